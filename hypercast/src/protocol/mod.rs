mod header;
mod tag;

pub use header::{FRAME_HEADER_SIZE, FrameHeader};
pub use tag::{Lane, USER_TAG_BIT, exchange_tag};
