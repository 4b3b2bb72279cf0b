mod buffer;

pub use buffer::ExchangeBuffer;
