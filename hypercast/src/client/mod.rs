mod async_client;
mod bootstrap;
mod collectives;
mod sync_client;

pub use async_client::HypercubeClient;
pub use sync_client::SyncClient;
