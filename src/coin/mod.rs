pub mod client;
pub mod coin_trait;
pub mod model;

pub use client::RpcClient;
pub use coin_trait::ChainRpc;
