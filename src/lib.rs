pub mod analyzer;
pub mod coin;
pub mod config;
pub mod fetcher;
pub mod notification;
pub mod respository;
pub mod service;
pub mod shutdown;
pub mod tasks;
pub mod types;
pub mod wallet;
