pub mod config;
pub mod pool;
pub mod server;
