pub mod cli;
pub mod config;
pub mod core;
pub mod directory;
pub mod error;
pub mod scheduler;
pub mod storage;
pub mod utils;
