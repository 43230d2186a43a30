pub mod archive;
pub mod config;
pub mod env;
pub mod error;
pub mod files;
pub mod logs;
pub mod runtime;
pub mod sandbox;
pub mod server;
