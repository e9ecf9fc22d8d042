pub mod cli;
pub mod config;
pub mod logging;
pub mod protocol;
pub mod selection;
pub mod server;
