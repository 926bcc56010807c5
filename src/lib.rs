pub mod cli;
pub mod config;
pub mod dns;
pub mod error;
pub mod log_sink;
pub mod network;
pub mod output;
pub mod ping;
pub mod scanner;
pub mod toolkit;

pub use error::{ProbeError, Result};
pub use toolkit::Toolkit;
