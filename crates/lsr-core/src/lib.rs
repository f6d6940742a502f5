pub mod config;
pub mod logging;

pub mod clients;
pub mod compose;
pub mod endpoint;
pub mod initializer;
pub mod process;
pub mod retry;
