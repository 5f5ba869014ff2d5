pub mod cli;
pub mod load_config;
pub mod source;

pub use cli::{run, Cli, Commands};
