pub mod cli;
pub mod load_config;
pub mod photos;

pub use cli::{run, Cli, Commands};
