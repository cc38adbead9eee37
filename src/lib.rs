pub mod cli;
pub mod load_config;

pub use cli::{replay, run, Cli, Commands, ReplayReport};
