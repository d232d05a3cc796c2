//! Command handlers, one module per subcommand group

pub mod block;
pub mod chapter;
pub mod config;
pub mod document;
pub mod search;
pub mod status;
