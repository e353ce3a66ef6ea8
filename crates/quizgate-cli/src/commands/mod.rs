pub mod completion;
pub mod config;
pub mod fetch;
pub mod simulate;
pub mod status;
