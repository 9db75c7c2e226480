//! CLI support for the `logris` binary

pub mod commands;
