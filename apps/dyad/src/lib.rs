//! # Dyad
//!
//! Application layer over `dyad-core`: the HTTP API, the CLI commands,
//! configuration loading and recipe files. The `dyad` binary is a thin
//! entry point over this library.

pub mod api;
pub mod cli;
pub mod config;
pub mod recipe;
