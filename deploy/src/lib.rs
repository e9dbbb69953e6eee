//! Operator tooling for publishing the copy trading Move package to Aptos.
//!
//! Everything here drives the `aptos` CLI as a subprocess; the chain is
//! never contacted directly.

pub mod aptos;
pub mod command_line;
pub mod contracts;
pub mod deploy;
pub mod env_file;
pub mod network;
pub mod profile;
pub mod publish;
pub mod runner;
pub mod setup;
pub mod summary;
pub mod switch;
