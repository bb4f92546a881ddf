//! Command-line front end for watched-folder document intake.

pub mod cli;
pub mod commands;
pub mod config;
