//! Operator tooling for tracer study surveys.

pub mod cli;
pub mod cmd;
pub mod config;
