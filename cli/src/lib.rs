//! Hivemind CLI library — exposes modules for integration testing.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod assets;
pub mod cli;
pub mod command_runner;
pub mod commands;
pub mod config;
pub mod generator;
pub mod manager;
pub mod output;
pub mod store;
pub mod supervisor;
pub mod template;
