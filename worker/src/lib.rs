//! Hivemind worker library — spec loading, orchestration and the
//! message-bus event loop.

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod orchestrator;
pub mod runtime;
pub mod spec;
