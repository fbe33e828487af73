//! Command implementations

pub mod agent;
