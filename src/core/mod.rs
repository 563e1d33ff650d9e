//! Core domain models
//!
//! This module defines the fundamental data structures that represent
//! pipelines, agent steps, shared run state, and execution results.

pub mod config;
pub mod context;
pub mod result;

pub use config::*;
pub use context::*;
pub use result::*;
