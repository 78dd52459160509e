//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod evaluate;
pub mod init;
pub mod validate;
