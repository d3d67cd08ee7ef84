//! # scap-common
//!
//! Shared vocabulary for the scap workspace: syscall identifiers, event
//! directions, parameter type tags, wire-format constants, the capture
//! configuration model, and the workspace-level error type.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used, clippy::panic))]

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
