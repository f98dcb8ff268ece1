//! ---
//! sw_section: "01-core-primitives"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Shared stack primitives and utilities for the deployment engine."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
//! Core shared primitives for the Stackway deployment workspace.
//! This crate exposes the stack data model, resource name parsing,
//! configuration loading, and logging bootstrap utilities consumed
//! across the workspace.
#![warn(missing_docs)]

pub mod arn;
pub mod config;
pub mod logging;
pub mod stack;

pub use arn::{ResourceName, ResourceNameError};
pub use config::{AppConfig, LoggingConfig};
pub use logging::{init_tracing, LogFormat};
pub use stack::{Parameter, Stack, StackDescription, StackStatus};
