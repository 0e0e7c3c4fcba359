//! # boomgate-types
//!
//! Shared type definitions for the boomgate chat-completion gateway.
//!
//! This crate sits at the bottom of the dependency graph. It contains:
//!
//! - **[`config`]** -- [`GatewayConfig`] schema and its sections
//! - **[`loader`]** -- config file discovery and camelCase key normalization
//! - **[`provider`]** -- [`ProviderDescriptor`], [`TaskTag`] and group names
//! - **[`error`]** -- [`ConfigError`]

pub mod config;
pub mod error;
pub mod loader;
pub mod provider;

pub use config::GatewayConfig;
pub use error::{ConfigError, Result};
pub use provider::{ProviderDescriptor, TaskTag};
