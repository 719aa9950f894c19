// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Centralized configuration management for the Warden permission service.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Type-safe configuration with validation
//! - Consistent environment variable naming (`WARDEN_SERVER_*`)
//!
//! # Usage
//!
//! ```ignore
//! use warden_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("{} rules loaded", config.policy.rules.len());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use tracing::{debug, info};
use warden_server_permission::canonical::contains_reserved;

/// Fully resolved server configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerConfig {
	pub permission: PermissionConfig,
	pub policy: PolicyConfig,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`WARDEN_SERVER_*`)
/// 2. Config file (`/etc/warden/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge the given sources in precedence order and finalize.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let permission = layer.permission.unwrap_or_default().finalize();
	let policy = layer.policy.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	validate_config(&permission)?;

	info!(
		permitted_object_types = ?permission.permitted_object_types,
		root_users = permission.root_user_ids.len(),
		rules = policy.rules.len(),
		locked_domains = policy.locked_domains.len(),
		log_level = %logging.level,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		permission,
		policy,
		logging,
	})
}

/// Validate cross-field configuration rules.
fn validate_config(permission: &PermissionConfig) -> Result<(), ConfigError> {
	if permission.permitted_object_types.is_empty() {
		return Err(ConfigError::Validation(
			"permission.permitted_object_types must list at least one object type".to_string(),
		));
	}

	if let Some(bad) = permission
		.permitted_object_types
		.iter()
		.find(|t| t.is_empty() || contains_reserved(t))
	{
		return Err(ConfigError::Validation(format!(
			"object type '{bad}' is empty or contains a reserved character"
		)));
	}

	if let Some(bad) = permission.root_user_ids.iter().find(|id| **id <= 0) {
		return Err(ConfigError::Validation(format!(
			"root user id {bad} must be positive"
		)));
	}

	if permission.pod_terminal_domain_type.is_empty()
		|| contains_reserved(&permission.pod_terminal_domain_type)
	{
		return Err(ConfigError::Validation(format!(
			"pod terminal domain type '{}' is empty or contains a reserved character",
			permission.pod_terminal_domain_type
		)));
	}

	Ok(())
}
