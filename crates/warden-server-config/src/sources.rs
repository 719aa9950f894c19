// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: environment variables and TOML files.

use std::path::PathBuf;

use tracing::{debug, trace};
use warden_server_permission::PolicyRule;

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{LogFormat, LoggingConfigLayer, PermissionConfigLayer, PolicyConfigLayer};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/warden/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: WARDEN_SERVER_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			permission: Some(load_permission_from_env()?),
			policy: Some(load_policy_from_env()?),
			logging: Some(load_logging_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_list(name: &str) -> Option<Vec<String>> {
	env_var(name).map(|s| split_list(&s))
}

fn split_list(raw: &str) -> Vec<String> {
	raw.split(',')
		.map(|s| s.trim().to_string())
		.filter(|s| !s.is_empty())
		.collect()
}

fn parse_i64_list(key: &str, raw: &str) -> Result<Vec<i64>, ConfigError> {
	split_list(raw)
		.iter()
		.map(|v| {
			v.parse().map_err(|_| ConfigError::InvalidValue {
				key: key.to_string(),
				message: format!("invalid i64 value '{v}'"),
			})
		})
		.collect()
}

fn load_permission_from_env() -> Result<PermissionConfigLayer, ConfigError> {
	let root_user_ids = match env_var("WARDEN_SERVER_ROOT_USER_IDS") {
		Some(raw) => Some(parse_i64_list("WARDEN_SERVER_ROOT_USER_IDS", &raw)?),
		None => None,
	};

	Ok(PermissionConfigLayer {
		permitted_object_types: env_list("WARDEN_SERVER_PERMITTED_OBJECT_TYPES"),
		root_user_ids,
		pod_terminal_domain_type: env_var("WARDEN_SERVER_POD_TERMINAL_DOMAIN_TYPE"),
	})
}

fn load_policy_from_env() -> Result<PolicyConfigLayer, ConfigError> {
	let rules = match env_var("WARDEN_SERVER_POLICY_RULES") {
		Some(json) => Some(serde_json::from_str::<Vec<PolicyRule>>(&json).map_err(|e| {
			ConfigError::InvalidValue {
				key: "WARDEN_SERVER_POLICY_RULES".to_string(),
				message: e.to_string(),
			}
		})?),
		None => None,
	};

	Ok(PolicyConfigLayer {
		rules,
		locked_domains: env_list("WARDEN_SERVER_LOCKED_DOMAINS"),
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	let format = match env_var("WARDEN_SERVER_LOG_FORMAT") {
		Some(v) => Some(match v.to_lowercase().as_str() {
			"json" => LogFormat::Json,
			"pretty" => LogFormat::Pretty,
			_ => {
				return Err(ConfigError::InvalidValue {
					key: "WARDEN_SERVER_LOG_FORMAT".to_string(),
					message: format!("expected 'json' or 'pretty', got '{v}'"),
				})
			}
		}),
		None => None,
	};

	Ok(LoggingConfigLayer {
		level: env_var("WARDEN_SERVER_LOG_LEVEL"),
		format,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_precedence_ordering() {
		assert!(Precedence::Environment > Precedence::ConfigFile);
		assert!(Precedence::ConfigFile > Precedence::Defaults);
	}

	#[test]
	fn test_defaults_source_returns_empty_layer() {
		let layer = DefaultsSource.load().unwrap();
		assert!(layer.permission.is_none());
		assert!(layer.policy.is_none());
	}

	#[test]
	fn test_toml_source_missing_file_returns_empty() {
		let source = TomlSource::new("/nonexistent/warden.toml");
		let layer = source.load().unwrap();
		assert!(layer.permission.is_none());
	}

	#[test]
	fn test_toml_source_parses_sections() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
[permission]
root_user_ids = [1]
permitted_object_types = ["table", "route"]

[policy]
locked_domains = ["env:prod"]

[[policy.rules]]
subject = "user:7"
object = "table:T1:sub:read"
action = "select"
"#
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		let permission = layer.permission.unwrap();
		assert_eq!(permission.root_user_ids, Some(vec![1]));
		let policy = layer.policy.unwrap();
		assert_eq!(policy.rules.unwrap().len(), 1);
		assert_eq!(policy.locked_domains, Some(vec!["env:prod".to_string()]));
	}

	#[test]
	fn test_toml_source_reports_parse_errors() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(file, "[permission\nroot_user_ids = 1").unwrap();

		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_split_list_trims_and_skips_empty() {
		assert_eq!(split_list(" table, route ,,db"), vec!["table", "route", "db"]);
	}

	#[test]
	fn test_parse_i64_list_rejects_garbage() {
		assert_eq!(parse_i64_list("K", "1, 2").unwrap(), vec![1, 2]);
		assert!(matches!(
			parse_i64_list("K", "1,root"),
			Err(ConfigError::InvalidValue { .. })
		));
	}
}
