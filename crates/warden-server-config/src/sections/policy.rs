// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy rules and domain locks.

use serde::{Deserialize, Serialize};
use warden_server_permission::canonical::SEPARATOR;
use warden_server_permission::PolicyRule;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfigLayer {
	pub rules: Option<Vec<PolicyRule>>,
	/// Locked domains written as `type:id`.
	pub locked_domains: Option<Vec<String>>,
}

impl PolicyConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.rules.is_some() {
			self.rules = other.rules;
		}
		if other.locked_domains.is_some() {
			self.locked_domains = other.locked_domains;
		}
	}

	pub fn finalize(self) -> Result<PolicyConfig, ConfigError> {
		let locked_domains = self
			.locked_domains
			.unwrap_or_default()
			.iter()
			.map(|raw| LockedDomain::parse(raw))
			.collect::<Result<Vec<_>, _>>()?;

		Ok(PolicyConfig {
			rules: self.rules.unwrap_or_default(),
			locked_domains,
		})
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PolicyConfig {
	pub rules: Vec<PolicyRule>,
	pub locked_domains: Vec<LockedDomain>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockedDomain {
	pub domain_type: String,
	pub domain_id: String,
}

impl LockedDomain {
	pub fn parse(raw: &str) -> Result<Self, ConfigError> {
		match raw.split_once(SEPARATOR) {
			Some((domain_type, domain_id))
				if !domain_type.is_empty() && !domain_id.is_empty() && !domain_id.contains(SEPARATOR) =>
			{
				Ok(Self {
					domain_type: domain_type.to_string(),
					domain_id: domain_id.to_string(),
				})
			}
			_ => Err(ConfigError::InvalidValue {
				key: "policy.locked_domains".to_string(),
				message: format!("expected 'type{SEPARATOR}id', got '{raw}'"),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parses_locked_domains() {
		let layer = PolicyConfigLayer {
			rules: None,
			locked_domains: Some(vec!["env:prod".to_string()]),
		};
		let config = layer.finalize().unwrap();
		assert_eq!(
			config.locked_domains,
			vec![LockedDomain {
				domain_type: "env".to_string(),
				domain_id: "prod".to_string(),
			}]
		);
		assert!(config.rules.is_empty());
	}

	#[test]
	fn test_rejects_malformed_locked_domain() {
		for raw in ["prod", ":prod", "env:", "env:prod:eu"] {
			assert!(LockedDomain::parse(raw).is_err(), "{raw} should be rejected");
		}
	}

	#[test]
	fn test_rules_from_toml() {
		let layer: PolicyConfigLayer = toml::from_str(
			r#"
			[[rules]]
			subject = "user:7"
			object = "table:T1:sub:read"
			action = "select"
			"#,
		)
		.unwrap();
		let config = layer.finalize().unwrap();
		assert_eq!(config.rules.len(), 1);
		assert_eq!(config.rules[0].domain, "*");
	}
}
