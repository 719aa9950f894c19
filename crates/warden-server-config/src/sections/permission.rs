// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission vocabulary section.

use serde::{Deserialize, Serialize};
use warden_server_permission::canonical::{DEFAULT_PERMITTED_OBJECT_TYPES, DOMAIN_ENV};

fn default_permitted_object_types() -> Vec<String> {
	DEFAULT_PERMITTED_OBJECT_TYPES
		.iter()
		.map(|s| s.to_string())
		.collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PermissionConfigLayer {
	pub permitted_object_types: Option<Vec<String>>,
	pub root_user_ids: Option<Vec<i64>>,
	pub pod_terminal_domain_type: Option<String>,
}

impl PermissionConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.permitted_object_types.is_some() {
			self.permitted_object_types = other.permitted_object_types;
		}
		if other.root_user_ids.is_some() {
			self.root_user_ids = other.root_user_ids;
		}
		if other.pod_terminal_domain_type.is_some() {
			self.pod_terminal_domain_type = other.pod_terminal_domain_type;
		}
	}

	pub fn finalize(self) -> PermissionConfig {
		PermissionConfig {
			permitted_object_types: self
				.permitted_object_types
				.unwrap_or_else(default_permitted_object_types),
			root_user_ids: self.root_user_ids.unwrap_or_default(),
			pod_terminal_domain_type: self
				.pod_terminal_domain_type
				.unwrap_or_else(|| DOMAIN_ENV.to_string()),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PermissionConfig {
	pub permitted_object_types: Vec<String>,
	pub root_user_ids: Vec<i64>,
	pub pod_terminal_domain_type: String,
}

impl Default for PermissionConfig {
	fn default() -> Self {
		PermissionConfigLayer::default().finalize()
	}
}
