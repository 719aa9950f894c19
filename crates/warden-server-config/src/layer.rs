// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use serde::{Deserialize, Serialize};

use crate::sections::{LoggingConfigLayer, PermissionConfigLayer, PolicyConfigLayer};

/// Partial configuration produced by a single source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerConfigLayer {
	pub permission: Option<PermissionConfigLayer>,
	pub policy: Option<PolicyConfigLayer>,
	pub logging: Option<LoggingConfigLayer>,
}

fn merge_section<T: Default>(base: &mut Option<T>, other: Option<T>, merge: impl FnOnce(&mut T, T)) {
	if let Some(other) = other {
		merge(base.get_or_insert_with(T::default), other);
	}
}

impl ServerConfigLayer {
	/// Overlays `other` on top of `self`; fields set in `other` win.
	pub fn merge(&mut self, other: Self) {
		merge_section(&mut self.permission, other.permission, PermissionConfigLayer::merge);
		merge_section(&mut self.policy, other.policy, PolicyConfigLayer::merge);
		merge_section(&mut self.logging, other.logging, LoggingConfigLayer::merge);
	}
}
