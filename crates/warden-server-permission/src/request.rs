// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The permission request handed to the decision pipeline.
//!
//! A [`PermissionRequest`] is built per call by the enclosing request-handling
//! layer and is transient. It is deliberately loosely typed: every field is a
//! plain string or integer, and validation happens during canonicalization.

use serde::{Deserialize, Serialize};

/// A request asking whether a user may perform actions on an object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRequest {
	/// Requesting user. Values `<= 0` are anonymous and never checkable.
	pub user_id: i64,
	/// Resource category, e.g. `table` or `route`.
	pub object_type: String,
	/// Identifier of the object instance within its category.
	pub object_idx: String,
	/// Finer-grained capability under the object.
	pub sub_resource: String,
	/// Requested actions. Empty means any action.
	#[serde(default)]
	pub acts: Vec<String>,
	#[serde(default)]
	pub domain_type: String,
	#[serde(default)]
	pub domain_id: String,
}

impl PermissionRequest {
	/// Creates a request with no actions and no domain.
	pub fn new(
		user_id: i64,
		object_type: impl Into<String>,
		object_idx: impl Into<String>,
		sub_resource: impl Into<String>,
	) -> Self {
		Self {
			user_id,
			object_type: object_type.into(),
			object_idx: object_idx.into(),
			sub_resource: sub_resource.into(),
			acts: Vec::new(),
			domain_type: String::new(),
			domain_id: String::new(),
		}
	}

	/// Builder: set the requested actions.
	pub fn with_acts<I, S>(mut self, acts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.acts = acts.into_iter().map(Into::into).collect();
		self
	}

	/// Builder: scope the request to a domain.
	pub fn with_domain(mut self, domain_type: impl Into<String>, domain_id: impl Into<String>) -> Self {
		self.domain_type = domain_type.into();
		self.domain_id = domain_id.into();
		self
	}

	/// The `(type, id)` domain pair, present only when both halves are set.
	pub fn domain(&self) -> Option<(&str, &str)> {
		if self.domain_type.is_empty() || self.domain_id.is_empty() {
			None
		} else {
			Some((self.domain_type.as_str(), self.domain_id.as_str()))
		}
	}
}
