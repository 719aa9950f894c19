// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Conversion of a [`PermissionRequest`] into the canonical policy tuple.
//!
//! The policy engine only understands four flat strings: subject, object,
//! action and domain. This module owns the vocabulary used to build them:
//!
//! ```text
//! subject = user:<user_id>
//! object  = <object_type>:<object_idx>:sub:<sub_resource>
//! action  = act1|act2|...            ("*" when no acts)
//! domain  = <domain_type>:<domain_id> ("*" when either half is missing)
//! ```
//!
//! Reserved characters (`:`, `|`, `*`) are rejected in every input field so
//! that two different requests can never collapse into the same tuple.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{PermissionError, PermissionResult};
use crate::request::PermissionRequest;

pub const PREFIX_USER: &str = "user";
pub const PREFIX_SUB_RESOURCE: &str = "sub";
pub const SEPARATOR: &str = ":";
pub const ACTION_SEPARATOR: &str = "|";
pub const WILDCARD: &str = "*";

pub const OBJECT_ROUTE: &str = "route";
pub const OBJECT_TABLE: &str = "table";
pub const OBJECT_INSTANCE: &str = "ins";
pub const OBJECT_DATABASE: &str = "db";
pub const OBJECT_CONFIG_RESOURCE: &str = "configRsrc";

pub const SUB_RESOURCE_POD_TERMINAL: &str = "pod-terminal";

pub const DOMAIN_ENV: &str = "env";

/// Object types accepted when no explicit set is configured.
pub const DEFAULT_PERMITTED_OBJECT_TYPES: &[&str] = &[
	OBJECT_ROUTE,
	OBJECT_TABLE,
	OBJECT_INSTANCE,
	OBJECT_DATABASE,
	OBJECT_CONFIG_RESOURCE,
];

/// Returns true if `value` contains a character reserved by the tuple format.
pub fn contains_reserved(value: &str) -> bool {
	value.contains(SEPARATOR) || value.contains(ACTION_SEPARATOR) || value.contains(WILDCARD)
}

/// The normalized quadruple consumed by the policy engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CanonicalTuple {
	pub subject: String,
	pub object: String,
	pub action: String,
	pub domain: String,
}

impl CanonicalTuple {
	pub fn new(
		subject: impl Into<String>,
		object: impl Into<String>,
		action: impl Into<String>,
		domain: impl Into<String>,
	) -> Self {
		Self {
			subject: subject.into(),
			object: object.into(),
			action: action.into(),
			domain: domain.into(),
		}
	}
}

impl fmt::Display for CanonicalTuple {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"({}, {}, {}, {})",
			self.subject, self.object, self.action, self.domain
		)
	}
}

/// Validates permission requests and builds canonical tuples.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canonicalizer {
	permitted_object_types: BTreeSet<String>,
}

impl Canonicalizer {
	pub fn new<I, S>(permitted_object_types: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			permitted_object_types: permitted_object_types.into_iter().map(Into::into).collect(),
		}
	}

	pub fn is_permitted_object_type(&self, object_type: &str) -> bool {
		self.permitted_object_types.contains(object_type)
	}

	pub fn permitted_object_types(&self) -> impl Iterator<Item = &str> {
		self.permitted_object_types.iter().map(String::as_str)
	}

	/// Builds the canonical tuple for `req`.
	///
	/// Pure function of its input. Fails with [`PermissionError::Validation`]
	/// when a required field is missing, the object type is not permitted, or
	/// any field carries a reserved character.
	pub fn canonicalize(&self, req: &PermissionRequest) -> PermissionResult<CanonicalTuple> {
		if req.user_id <= 0
			|| req.object_type.is_empty()
			|| req.object_idx.is_empty()
			|| req.sub_resource.is_empty()
		{
			return Err(PermissionError::Validation(
				"the userId, objectType, objectIdx and subResource cannot be empty".to_string(),
			));
		}
		if !self.is_permitted_object_type(&req.object_type) {
			return Err(PermissionError::Validation(format!(
				"objectType({}) is invalid",
				req.object_type
			)));
		}

		check_field("objectType", &req.object_type)?;
		check_field("objectIdx", &req.object_idx)?;
		check_field("subResource", &req.sub_resource)?;
		check_field("domainType", &req.domain_type)?;
		check_field("domainId", &req.domain_id)?;
		for act in &req.acts {
			if act.is_empty() {
				return Err(PermissionError::Validation("acts cannot contain an empty action".to_string()));
			}
			check_field("acts", act)?;
		}

		let subject = join(&[PREFIX_USER, &req.user_id.to_string()]);
		let object = join(&[
			&req.object_type,
			&req.object_idx,
			PREFIX_SUB_RESOURCE,
			&req.sub_resource,
		]);
		let action = if req.acts.is_empty() {
			WILDCARD.to_string()
		} else {
			req.acts.join(ACTION_SEPARATOR)
		};
		let domain = match req.domain() {
			Some((domain_type, domain_id)) => join(&[domain_type, domain_id]),
			None => WILDCARD.to_string(),
		};

		Ok(CanonicalTuple {
			subject,
			object,
			action,
			domain,
		})
	}
}

impl Default for Canonicalizer {
	fn default() -> Self {
		Self::new(DEFAULT_PERMITTED_OBJECT_TYPES.iter().copied())
	}
}

fn check_field(name: &str, value: &str) -> PermissionResult<()> {
	if contains_reserved(value) {
		return Err(PermissionError::Validation(format!(
			"{name}({value}) contains a reserved character"
		)));
	}
	Ok(())
}

fn join(parts: &[&str]) -> String {
	parts.join(SEPARATOR)
}
