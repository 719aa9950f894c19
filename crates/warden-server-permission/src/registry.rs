// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Strategy registry: `object type → sub-resource → checker`.
//!
//! The registry is assembled once with [`StrategyRegistryBuilder`] and is
//! immutable afterwards, so concurrent lookups need no locking. Any pair
//! without a registered checker resolves to the default checker.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::canonical::{OBJECT_TABLE, SUB_RESOURCE_POD_TERMINAL};
use crate::checker::{DefaultChecker, PermissionChecker, PodTerminalChecker};

pub struct StrategyRegistry {
	default: Arc<dyn PermissionChecker>,
	strategies: HashMap<String, HashMap<String, Arc<dyn PermissionChecker>>>,
}

impl StrategyRegistry {
	pub fn builder() -> StrategyRegistryBuilder {
		StrategyRegistryBuilder::default()
	}

	/// Registry with the built-in special cases.
	pub fn builtin() -> Self {
		Self::builder()
			.register(OBJECT_TABLE, SUB_RESOURCE_POD_TERMINAL, PodTerminalChecker)
			.build()
	}

	/// Selects the checker for a pair. Never fails.
	pub fn select(&self, object_type: &str, sub_resource: &str) -> &dyn PermissionChecker {
		let checker = self
			.strategies
			.get(object_type)
			.and_then(|by_sub_resource| by_sub_resource.get(sub_resource))
			.unwrap_or(&self.default);
		debug!(object_type, sub_resource, checker = checker.name(), "selected checker");
		checker.as_ref()
	}

	pub fn len(&self) -> usize {
		self.strategies.values().map(HashMap::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl Default for StrategyRegistry {
	fn default() -> Self {
		Self::builtin()
	}
}

impl std::fmt::Debug for StrategyRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let mut entries: Vec<(&str, &str, &'static str)> = self
			.strategies
			.iter()
			.flat_map(|(object_type, by_sub_resource)| {
				by_sub_resource.iter().map(move |(sub_resource, checker)| {
					(object_type.as_str(), sub_resource.as_str(), checker.name())
				})
			})
			.collect();
		entries.sort_unstable();
		f.debug_struct("StrategyRegistry")
			.field("default", &self.default.name())
			.field("strategies", &entries)
			.finish()
	}
}

pub struct StrategyRegistryBuilder {
	default: Arc<dyn PermissionChecker>,
	strategies: HashMap<String, HashMap<String, Arc<dyn PermissionChecker>>>,
}

impl Default for StrategyRegistryBuilder {
	fn default() -> Self {
		Self {
			default: Arc::new(DefaultChecker),
			strategies: HashMap::new(),
		}
	}
}

impl StrategyRegistryBuilder {
	/// Registers `checker` for the pair, replacing any earlier registration.
	pub fn register(
		mut self,
		object_type: impl Into<String>,
		sub_resource: impl Into<String>,
		checker: impl PermissionChecker + 'static,
	) -> Self {
		let object_type = object_type.into();
		let sub_resource = sub_resource.into();
		debug!(%object_type, %sub_resource, checker = checker.name(), "registering checker");
		self.strategies
			.entry(object_type)
			.or_default()
			.insert(sub_resource, Arc::new(checker));
		self
	}

	/// Replaces the fallback checker.
	pub fn default_checker(mut self, checker: impl PermissionChecker + 'static) -> Self {
		self.default = Arc::new(checker);
		self
	}

	pub fn build(self) -> StrategyRegistry {
		StrategyRegistry {
			default: self.default,
			strategies: self.strategies,
		}
	}
}
