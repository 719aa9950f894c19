// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission service: the entry point used by request handlers.
//!
//! ```text
//! PermissionRequest → StrategyRegistry::select → PermissionChecker::check → Ok(()) | PermissionError
//! ```

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::canonical::Canonicalizer;
use crate::checker::CheckContext;
use crate::engine::{PolicyEngine, PolicyEnforcer};
use crate::error::{PermissionError, PermissionResult};
use crate::lock::DomainLockLookup;
use crate::registry::StrategyRegistry;
use crate::request::PermissionRequest;
use crate::root::RootUserLookup;

/// Owns the strategy registry and the collaborators every check needs.
///
/// Cheap to share behind an [`Arc`]; nothing is mutated during a check.
#[derive(Debug)]
pub struct PermissionService {
	registry: StrategyRegistry,
	ctx: CheckContext,
}

impl PermissionService {
	pub fn new(registry: StrategyRegistry, ctx: CheckContext) -> Self {
		Self { registry, ctx }
	}

	/// Builds a service with the built-in registry and default vocabulary.
	pub fn with_collaborators(
		engine: Arc<dyn PolicyEngine>,
		root_users: Arc<dyn RootUserLookup>,
		domain_locks: Arc<dyn DomainLockLookup>,
	) -> Self {
		let ctx = CheckContext::new(
			Canonicalizer::default(),
			PolicyEnforcer::new(engine),
			root_users,
			domain_locks,
		);
		Self::new(StrategyRegistry::builtin(), ctx)
	}

	pub fn registry(&self) -> &StrategyRegistry {
		&self.registry
	}

	pub fn context(&self) -> &CheckContext {
		&self.ctx
	}

	/// Checks a request. `Ok(())` means permitted.
	pub async fn check(&self, req: &PermissionRequest) -> PermissionResult<()> {
		self.check_with_cancel(req, &CancellationToken::new()).await
	}

	/// Checks a request, aborting with [`PermissionError::Canceled`] at the next
	/// collaborator call once `cancel` fires.
	#[instrument(
		level = "debug",
		skip(self, req, cancel),
		fields(
			user_id = req.user_id,
			object_type = %req.object_type,
			object_idx = %req.object_idx,
			sub_resource = %req.sub_resource,
		)
	)]
	pub async fn check_with_cancel(
		&self,
		req: &PermissionRequest,
		cancel: &CancellationToken,
	) -> PermissionResult<()> {
		info!(request = ?req, "request check permission");

		// Anonymous subjects never reach a checker.
		if req.user_id <= 0 {
			return Err(PermissionError::Validation(format!(
				"userId({}) must be positive",
				req.user_id
			)));
		}

		let checker = self.registry.select(&req.object_type, &req.sub_resource);
		checker.check(&self.ctx, req, cancel).await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::{PolicyRule, RulePolicyEngine};
	use crate::lock::InMemoryDomainLocks;
	use crate::root::StaticRootUsers;
	use proptest::prelude::*;

	fn service(rules: Vec<PolicyRule>, roots: &[i64]) -> PermissionService {
		PermissionService::with_collaborators(
			Arc::new(RulePolicyEngine::new(rules)),
			Arc::new(StaticRootUsers::new(roots.iter().copied())),
			Arc::new(InMemoryDomainLocks::with_locked([("env", "prod")])),
		)
	}

	#[tokio::test]
	async fn dispatches_pod_terminal_requests() {
		let svc = service(vec![PolicyRule::new("*", "*", "*", "*")], &[]);
		let req = PermissionRequest::new(7, "table", "T1", "pod-terminal");

		// The pod terminal checker rejects a request with no env domain even
		// though the rule set would allow it.
		assert!(matches!(svc.check(&req).await, Err(PermissionError::Validation(_))));
	}

	#[test]
	fn anonymous_requests_are_invalid_regardless_of_other_fields() {
		proptest!(|(
			user_id in i64::MIN..=0,
			object_type in prop_oneof![Just("route"), Just("table"), Just("bogus")],
			acts in prop::collection::vec(prop_oneof![Just("write"), Just("select")], 0..3),
		)| {
			let svc = service(vec![PolicyRule::new("*", "*", "*", "*")], &[user_id]);
			let req = PermissionRequest::new(user_id, object_type, "T1", "read")
				.with_acts(acts)
				.with_domain("env", "prod");

			let result = tokio_test::block_on(svc.check(&req));
			prop_assert!(matches!(result, Err(PermissionError::Validation(_))));
		});
	}
}
