// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Checker strategies.
//!
//! Each checker runs the same strictly sequential pipeline, short-circuiting
//! on the first failure or grant:
//!
//! ```text
//! [route pass] → domain lock gate → root bypass → canonicalize → enforce → interpret
//! ```
//!
//! The route pass only exists in [`DefaultChecker`]. [`PodTerminalChecker`]
//! additionally requires an environment domain and evaluates exactly one
//! tuple with [`PolicyEnforcer::enforce_one`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::canonical::{Canonicalizer, CanonicalTuple, DOMAIN_ENV, OBJECT_ROUTE, SEPARATOR};
use crate::engine::{at_boundary, PolicyEnforcer};
use crate::error::{PermissionError, PermissionResult};
use crate::lock::DomainLockLookup;
use crate::request::PermissionRequest;
use crate::root::RootUserLookup;

/// A permission-decision strategy for one object type / sub-resource pair.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
	fn name(&self) -> &'static str;

	/// Returns `Ok(())` when the request is permitted.
	async fn check(
		&self,
		ctx: &CheckContext,
		req: &PermissionRequest,
		cancel: &CancellationToken,
	) -> PermissionResult<()>;
}

/// Collaborators shared by every checker.
#[derive(Clone)]
pub struct CheckContext {
	pub canonicalizer: Canonicalizer,
	pub enforcer: PolicyEnforcer,
	pub root_users: Arc<dyn RootUserLookup>,
	pub domain_locks: Arc<dyn DomainLockLookup>,
	/// Domain type the pod terminal checker requires.
	pub pod_terminal_domain_type: String,
}

impl CheckContext {
	pub fn new(
		canonicalizer: Canonicalizer,
		enforcer: PolicyEnforcer,
		root_users: Arc<dyn RootUserLookup>,
		domain_locks: Arc<dyn DomainLockLookup>,
	) -> Self {
		Self {
			canonicalizer,
			enforcer,
			root_users,
			domain_locks,
			pod_terminal_domain_type: DOMAIN_ENV.to_string(),
		}
	}

	pub fn with_pod_terminal_domain_type(mut self, domain_type: impl Into<String>) -> Self {
		self.pod_terminal_domain_type = domain_type.into();
		self
	}

	/// Fails with [`PermissionError::DomainLocked`] when the request writes
	/// into a locked domain. Requests without a domain pass.
	///
	/// A lock store failure is logged and resolves to a denial.
	pub async fn check_domain_lock(
		&self,
		req: &PermissionRequest,
		cancel: &CancellationToken,
	) -> PermissionResult<()> {
		let Some((domain_type, domain_id)) = req.domain() else {
			return Ok(());
		};

		let lookup = self.domain_locks.is_locked(domain_type, domain_id, &req.acts);
		match at_boundary(cancel, lookup).await? {
			Ok(false) => Ok(()),
			Ok(true) => {
				info!(domain_type, domain_id, acts = ?req.acts, "write blocked by domain lock");
				Err(PermissionError::DomainLocked {
					domain: format!("{domain_type}{SEPARATOR}{domain_id}"),
				})
			}
			Err(e) => {
				warn!(domain_type, domain_id, error = %e, "domain lock lookup failed, denying");
				Err(PermissionError::PermissionDenied)
			}
		}
	}

	/// Returns true if the requesting user is root. Anonymous users never are,
	/// and the lookup is skipped for them.
	pub async fn is_root(
		&self,
		req: &PermissionRequest,
		cancel: &CancellationToken,
	) -> PermissionResult<bool> {
		if req.user_id <= 0 {
			return Ok(false);
		}
		at_boundary(cancel, self.root_users.is_root(req.user_id)).await
	}

	pub fn canonicalize(&self, req: &PermissionRequest) -> PermissionResult<CanonicalTuple> {
		self.canonicalizer.canonicalize(req).map_err(|e| {
			error!(error = %e, "permission request is invalid");
			e
		})
	}
}

impl std::fmt::Debug for CheckContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CheckContext")
			.field("canonicalizer", &self.canonicalizer)
			.field("pod_terminal_domain_type", &self.pod_terminal_domain_type)
			.finish_non_exhaustive()
	}
}

/// Turns an enforcement outcome into a verdict.
///
/// Engine faults are logged and fold into a denial. Cancellation passes through.
fn interpret(outcome: PermissionResult<bool>, tuple: &CanonicalTuple) -> PermissionResult<()> {
	let allowed = match outcome {
		Ok(allowed) => allowed,
		Err(PermissionError::Engine(e)) => {
			warn!(%tuple, error = %e, "policy engine fault, denying");
			false
		}
		Err(e) => return Err(e),
	};

	if allowed {
		Ok(())
	} else {
		info!(%tuple, "permission denied");
		Err(PermissionError::PermissionDenied)
	}
}

/// Checker used for every pair without a registered strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultChecker;

impl DefaultChecker {
	/// Route objects are granted unconditionally.
	///
	/// Placeholder until route permissions are evaluated against the rule
	/// store. Route requests skip the lock gate, the root lookup and the
	/// engine entirely.
	fn provisional_route_pass(req: &PermissionRequest) -> bool {
		req.object_type == OBJECT_ROUTE
	}
}

#[async_trait]
impl PermissionChecker for DefaultChecker {
	fn name(&self) -> &'static str {
		"default"
	}

	async fn check(
		&self,
		ctx: &CheckContext,
		req: &PermissionRequest,
		cancel: &CancellationToken,
	) -> PermissionResult<()> {
		if Self::provisional_route_pass(req) {
			info!("route objects always pass currently");
			return Ok(());
		}

		ctx.check_domain_lock(req, cancel).await?;

		if ctx.is_root(req, cancel).await? {
			return Ok(());
		}

		let tuple = ctx.canonicalize(req)?;
		let candidates = [tuple];
		let outcome = ctx.enforcer.enforce_any(&candidates, cancel).await;
		interpret(outcome, &candidates[0])
	}
}

/// Checker for interactive terminals into an application's pods.
///
/// Non-root users must scope the request to an environment domain.
#[derive(Debug, Clone, Copy, Default)]
pub struct PodTerminalChecker;

#[async_trait]
impl PermissionChecker for PodTerminalChecker {
	fn name(&self) -> &'static str {
		"pod_terminal"
	}

	async fn check(
		&self,
		ctx: &CheckContext,
		req: &PermissionRequest,
		cancel: &CancellationToken,
	) -> PermissionResult<()> {
		ctx.check_domain_lock(req, cancel).await?;

		if ctx.is_root(req, cancel).await? {
			return Ok(());
		}

		let tuple = ctx.canonicalize(req)?;
		match req.domain() {
			Some((domain_type, _)) if domain_type == ctx.pod_terminal_domain_type => {}
			_ => {
				let e = PermissionError::Validation(format!(
					"pod terminal access requires a {} domain",
					ctx.pod_terminal_domain_type
				));
				error!(error = %e, "permission request is invalid");
				return Err(e);
			}
		}

		let outcome = ctx.enforcer.enforce_one(&tuple, cancel).await;
		interpret(outcome, &tuple)
	}
}
