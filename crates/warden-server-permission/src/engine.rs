// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy engine adapter.
//!
//! The rule engine itself is an external collaborator behind [`PolicyEngine`].
//! [`PolicyEnforcer`] wraps it and exposes the two evaluation shapes the
//! checkers need:
//!
//! - [`PolicyEnforcer::enforce_one`]: a single canonical tuple
//! - [`PolicyEnforcer::enforce_any`]: any-of-many, short-circuiting on the
//!   first tuple the engine allows
//!
//! Every engine call is a cancellation boundary: a canceled token aborts the
//! check with [`PermissionError::Canceled`] instead of producing a verdict.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::canonical::{CanonicalTuple, ACTION_SEPARATOR, WILDCARD};
use crate::error::{EngineError, PermissionError, PermissionResult};

/// External rule engine evaluating one canonical tuple.
#[async_trait]
pub trait PolicyEngine: Send + Sync {
	async fn enforce(&self, tuple: &CanonicalTuple) -> Result<bool, EngineError>;
}

/// Runs `fut` unless `cancel` fires first.
pub(crate) async fn at_boundary<F, T>(cancel: &CancellationToken, fut: F) -> PermissionResult<T>
where
	F: Future<Output = T>,
{
	if cancel.is_cancelled() {
		return Err(PermissionError::Canceled);
	}
	tokio::select! {
		biased;
		_ = cancel.cancelled() => Err(PermissionError::Canceled),
		out = fut => Ok(out),
	}
}

/// Adapter over a [`PolicyEngine`] used by the checker pipeline.
#[derive(Clone)]
pub struct PolicyEnforcer {
	engine: Arc<dyn PolicyEngine>,
}

impl PolicyEnforcer {
	pub fn new(engine: Arc<dyn PolicyEngine>) -> Self {
		Self { engine }
	}

	/// Delegates a single tuple to the engine.
	pub async fn enforce_one(
		&self,
		tuple: &CanonicalTuple,
		cancel: &CancellationToken,
	) -> PermissionResult<bool> {
		let allowed = at_boundary(cancel, self.engine.enforce(tuple)).await??;
		trace!(%tuple, allowed, "enforced single tuple");
		Ok(allowed)
	}

	/// Returns true if at least one tuple is allowed.
	///
	/// A candidate failure does not stop evaluation of the remaining tuples;
	/// it is reported only if nothing matched. An engine-wide failure halts
	/// immediately.
	pub async fn enforce_any(
		&self,
		tuples: &[CanonicalTuple],
		cancel: &CancellationToken,
	) -> PermissionResult<bool> {
		let mut first_error: Option<EngineError> = None;

		for tuple in tuples {
			match at_boundary(cancel, self.engine.enforce(tuple)).await? {
				Ok(true) => {
					trace!(%tuple, "tuple allowed");
					return Ok(true);
				}
				Ok(false) => {}
				Err(e) if e.is_fatal() => return Err(e.into()),
				Err(e) => {
					debug!(%tuple, error = %e, "candidate evaluation failed, continuing");
					first_error.get_or_insert(e);
				}
			}
		}

		match first_error {
			Some(e) => Err(e.into()),
			None => Ok(false),
		}
	}
}

impl std::fmt::Debug for PolicyEnforcer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("PolicyEnforcer").finish_non_exhaustive()
	}
}

/// A single allow rule in the in-memory engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
	pub subject: String,
	pub object: String,
	pub action: String,
	#[serde(default = "wildcard")]
	pub domain: String,
}

fn wildcard() -> String {
	WILDCARD.to_string()
}

impl PolicyRule {
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

	/// Returns true if this rule grants `tuple`.
	///
	/// A `*` rule field matches anything. A `*` request domain matches any
	/// rule domain. The requested actions must all be listed by the rule.
	pub fn matches(&self, tuple: &CanonicalTuple) -> bool {
		field_matches(&self.subject, &tuple.subject)
			&& field_matches(&self.object, &tuple.object)
			&& action_matches(&self.action, &tuple.action)
			&& (tuple.domain == WILDCARD || field_matches(&self.domain, &tuple.domain))
	}
}

fn field_matches(rule: &str, requested: &str) -> bool {
	rule == WILDCARD || rule == requested
}

fn action_matches(rule: &str, requested: &str) -> bool {
	if rule == WILDCARD {
		return true;
	}
	if requested == WILDCARD {
		return false;
	}
	let granted: Vec<&str> = rule.split(ACTION_SEPARATOR).collect();
	requested
		.split(ACTION_SEPARATOR)
		.all(|act| granted.contains(&act))
}

/// In-memory allow-list engine.
#[derive(Debug, Clone, Default)]
pub struct RulePolicyEngine {
	rules: Vec<PolicyRule>,
}

impl RulePolicyEngine {
	pub fn new(rules: Vec<PolicyRule>) -> Self {
		Self { rules }
	}

	pub fn rules(&self) -> &[PolicyRule] {
		&self.rules
	}
}

#[async_trait]
impl PolicyEngine for RulePolicyEngine {
	async fn enforce(&self, tuple: &CanonicalTuple) -> Result<bool, EngineError> {
		Ok(self.rules.iter().any(|rule| rule.matches(tuple)))
	}
}
