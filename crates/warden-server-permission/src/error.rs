// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

use thiserror::Error;

/// Message returned to callers when policy evaluation denies a request.
pub const MSG_NO_PERMISSION: &str = "no permission";

pub type PermissionResult<T> = Result<T, PermissionError>;

/// Outcome of a permission check that did not end in a grant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PermissionError {
	/// The request is malformed or incomplete. A caller bug, not a security event.
	#[error("invalid permission request: {0}")]
	Validation(String),

	#[error("domain {domain} is locked for write operations")]
	DomainLocked { domain: String },

	#[error("{}", MSG_NO_PERMISSION)]
	PermissionDenied,

	#[error("policy engine error: {0}")]
	Engine(#[from] EngineError),

	#[error("permission check was canceled")]
	Canceled,
}

impl PermissionError {
	/// Returns true if the error is a verdict against the subject rather than
	/// an input or processing failure.
	pub fn is_denial(&self) -> bool {
		matches!(
			self,
			PermissionError::DomainLocked { .. } | PermissionError::PermissionDenied
		)
	}
}

/// Failures reported by the rule store behind the policy engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
	/// A single candidate rule shape could not be evaluated.
	#[error("candidate evaluation failed: {0}")]
	Candidate(String),

	/// The rule store could not be queried at all.
	#[error("policy engine unavailable: {0}")]
	Unavailable(String),
}

impl EngineError {
	/// Engine-wide failures halt any-of evaluation; candidate failures do not.
	pub fn is_fatal(&self) -> bool {
		matches!(self, EngineError::Unavailable(_))
	}
}

/// The domain lock store could not be queried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("domain lock lookup failed: {0}")]
pub struct LockError(pub String);
