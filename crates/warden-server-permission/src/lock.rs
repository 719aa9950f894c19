// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Domain lock gate.
//!
//! An administratively locked domain rejects write-class actions from every
//! subject, root included. The lock state lives outside the decision pipeline
//! and is queried through [`DomainLockLookup`].

use std::collections::HashSet;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::info;

use crate::canonical::WILDCARD;
use crate::error::LockError;

/// Actions that count as writes for the lock gate.
pub const WRITE_ACTS: &[&str] = &["write", "edit", "create", "update", "delete"];

/// Returns true if the requested actions may write.
///
/// An empty action set means any action, so it counts as a write, as does a
/// wildcard act. Matching ignores ASCII case.
pub fn has_write_act(acts: &[String]) -> bool {
	if acts.is_empty() {
		return true;
	}
	acts.iter().any(|act| {
		act.as_str() == WILDCARD || WRITE_ACTS.iter().any(|write| write.eq_ignore_ascii_case(act))
	})
}

/// External query for domain lock state.
#[async_trait]
pub trait DomainLockLookup: Send + Sync {
	/// Returns true only when `requested_acts` contains a write-class action
	/// and the domain is locked.
	async fn is_locked(
		&self,
		domain_type: &str,
		domain_id: &str,
		requested_acts: &[String],
	) -> Result<bool, LockError>;
}

/// Lock store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryDomainLocks {
	locked: RwLock<HashSet<(String, String)>>,
}

impl InMemoryDomainLocks {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a store with the given `(type, id)` domains already locked.
	pub fn with_locked<I, S>(domains: I) -> Self
	where
		I: IntoIterator<Item = (S, S)>,
		S: Into<String>,
	{
		let locked = domains
			.into_iter()
			.map(|(domain_type, domain_id)| (domain_type.into(), domain_id.into()))
			.collect();
		Self {
			locked: RwLock::new(locked),
		}
	}

	pub fn lock(&self, domain_type: &str, domain_id: &str) -> Result<(), LockError> {
		let mut locked = self.locked.write().map_err(|e| LockError(e.to_string()))?;
		if locked.insert((domain_type.to_string(), domain_id.to_string())) {
			info!(domain_type, domain_id, "domain locked");
		}
		Ok(())
	}

	pub fn unlock(&self, domain_type: &str, domain_id: &str) -> Result<(), LockError> {
		let mut locked = self.locked.write().map_err(|e| LockError(e.to_string()))?;
		if locked.remove(&(domain_type.to_string(), domain_id.to_string())) {
			info!(domain_type, domain_id, "domain unlocked");
		}
		Ok(())
	}
}

#[async_trait]
impl DomainLockLookup for InMemoryDomainLocks {
	async fn is_locked(
		&self,
		domain_type: &str,
		domain_id: &str,
		requested_acts: &[String],
	) -> Result<bool, LockError> {
		if !has_write_act(requested_acts) {
			return Ok(false);
		}
		let locked = self.locked.read().map_err(|e| LockError(e.to_string()))?;
		Ok(locked.contains(&(domain_type.to_string(), domain_id.to_string())))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn acts(list: &[&str]) -> Vec<String> {
		list.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn write_class_detection() {
		assert!(has_write_act(&acts(&["select", "delete"])));
		assert!(!has_write_act(&acts(&["select", "view"])));
	}

	#[test]
	fn unscoped_and_mixed_case_acts_count_as_writes() {
		assert!(has_write_act(&[]));
		assert!(has_write_act(&acts(&["*"])));
		assert!(has_write_act(&acts(&["WRITE"])));
		assert!(has_write_act(&acts(&["select", "Delete"])));
	}

	#[tokio::test]
	async fn locked_domain_blocks_writes_only() {
		let locks = InMemoryDomainLocks::with_locked([("env", "prod")]);

		assert!(locks.is_locked("env", "prod", &acts(&["write"])).await.unwrap());
		assert!(!locks.is_locked("env", "prod", &acts(&["select"])).await.unwrap());
		assert!(!locks.is_locked("env", "dev", &acts(&["write"])).await.unwrap());
	}

	#[tokio::test]
	async fn locked_domain_blocks_requests_without_acts() {
		let locks = InMemoryDomainLocks::with_locked([("env", "prod")]);

		assert!(locks.is_locked("env", "prod", &[]).await.unwrap());
		assert!(locks.is_locked("env", "prod", &acts(&["UPDATE"])).await.unwrap());
	}

	#[tokio::test]
	async fn lock_and_unlock_toggle_state() {
		let locks = InMemoryDomainLocks::new();
		let write = acts(&["edit"]);

		locks.lock("env", "staging").unwrap();
		assert!(locks.is_locked("env", "staging", &write).await.unwrap());

		locks.unlock("env", "staging").unwrap();
		assert!(!locks.is_locked("env", "staging", &write).await.unwrap());
	}
}
