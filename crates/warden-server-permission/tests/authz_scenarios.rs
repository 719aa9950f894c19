// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! End-to-end decision scenarios through `PermissionService`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use warden_server_permission::{
	CanonicalTuple, CancellationToken, DomainLockLookup, EngineError, InMemoryDomainLocks, LockError,
	PermissionError, PermissionRequest, PermissionService, PolicyEngine, PolicyRule,
	RootUserLookup, RulePolicyEngine, StaticRootUsers,
};

struct CountingEngine {
	inner: RulePolicyEngine,
	calls: AtomicUsize,
}

impl CountingEngine {
	fn new(rules: Vec<PolicyRule>) -> Arc<Self> {
		Arc::new(Self {
			inner: RulePolicyEngine::new(rules),
			calls: AtomicUsize::new(0),
		})
	}

	fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}

#[async_trait]
impl PolicyEngine for CountingEngine {
	async fn enforce(&self, tuple: &CanonicalTuple) -> Result<bool, EngineError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.inner.enforce(tuple).await
	}
}

/// Lock gate that reports every domain as locked for writes.
struct AlwaysLocked;

#[async_trait]
impl DomainLockLookup for AlwaysLocked {
	async fn is_locked(
		&self,
		_domain_type: &str,
		_domain_id: &str,
		acts: &[String],
	) -> Result<bool, LockError> {
		Ok(warden_server_permission::lock::has_write_act(acts))
	}
}

/// Root lookup that never answers, used to exercise cancellation.
struct HangingRoots;

#[async_trait]
impl RootUserLookup for HangingRoots {
	async fn is_root(&self, _user_id: i64) -> bool {
		tokio::time::sleep(Duration::from_secs(3600)).await;
		false
	}
}

struct TestApp {
	engine: Arc<CountingEngine>,
	service: PermissionService,
}

impl TestApp {
	fn new(rules: Vec<PolicyRule>, roots: &[i64]) -> Self {
		Self::with_locks(rules, roots, Arc::new(InMemoryDomainLocks::new()))
	}

	fn with_locks(rules: Vec<PolicyRule>, roots: &[i64], locks: Arc<dyn DomainLockLookup>) -> Self {
		let engine = CountingEngine::new(rules);
		let service = PermissionService::with_collaborators(
			engine.clone(),
			Arc::new(StaticRootUsers::new(roots.iter().copied())),
			locks,
		);
		Self { engine, service }
	}
}

fn select_t1(user_id: i64) -> PermissionRequest {
	PermissionRequest::new(user_id, "table", "T1", "read").with_acts(["select"])
}

fn allow_user7_select_t1() -> PolicyRule {
	PolicyRule::new("user:7", "table:T1:sub:read", "select", "*")
}

#[tokio::test]
async fn generic_allow() {
	let app = TestApp::new(vec![allow_user7_select_t1()], &[]);

	assert_eq!(app.service.check(&select_t1(7)).await, Ok(()));
	assert_eq!(app.engine.calls(), 1);
}

#[tokio::test]
async fn generic_deny() {
	let app = TestApp::new(vec![], &[]);

	let err = app.service.check(&select_t1(7)).await.unwrap_err();
	assert_eq!(err, PermissionError::PermissionDenied);
	assert_eq!(err.to_string(), "no permission");
}

#[tokio::test]
async fn root_is_permitted_even_when_rules_deny() {
	let app = TestApp::new(vec![], &[1]);

	assert_eq!(app.service.check(&select_t1(1)).await, Ok(()));
	assert_eq!(app.engine.calls(), 0, "root bypass skips policy evaluation");
}

#[tokio::test]
async fn locked_domain_blocks_write_before_policy_lookup() {
	let app = TestApp::with_locks(
		vec![PolicyRule::new("*", "*", "*", "*")],
		&[],
		Arc::new(AlwaysLocked),
	);
	let req = PermissionRequest::new(7, "table", "T1", "read")
		.with_acts(["write"])
		.with_domain("env", "prod");

	assert_eq!(
		app.service.check(&req).await,
		Err(PermissionError::DomainLocked {
			domain: "env:prod".to_string()
		})
	);
	assert_eq!(app.engine.calls(), 0, "policy engine must not be invoked");
}

#[tokio::test]
async fn locked_domain_still_allows_reads() {
	let app = TestApp::with_locks(
		vec![PolicyRule::new("user:7", "table:T1:sub:read", "select", "env:prod")],
		&[],
		Arc::new(AlwaysLocked),
	);
	let req = select_t1(7).with_domain("env", "prod");

	assert_eq!(app.service.check(&req).await, Ok(()));
}

#[tokio::test]
async fn locked_domain_blocks_requests_without_acts() {
	let app = TestApp::with_locks(
		vec![PolicyRule::new("user:7", "table:T1:sub:read", "*", "env:prod")],
		&[],
		Arc::new(InMemoryDomainLocks::with_locked([("env", "prod")])),
	);
	let any_act = PermissionRequest::new(7, "table", "T1", "read").with_domain("env", "prod");
	let upper_write = any_act.clone().with_acts(["WRITE"]);
	let locked = Err(PermissionError::DomainLocked {
		domain: "env:prod".to_string(),
	});

	assert_eq!(app.service.check(&any_act).await, locked);
	assert_eq!(app.service.check(&upper_write).await, locked);
	assert_eq!(app.engine.calls(), 0);
}

#[tokio::test]
async fn missing_sub_resource_is_invalid() {
	let app = TestApp::new(vec![PolicyRule::new("*", "*", "*", "*")], &[]);
	let req = PermissionRequest::new(7, "table", "T1", "").with_acts(["select"]);

	assert!(matches!(
		app.service.check(&req).await,
		Err(PermissionError::Validation(_))
	));
	assert_eq!(app.engine.calls(), 0);
}

#[tokio::test]
async fn unknown_object_type_is_invalid() {
	let app = TestApp::new(vec![PolicyRule::new("*", "*", "*", "*")], &[]);
	let req = PermissionRequest::new(7, "unknown-type", "x", "read");

	assert!(matches!(
		app.service.check(&req).await,
		Err(PermissionError::Validation(_))
	));
}

#[tokio::test]
async fn anonymous_user_is_invalid_even_for_routes() {
	let app = TestApp::new(vec![], &[]);
	let req = PermissionRequest::new(0, "route", "/", "view");

	assert!(matches!(
		app.service.check(&req).await,
		Err(PermissionError::Validation(_))
	));
}

#[tokio::test]
async fn repeated_checks_are_idempotent() {
	let app = TestApp::new(vec![allow_user7_select_t1()], &[]);
	let req = select_t1(7);

	assert_eq!(app.service.check(&req).await, Ok(()));
	assert_eq!(app.service.check(&req).await, Ok(()));
}

#[tokio::test]
async fn pod_terminal_scoped_to_env() {
	let app = TestApp::new(
		vec![PolicyRule::new(
			"user:7",
			"table:T1:sub:pod-terminal",
			"exec",
			"env:prod",
		)],
		&[],
	);
	let allowed = PermissionRequest::new(7, "table", "T1", "pod-terminal")
		.with_acts(["exec"])
		.with_domain("env", "prod");
	let other_env = allowed.clone().with_domain("env", "dev");

	assert_eq!(app.service.check(&allowed).await, Ok(()));
	assert_eq!(
		app.service.check(&other_env).await,
		Err(PermissionError::PermissionDenied)
	);
}

#[tokio::test]
async fn cancellation_aborts_pending_collaborator_call() {
	let engine = CountingEngine::new(vec![PolicyRule::new("*", "*", "*", "*")]);
	let service = PermissionService::with_collaborators(
		engine.clone(),
		Arc::new(HangingRoots),
		Arc::new(InMemoryDomainLocks::new()),
	);
	let cancel = CancellationToken::new();
	let trigger = cancel.clone();
	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_millis(20)).await;
		trigger.cancel();
	});

	let result = service.check_with_cancel(&select_t1(7), &cancel).await;

	assert_eq!(result, Err(PermissionError::Canceled));
	assert_eq!(engine.calls(), 0);
}
