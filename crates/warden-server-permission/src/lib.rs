// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Permission decisions for Warden.
//!
//! Given a [`PermissionRequest`] (user, object, sub-resource, actions and an
//! optional domain), [`PermissionService`] selects a [`PermissionChecker`] from
//! the [`StrategyRegistry`] and runs its pipeline:
//!
//! 1. **Domain lock gate**: writes into a locked domain are rejected
//! 2. **Root bypass**: superusers are permitted without rule evaluation
//! 3. **Canonicalize**: the request becomes a [`CanonicalTuple`]
//! 4. **Enforce**: the tuple is evaluated by the external [`PolicyEngine`]
//!
//! Engine faults fail closed. The rule engine, root lookup and lock store are
//! collaborators behind traits; in-memory implementations are provided for
//! configuration-driven deployments and tests.

pub mod canonical;
pub mod checker;
pub mod engine;
pub mod error;
pub mod lock;
pub mod registry;
pub mod request;
pub mod root;
pub mod service;

pub use canonical::{CanonicalTuple, Canonicalizer};
pub use checker::{CheckContext, DefaultChecker, PermissionChecker, PodTerminalChecker};
pub use engine::{PolicyEngine, PolicyEnforcer, PolicyRule, RulePolicyEngine};
pub use error::{EngineError, LockError, PermissionError, PermissionResult, MSG_NO_PERMISSION};
pub use lock::{DomainLockLookup, InMemoryDomainLocks};
pub use registry::{StrategyRegistry, StrategyRegistryBuilder};
pub use request::PermissionRequest;
pub use root::{RootUserLookup, StaticRootUsers};
pub use service::PermissionService;
pub use tokio_util::sync::CancellationToken;
