// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Wiring from resolved configuration to a [`PermissionService`].

use std::sync::Arc;

use warden_server_config::ServerConfig;
use warden_server_permission::{
	Canonicalizer, CheckContext, InMemoryDomainLocks, PermissionService, PolicyEnforcer,
	RulePolicyEngine, StaticRootUsers, StrategyRegistry,
};

pub fn build_service(config: &ServerConfig) -> PermissionService {
	let engine = RulePolicyEngine::new(config.policy.rules.clone());
	let locks = InMemoryDomainLocks::with_locked(
		config
			.policy
			.locked_domains
			.iter()
			.map(|d| (d.domain_type.clone(), d.domain_id.clone())),
	);

	let ctx = CheckContext::new(
		Canonicalizer::new(config.permission.permitted_object_types.iter().cloned()),
		PolicyEnforcer::new(Arc::new(engine)),
		Arc::new(StaticRootUsers::new(
			config.permission.root_user_ids.iter().copied(),
		)),
		Arc::new(locks),
	)
	.with_pod_terminal_domain_type(config.permission.pod_terminal_domain_type.clone());

	PermissionService::new(StrategyRegistry::builtin(), ctx)
}
