// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Root user lookup for the superuser bypass.

use std::collections::HashSet;

use async_trait::async_trait;

/// External query deciding whether a user is a superuser.
#[async_trait]
pub trait RootUserLookup: Send + Sync {
	/// Must return false for `user_id <= 0`.
	async fn is_root(&self, user_id: i64) -> bool;
}

/// Fixed set of root user ids, usually taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticRootUsers {
	ids: HashSet<i64>,
}

impl StaticRootUsers {
	pub fn new(ids: impl IntoIterator<Item = i64>) -> Self {
		Self {
			ids: ids.into_iter().filter(|id| *id > 0).collect(),
		}
	}
}

#[async_trait]
impl RootUserLookup for StaticRootUsers {
	async fn is_root(&self, user_id: i64) -> bool {
		user_id > 0 && self.ids.contains(&user_id)
	}
}
