// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

mod logging;
mod permission;
mod policy;

pub use logging::{LogFormat, LoggingConfig, LoggingConfigLayer};
pub use permission::{PermissionConfig, PermissionConfigLayer};
pub use policy::{LockedDomain, PolicyConfig, PolicyConfigLayer};
