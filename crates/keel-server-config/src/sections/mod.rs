// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections. Each section has a resolved `*Config` type and a
//! partial `*ConfigLayer` that sources produce and merge.

mod authz;
mod database;
mod logging;

pub use authz::{AuthzConfig, AuthzConfigLayer};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
