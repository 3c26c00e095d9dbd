// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Authorization for Keel.
//!
//! Users hold one of three ranked roles in a home organization. Roles grant
//! permissions through a fixed table, organizations form a tree, and a user
//! may act on resources in their home organization and its children. Task
//! writes add ownership rules on top.
//!
//! The pure decision logic lives in [`authz`]. [`Authorizer`] combines it with
//! scope resolution, resource lookup and the audit trail for request handlers.

pub mod audit;
pub mod authorizer;
pub mod authz;
pub mod error;
pub mod org;
pub mod permission;
pub mod principal;
pub mod role;
pub mod scope;
pub mod types;

pub use audit::{
	AuditAction, AuditError, AuditLogBuilder, AuditLogEntry, AuditRecorder, MemoryAuditRecorder,
	TracingAuditRecorder, AUDIT_LIST_LIMIT,
};
pub use authorizer::{Authorizer, ResourceLookup};
pub use authz::{
	operations, Action, Decision, DenyReason, OperationDescriptor, PolicyEngine, ResourceKind,
	ResourceSnapshot,
};
pub use error::{AuthzError, LookupError};
pub use org::{OrgHierarchy, OrgTree, OrgTreeError, Organization};
pub use permission::{
	has_all_permissions, has_permission, permissions_of, Permission, PermissionParseError,
	PermissionSet, RolePermissionMap, RolePermissionMapBuilder,
};
pub use principal::{AuthContext, AuthRequired, Principal};
pub use role::{Role, RoleParseError};
pub use scope::{AccessibleOrgs, ScopeDepth, ScopeFilter, ScopeResolver};
pub use types::{AuditLogId, OrgId, TaskId, UserId};
