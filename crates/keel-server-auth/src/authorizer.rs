// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request-level authorization.
//!
//! [`Authorizer`] wires the [`PolicyEngine`] to its collaborators and fixes the
//! order of checks for a request:
//!
//! 1. identity, role and permission gates
//! 2. resource lookup (a missing resource is `NotFound`)
//! 3. scope resolution for the caller's home organization
//! 4. scope gate and ownership rule
//!
//! A resource outside the caller's scope is therefore reported as forbidden
//! only when it exists.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditLogEntry, AuditRecorder};
use crate::authz::{Action, Decision, OperationDescriptor, PolicyEngine, ResourceKind, ResourceSnapshot};
use crate::error::{AuthzError, LookupError};
use crate::principal::{AuthContext, Principal};
use crate::scope::{AccessibleOrgs, ScopeFilter, ScopeResolver};

/// Loads the access-relevant fields of a resource instance.
#[async_trait]
pub trait ResourceLookup: Send + Sync {
	/// Returns `Ok(None)` if no resource of `kind` has `id`.
	async fn find_resource(
		&self,
		kind: ResourceKind,
		id: Uuid,
	) -> Result<Option<ResourceSnapshot>, LookupError>;
}

#[derive(Clone)]
pub struct Authorizer {
	engine: PolicyEngine,
	resolver: ScopeResolver,
	recorder: Arc<dyn AuditRecorder>,
	audit_reads: bool,
}

impl Authorizer {
	pub fn new(engine: PolicyEngine, resolver: ScopeResolver, recorder: Arc<dyn AuditRecorder>) -> Self {
		Self {
			engine,
			resolver,
			recorder,
			audit_reads: true,
		}
	}

	/// Whether allowed single-resource reads are written to the audit trail.
	pub fn with_audit_reads(mut self, enabled: bool) -> Self {
		self.audit_reads = enabled;
		self
	}

	pub fn engine(&self) -> &PolicyEngine {
		&self.engine
	}

	pub fn resolver(&self) -> &ScopeResolver {
		&self.resolver
	}

	/// Checks an operation that does not target a single resource.
	#[instrument(level = "debug", skip(self, ctx), fields(operation = op.name()))]
	pub fn authorize(&self, ctx: &AuthContext, op: &OperationDescriptor) -> Result<(), AuthzError> {
		let principal = ctx.principal();
		let decision = self.engine.check_operation(principal, op);
		self.finish(principal, op, decision)
	}

	/// Checks a resource-scoped operation on resource `id` and returns its snapshot.
	#[instrument(level = "debug", skip(self, ctx, lookup), fields(operation = op.name(), resource_id = %id))]
	pub async fn authorize_resource(
		&self,
		ctx: &AuthContext,
		op: &OperationDescriptor,
		id: Uuid,
		lookup: &dyn ResourceLookup,
	) -> Result<ResourceSnapshot, AuthzError> {
		let principal = ctx.principal();
		self.finish(principal, op, self.engine.check_operation(principal, op))?;

		let principal = principal.ok_or(AuthzError::Unauthenticated)?;

		let resource = lookup
			.find_resource(op.resource(), id)
			.await?
			.ok_or(AuthzError::NotFound {
				kind: op.resource(),
				id,
			})?;

		// Unscoped operations only need the resource to exist.
		if op.is_resource_scoped() {
			let accessible = self
				.resolver
				.accessible_organizations(principal.organization_id)
				.await?;

			let decision = self.engine.check_resource(principal, op, &resource, &accessible);
			self.finish(Some(principal), op, decision)?;
		}

		if self.audit_reads && op.action() == Action::Read {
			self.record_action(principal, AuditAction::Read, &resource, None).await;
		}

		Ok(resource)
	}

	/// Checks a collection read and returns the row filter for the listing.
	///
	/// Public operations return `None`: their rows are not filtered and no
	/// identity is required. Audit listings cover the home organization only.
	pub async fn authorize_listing(
		&self,
		ctx: &AuthContext,
		op: &OperationDescriptor,
	) -> Result<Option<ScopeFilter>, AuthzError> {
		self.authorize(ctx, op)?;
		if op.is_public() {
			return Ok(None);
		}
		let principal = ctx.principal().ok_or(AuthzError::Unauthenticated)?;

		let filter = match op.resource() {
			ResourceKind::Task => self.resolver.task_filter(principal).await?,
			ResourceKind::AuditLog => {
				ScopeFilter::for_users(&AccessibleOrgs::home_only(principal.organization_id))
			}
			ResourceKind::User | ResourceKind::Organization => self.resolver.user_filter(principal).await?,
		};
		Ok(Some(filter))
	}

	/// Records a completed action on `resource`. Failures are logged, not returned.
	pub async fn record_action(
		&self,
		principal: &Principal,
		action: AuditAction,
		resource: &ResourceSnapshot,
		details: Option<String>,
	) {
		let mut builder =
			AuditLogEntry::builder(principal, action, resource.kind.as_str()).resource_id(resource.id);
		if let Some(details) = details {
			builder = builder.details(details);
		}
		self.record(builder.build()).await;
	}

	/// Records a sign-in by `principal`.
	pub async fn record_login(&self, principal: &Principal, ip_address: Option<String>) {
		let mut builder = AuditLogEntry::builder(principal, AuditAction::Login, "auth")
			.details(format!("User {} logged in", principal.email));
		if let Some(ip) = ip_address {
			builder = builder.ip_address(ip);
		}
		self.record(builder.build()).await;
	}

	pub async fn record_logout(&self, principal: &Principal) {
		let entry = AuditLogEntry::builder(principal, AuditAction::Logout, "auth").build();
		self.record(entry).await;
	}

	async fn record(&self, entry: AuditLogEntry) {
		if let Err(e) = self.recorder.record(&entry).await {
			tracing::warn!(
				recorder = self.recorder.name(),
				audit_id = %entry.id,
				error = %e,
				"failed to record audit entry"
			);
		}
	}

	fn finish(
		&self,
		principal: Option<&Principal>,
		op: &OperationDescriptor,
		decision: Decision,
	) -> Result<(), AuthzError> {
		match decision {
			Decision::Allow => Ok(()),
			Decision::Deny(reason) => {
				tracing::info!(
					operation = op.name(),
					user_id = principal.map(|p| tracing::field::display(p.subject_id)),
					role = principal.map(|p| p.role.as_str()),
					reason = %reason,
					"access_denied"
				);
				Err(reason.into())
			}
		}
	}
}
