// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Commands that run the authorizer against a live database.

use std::fmt::Write;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use keel_server_auth::{
	Action, AuthContext, Authorizer, AuthzError, OperationDescriptor, OrgId, PolicyEngine,
	ScopeResolver,
};
use keel_server_config::{AuthzConfig, DatabaseConfig};
use keel_server_db::{
	create_pool, run_migrations, OrgRepository, SqliteAuditRecorder, SqliteResourceLookup,
	UserRepository,
};
use sqlx::SqlitePool;
use uuid::Uuid;

pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool> {
	let pool = create_pool(&config.url).await?;
	run_migrations(&pool).await?;
	Ok(pool)
}

/// Authorizer wired to the database with the configured policy.
pub fn authorizer(pool: &SqlitePool, config: &AuthzConfig) -> Authorizer {
	let resolver = ScopeResolver::new(Arc::new(OrgRepository::new(pool.clone())))
		.with_depth(config.scope_depth);
	Authorizer::new(
		PolicyEngine::new(config.role_permissions.clone()),
		resolver,
		Arc::new(SqliteAuditRecorder::new(pool.clone())),
	)
	.with_audit_reads(config.audit_reads)
}

pub async fn scope(pool: &SqlitePool, config: &AuthzConfig, org: OrgId) -> Result<String> {
	let orgs = OrgRepository::new(pool.clone());
	if orgs.get(org).await?.is_none() {
		bail!("organization {org} not found");
	}

	let accessible = authorizer(pool, config)
		.resolver()
		.accessible_organizations(org)
		.await?;

	let mut out = String::new();
	for id in accessible.iter() {
		let name = orgs
			.get(id)
			.await?
			.map(|o| o.name)
			.unwrap_or_else(|| "?".to_string());
		let marker = if id == accessible.home() { " (home)" } else { "" };
		let _ = writeln!(out, "{id}  {name}{marker}");
	}
	Ok(out)
}

#[derive(Debug)]
pub struct CheckRequest<'a> {
	pub operation: &'static OperationDescriptor,
	pub email: &'a str,
	pub resource: Option<Uuid>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Verdict {
	Allow(String),
	Deny(String),
}

/// Authorizes `request` as the user registered under `request.email`.
pub async fn check(pool: &SqlitePool, config: &AuthzConfig, request: CheckRequest<'_>) -> Result<Verdict> {
	let op = request.operation;
	let user = UserRepository::new(pool.clone())
		.get_by_email(request.email)
		.await?
		.ok_or_else(|| anyhow!("no user with email {}", request.email))?;
	let ctx = AuthContext::authenticated(user.principal());
	let authorizer = authorizer(pool, config);

	let outcome = if let Some(id) = request.resource {
		let lookup = SqliteResourceLookup::new(pool.clone());
		authorizer
			.authorize_resource(&ctx, op, id, &lookup)
			.await
			.map(|snapshot| format!("allow {} {}", snapshot.kind, snapshot.id))
	} else if op.is_resource_scoped() {
		bail!("{} acts on a single resource; pass --resource", op.name());
	} else if op.action() == Action::List {
		authorizer
			.authorize_listing(&ctx, op)
			.await
			.map(|filter| match filter {
				Some(filter) => format!(
					"allow {} across {} organization(s){}",
					op.name(),
					filter.org_ids.len(),
					if filter.assignee.is_some() { " plus assigned tasks" } else { "" }
				),
				None => format!("allow {} (public, unfiltered)", op.name()),
			})
	} else {
		authorizer
			.authorize(&ctx, op)
			.map(|()| format!("allow {}", op.name()))
	};

	match outcome {
		Ok(message) => Ok(Verdict::Allow(message)),
		Err(AuthzError::Lookup(e)) => Err(e.into()),
		Err(e) => Ok(Verdict::Deny(format!("deny ({}) {e}", e.status_code()))),
	}
}

/// Recent audit entries, optionally for one user.
pub async fn audit(pool: &SqlitePool, email: Option<&str>) -> Result<String> {
	let recorder = SqliteAuditRecorder::new(pool.clone());
	let entries = match email {
		Some(email) => {
			let user = UserRepository::new(pool.clone())
				.get_by_email(email)
				.await?
				.ok_or_else(|| anyhow!("no user with email {email}"))?;
			recorder.list_by_user(user.id).await?
		}
		None => recorder.list_recent().await?,
	};

	let mut out = String::new();
	for entry in entries {
		let _ = writeln!(out, "{}  {entry}", entry.timestamp.to_rfc3339());
	}
	Ok(out)
}
