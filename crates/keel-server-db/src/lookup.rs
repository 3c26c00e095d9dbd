// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use keel_server_auth::{
	AuditLogId, LookupError, OrgId, ResourceKind, ResourceLookup, ResourceSnapshot, TaskId, UserId,
};
use sqlx::sqlite::SqlitePool;
use uuid::Uuid;

use crate::convert::parse_id;
use crate::error::DbError;
use crate::org::OrgRepository;
use crate::task::TaskRepository;
use crate::user::UserRepository;

/// Resolves resource snapshots from the database for any [`ResourceKind`].
#[derive(Clone)]
pub struct SqliteResourceLookup {
	pool: SqlitePool,
	tasks: TaskRepository,
	users: UserRepository,
	orgs: OrgRepository,
}

impl SqliteResourceLookup {
	pub fn new(pool: SqlitePool) -> Self {
		Self {
			tasks: TaskRepository::new(pool.clone()),
			users: UserRepository::new(pool.clone()),
			orgs: OrgRepository::new(pool.clone()),
			pool,
		}
	}

	/// Audit entries are scoped to the organization of the user who acted.
	async fn audit_log_snapshot(&self, id: AuditLogId) -> Result<Option<ResourceSnapshot>, DbError> {
		let org: Option<String> = sqlx::query_scalar(
			r#"
			SELECT u.organization_id
			FROM audit_logs a
			JOIN users u ON u.id = a.user_id
			WHERE a.id = ?
			"#,
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		org
			.map(|o| parse_id::<OrgId>(&o, "organization_id").map(|org| ResourceSnapshot::audit_log(id, org)))
			.transpose()
	}
}

#[async_trait]
impl ResourceLookup for SqliteResourceLookup {
	#[tracing::instrument(skip(self), fields(kind = %kind, id = %id))]
	async fn find_resource(
		&self,
		kind: ResourceKind,
		id: Uuid,
	) -> Result<Option<ResourceSnapshot>, LookupError> {
		let snapshot = match kind {
			ResourceKind::Task => self.tasks.get(TaskId::new(id)).await?.map(|t| t.snapshot()),
			ResourceKind::User => self.users.get(UserId::new(id)).await?.map(|u| u.snapshot()),
			ResourceKind::Organization => self
				.orgs
				.get(OrgId::new(id))
				.await?
				.map(|o| ResourceSnapshot::organization(o.id)),
			ResourceKind::AuditLog => self.audit_log_snapshot(AuditLogId::new(id)).await?,
		};
		Ok(snapshot)
	}
}
