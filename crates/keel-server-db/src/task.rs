// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Task repository.
//!
//! A task belongs to the organization of the user who created it. Listings
//! and statistics take a [`ScopeFilter`] so a query returns exactly the rows
//! the scope gate would admit: tasks in an accessible organization, plus tasks
//! assigned to the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keel_server_auth::{OrgId, Principal, ResourceSnapshot, ScopeFilter, TaskId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePool, QueryBuilder, Row, Sqlite};

use crate::convert::{parse_enum, parse_id, parse_opt_id, parse_timestamp};
use crate::error::DbError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {field} '{value}'")]
pub struct ParseTaskFieldError {
	pub field: &'static str,
	pub value: String,
}

macro_rules! task_field_enum {
	($name:ident, $field:literal, { $($variant:ident => $s:literal),+ $(,)? }) => {
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
		#[serde(rename_all = "snake_case")]
		pub enum $name {
			$($variant),+
		}

		impl $name {
			pub fn all() -> &'static [$name] {
				&[$($name::$variant),+]
			}

			pub fn as_str(self) -> &'static str {
				match self {
					$($name::$variant => $s),+
				}
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}

		impl FromStr for $name {
			type Err = ParseTaskFieldError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($s => Ok($name::$variant),)+
					other => Err(ParseTaskFieldError {
						field: $field,
						value: other.to_string(),
					}),
				}
			}
		}
	};
}

task_field_enum!(TaskStatus, "status", {
	Todo => "todo",
	InProgress => "in_progress",
	Done => "done",
});

task_field_enum!(TaskPriority, "priority", {
	Low => "low",
	Medium => "medium",
	High => "high",
});

task_field_enum!(TaskCategory, "category", {
	Work => "work",
	Personal => "personal",
	Urgent => "urgent",
	Other => "other",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
	pub id: TaskId,
	pub title: String,
	pub description: Option<String>,
	pub status: TaskStatus,
	pub priority: TaskPriority,
	pub category: TaskCategory,
	pub due_date: Option<DateTime<Utc>>,
	pub order: i64,
	pub created_by_id: UserId,
	pub assignee_id: Option<UserId>,
	pub organization_id: OrgId,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl Task {
	pub fn snapshot(&self) -> ResourceSnapshot {
		let snapshot = ResourceSnapshot::task(self.id, self.organization_id, self.created_by_id);
		match self.assignee_id {
			Some(assignee) => snapshot.with_assignee(assignee),
			None => snapshot,
		}
	}
}

#[derive(Debug, Clone)]
pub struct NewTask {
	pub title: String,
	pub description: Option<String>,
	pub status: TaskStatus,
	pub priority: TaskPriority,
	pub category: TaskCategory,
	pub due_date: Option<DateTime<Utc>>,
	pub assignee_id: Option<UserId>,
}

impl NewTask {
	/// A `todo`, `medium` priority `work` task.
	pub fn new(title: impl Into<String>) -> Self {
		Self {
			title: title.into(),
			description: None,
			status: TaskStatus::Todo,
			priority: TaskPriority::Medium,
			category: TaskCategory::Work,
			due_date: None,
			assignee_id: None,
		}
	}
}

/// Partial update. `None` leaves a field unchanged; for nullable columns
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
	pub title: Option<String>,
	pub description: Option<Option<String>>,
	pub status: Option<TaskStatus>,
	pub priority: Option<TaskPriority>,
	pub category: Option<TaskCategory>,
	pub due_date: Option<Option<DateTime<Utc>>>,
	pub assignee_id: Option<Option<UserId>>,
	pub order: Option<i64>,
}

impl TaskUpdate {
	fn apply(self, task: &mut Task) {
		if let Some(title) = self.title {
			task.title = title;
		}
		if let Some(description) = self.description {
			task.description = description;
		}
		if let Some(status) = self.status {
			task.status = status;
		}
		if let Some(priority) = self.priority {
			task.priority = priority;
		}
		if let Some(category) = self.category {
			task.category = category;
		}
		if let Some(due_date) = self.due_date {
			task.due_date = due_date;
		}
		if let Some(assignee_id) = self.assignee_id {
			task.assignee_id = assignee_id;
		}
		if let Some(order) = self.order {
			task.order = order;
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskSortField {
	#[default]
	Order,
	Title,
	Status,
	Priority,
	DueDate,
	CreatedAt,
	UpdatedAt,
}

impl TaskSortField {
	fn column(self) -> &'static str {
		match self {
			TaskSortField::Order => "sort_order",
			TaskSortField::Title => "title",
			TaskSortField::Status => "status",
			TaskSortField::Priority => "priority",
			TaskSortField::DueDate => "due_date",
			TaskSortField::CreatedAt => "created_at",
			TaskSortField::UpdatedAt => "updated_at",
		}
	}
}

/// Optional listing filters applied on top of the scope.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
	pub status: Option<TaskStatus>,
	pub priority: Option<TaskPriority>,
	pub category: Option<TaskCategory>,
	/// Substring matched against title and description.
	pub search: Option<String>,
	pub sort_by: TaskSortField,
	pub descending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
	pub total: u64,
	pub by_status: BTreeMap<String, u64>,
	pub by_priority: BTreeMap<String, u64>,
	pub by_category: BTreeMap<String, u64>,
}

#[async_trait]
pub trait TaskStore: Send + Sync {
	async fn create(&self, creator: &Principal, new_task: NewTask) -> Result<Task, DbError>;
	async fn get(&self, id: TaskId) -> Result<Option<Task>, DbError>;
	async fn list(&self, scope: &ScopeFilter, filter: &TaskFilter) -> Result<Vec<Task>, DbError>;
	async fn stats(&self, scope: &ScopeFilter) -> Result<TaskStats, DbError>;
	async fn update(&self, id: TaskId, changes: TaskUpdate) -> Result<Task, DbError>;
	async fn delete(&self, id: TaskId) -> Result<bool, DbError>;
}

const TASK_COLUMNS: &str = "id, title, description, status, priority, category, due_date, sort_order, created_by_id, assignee_id, organization_id, created_at, updated_at";

#[derive(Clone)]
pub struct TaskRepository {
	pool: SqlitePool,
}

impl TaskRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create a task in `creator`'s home organization, attributed to `creator`
	/// and placed after the last task of that organization.
	#[tracing::instrument(skip(self, creator, new_task), fields(user_id = %creator.subject_id, org_id = %creator.organization_id))]
	pub async fn create(&self, creator: &Principal, new_task: NewTask) -> Result<Task, DbError> {
		let mut tx = self.pool.begin().await?;

		let max_order: i64 =
			sqlx::query_scalar("SELECT COALESCE(MAX(sort_order), 0) FROM tasks WHERE organization_id = ?")
				.bind(creator.organization_id.to_string())
				.fetch_one(&mut *tx)
				.await?;

		let now = Utc::now();
		let task = Task {
			id: TaskId::generate(),
			title: new_task.title,
			description: new_task.description,
			status: new_task.status,
			priority: new_task.priority,
			category: new_task.category,
			due_date: new_task.due_date,
			order: max_order + 1,
			created_by_id: creator.subject_id,
			assignee_id: new_task.assignee_id,
			organization_id: creator.organization_id,
			created_at: now,
			updated_at: now,
		};

		sqlx::query(
			r#"
			INSERT INTO tasks (id, title, description, status, priority, category, due_date, sort_order,
				created_by_id, assignee_id, organization_id, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(task.id.to_string())
		.bind(&task.title)
		.bind(&task.description)
		.bind(task.status.as_str())
		.bind(task.priority.as_str())
		.bind(task.category.as_str())
		.bind(task.due_date.map(|d| d.to_rfc3339()))
		.bind(task.order)
		.bind(task.created_by_id.to_string())
		.bind(task.assignee_id.map(|a| a.to_string()))
		.bind(task.organization_id.to_string())
		.bind(task.created_at.to_rfc3339())
		.bind(task.updated_at.to_rfc3339())
		.execute(&mut *tx)
		.await?;

		tx.commit().await?;

		tracing::debug!(task_id = %task.id, order = task.order, "task created");
		Ok(task)
	}

	#[tracing::instrument(skip(self), fields(task_id = %id))]
	pub async fn get(&self, id: TaskId) -> Result<Option<Task>, DbError> {
		let row = sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.map(|r| row_to_task(&r)).transpose()
	}

	/// Tasks visible under `scope`, filtered and sorted per `filter`.
	#[tracing::instrument(skip(self, scope, filter), fields(org_count = scope.org_ids.len()))]
	pub async fn list(&self, scope: &ScopeFilter, filter: &TaskFilter) -> Result<Vec<Task>, DbError> {
		let mut qb: QueryBuilder<Sqlite> =
			QueryBuilder::new(format!("SELECT {TASK_COLUMNS} FROM tasks WHERE "));
		push_scope(&mut qb, scope, Some("assignee_id"));

		if let Some(status) = filter.status {
			qb.push(" AND status = ").push_bind(status.as_str());
		}
		if let Some(priority) = filter.priority {
			qb.push(" AND priority = ").push_bind(priority.as_str());
		}
		if let Some(category) = filter.category {
			qb.push(" AND category = ").push_bind(category.as_str());
		}
		if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
			let pattern = format!("%{search}%");
			qb.push(" AND (title LIKE ")
				.push_bind(pattern.clone())
				.push(" OR description LIKE ")
				.push_bind(pattern)
				.push(")");
		}

		qb.push(" ORDER BY ")
			.push(filter.sort_by.column())
			.push(if filter.descending { " DESC" } else { " ASC" })
			.push(", id ASC");

		let rows = qb.build().fetch_all(&self.pool).await?;
		rows.iter().map(row_to_task).collect()
	}

	/// Counts by status, priority and category over the tasks visible under `scope`.
	#[tracing::instrument(skip(self, scope), fields(org_count = scope.org_ids.len()))]
	pub async fn stats(&self, scope: &ScopeFilter) -> Result<TaskStats, DbError> {
		let mut qb: QueryBuilder<Sqlite> =
			QueryBuilder::new("SELECT status, priority, category FROM tasks WHERE ");
		push_scope(&mut qb, scope, Some("assignee_id"));

		let rows = qb.build().fetch_all(&self.pool).await?;

		let mut stats = TaskStats::default();
		for row in &rows {
			stats.total += 1;
			*stats.by_status.entry(row.get("status")).or_insert(0) += 1;
			*stats.by_priority.entry(row.get("priority")).or_insert(0) += 1;
			*stats.by_category.entry(row.get("category")).or_insert(0) += 1;
		}
		Ok(stats)
	}

	/// Apply `changes` and return the updated task.
	///
	/// # Errors
	/// Returns `DbError::NotFound` if the task does not exist.
	#[tracing::instrument(skip(self, changes), fields(task_id = %id))]
	pub async fn update(&self, id: TaskId, changes: TaskUpdate) -> Result<Task, DbError> {
		let mut task = self
			.get(id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("Task {id}")))?;

		changes.apply(&mut task);
		task.updated_at = Utc::now();

		sqlx::query(
			r#"
			UPDATE tasks
			SET title = ?, description = ?, status = ?, priority = ?, category = ?, due_date = ?,
				sort_order = ?, assignee_id = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&task.title)
		.bind(&task.description)
		.bind(task.status.as_str())
		.bind(task.priority.as_str())
		.bind(task.category.as_str())
		.bind(task.due_date.map(|d| d.to_rfc3339()))
		.bind(task.order)
		.bind(task.assignee_id.map(|a| a.to_string()))
		.bind(task.updated_at.to_rfc3339())
		.bind(task.id.to_string())
		.execute(&self.pool)
		.await?;

		tracing::debug!(task_id = %task.id, "task updated");
		Ok(task)
	}

	/// Move a task to `new_order`, optionally changing its status.
	pub async fn reorder(
		&self,
		id: TaskId,
		new_order: i64,
		new_status: Option<TaskStatus>,
	) -> Result<Task, DbError> {
		let changes = TaskUpdate {
			order: Some(new_order),
			status: new_status,
			..TaskUpdate::default()
		};
		self.update(id, changes).await
	}

	#[tracing::instrument(skip(self), fields(task_id = %id))]
	pub async fn delete(&self, id: TaskId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}
}

#[async_trait]
impl TaskStore for TaskRepository {
	async fn create(&self, creator: &Principal, new_task: NewTask) -> Result<Task, DbError> {
		TaskRepository::create(self, creator, new_task).await
	}

	async fn get(&self, id: TaskId) -> Result<Option<Task>, DbError> {
		TaskRepository::get(self, id).await
	}

	async fn list(&self, scope: &ScopeFilter, filter: &TaskFilter) -> Result<Vec<Task>, DbError> {
		TaskRepository::list(self, scope, filter).await
	}

	async fn stats(&self, scope: &ScopeFilter) -> Result<TaskStats, DbError> {
		TaskRepository::stats(self, scope).await
	}

	async fn update(&self, id: TaskId, changes: TaskUpdate) -> Result<Task, DbError> {
		TaskRepository::update(self, id, changes).await
	}

	async fn delete(&self, id: TaskId) -> Result<bool, DbError> {
		TaskRepository::delete(self, id).await
	}
}

/// Appends `(organization_id IN (..) OR <assignee_column> = ?)` for `scope`.
///
/// An empty organization list matches nothing through the organization arm.
pub(crate) fn push_scope(
	qb: &mut QueryBuilder<'_, Sqlite>,
	scope: &ScopeFilter,
	assignee_column: Option<&str>,
) {
	qb.push("(");
	if scope.org_ids.is_empty() {
		qb.push("0");
	} else {
		qb.push("organization_id IN (");
		let mut ids = qb.separated(", ");
		for org_id in &scope.org_ids {
			ids.push_bind(org_id.to_string());
		}
		ids.push_unseparated(")");
	}
	if let (Some(column), Some(assignee)) = (assignee_column, scope.assignee) {
		qb.push(" OR ")
			.push(column)
			.push(" = ")
			.push_bind(assignee.to_string());
	}
	qb.push(")");
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<Task, DbError> {
	let id: String = row.get("id");
	let status: String = row.get("status");
	let priority: String = row.get("priority");
	let category: String = row.get("category");
	let due_date: Option<String> = row.get("due_date");
	let created_by_id: String = row.get("created_by_id");
	let assignee_id: Option<String> = row.get("assignee_id");
	let organization_id: String = row.get("organization_id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(Task {
		id: parse_id(&id, "task id")?,
		title: row.get("title"),
		description: row.get("description"),
		status: parse_enum(&status, "status")?,
		priority: parse_enum(&priority, "priority")?,
		category: parse_enum(&category, "category")?,
		due_date: due_date
			.map(|d| parse_timestamp(&d, "due_date"))
			.transpose()?,
		order: row.get("sort_order"),
		created_by_id: parse_id(&created_by_id, "created_by_id")?,
		assignee_id: parse_opt_id(assignee_id, "assignee_id")?,
		organization_id: parse_id(&organization_id, "organization_id")?,
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_migrated_test_pool, seed_org, seed_user};
	use keel_server_auth::{AccessibleOrgs, Role};

	struct Env {
		repo: TaskRepository,
		parent: OrgId,
		child: OrgId,
		other: OrgId,
		admin: Principal,
		viewer: Principal,
		outsider: Principal,
	}

	async fn env() -> Env {
		let pool = create_migrated_test_pool().await;
		let parent = seed_org(&pool, "Acme", None).await;
		let child = seed_org(&pool, "Tech", Some(parent)).await;
		let other = seed_org(&pool, "Globex", None).await;
		let admin = seed_user(&pool, "admin@acme.test", Role::Admin, parent).await.principal();
		let viewer = seed_user(&pool, "viewer@acme.test", Role::Viewer, child).await.principal();
		let outsider = seed_user(&pool, "owner@globex.test", Role::Owner, other).await.principal();
		Env {
			repo: TaskRepository::new(pool),
			parent,
			child,
			other,
			admin,
			viewer,
			outsider,
		}
	}

	mod field_enums {
		use super::*;

		#[test]
		fn parse_and_display() {
			for status in TaskStatus::all() {
				assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), *status);
			}
			assert_eq!(TaskPriority::High.to_string(), "high");
			let err = "someday".parse::<TaskCategory>().unwrap_err();
			assert_eq!(err.to_string(), "unknown category 'someday'");
		}
	}

	mod create {
		use super::*;

		#[tokio::test]
		async fn order_increments_per_organization() {
			let env = env().await;
			let first = env.repo.create(&env.admin, NewTask::new("one")).await.unwrap();
			let second = env.repo.create(&env.admin, NewTask::new("two")).await.unwrap();
			let elsewhere = env.repo.create(&env.outsider, NewTask::new("three")).await.unwrap();

			assert_eq!(first.order, 1);
			assert_eq!(second.order, 2);
			assert_eq!(elsewhere.order, 1);
		}

		#[tokio::test]
		async fn scoped_to_creator() {
			let env = env().await;
			let task = env.repo.create(&env.viewer, NewTask::new("mine")).await.unwrap();
			assert_eq!(task.organization_id, env.child);
			assert_eq!(task.created_by_id, env.viewer.subject_id);

			let fetched = env.repo.get(task.id).await.unwrap().unwrap();
			assert_eq!(fetched, task);
		}

		#[tokio::test]
		async fn snapshot_carries_assignee() {
			let env = env().await;
			let mut new_task = NewTask::new("assigned");
			new_task.assignee_id = Some(env.viewer.subject_id);
			let task = env.repo.create(&env.admin, new_task).await.unwrap();

			let snapshot = task.snapshot();
			assert_eq!(snapshot.organization_id, env.parent);
			assert_eq!(snapshot.created_by_id, Some(env.admin.subject_id));
			assert_eq!(snapshot.assignee_id, Some(env.viewer.subject_id));
		}
	}

	mod listing {
		use super::*;

		#[tokio::test]
		async fn scope_admits_org_rows_and_assignments() {
			let env = env().await;
			env.repo.create(&env.admin, NewTask::new("parent task")).await.unwrap();
			env.repo.create(&env.viewer, NewTask::new("child task")).await.unwrap();
			let mut assigned = NewTask::new("assigned to viewer");
			assigned.assignee_id = Some(env.viewer.subject_id);
			env.repo.create(&env.outsider, assigned).await.unwrap();
			env.repo.create(&env.outsider, NewTask::new("globex only")).await.unwrap();

			let parent_scope = ScopeFilter::for_tasks(&env.admin, &AccessibleOrgs::from_ids(env.parent, [env.child]));
			let mut titles: Vec<_> = env
				.repo
				.list(&parent_scope, &TaskFilter::default())
				.await
				.unwrap()
				.into_iter()
				.map(|t| t.title)
				.collect();
			titles.sort();
			assert_eq!(titles, vec!["child task", "parent task"]);

			let child_scope = ScopeFilter::for_tasks(&env.viewer, &AccessibleOrgs::home_only(env.child));
			let mut titles: Vec<_> = env
				.repo
				.list(&child_scope, &TaskFilter::default())
				.await
				.unwrap()
				.into_iter()
				.map(|t| t.title)
				.collect();
			titles.sort();
			assert_eq!(titles, vec!["assigned to viewer", "child task"]);

			let other_scope = ScopeFilter::for_tasks(&env.outsider, &AccessibleOrgs::home_only(env.other));
			assert_eq!(env.repo.list(&other_scope, &TaskFilter::default()).await.unwrap().len(), 2);
		}

		#[tokio::test]
		async fn filters_and_sorting() {
			let env = env().await;
			let mut urgent = NewTask::new("Fix outage");
			urgent.priority = TaskPriority::High;
			urgent.description = Some("database is down".to_string());
			env.repo.create(&env.admin, urgent).await.unwrap();
			env.repo.create(&env.admin, NewTask::new("Write docs")).await.unwrap();

			let scope = ScopeFilter::for_tasks(&env.admin, &AccessibleOrgs::home_only(env.parent));

			let high = TaskFilter {
				priority: Some(TaskPriority::High),
				..TaskFilter::default()
			};
			assert_eq!(env.repo.list(&scope, &high).await.unwrap().len(), 1);

			let search = TaskFilter {
				search: Some("database".to_string()),
				..TaskFilter::default()
			};
			let found = env.repo.list(&scope, &search).await.unwrap();
			assert_eq!(found[0].title, "Fix outage");

			let newest_first = TaskFilter {
				sort_by: TaskSortField::Order,
				descending: true,
				..TaskFilter::default()
			};
			let titles: Vec<_> = env
				.repo
				.list(&scope, &newest_first)
				.await
				.unwrap()
				.into_iter()
				.map(|t| t.title)
				.collect();
			assert_eq!(titles, vec!["Write docs", "Fix outage"]);
		}

		#[tokio::test]
		async fn stats_follow_scope() {
			let env = env().await;
			let mut done = NewTask::new("shipped");
			done.status = TaskStatus::Done;
			env.repo.create(&env.admin, done).await.unwrap();
			env.repo.create(&env.admin, NewTask::new("pending")).await.unwrap();
			env.repo.create(&env.outsider, NewTask::new("invisible")).await.unwrap();

			let scope = ScopeFilter::for_tasks(&env.admin, &AccessibleOrgs::from_ids(env.parent, [env.child]));
			let stats = env.repo.stats(&scope).await.unwrap();
			assert_eq!(stats.total, 2);
			assert_eq!(stats.by_status.get("done"), Some(&1));
			assert_eq!(stats.by_status.get("todo"), Some(&1));
			assert_eq!(stats.by_category.get("work"), Some(&2));
		}
	}

	mod writes {
		use super::*;

		#[tokio::test]
		async fn update_applies_partial_changes() {
			let env = env().await;
			let task = env.repo.create(&env.admin, NewTask::new("draft")).await.unwrap();

			let updated = env
				.repo
				.update(
					task.id,
					TaskUpdate {
						title: Some("final".to_string()),
						assignee_id: Some(Some(env.viewer.subject_id)),
						..TaskUpdate::default()
					},
				)
				.await
				.unwrap();
			assert_eq!(updated.title, "final");
			assert_eq!(updated.assignee_id, Some(env.viewer.subject_id));
			assert_eq!(updated.priority, TaskPriority::Medium);

			let cleared = env
				.repo
				.update(
					task.id,
					TaskUpdate {
						assignee_id: Some(None),
						..TaskUpdate::default()
					},
				)
				.await
				.unwrap();
			assert!(cleared.assignee_id.is_none());
			assert_eq!(cleared.title, "final");
		}

		#[tokio::test]
		async fn reorder_moves_and_sets_status() {
			let env = env().await;
			let task = env.repo.create(&env.admin, NewTask::new("card")).await.unwrap();
			let moved = env
				.repo
				.reorder(task.id, 10, Some(TaskStatus::InProgress))
				.await
				.unwrap();
			assert_eq!(moved.order, 10);
			assert_eq!(moved.status, TaskStatus::InProgress);
		}

		#[tokio::test]
		async fn update_missing_is_not_found() {
			let env = env().await;
			let err = env
				.repo
				.update(TaskId::generate(), TaskUpdate::default())
				.await
				.unwrap_err();
			assert!(matches!(err, DbError::NotFound(_)));
		}

		#[tokio::test]
		async fn delete_removes_row() {
			let env = env().await;
			let task = env.repo.create(&env.admin, NewTask::new("temp")).await.unwrap();
			assert!(env.repo.delete(task.id).await.unwrap());
			assert!(env.repo.get(task.id).await.unwrap().is_none());
			assert!(!env.repo.delete(task.id).await.unwrap());
		}
	}
}
