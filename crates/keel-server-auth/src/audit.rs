// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit trail of user actions.
//!
//! Entries are written through an [`AuditRecorder`]. Recording is best effort:
//! callers log recorder failures and carry on, so an unavailable audit store
//! never changes an access decision.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

use crate::principal::Principal;
use crate::types::{AuditLogId, UserId};

/// Maximum number of entries returned by a recent-activity listing.
pub const AUDIT_LIST_LIMIT: usize = 100;

/// What the user did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
	Create,
	Read,
	Update,
	Delete,
	Login,
	Logout,
}

impl AuditAction {
	pub fn as_str(self) -> &'static str {
		match self {
			AuditAction::Create => "create",
			AuditAction::Read => "read",
			AuditAction::Update => "update",
			AuditAction::Delete => "delete",
			AuditAction::Login => "login",
			AuditAction::Logout => "logout",
		}
	}
}

impl fmt::Display for AuditAction {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for AuditAction {
	type Err = AuditError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"create" => Ok(AuditAction::Create),
			"read" => Ok(AuditAction::Read),
			"update" => Ok(AuditAction::Update),
			"delete" => Ok(AuditAction::Delete),
			"login" => Ok(AuditAction::Login),
			"logout" => Ok(AuditAction::Logout),
			other => Err(AuditError::InvalidAction(other.to_string())),
		}
	}
}

#[derive(Debug, Error)]
pub enum AuditError {
	#[error("unknown audit action '{0}'")]
	InvalidAction(String),

	#[error("audit store error: {0}")]
	Store(String),
}

/// One recorded user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
	pub id: AuditLogId,
	pub timestamp: DateTime<Utc>,
	pub user_id: UserId,
	pub user_email: String,
	pub action: AuditAction,
	/// Resource type, e.g. `task` or `auth`.
	pub resource: String,
	pub resource_id: Option<String>,
	pub details: Option<String>,
	pub ip_address: Option<String>,
}

impl AuditLogEntry {
	/// Starts an entry attributed to `principal`.
	pub fn builder(principal: &Principal, action: AuditAction, resource: impl Into<String>) -> AuditLogBuilder {
		AuditLogBuilder {
			user_id: principal.subject_id,
			user_email: principal.email.clone(),
			action,
			resource: resource.into(),
			resource_id: None,
			details: None,
			ip_address: None,
			timestamp: None,
		}
	}
}

impl fmt::Display for AuditLogEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.action.as_str().to_uppercase(), self.resource)?;
		if let Some(id) = &self.resource_id {
			write!(f, ":{id}")?;
		}
		write!(f, " by {}", self.user_email)
	}
}

/// Fluent builder for [`AuditLogEntry`].
#[derive(Debug, Clone)]
pub struct AuditLogBuilder {
	user_id: UserId,
	user_email: String,
	action: AuditAction,
	resource: String,
	resource_id: Option<String>,
	details: Option<String>,
	ip_address: Option<String>,
	timestamp: Option<DateTime<Utc>>,
}

impl AuditLogBuilder {
	pub fn resource_id(mut self, id: impl ToString) -> Self {
		self.resource_id = Some(id.to_string());
		self
	}

	pub fn details(mut self, details: impl Into<String>) -> Self {
		self.details = Some(details.into());
		self
	}

	pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
		self.ip_address = Some(ip.into());
		self
	}

	/// Overrides the timestamp, which defaults to the time of [`build`](Self::build).
	pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
		self.timestamp = Some(timestamp);
		self
	}

	pub fn build(self) -> AuditLogEntry {
		AuditLogEntry {
			id: AuditLogId::generate(),
			timestamp: self.timestamp.unwrap_or_else(Utc::now),
			user_id: self.user_id,
			user_email: self.user_email,
			action: self.action,
			resource: self.resource,
			resource_id: self.resource_id,
			details: self.details,
			ip_address: self.ip_address,
		}
	}
}

/// Destination for audit entries.
#[async_trait]
pub trait AuditRecorder: Send + Sync {
	fn name(&self) -> &str;

	async fn record(&self, entry: &AuditLogEntry) -> Result<(), AuditError>;
}

/// Writes entries as structured `tracing` events on the `audit` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditRecorder;

#[async_trait]
impl AuditRecorder for TracingAuditRecorder {
	fn name(&self) -> &str {
		"tracing"
	}

	async fn record(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
		tracing::info!(
			target: "audit",
			audit_id = %entry.id,
			user_id = %entry.user_id,
			action = %entry.action,
			resource = %entry.resource,
			resource_id = entry.resource_id.as_deref(),
			"{entry}"
		);
		Ok(())
	}
}

/// Keeps entries in memory, oldest first.
#[derive(Debug, Default)]
pub struct MemoryAuditRecorder {
	entries: Mutex<Vec<AuditLogEntry>>,
}

impl MemoryAuditRecorder {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn entries(&self) -> Vec<AuditLogEntry> {
		self.entries.lock().await.clone()
	}

	pub async fn len(&self) -> usize {
		self.entries.lock().await.len()
	}

	pub async fn is_empty(&self) -> bool {
		self.entries.lock().await.is_empty()
	}
}

#[async_trait]
impl AuditRecorder for MemoryAuditRecorder {
	fn name(&self) -> &str {
		"memory"
	}

	async fn record(&self, entry: &AuditLogEntry) -> Result<(), AuditError> {
		self.entries.lock().await.push(entry.clone());
		Ok(())
	}
}
