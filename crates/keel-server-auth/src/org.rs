// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organizations and the hierarchy they form.
//!
//! This module provides:
//! - [`Organization`] - a node in the tenant tree, optionally under a parent
//! - [`OrgHierarchy`] - the read interface the scope resolver queries
//! - [`OrgTree`] - an in-memory hierarchy that enforces the tree invariants

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::LookupError;
use crate::types::OrgId;

/// A tenant organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
	/// Unique identifier for this organization.
	pub id: OrgId,

	/// Display name.
	pub name: String,

	/// Parent organization; `None` for a root.
	pub parent_id: Option<OrgId>,

	/// When the organization was created.
	pub created_at: DateTime<Utc>,

	/// When the organization was last updated.
	pub updated_at: DateTime<Utc>,
}

impl Organization {
	/// Creates a root organization with a fresh ID.
	pub fn root(name: impl Into<String>) -> Self {
		let now = Utc::now();
		Self {
			id: OrgId::generate(),
			name: name.into(),
			parent_id: None,
			created_at: now,
			updated_at: now,
		}
	}

	/// Creates an organization nested under `parent`.
	pub fn child_of(parent: OrgId, name: impl Into<String>) -> Self {
		Self {
			parent_id: Some(parent),
			..Self::root(name)
		}
	}

	pub fn is_root(&self) -> bool {
		self.parent_id.is_none()
	}
}

/// Read access to the organization tree.
///
/// Implementations may perform I/O; each call is an independent query and
/// results must not be cached across authorization decisions.
#[async_trait]
pub trait OrgHierarchy: Send + Sync {
	/// IDs of organizations whose parent is `parent`.
	async fn child_org_ids(&self, parent: OrgId) -> Result<Vec<OrgId>, LookupError>;
}

/// Violations of the organization tree invariants.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrgTreeError {
	#[error("organization {0} already exists")]
	Duplicate(OrgId),

	#[error("parent organization {0} does not exist")]
	MissingParent(OrgId),

	#[error("organization {0} cannot be its own ancestor")]
	Cycle(OrgId),

	#[error("organization {0} not found")]
	NotFound(OrgId),
}

/// In-memory organization tree.
///
/// Every insert and re-parent is validated: parents must exist and no
/// organization may become its own ancestor.
#[derive(Debug, Clone, Default)]
pub struct OrgTree {
	orgs: BTreeMap<OrgId, Organization>,
}

impl OrgTree {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, org: Organization) -> Result<(), OrgTreeError> {
		if self.orgs.contains_key(&org.id) {
			return Err(OrgTreeError::Duplicate(org.id));
		}
		if let Some(parent) = org.parent_id {
			if parent == org.id {
				return Err(OrgTreeError::Cycle(org.id));
			}
			if !self.orgs.contains_key(&parent) {
				return Err(OrgTreeError::MissingParent(parent));
			}
		}
		self.orgs.insert(org.id, org);
		Ok(())
	}

	pub fn get(&self, id: OrgId) -> Option<&Organization> {
		self.orgs.get(&id)
	}

	/// Moves `id` under `new_parent` (or to the root level with `None`).
	pub fn reparent(&mut self, id: OrgId, new_parent: Option<OrgId>) -> Result<(), OrgTreeError> {
		if !self.orgs.contains_key(&id) {
			return Err(OrgTreeError::NotFound(id));
		}
		if let Some(parent) = new_parent {
			if !self.orgs.contains_key(&parent) {
				return Err(OrgTreeError::MissingParent(parent));
			}
			if self.is_ancestor_or_self(id, parent) {
				return Err(OrgTreeError::Cycle(id));
			}
		}
		if let Some(org) = self.orgs.get_mut(&id) {
			org.parent_id = new_parent;
			org.updated_at = Utc::now();
		}
		Ok(())
	}

	/// Returns true if `ancestor` is `id` or appears on `id`'s parent chain.
	pub fn is_ancestor_or_self(&self, ancestor: OrgId, id: OrgId) -> bool {
		let mut seen = HashSet::new();
		let mut current = Some(id);
		while let Some(cur) = current {
			if cur == ancestor {
				return true;
			}
			if !seen.insert(cur) {
				return false;
			}
			current = self.orgs.get(&cur).and_then(|o| o.parent_id);
		}
		false
	}

	pub fn children(&self, parent: OrgId) -> impl Iterator<Item = &Organization> {
		self
			.orgs
			.values()
			.filter(move |o| o.parent_id == Some(parent))
	}

	pub fn len(&self) -> usize {
		self.orgs.len()
	}

	pub fn is_empty(&self) -> bool {
		self.orgs.is_empty()
	}
}

#[async_trait]
impl OrgHierarchy for OrgTree {
	async fn child_org_ids(&self, parent: OrgId) -> Result<Vec<OrgId>, LookupError> {
		Ok(self.children(parent).map(|o| o.id).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	mod organization {
		use super::*;

		#[test]
		fn root_has_no_parent() {
			let org = Organization::root("Acme");
			assert!(org.is_root());
			assert_eq!(org.created_at, org.updated_at);
		}

		#[test]
		fn child_points_at_parent() {
			let root = Organization::root("Acme");
			let child = Organization::child_of(root.id, "Acme Tech");
			assert_eq!(child.parent_id, Some(root.id));
			assert_ne!(child.id, root.id);
		}

		#[test]
		fn serializes_parent_id() {
			let root = Organization::root("Acme");
			let child = Organization::child_of(root.id, "Acme Tech");
			let json = serde_json::to_string(&child).unwrap();
			assert!(json.contains(&format!("\"parent_id\":\"{}\"", root.id)));
		}
	}

	mod tree {
		use super::*;

		#[test]
		fn rejects_missing_parent() {
			let mut tree = OrgTree::new();
			let orphan = Organization::child_of(OrgId::generate(), "Orphan");
			let parent = orphan.parent_id.unwrap();
			assert_eq!(tree.insert(orphan), Err(OrgTreeError::MissingParent(parent)));
		}

		#[test]
		fn rejects_self_parent() {
			let mut tree = OrgTree::new();
			let mut org = Organization::root("Loop");
			org.parent_id = Some(org.id);
			assert_eq!(tree.insert(org.clone()), Err(OrgTreeError::Cycle(org.id)));
		}

		#[test]
		fn rejects_duplicates() {
			let mut tree = OrgTree::new();
			let org = Organization::root("Acme");
			tree.insert(org.clone()).unwrap();
			assert_eq!(tree.insert(org.clone()), Err(OrgTreeError::Duplicate(org.id)));
		}

		#[test]
		fn reparent_rejects_cycles() {
			let mut tree = OrgTree::new();
			let root = Organization::root("Acme");
			let child = Organization::child_of(root.id, "Tech");
			let grandchild = Organization::child_of(child.id, "Platform");
			tree.insert(root.clone()).unwrap();
			tree.insert(child.clone()).unwrap();
			tree.insert(grandchild.clone()).unwrap();

			assert_eq!(
				tree.reparent(root.id, Some(grandchild.id)),
				Err(OrgTreeError::Cycle(root.id))
			);
			assert_eq!(
				tree.reparent(child.id, Some(child.id)),
				Err(OrgTreeError::Cycle(child.id))
			);
		}

		#[test]
		fn reparent_moves_subtree() {
			let mut tree = OrgTree::new();
			let a = Organization::root("A");
			let b = Organization::root("B");
			let child = Organization::child_of(a.id, "A1");
			tree.insert(a.clone()).unwrap();
			tree.insert(b.clone()).unwrap();
			tree.insert(child.clone()).unwrap();

			tree.reparent(child.id, Some(b.id)).unwrap();
			assert_eq!(tree.children(a.id).count(), 0);
			assert_eq!(tree.children(b.id).count(), 1);

			tree.reparent(child.id, None).unwrap();
			assert!(tree.get(child.id).unwrap().is_root());
		}

		#[tokio::test]
		async fn hierarchy_lists_direct_children_only() {
			let mut tree = OrgTree::new();
			let root = Organization::root("Acme");
			let child = Organization::child_of(root.id, "Tech");
			let grandchild = Organization::child_of(child.id, "Platform");
			tree.insert(root.clone()).unwrap();
			tree.insert(child.clone()).unwrap();
			tree.insert(grandchild).unwrap();

			let ids = tree.child_org_ids(root.id).await.unwrap();
			assert_eq!(ids, vec![child.id]);
		}
	}
}
