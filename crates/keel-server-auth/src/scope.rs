// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization scope resolution.
//!
//! A principal homed in an organization may see that organization and the
//! organizations beneath it, down to a configured [`ScopeDepth`]. The default
//! depth of one admits direct children only: a parent-org user sees its
//! immediate sub-teams, while a child-org user sees neither its parent nor its
//! siblings.
//!
//! Resolution queries the [`OrgHierarchy`] on every call. Lookup failures are
//! returned as [`LookupError`] and never collapse into an empty scope.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::instrument;

use crate::error::LookupError;
use crate::org::OrgHierarchy;
use crate::principal::Principal;
use crate::types::{OrgId, UserId};

/// How many levels below the home organization are visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeDepth(u8);

impl ScopeDepth {
	/// Upper bound accepted from configuration.
	pub const MAX: u8 = 8;

	/// Home organization only.
	pub const HOME_ONLY: ScopeDepth = ScopeDepth(0);

	/// Home organization and its direct children.
	pub const DIRECT_CHILDREN: ScopeDepth = ScopeDepth(1);

	/// Returns `None` if `levels` exceeds [`ScopeDepth::MAX`].
	pub fn new(levels: u8) -> Option<Self> {
		(levels <= Self::MAX).then_some(Self(levels))
	}

	pub fn levels(self) -> u8 {
		self.0
	}
}

impl Default for ScopeDepth {
	fn default() -> Self {
		Self::DIRECT_CHILDREN
	}
}

/// Organizations a principal may access. The home organization comes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessibleOrgs {
	ids: Vec<OrgId>,
}

impl AccessibleOrgs {
	/// Scope containing only `home`.
	pub fn home_only(home: OrgId) -> Self {
		Self { ids: vec![home] }
	}

	/// Builds a scope from `home` and precomputed descendants. Duplicates are dropped.
	pub fn from_ids(home: OrgId, descendants: impl IntoIterator<Item = OrgId>) -> Self {
		let mut scope = Self::home_only(home);
		for id in descendants {
			if !scope.contains(id) {
				scope.push(id);
			}
		}
		scope
	}

	pub fn home(&self) -> OrgId {
		self.ids[0]
	}

	pub fn contains(&self, org_id: OrgId) -> bool {
		self.ids.contains(&org_id)
	}

	pub fn as_slice(&self) -> &[OrgId] {
		&self.ids
	}

	pub fn iter(&self) -> impl Iterator<Item = OrgId> + '_ {
		self.ids.iter().copied()
	}

	pub fn len(&self) -> usize {
		self.ids.len()
	}

	/// Always false, since the home organization is always present. Provided
	/// alongside [`AccessibleOrgs::len`].
	pub fn is_empty(&self) -> bool {
		self.ids.is_empty()
	}

	fn push(&mut self, org_id: OrgId) {
		self.ids.push(org_id);
	}
}

/// Computes accessible organizations from an [`OrgHierarchy`].
#[derive(Clone)]
pub struct ScopeResolver {
	hierarchy: Arc<dyn OrgHierarchy>,
	depth: ScopeDepth,
}

impl ScopeResolver {
	pub fn new(hierarchy: Arc<dyn OrgHierarchy>) -> Self {
		Self {
			hierarchy,
			depth: ScopeDepth::default(),
		}
	}

	pub fn with_depth(mut self, depth: ScopeDepth) -> Self {
		self.depth = depth;
		self
	}

	pub fn depth(&self) -> ScopeDepth {
		self.depth
	}

	/// Returns `home` plus its descendants down to the configured depth.
	///
	/// Traversal is breadth-first and skips organizations already visited, so
	/// a store that violates the no-cycle invariant cannot cause a loop.
	#[instrument(level = "debug", skip(self), fields(home = %home, depth = self.depth.levels()))]
	pub async fn accessible_organizations(&self, home: OrgId) -> Result<AccessibleOrgs, LookupError> {
		let mut accessible = AccessibleOrgs::home_only(home);
		let mut visited = HashSet::from([home]);
		let mut frontier = vec![home];

		for _ in 0..self.depth.levels() {
			let mut next = Vec::new();
			for parent in frontier {
				let children = self.hierarchy.child_org_ids(parent).await.map_err(|e| {
					tracing::warn!(parent = %parent, error = %e, "organization lookup failed");
					e
				})?;
				for child in children {
					if visited.insert(child) {
						accessible.push(child);
						next.push(child);
					}
				}
			}
			if next.is_empty() {
				break;
			}
			frontier = next;
		}

		tracing::debug!(count = accessible.len(), "resolved accessible organizations");
		Ok(accessible)
	}

	/// Builds the listing filter for `principal`'s tasks.
	pub async fn task_filter(&self, principal: &Principal) -> Result<ScopeFilter, LookupError> {
		let accessible = self
			.accessible_organizations(principal.organization_id)
			.await?;
		Ok(ScopeFilter::for_tasks(principal, &accessible))
	}

	/// Builds the listing filter for users visible to `principal`.
	pub async fn user_filter(&self, principal: &Principal) -> Result<ScopeFilter, LookupError> {
		let accessible = self
			.accessible_organizations(principal.organization_id)
			.await?;
		Ok(ScopeFilter::for_users(&accessible))
	}
}

/// Row filter for collection reads, expressing the scope gate for a query.
///
/// A row matches when its organization is in `org_ids`, or when `assignee` is
/// set and equals the row's assignee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeFilter {
	pub org_ids: Vec<OrgId>,
	pub assignee: Option<UserId>,
}

impl ScopeFilter {
	pub fn for_tasks(principal: &Principal, accessible: &AccessibleOrgs) -> Self {
		Self {
			org_ids: accessible.as_slice().to_vec(),
			assignee: Some(principal.subject_id),
		}
	}

	pub fn for_users(accessible: &AccessibleOrgs) -> Self {
		Self {
			org_ids: accessible.as_slice().to_vec(),
			assignee: None,
		}
	}

	pub fn matches(&self, org_id: OrgId, assignee_id: Option<UserId>) -> bool {
		self.org_ids.contains(&org_id) || (self.assignee.is_some() && self.assignee == assignee_id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::org::{OrgTree, Organization};
	use crate::role::Role;
	use async_trait::async_trait;

	struct Fixture {
		tree: Arc<OrgTree>,
		root: OrgId,
		tech: OrgId,
		design: OrgId,
		platform: OrgId,
		other: OrgId,
	}

	/// root ─┬─ tech ── platform
	///       └─ design
	/// other
	fn fixture() -> Fixture {
		let mut tree = OrgTree::new();
		let root = Organization::root("Acme");
		let tech = Organization::child_of(root.id, "Tech");
		let design = Organization::child_of(root.id, "Design");
		let platform = Organization::child_of(tech.id, "Platform");
		let other = Organization::root("Globex");
		let ids = (root.id, tech.id, design.id, platform.id, other.id);
		for org in [root, tech, design, platform, other] {
			tree.insert(org).unwrap();
		}
		Fixture {
			tree: Arc::new(tree),
			root: ids.0,
			tech: ids.1,
			design: ids.2,
			platform: ids.3,
			other: ids.4,
		}
	}

	struct FailingHierarchy;

	#[async_trait]
	impl OrgHierarchy for FailingHierarchy {
		async fn child_org_ids(&self, _parent: OrgId) -> Result<Vec<OrgId>, LookupError> {
			Err(LookupError::Backend("connection refused".to_string()))
		}
	}

	/// Reports each org as its own child and as the other's child.
	struct CyclicHierarchy {
		a: OrgId,
		b: OrgId,
	}

	#[async_trait]
	impl OrgHierarchy for CyclicHierarchy {
		async fn child_org_ids(&self, parent: OrgId) -> Result<Vec<OrgId>, LookupError> {
			Ok(if parent == self.a {
				vec![self.a, self.b]
			} else {
				vec![self.a]
			})
		}
	}

	#[test]
	fn depth_is_bounded() {
		assert_eq!(ScopeDepth::new(3).map(ScopeDepth::levels), Some(3));
		assert!(ScopeDepth::new(ScopeDepth::MAX + 1).is_none());
		assert_eq!(ScopeDepth::default(), ScopeDepth::DIRECT_CHILDREN);
	}

	#[test]
	fn accessible_set_is_never_empty() {
		let home = OrgId::generate();
		let only = AccessibleOrgs::home_only(home);
		assert!(!only.is_empty());
		assert_eq!(only.len(), 1);

		let child = OrgId::generate();
		let wider = AccessibleOrgs::from_ids(home, [child, home, child]);
		assert_eq!(wider.as_slice(), &[home, child]);
		assert!(!wider.is_empty());
	}

	#[tokio::test]
	async fn parent_sees_direct_children() {
		let f = fixture();
		let resolver = ScopeResolver::new(f.tree.clone());
		let scope = resolver.accessible_organizations(f.root).await.unwrap();

		assert_eq!(scope.home(), f.root);
		assert!(scope.contains(f.root));
		assert!(scope.contains(f.tech));
		assert!(scope.contains(f.design));
		assert!(!scope.contains(f.platform));
		assert!(!scope.contains(f.other));
		assert_eq!(scope.len(), 3);
	}

	#[tokio::test]
	async fn child_sees_neither_parent_nor_siblings() {
		let f = fixture();
		let resolver = ScopeResolver::new(f.tree.clone());
		let scope = resolver.accessible_organizations(f.design).await.unwrap();

		assert!(scope.contains(f.design));
		assert!(!scope.contains(f.root));
		assert!(!scope.contains(f.tech));
		assert_eq!(scope.len(), 1);
	}

	#[tokio::test]
	async fn deeper_scope_reaches_grandchildren() {
		let f = fixture();
		let resolver = ScopeResolver::new(f.tree.clone()).with_depth(ScopeDepth::new(2).unwrap());
		let scope = resolver.accessible_organizations(f.root).await.unwrap();
		assert!(scope.contains(f.platform));
		assert_eq!(scope.len(), 4);
	}

	#[tokio::test]
	async fn home_only_scope() {
		let f = fixture();
		let resolver = ScopeResolver::new(f.tree.clone()).with_depth(ScopeDepth::HOME_ONLY);
		let scope = resolver.accessible_organizations(f.root).await.unwrap();
		assert_eq!(scope.as_slice(), &[f.root]);
	}

	#[tokio::test]
	async fn unknown_home_still_contains_itself() {
		let f = fixture();
		let resolver = ScopeResolver::new(f.tree.clone());
		let stranger = OrgId::generate();
		let scope = resolver.accessible_organizations(stranger).await.unwrap();
		assert_eq!(scope.as_slice(), &[stranger]);
	}

	#[tokio::test]
	async fn lookup_failure_propagates() {
		let resolver = ScopeResolver::new(Arc::new(FailingHierarchy));
		let result = resolver.accessible_organizations(OrgId::generate()).await;
		assert!(matches!(result, Err(LookupError::Backend(_))));
	}

	#[tokio::test]
	async fn home_only_scope_never_queries_the_store() {
		let resolver =
			ScopeResolver::new(Arc::new(FailingHierarchy)).with_depth(ScopeDepth::HOME_ONLY);
		assert!(resolver
			.accessible_organizations(OrgId::generate())
			.await
			.is_ok());
	}

	#[tokio::test]
	async fn cyclic_store_terminates_without_duplicates() {
		let a = OrgId::generate();
		let b = OrgId::generate();
		let resolver = ScopeResolver::new(Arc::new(CyclicHierarchy { a, b }))
			.with_depth(ScopeDepth::new(ScopeDepth::MAX).unwrap());
		let scope = resolver.accessible_organizations(a).await.unwrap();
		assert_eq!(scope.as_slice(), &[a, b]);
	}

	#[tokio::test]
	async fn task_filter_includes_assignee() {
		let f = fixture();
		let resolver = ScopeResolver::new(f.tree.clone());
		let principal = Principal::new(UserId::generate(), "ada@example.com", Role::Viewer, f.tech);
		let filter = resolver.task_filter(&principal).await.unwrap();

		assert!(filter.matches(f.tech, None));
		assert!(filter.matches(f.platform, None));
		assert!(!filter.matches(f.other, None));
		assert!(filter.matches(f.other, Some(principal.subject_id)));
		assert!(!filter.matches(f.other, Some(UserId::generate())));
	}

	#[tokio::test]
	async fn user_filter_ignores_assignment() {
		let f = fixture();
		let resolver = ScopeResolver::new(f.tree.clone());
		let principal = Principal::new(UserId::generate(), "ada@example.com", Role::Owner, f.root);
		let filter = resolver.user_filter(&principal).await.unwrap();

		assert_eq!(filter.assignee, None);
		assert!(filter.matches(f.design, None));
		assert!(!filter.matches(f.other, Some(principal.subject_id)));
	}
}
