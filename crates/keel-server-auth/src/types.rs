// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Identifier newtypes shared by the authorization engine and its collaborators.
//!
//! Each entity gets its own wrapper around a [`uuid::Uuid`] so a task id can
//! never be passed where an organization id is expected. All ID types
//! serialize transparently as UUID strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(
			Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
		)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			/// Create a new ID from a UUID.
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			/// Generate a new random ID.
			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			/// Get the inner UUID value.
			pub fn into_inner(self) -> Uuid {
				self.0
			}

			/// Get a reference to the inner UUID.
			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s).map(Self)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl From<$name> for Uuid {
			fn from(id: $name) -> Self {
				id.0
			}
		}
	};
}

define_id_type!(UserId, "Unique identifier for a user.");
define_id_type!(OrgId, "Unique identifier for an organization.");
define_id_type!(TaskId, "Unique identifier for a task.");
define_id_type!(AuditLogId, "Unique identifier for an audit log entry.");

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn user_id_generates_unique() {
		assert_ne!(UserId::generate(), UserId::generate());
	}

	#[test]
	fn org_id_serializes_as_uuid() {
		let uuid = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
		let json = serde_json::to_string(&OrgId::new(uuid)).unwrap();
		assert_eq!(json, "\"550e8400-e29b-41d4-a716-446655440000\"");
	}

	#[test]
	fn task_id_parses_from_str() {
		let id: TaskId = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
		assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
		assert!("not-a-uuid".parse::<TaskId>().is_err());
	}

	proptest! {
		#[test]
		fn display_then_parse_is_identity(a: u128) {
			let id = OrgId::new(Uuid::from_u128(a));
			prop_assert_eq!(id.to_string().parse::<OrgId>().unwrap(), id);
		}
	}
}
