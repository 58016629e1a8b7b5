//! Activity records: the append-only audit trail.
//!
//! One record is written per mutation of an auditable resource. Records are
//! never updated or deleted; the SQLite backend enforces this with triggers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::identity::IdentitySummary;

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ActivityAction {
  Create,
  Update,
  Delete,
}

/// Before and after values of one changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
  pub from: serde_json::Value,
  pub to:   serde_json::Value,
}

/// Field name → change. Only fields whose value actually changed appear.
pub type Changes = BTreeMap<String, FieldChange>;

/// A persisted activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRecord {
  pub id:           Uuid,
  pub action:       ActivityAction,
  pub entity_type:  String,
  pub entity_id:    Uuid,
  /// Display name of the resource when the action happened. Kept because the
  /// resource itself may be deleted later.
  pub entity_label: String,
  pub performed_by: Uuid,
  /// Present only for [`ActivityAction::Update`].
  pub changes:      Option<Changes>,
  pub created_at:   DateTime<Utc>,
  /// Name and email of `performed_by`, filled in when the log is read.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub performer:    Option<IdentitySummary>,
}

/// Input for [`ActivityStore::append_activity`](crate::store::ActivityStore::append_activity).
/// `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivity {
  pub action:       ActivityAction,
  pub entity_type:  String,
  pub entity_id:    Uuid,
  pub entity_label: String,
  pub performed_by: Uuid,
  pub changes:      Option<Changes>,
}

/// A resource whose mutations are recorded in the activity log.
pub trait Auditable {
  const ENTITY_TYPE: &'static str;

  fn entity_id(&self) -> Uuid;

  /// Human-readable name, snapshotted into each record.
  fn entity_label(&self) -> String;
}
