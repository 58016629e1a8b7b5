//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! Enumerations are stored by their canonical names. The UPDATE change map is
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use rolo_core::{
  activity::{ActivityAction, ActivityRecord, Changes},
  contact::{Contact, ContactStatus},
  identity::{Identity, IdentitySummary, Role},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::Decode(format!("role {s:?}")))
}

pub fn decode_status(s: &str) -> Result<ContactStatus> {
  s.parse().map_err(|_| Error::Decode(format!("contact status {s:?}")))
}

pub fn decode_action(s: &str) -> Result<ActivityAction> {
  s.parse().map_err(|_| Error::Decode(format!("activity action {s:?}")))
}

// ─── Changes ─────────────────────────────────────────────────────────────────

pub fn encode_changes(changes: Option<&Changes>) -> Result<Option<String>> {
  changes.map(serde_json::to_string).transpose().map_err(Error::from)
}

pub fn decode_changes(s: Option<&str>) -> Result<Option<Changes>> {
  s.map(serde_json::from_str).transpose().map_err(Error::from)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawIdentity::from_row`].
pub const IDENTITY_COLUMNS: &str = "id, name, email, password_hash, role, \
  is_active, refresh_token_hash, last_login, created_at";

/// Raw values read directly from an `identities` row.
pub struct RawIdentity {
  pub id:                 String,
  pub name:               String,
  pub email:              String,
  pub password_hash:      String,
  pub role:               String,
  pub is_active:          bool,
  pub refresh_token_hash: Option<String>,
  pub last_login:         Option<String>,
  pub created_at:         String,
}

impl RawIdentity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(0)?,
      name:               row.get(1)?,
      email:              row.get(2)?,
      password_hash:      row.get(3)?,
      role:               row.get(4)?,
      is_active:          row.get(5)?,
      refresh_token_hash: row.get(6)?,
      last_login:         row.get(7)?,
      created_at:         row.get(8)?,
    })
  }

  pub fn into_identity(self) -> Result<Identity> {
    Ok(Identity {
      id:                 decode_uuid(&self.id)?,
      name:               self.name,
      email:              self.email,
      password_hash:      self.password_hash,
      role:               decode_role(&self.role)?,
      is_active:          self.is_active,
      refresh_token_hash: self.refresh_token_hash,
      last_login:         self.last_login.as_deref().map(decode_dt).transpose()?,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawContact::from_row`]. Select from
/// [`CONTACT_SOURCE`].
pub const CONTACT_COLUMNS: &str = "c.id, c.owner_id, c.name, c.email, c.phone, \
  c.company, c.status, c.notes, c.created_at, c.updated_at, o.name, o.email";

/// Contacts joined with their owner.
pub const CONTACT_SOURCE: &str = "contacts c LEFT JOIN identities o ON o.id = c.owner_id";

/// Raw values read directly from a `contacts` row and its owner.
pub struct RawContact {
  pub id:          String,
  pub owner_id:    String,
  pub name:        String,
  pub email:       String,
  pub phone:       Option<String>,
  pub company:     Option<String>,
  pub status:      String,
  pub notes:       Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
  pub owner_name:  Option<String>,
  pub owner_email: Option<String>,
}

impl RawContact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      owner_id:    row.get(1)?,
      name:        row.get(2)?,
      email:       row.get(3)?,
      phone:       row.get(4)?,
      company:     row.get(5)?,
      status:      row.get(6)?,
      notes:       row.get(7)?,
      created_at:  row.get(8)?,
      updated_at:  row.get(9)?,
      owner_name:  row.get(10)?,
      owner_email: row.get(11)?,
    })
  }

  pub fn into_contact(self) -> Result<Contact> {
    let owner_id = decode_uuid(&self.owner_id)?;
    Ok(Contact {
      id:         decode_uuid(&self.id)?,
      owner_id,
      name:       self.name,
      email:      self.email,
      phone:      self.phone,
      company:    self.company,
      status:     decode_status(&self.status)?,
      notes:      self.notes,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      owner:      summary(owner_id, self.owner_name, self.owner_email),
    })
  }
}

/// Column list matching [`RawActivity::from_row`]. Select from
/// [`ACTIVITY_SOURCE`].
pub const ACTIVITY_COLUMNS: &str = "a.id, a.action, a.entity_type, a.entity_id, \
  a.entity_label, a.performed_by, a.changes, a.created_at, p.name, p.email";

/// Activities joined with the identity that performed them.
pub const ACTIVITY_SOURCE: &str =
  "activities a LEFT JOIN identities p ON p.id = a.performed_by";

/// Raw values read directly from an `activities` row and its performer.
pub struct RawActivity {
  pub id:              String,
  pub action:          String,
  pub entity_type:     String,
  pub entity_id:       String,
  pub entity_label:    String,
  pub performed_by:    String,
  pub changes:         Option<String>,
  pub created_at:      String,
  pub performer_name:  Option<String>,
  pub performer_email: Option<String>,
}

impl RawActivity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      action:          row.get(1)?,
      entity_type:     row.get(2)?,
      entity_id:       row.get(3)?,
      entity_label:    row.get(4)?,
      performed_by:    row.get(5)?,
      changes:         row.get(6)?,
      created_at:      row.get(7)?,
      performer_name:  row.get(8)?,
      performer_email: row.get(9)?,
    })
  }

  pub fn into_record(self) -> Result<ActivityRecord> {
    let performed_by = decode_uuid(&self.performed_by)?;
    Ok(ActivityRecord {
      id:           decode_uuid(&self.id)?,
      action:       decode_action(&self.action)?,
      entity_type:  self.entity_type,
      entity_id:    decode_uuid(&self.entity_id)?,
      entity_label: self.entity_label,
      performed_by,
      changes:      decode_changes(self.changes.as_deref())?,
      created_at:   decode_dt(&self.created_at)?,
      performer:    summary(performed_by, self.performer_name, self.performer_email),
    })
  }
}

/// An identity summary, when the joined identity row was found.
fn summary(
  id: Uuid,
  name: Option<String>,
  email: Option<String>,
) -> Option<IdentitySummary> {
  Some(IdentitySummary { id, name: name?, email: email? })
}
