//! Contacts, the owned business resource.
//!
//! Every contact has exactly one owner, fixed at creation. Ownership drives
//! visibility through [`crate::access`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{activity::Auditable, identity::IdentitySummary};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Pipeline stage of a contact.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
pub enum ContactStatus {
  #[default]
  Lead,
  Prospect,
  Customer,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A persisted contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:         Uuid,
  /// Identity that created the contact. Never reassigned.
  pub owner_id:   Uuid,
  pub name:       String,
  pub email:      String,
  pub phone:      Option<String>,
  pub company:    Option<String>,
  pub status:     ContactStatus,
  pub notes:      Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  /// Name and email of the owner, filled in by the store when it reads the
  /// contact back.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub owner:      Option<IdentitySummary>,
}

impl Auditable for Contact {
  const ENTITY_TYPE: &'static str = "Contact";

  fn entity_id(&self) -> Uuid { self.id }

  fn entity_label(&self) -> String { self.name.clone() }
}

/// Input for creating a contact. The owner is supplied separately by the
/// caller's authenticated identity, never by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
  pub name:    String,
  pub email:   String,
  pub phone:   Option<String>,
  pub company: Option<String>,
  #[serde(default)]
  pub status:  ContactStatus,
  pub notes:   Option<String>,
}

/// A partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPatch {
  pub name:    Option<String>,
  pub email:   Option<String>,
  pub phone:   Option<String>,
  pub company: Option<String>,
  pub status:  Option<ContactStatus>,
  pub notes:   Option<String>,
}

impl ContactPatch {
  /// Apply the patch to a copy of `contact`, leaving `id`, `owner_id` and
  /// timestamps as they are.
  pub fn apply_to(&self, contact: &Contact) -> Contact {
    let mut next = contact.clone();
    if let Some(name) = &self.name {
      next.name = name.clone();
    }
    if let Some(email) = &self.email {
      next.email = email.clone();
    }
    if let Some(phone) = &self.phone {
      next.phone = Some(phone.clone());
    }
    if let Some(company) = &self.company {
      next.company = Some(company.clone());
    }
    if let Some(status) = self.status {
      next.status = status;
    }
    if let Some(notes) = &self.notes {
      next.notes = Some(notes.clone());
    }
    next
  }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Columns a contact listing may be sorted by.
///
/// This is a closed set: the store maps each variant to a fixed column, so a
/// client-supplied string can never select an arbitrary field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
  #[default]
  CreatedAt,
  UpdatedAt,
  Name,
  Email,
  Company,
  Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  #[default]
  Desc,
}

/// Parameters for [`ContactStore::list_contacts`](crate::store::ContactStore::list_contacts).
///
/// `owner` is the ownership filter. It is set by
/// [`access::scoped_query`](crate::access::scoped_query); callers should not
/// fill it in from client input.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactQuery {
  pub owner:  Option<Uuid>,
  /// Case-insensitive substring match over name and email.
  pub text:   Option<String>,
  pub status: Option<ContactStatus>,
  pub sort:   SortField,
  pub order:  SortOrder,
  pub page:   u32,
  pub limit:  u32,
}

impl Default for ContactQuery {
  fn default() -> Self {
    Self {
      owner:  None,
      text:   None,
      status: None,
      sort:   SortField::default(),
      order:  SortOrder::default(),
      page:   1,
      limit:  10,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn alice() -> Contact {
    let now = Utc::now();
    Contact {
      id:         Uuid::new_v4(),
      owner_id:   Uuid::new_v4(),
      name:       "Alice".into(),
      email:      "alice@example.com".into(),
      phone:      None,
      company:    Some("Acme".into()),
      status:     ContactStatus::Lead,
      notes:      None,
      created_at: now,
      updated_at: now,
      owner:      None,
    }
  }

  #[test]
  fn patch_only_touches_present_fields() {
    let before = alice();
    let patch = ContactPatch {
      name: Some("Alicia".into()),
      status: Some(ContactStatus::Customer),
      ..Default::default()
    };
    let after = patch.apply_to(&before);
    assert_eq!(after.name, "Alicia");
    assert_eq!(after.status, ContactStatus::Customer);
    assert_eq!(after.email, before.email);
    assert_eq!(after.company, before.company);
    assert_eq!(after.owner_id, before.owner_id);
  }

  #[test]
  fn sort_field_rejects_unknown_columns() {
    let ok: SortField = serde_json::from_str("\"updatedAt\"").unwrap();
    assert_eq!(ok, SortField::UpdatedAt);
    assert!(serde_json::from_str::<SortField>("\"password_hash\"").is_err());
  }

  #[test]
  fn status_parses_capitalised_names() {
    assert_eq!("Prospect".parse::<ContactStatus>().unwrap(), ContactStatus::Prospect);
    assert_eq!(ContactStatus::Customer.to_string(), "Customer");
  }
}
