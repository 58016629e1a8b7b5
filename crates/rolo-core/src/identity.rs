//! Identities: an account that can authenticate and own contacts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// The role an identity holds. Only `Admin` widens what an identity can see.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  User,
  Admin,
}

/// A persisted identity.
///
/// The password hash and refresh-token digest are never serialised; API
/// responses can embed an `Identity` directly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
  pub id:                 Uuid,
  pub name:               String,
  pub email:              String,
  #[serde(skip_serializing)]
  pub password_hash:      String,
  pub role:               Role,
  pub is_active:          bool,
  /// SHA-256 hex digest of the single live refresh token, if any.
  #[serde(skip_serializing)]
  pub refresh_token_hash: Option<String>,
  pub last_login:         Option<DateTime<Utc>>,
  pub created_at:         DateTime<Utc>,
}

impl Identity {
  pub fn is_admin(&self) -> bool { self.role == Role::Admin }
}

/// The public face of an identity, embedded in the records it owns or
/// performed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
  pub id:    Uuid,
  pub name:  String,
  pub email: String,
}

impl From<&Identity> for IdentitySummary {
  fn from(identity: &Identity) -> Self {
    Self { id: identity.id, name: identity.name.clone(), email: identity.email.clone() }
  }
}

/// Input for [`CredentialStore::create_identity`](crate::store::CredentialStore::create_identity).
///
/// Carries a password *hash*; plaintext never reaches the store.
#[derive(Debug, Clone)]
pub struct NewIdentity {
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub role:          Role,
}

/// Canonical form of an email address used for storage and lookup.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }
