//! Storage traits for identities, contacts, and activity records.
//!
//! The traits are implemented by storage backends (e.g. `rolo-store-sqlite`).
//! Higher layers (`rolo-auth`, `rolo-api`) depend on these abstractions, not
//! on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  access::Scope,
  activity::{ActivityRecord, NewActivity},
  contact::{Contact, ContactPatch, ContactQuery, NewContact},
  identity::{Identity, NewIdentity, Role},
};

/// The error type shared by every storage trait of one backend.
///
/// Backend errors must convert into [`crate::Error`] so that callers can
/// classify them (`Conflict`, `Unavailable`, `Internal`).
pub trait Backend: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static + Into<crate::Error>;
}

// ─── Identities ──────────────────────────────────────────────────────────────

pub trait CredentialStore: Backend {
  /// Persist a new identity. Fails with a conflict if the email is already
  /// registered, compared case-insensitively.
  fn create_identity(
    &self,
    input: NewIdentity,
  ) -> impl Future<Output = Result<Identity, Self::Error>> + Send + '_;

  fn find_identity(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  fn find_identity_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  /// Unconditionally replace (or clear) the stored refresh-token digest.
  /// Used on signup, login, logout and deactivation.
  fn set_refresh_token(
    &self,
    id: Uuid,
    token_hash: Option<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Atomically replace the refresh-token digest only if it currently equals
  /// `expected`. Returns `false` when the stored value differed, which means
  /// another rotation (or a logout) won the race.
  fn swap_refresh_token(
    &self,
    id: Uuid,
    expected: String,
    replacement: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn touch_last_login(
    &self,
    id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Returns `false` if no identity has this id.
  fn set_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns `false` if no identity has this id.
  fn set_role(
    &self,
    id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Contacts ────────────────────────────────────────────────────────────────

/// Contact persistence. Every read and write by id takes a [`Scope`]; a
/// contact outside the scope behaves exactly like a missing one.
pub trait ContactStore: Backend {
  fn insert_contact(
    &self,
    owner: Uuid,
    input: NewContact,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn get_contact(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// Apply `patch` and return `(before, after)`, or `None` if the contact is
  /// absent or out of scope.
  fn update_contact(
    &self,
    scope: Scope,
    id: Uuid,
    patch: ContactPatch,
  ) -> impl Future<Output = Result<Option<(Contact, Contact)>, Self::Error>> + Send + '_;

  /// Delete and return the removed contact, or `None` if absent or out of
  /// scope.
  fn delete_contact(
    &self,
    scope: Scope,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  /// One page of contacts matching `query`, plus the total match count.
  fn list_contacts<'a>(
    &'a self,
    query: &'a ContactQuery,
  ) -> impl Future<Output = Result<(Vec<Contact>, u64), Self::Error>> + Send + 'a;
}

// ─── Activities ──────────────────────────────────────────────────────────────

/// Append-only activity log. There is deliberately no update or delete.
pub trait ActivityStore: Backend {
  fn append_activity(
    &self,
    input: NewActivity,
  ) -> impl Future<Output = Result<ActivityRecord, Self::Error>> + Send + '_;

  /// One page of records, newest first, optionally restricted to a single
  /// performer, plus the total match count.
  fn list_activities(
    &self,
    performed_by: Option<Uuid>,
    page: u32,
    limit: u32,
  ) -> impl Future<Output = Result<(Vec<ActivityRecord>, u64), Self::Error>> + Send + '_;
}
