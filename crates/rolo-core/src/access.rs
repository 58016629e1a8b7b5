//! The authorization gate.
//!
//! Two independent checks:
//!
//! - **Ownership scope**: admins see every contact; everyone else sees only
//!   contacts they own. A contact outside the caller's scope is reported as
//!   not found, so its existence is never confirmed to a non-owner.
//! - **Role restriction**: [`restrict_to`] guards operations that need a
//!   specific role regardless of ownership.
//!
//! Every function takes the authenticated identity explicitly.

use uuid::Uuid;

use crate::{
  Error, Result,
  contact::ContactQuery,
  identity::{Identity, Role},
};

/// Which contacts an identity may see and mutate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
  All,
  Owner(Uuid),
}

impl Scope {
  /// The ownership filter to apply, if any.
  pub fn owner(self) -> Option<Uuid> {
    match self {
      Self::All => None,
      Self::Owner(id) => Some(id),
    }
  }

  pub fn permits(self, owner_id: Uuid) -> bool {
    match self {
      Self::All => true,
      Self::Owner(id) => id == owner_id,
    }
  }
}

pub fn scope_for(identity: &Identity) -> Scope {
  match identity.role {
    Role::Admin => Scope::All,
    Role::User => Scope::Owner(identity.id),
  }
}

pub fn has_role(identity: &Identity, allowed: &[Role]) -> bool {
  allowed.contains(&identity.role)
}

/// Fail with `Forbidden` unless the identity holds one of `allowed`.
pub fn restrict_to(identity: &Identity, allowed: &[Role]) -> Result<()> {
  if has_role(identity, allowed) {
    Ok(())
  } else {
    Err(Error::Forbidden(
      "you do not have permission for this action".into(),
    ))
  }
}

/// Narrow a contact query to what `identity` may see.
///
/// Non-admins always get their own id as the owner filter, whatever the
/// incoming query asked for. Admins keep any owner filter they supplied.
pub fn scoped_query(identity: &Identity, mut query: ContactQuery) -> ContactQuery {
  if let Scope::Owner(id) = scope_for(identity) {
    query.owner = Some(id);
  }
  query
}

/// The `performed_by` filter for activity listings: admins see every record,
/// everyone else only their own.
pub fn activity_filter(identity: &Identity) -> Option<Uuid> {
  scope_for(identity).owner()
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::ErrorKind;

  fn identity(role: Role) -> Identity {
    Identity {
      id: Uuid::new_v4(),
      name: "Test".into(),
      email: "test@example.com".into(),
      password_hash: String::new(),
      role,
      is_active: true,
      refresh_token_hash: None,
      last_login: None,
      created_at: Utc::now(),
    }
  }

  #[test]
  fn admin_scope_is_unrestricted() {
    let admin = identity(Role::Admin);
    assert_eq!(scope_for(&admin), Scope::All);
    assert!(scope_for(&admin).permits(Uuid::new_v4()));
    assert_eq!(activity_filter(&admin), None);
  }

  #[test]
  fn user_scope_is_own_contacts_only() {
    let user = identity(Role::User);
    let scope = scope_for(&user);
    assert!(scope.permits(user.id));
    assert!(!scope.permits(Uuid::new_v4()));
    assert_eq!(activity_filter(&user), Some(user.id));
  }

  #[test]
  fn scoped_query_overrides_client_owner_for_users() {
    let user = identity(Role::User);
    let query = ContactQuery { owner: Some(Uuid::new_v4()), ..Default::default() };
    assert_eq!(scoped_query(&user, query).owner, Some(user.id));
  }

  #[test]
  fn scoped_query_keeps_admin_filter() {
    let admin = identity(Role::Admin);
    let other = Uuid::new_v4();
    let query = ContactQuery { owner: Some(other), ..Default::default() };
    assert_eq!(scoped_query(&admin, query).owner, Some(other));
    assert_eq!(scoped_query(&admin, ContactQuery::default()).owner, None);
  }

  #[test]
  fn restrict_to_forbids_missing_role() {
    let user = identity(Role::User);
    let err = restrict_to(&user, &[Role::Admin]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
    assert!(restrict_to(&user, &[Role::User, Role::Admin]).is_ok());
  }
}
