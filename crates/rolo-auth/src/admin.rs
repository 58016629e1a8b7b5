//! Identity administration: role changes and deactivation.

use std::{sync::Arc, time::Duration};

use rolo_core::{
  Error, Result, access,
  identity::{Identity, Role, normalize_email},
  store::CredentialStore,
  timeout::{DEFAULT_STORAGE_TIMEOUT, bounded},
};
use uuid::Uuid;

fn identity_not_found() -> Error { Error::not_found("identity not found") }

pub struct IdentityAdmin<S> {
  store:   Arc<S>,
  timeout: Duration,
}

impl<S: CredentialStore> IdentityAdmin<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store, timeout: DEFAULT_STORAGE_TIMEOUT } }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Change `target`'s role. Only admins may do this.
  pub async fn set_role(&self, actor: &Identity, target: Uuid, role: Role) -> Result<Identity> {
    access::restrict_to(actor, &[Role::Admin])?;
    if !bounded(self.timeout, self.store.set_role(target, role)).await? {
      return Err(identity_not_found());
    }
    tracing::info!(actor = %actor.id, %target, %role, "role changed");
    self.reload(target).await
  }

  /// Soft-delete `target` and revoke its refresh token. Its access tokens stop
  /// working on their next use.
  pub async fn deactivate(&self, actor: &Identity, target: Uuid) -> Result<Identity> {
    access::restrict_to(actor, &[Role::Admin])?;
    if actor.id == target {
      return Err(Error::invalid("cannot deactivate your own account"));
    }
    if !bounded(self.timeout, self.store.set_active(target, false)).await? {
      return Err(identity_not_found());
    }
    bounded(self.timeout, self.store.set_refresh_token(target, None)).await?;
    tracing::info!(actor = %actor.id, %target, "identity deactivated");
    self.reload(target).await
  }

  /// Grant the admin role by email without an authenticated actor. This is
  /// the operator path used from the command line.
  pub async fn promote(&self, email: &str) -> Result<Identity> {
    let identity = bounded(
      self.timeout,
      self.store.find_identity_by_email(normalize_email(email)),
    )
    .await?
    .ok_or_else(identity_not_found)?;
    bounded(self.timeout, self.store.set_role(identity.id, Role::Admin)).await?;
    tracing::info!(identity_id = %identity.id, "identity promoted to admin");
    self.reload(identity.id).await
  }

  async fn reload(&self, id: Uuid) -> Result<Identity> {
    bounded(self.timeout, self.store.find_identity(id))
      .await?
      .ok_or_else(identity_not_found)
  }
}

#[cfg(test)]
mod tests {
  use rolo_core::{ErrorKind, identity::NewIdentity};
  use rolo_store_sqlite::SqliteStore;

  use super::*;

  async fn make(store: &SqliteStore, email: &str, role: Role) -> Identity {
    store
      .create_identity(NewIdentity {
        name: "Someone".into(),
        email: email.into(),
        password_hash: "h".into(),
        role,
      })
      .await
      .unwrap()
  }

  async fn setup() -> (IdentityAdmin<SqliteStore>, Arc<SqliteStore>, Identity, Identity) {
    let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
    let admin = make(&store, "root@x.com", Role::Admin).await;
    let user = make(&store, "jane@x.com", Role::User).await;
    (IdentityAdmin::new(store.clone()), store, admin, user)
  }

  #[tokio::test]
  async fn only_admins_change_roles() {
    let (admin_ops, _, admin, user) = setup().await;

    let err = admin_ops.set_role(&user, admin.id, Role::User).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let promoted = admin_ops.set_role(&admin, user.id, Role::Admin).await.unwrap();
    assert_eq!(promoted.role, Role::Admin);

    let err = admin_ops
      .set_role(&admin, Uuid::new_v4(), Role::Admin)
      .await
      .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
  }

  #[tokio::test]
  async fn deactivation_revokes_refresh_token() {
    let (admin_ops, store, admin, user) = setup().await;
    store.set_refresh_token(user.id, Some("digest".into())).await.unwrap();

    let gone = admin_ops.deactivate(&admin, user.id).await.unwrap();
    assert!(!gone.is_active);
    assert!(gone.refresh_token_hash.is_none());

    let err = admin_ops.deactivate(&admin, admin.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
    let err = admin_ops.deactivate(&user, admin.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
  }

  #[tokio::test]
  async fn operator_promotion_by_email() {
    let (admin_ops, _, _, user) = setup().await;
    let promoted = admin_ops.promote(" JANE@x.com").await.unwrap();
    assert_eq!(promoted.id, user.id);
    assert_eq!(promoted.role, Role::Admin);

    let err = admin_ops.promote("nobody@x.com").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
  }
}
