//! Contact operations with ownership scoping and auditing.
//!
//! Each operation takes the authenticated identity as an explicit argument,
//! resolves its [`Scope`](crate::access::Scope) through the authorization
//! gate, and hands every successful mutation to the [`AuditRecorder`].
//!
//! A mutation and its audit record run together as one detached task. When
//! the storage deadline passes the caller gets `Unavailable`, but a write
//! that still commits afterwards is audited all the same.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
  Error, Result, access,
  activity::ActivityAction,
  audit::AuditRecorder,
  contact::{Contact, ContactPatch, ContactQuery, NewContact},
  diff::diff,
  identity::{Identity, normalize_email},
  page::{self, Page, Pagination},
  store::{ActivityStore, ContactStore},
  timeout::{DEFAULT_STORAGE_TIMEOUT, bounded, detached},
  validate,
};

/// Default page size for contact listings.
pub const DEFAULT_CONTACT_LIMIT: u32 = 10;

fn contact_not_found() -> Error { Error::not_found("contact not found") }

pub struct ContactService<S> {
  store:   Arc<S>,
  audit:   AuditRecorder<S>,
  timeout: Duration,
}

impl<S> Clone for ContactService<S> {
  fn clone(&self) -> Self {
    Self {
      store:   self.store.clone(),
      audit:   self.audit.clone(),
      timeout: self.timeout,
    }
  }
}

impl<S> ContactService<S>
where
  S: ContactStore + ActivityStore + 'static,
{
  pub fn new(store: Arc<S>) -> Self {
    Self {
      audit: AuditRecorder::new(store.clone()),
      store,
      timeout: DEFAULT_STORAGE_TIMEOUT,
    }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.audit = self.audit.with_timeout(timeout);
    self.timeout = timeout;
    self
  }

  pub fn audit(&self) -> &AuditRecorder<S> { &self.audit }

  /// Create a contact owned by `actor`.
  pub async fn create(&self, actor: &Identity, mut input: NewContact) -> Result<Contact> {
    validate::new_contact(&input)?;
    input.name = input.name.trim().to_owned();
    input.email = normalize_email(&input.email);

    let this = self.clone();
    let actor_id = actor.id;
    detached(self.timeout, async move {
      let contact = this
        .store
        .insert_contact(actor_id, input)
        .await
        .map_err(Into::<Error>::into)?;
      this
        .audit
        .record(ActivityAction::Create, &contact, actor_id, None)
        .await;
      Ok(contact)
    })
    .await
  }

  pub async fn get(&self, actor: &Identity, id: Uuid) -> Result<Contact> {
    let scope = access::scope_for(actor);
    bounded(self.timeout, self.store.get_contact(scope, id))
      .await?
      .ok_or_else(contact_not_found)
  }

  /// Apply a partial update and record the field-level diff.
  pub async fn update(
    &self,
    actor: &Identity,
    id: Uuid,
    mut patch: ContactPatch,
  ) -> Result<Contact> {
    validate::contact_patch(&patch)?;
    patch.name = patch.name.map(|n| n.trim().to_owned());
    patch.email = patch.email.as_deref().map(normalize_email);

    let scope = access::scope_for(actor);
    let this = self.clone();
    let actor_id = actor.id;
    detached(self.timeout, async move {
      let (before, after) = this
        .store
        .update_contact(scope, id, patch)
        .await
        .map_err(Into::<Error>::into)?
        .ok_or_else(contact_not_found)?;

      let changes = diff(&before, &after);
      this
        .audit
        .record(ActivityAction::Update, &after, actor_id, Some(changes))
        .await;
      Ok(after)
    })
    .await
  }

  pub async fn delete(&self, actor: &Identity, id: Uuid) -> Result<()> {
    let scope = access::scope_for(actor);
    let this = self.clone();
    let actor_id = actor.id;
    detached(self.timeout, async move {
      let removed = this
        .store
        .delete_contact(scope, id)
        .await
        .map_err(Into::<Error>::into)?
        .ok_or_else(contact_not_found)?;
      this
        .audit
        .record(ActivityAction::Delete, &removed, actor_id, None)
        .await;
      Ok(())
    })
    .await
  }

  /// One page of the contacts visible to `actor`.
  pub async fn list(&self, actor: &Identity, query: ContactQuery) -> Result<Page<Contact>> {
    let (page, limit) =
      page::clamp(Some(query.page), Some(query.limit), DEFAULT_CONTACT_LIMIT);
    let mut query = access::scoped_query(actor, query);
    query.page = page;
    query.limit = limit;
    query.text = query
      .text
      .map(|t| t.trim().to_owned())
      .filter(|t| !t.is_empty());

    let (items, total) = bounded(self.timeout, self.store.list_contacts(&query)).await?;
    Ok(Page { items, pagination: Pagination::new(page, limit, total) })
  }
}
