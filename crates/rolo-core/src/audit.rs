//! The audit recorder, sole writer of the activity log.
//!
//! Recording is best-effort: the mutation that triggered it has already been
//! committed, so an append failure is logged and swallowed rather than
//! surfaced or rolled back.

use std::{sync::Arc, time::Duration};

use uuid::Uuid;

use crate::{
  Result, access,
  activity::{ActivityAction, ActivityRecord, Auditable, Changes, NewActivity},
  identity::Identity,
  page::{self, Page, Pagination},
  store::ActivityStore,
  timeout::{DEFAULT_STORAGE_TIMEOUT, bounded},
};

/// Default page size for activity listings.
pub const DEFAULT_ACTIVITY_LIMIT: u32 = 20;

pub struct AuditRecorder<S> {
  store:   Arc<S>,
  timeout: Duration,
}

impl<S> Clone for AuditRecorder<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), timeout: self.timeout }
  }
}

impl<S: ActivityStore> AuditRecorder<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, timeout: DEFAULT_STORAGE_TIMEOUT }
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  /// Append an activity record for `resource`.
  ///
  /// The label is taken from the resource now, not re-derived later. A
  /// change map is kept only for [`ActivityAction::Update`].
  pub async fn record<R: Auditable>(
    &self,
    action: ActivityAction,
    resource: &R,
    performed_by: Uuid,
    changes: Option<Changes>,
  ) {
    let input = NewActivity {
      action,
      entity_type: R::ENTITY_TYPE.to_owned(),
      entity_id: resource.entity_id(),
      entity_label: resource.entity_label(),
      performed_by,
      changes: match action {
        ActivityAction::Update => Some(changes.unwrap_or_default()),
        ActivityAction::Create | ActivityAction::Delete => None,
      },
    };

    if let Err(e) = bounded(self.timeout, self.store.append_activity(input)).await {
      tracing::error!(
        %action,
        entity_type = R::ENTITY_TYPE,
        entity_id = %resource.entity_id(),
        error = %e,
        "failed to record activity"
      );
    }
  }

  /// Activity visible to `identity`, newest first.
  pub async fn list(
    &self,
    identity: &Identity,
    page: Option<u32>,
    limit: Option<u32>,
  ) -> Result<Page<ActivityRecord>> {
    let (page, limit) = page::clamp(page, limit, DEFAULT_ACTIVITY_LIMIT);
    let filter = access::activity_filter(identity);
    let (items, total) = bounded(
      self.timeout,
      self.store.list_activities(filter, page, limit),
    )
    .await?;
    Ok(Page { items, pagination: Pagination::new(page, limit, total) })
  }
}
