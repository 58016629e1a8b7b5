//! [`SqliteStore`]: the SQLite implementation of the Rolo storage traits.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{ErrorCode, OptionalExtension as _};
use uuid::Uuid;

use rolo_core::{
  access::Scope,
  activity::{ActivityRecord, NewActivity},
  contact::{Contact, ContactPatch, ContactQuery, NewContact, SortField, SortOrder},
  identity::{Identity, NewIdentity, Role},
  page,
  store::{ActivityStore, Backend, ContactStore, CredentialStore},
};

use crate::{
  Error, Result,
  encode::{
    ACTIVITY_COLUMNS, ACTIVITY_SOURCE, CONTACT_COLUMNS, CONTACT_SOURCE, IDENTITY_COLUMNS,
    RawActivity, RawContact,
    RawIdentity, encode_changes, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rolo store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run raw SQL against the connection. Only used by tests to poke at
  /// invariants the public API cannot reach.
  #[cfg(test)]
  pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<usize> {
    Ok(self.conn.call(move |conn| Ok(conn.execute(sql, [])?)).await?)
  }
}

/// Map a closed [`SortField`] to a fixed SQL column expression.
fn sort_column(field: SortField) -> &'static str {
  match field {
    SortField::CreatedAt => "c.created_at",
    SortField::UpdatedAt => "c.updated_at",
    SortField::Name => "c.name COLLATE NOCASE",
    SortField::Email => "c.email COLLATE NOCASE",
    SortField::Company => "c.company COLLATE NOCASE",
    SortField::Status => "c.status",
  }
}

/// One contact by id, with `?2` as an optional owner filter.
fn scoped_contact_select() -> String {
  format!(
    "SELECT {CONTACT_COLUMNS} FROM {CONTACT_SOURCE}
     WHERE c.id = ?1 AND (?2 IS NULL OR c.owner_id = ?2)"
  )
}

fn sort_direction(order: SortOrder) -> &'static str {
  match order {
    SortOrder::Asc => "ASC",
    SortOrder::Desc => "DESC",
  }
}

/// Escape LIKE wildcards so the search text matches literally.
fn like_pattern(text: &str) -> String {
  let mut escaped = String::with_capacity(text.len() + 2);
  escaped.push('%');
  for c in text.chars() {
    if matches!(c, '\\' | '%' | '_') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped.push('%');
  escaped
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
  matches!(e, rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::ConstraintViolation)
}

impl Backend for SqliteStore {
  type Error = Error;
}

// ─── CredentialStore impl ────────────────────────────────────────────────────

impl CredentialStore for SqliteStore {
  async fn create_identity(&self, input: NewIdentity) -> Result<Identity> {
    let identity = Identity {
      id:                 Uuid::new_v4(),
      name:               input.name,
      email:              input.email,
      password_hash:      input.password_hash,
      role:               input.role,
      is_active:          true,
      refresh_token_hash: None,
      last_login:         None,
      created_at:         Utc::now(),
    };

    let id_str    = encode_uuid(identity.id);
    let name      = identity.name.clone();
    let email     = identity.email.clone();
    let hash      = identity.password_hash.clone();
    let role_str  = identity.role.to_string();
    let at_str    = encode_dt(identity.created_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM identities WHERE email = ?1",
            rusqlite::params![email],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if taken {
          return Ok(false);
        }

        match conn.execute(
          "INSERT INTO identities (id, name, email, password_hash, role, is_active, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6)",
          rusqlite::params![id_str, name, email, hash, role_str, at_str],
        ) {
          Ok(_) => Ok(true),
          // A concurrent signup slipped in between the check and the insert.
          Err(e) if is_constraint_violation(&e) => Ok(false),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    if !inserted {
      return Err(Error::EmailTaken(identity.email));
    }
    Ok(identity)
  }

  async fn find_identity(&self, id: Uuid) -> Result<Option<Identity>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = ?1"),
            rusqlite::params![id_str],
            RawIdentity::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn find_identity_by_email(&self, email: String) -> Result<Option<Identity>> {
    let raw: Option<RawIdentity> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = ?1"),
            rusqlite::params![email],
            RawIdentity::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawIdentity::into_identity).transpose()
  }

  async fn set_refresh_token(&self, id: Uuid, token_hash: Option<String>) -> Result<()> {
    let id_str = encode_uuid(id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE identities SET refresh_token_hash = ?2 WHERE id = ?1",
          rusqlite::params![id_str, token_hash],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn swap_refresh_token(
    &self,
    id:          Uuid,
    expected:    String,
    replacement: String,
  ) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE identities SET refresh_token_hash = ?3
           WHERE id = ?1 AND refresh_token_hash = ?2",
          rusqlite::params![id_str, expected, replacement],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE identities SET last_login = ?2 WHERE id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn set_active(&self, id: Uuid, active: bool) -> Result<bool> {
    let id_str = encode_uuid(id);

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE identities SET is_active = ?2 WHERE id = ?1",
          rusqlite::params![id_str, active],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }

  async fn set_role(&self, id: Uuid, role: Role) -> Result<bool> {
    let id_str   = encode_uuid(id);
    let role_str = role.to_string();

    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE identities SET role = ?2 WHERE id = ?1",
          rusqlite::params![id_str, role_str],
        )?)
      })
      .await?;

    Ok(changed == 1)
  }
}

// ─── ContactStore impl ───────────────────────────────────────────────────────

impl ContactStore for SqliteStore {
  async fn insert_contact(&self, owner: Uuid, input: NewContact) -> Result<Contact> {
    let id_str     = encode_uuid(Uuid::new_v4());
    let owner_str  = encode_uuid(owner);
    let status_str = input.status.to_string();
    let at_str     = encode_dt(Utc::now());

    let raw: RawContact = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO contacts (
             id, owner_id, name, email, phone, company, status, notes,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
          rusqlite::params![
            id_str,
            owner_str,
            input.name,
            input.email,
            input.phone,
            input.company,
            status_str,
            input.notes,
            at_str,
          ],
        )?;
        let raw = conn.query_row(
          &scoped_contact_select(),
          rusqlite::params![id_str, Option::<String>::None],
          RawContact::from_row,
        )?;
        Ok(raw)
      })
      .await?;

    raw.into_contact()
  }

  async fn get_contact(&self, scope: Scope, id: Uuid) -> Result<Option<Contact>> {
    let id_str    = encode_uuid(id);
    let owner_str = scope.owner().map(encode_uuid);

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &scoped_contact_select(),
            rusqlite::params![id_str, owner_str],
            RawContact::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn update_contact(
    &self,
    scope: Scope,
    id:    Uuid,
    patch: ContactPatch,
  ) -> Result<Option<(Contact, Contact)>> {
    let id_str     = encode_uuid(id);
    let owner_str  = scope.owner().map(encode_uuid);
    let status_str = patch.status.map(|s| s.to_string());
    let at_str     = encode_dt(Utc::now());

    let raws: Option<(RawContact, RawContact)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let select = scoped_contact_select();

        let Some(before) = tx
          .query_row(&select, rusqlite::params![id_str, owner_str], RawContact::from_row)
          .optional()?
        else {
          return Ok(None);
        };

        tx.execute(
          "UPDATE contacts SET
             name       = COALESCE(?2, name),
             email      = COALESCE(?3, email),
             phone      = COALESCE(?4, phone),
             company    = COALESCE(?5, company),
             status     = COALESCE(?6, status),
             notes      = COALESCE(?7, notes),
             updated_at = ?8
           WHERE id = ?1",
          rusqlite::params![
            id_str,
            patch.name,
            patch.email,
            patch.phone,
            patch.company,
            status_str,
            patch.notes,
            at_str,
          ],
        )?;

        let after =
          tx.query_row(&select, rusqlite::params![id_str, owner_str], RawContact::from_row)?;
        tx.commit()?;
        Ok(Some((before, after)))
      })
      .await?;

    raws
      .map(|(before, after)| Ok((before.into_contact()?, after.into_contact()?)))
      .transpose()
  }

  async fn delete_contact(&self, scope: Scope, id: Uuid) -> Result<Option<Contact>> {
    let id_str    = encode_uuid(id);
    let owner_str = scope.owner().map(encode_uuid);

    let raw: Option<RawContact> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let removed = tx
          .query_row(
            &scoped_contact_select(),
            rusqlite::params![id_str, owner_str],
            RawContact::from_row,
          )
          .optional()?;
        if removed.is_some() {
          tx.execute("DELETE FROM contacts WHERE id = ?1", rusqlite::params![id_str])?;
        }
        tx.commit()?;
        Ok(removed)
      })
      .await?;

    raw.map(RawContact::into_contact).transpose()
  }

  async fn list_contacts<'a>(
    &'a self,
    query: &'a ContactQuery,
  ) -> Result<(Vec<Contact>, u64)> {
    let owner_str  = query.owner.map(encode_uuid);
    let pattern    = query.text.as_deref().map(like_pattern);
    let status_str = query.status.map(|s| s.to_string());
    let limit_val  = i64::from(query.limit);
    let offset_val = i64::try_from(page::offset(query.page, query.limit)).unwrap_or(i64::MAX);
    let column     = sort_column(query.sort);
    let direction  = sort_direction(query.order);

    let (raws, total): (Vec<RawContact>, i64) = self
      .conn
      .call(move |conn| {
        let filter = "WHERE (?1 IS NULL OR c.owner_id = ?1)
             AND (?2 IS NULL OR c.name LIKE ?2 ESCAPE '\\' OR c.email LIKE ?2 ESCAPE '\\')
             AND (?3 IS NULL OR c.status = ?3)";

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM contacts c {filter}"),
          rusqlite::params![owner_str, pattern, status_str],
          |r| r.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {CONTACT_COLUMNS} FROM {CONTACT_SOURCE} {filter}
           ORDER BY {column} {direction}, c.rowid {direction}
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![owner_str, pattern, status_str, limit_val, offset_val],
            RawContact::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
      })
      .await?;

    let contacts = raws
      .into_iter()
      .map(RawContact::into_contact)
      .collect::<Result<_>>()?;
    Ok((contacts, u64::try_from(total).unwrap_or_default()))
  }
}

// ─── ActivityStore impl ──────────────────────────────────────────────────────

impl ActivityStore for SqliteStore {
  async fn append_activity(&self, input: NewActivity) -> Result<ActivityRecord> {
    let id_str        = encode_uuid(Uuid::new_v4());
    let action_str    = input.action.to_string();
    let entity_id_str = encode_uuid(input.entity_id);
    let performer_str = encode_uuid(input.performed_by);
    let changes_str   = encode_changes(input.changes.as_ref())?;
    let at_str        = encode_dt(Utc::now());

    let raw: RawActivity = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO activities (
             id, action, entity_type, entity_id, entity_label,
             performed_by, changes, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            action_str,
            input.entity_type,
            entity_id_str,
            input.entity_label,
            performer_str,
            changes_str,
            at_str,
          ],
        )?;
        let raw = conn.query_row(
          &format!("SELECT {ACTIVITY_COLUMNS} FROM {ACTIVITY_SOURCE} WHERE a.id = ?1"),
          rusqlite::params![id_str],
          RawActivity::from_row,
        )?;
        Ok(raw)
      })
      .await?;

    raw.into_record()
  }

  async fn list_activities(
    &self,
    performed_by: Option<Uuid>,
    page:         u32,
    limit:        u32,
  ) -> Result<(Vec<ActivityRecord>, u64)> {
    let performer_str = performed_by.map(encode_uuid);
    let limit_val     = i64::from(limit);
    let offset_val    = i64::try_from(page::offset(page, limit)).unwrap_or(i64::MAX);

    let (raws, total): (Vec<RawActivity>, i64) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          "SELECT COUNT(*) FROM activities a WHERE ?1 IS NULL OR a.performed_by = ?1",
          rusqlite::params![performer_str],
          |r| r.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {ACTIVITY_COLUMNS} FROM {ACTIVITY_SOURCE}
           WHERE ?1 IS NULL OR a.performed_by = ?1
           ORDER BY a.created_at DESC, a.rowid DESC
           LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![performer_str, limit_val, offset_val],
            RawActivity::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
      })
      .await?;

    let records = raws
      .into_iter()
      .map(RawActivity::into_record)
      .collect::<Result<_>>()?;
    Ok((records, u64::try_from(total).unwrap_or_default()))
  }
}
