//! Field-level diff between two versions of a contact.
//!
//! Produces the `changes` map of an UPDATE activity record. Only fields whose
//! value differs appear; unchanged fields are omitted entirely rather than
//! recorded with equal `from`/`to`.

use serde_json::{Value, json};

use crate::{
  activity::{Changes, FieldChange},
  contact::Contact,
};

/// Compare the mutable fields of `before` and `after`.
pub fn diff(before: &Contact, after: &Contact) -> Changes {
  let fields: [(&str, Value, Value); 6] = [
    ("name", json!(before.name), json!(after.name)),
    ("email", json!(before.email), json!(after.email)),
    ("phone", json!(before.phone), json!(after.phone)),
    ("company", json!(before.company), json!(after.company)),
    ("status", json!(before.status), json!(after.status)),
    ("notes", json!(before.notes), json!(after.notes)),
  ];

  fields
    .into_iter()
    .filter(|(_, from, to)| from != to)
    .map(|(field, from, to)| (field.to_owned(), FieldChange { from, to }))
    .collect()
}
