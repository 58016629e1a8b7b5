//! Input validation for signup and contact payloads.
//!
//! Every check fails with [`Error::Invalid`] and a message naming the field.

use crate::{
  Error, Result,
  contact::{ContactPatch, NewContact},
};

fn char_len_between(field: &str, value: &str, min: usize, max: usize) -> Result<()> {
  let len = value.trim().chars().count();
  if len < min || len > max {
    return Err(Error::invalid(format!(
      "{field} must be {min}-{max} characters"
    )));
  }
  Ok(())
}

fn at_most(field: &str, value: Option<&str>, max: usize) -> Result<()> {
  match value {
    Some(v) if v.chars().count() > max => Err(Error::invalid(format!(
      "{field} cannot exceed {max} characters"
    ))),
    _ => Ok(()),
  }
}

pub fn identity_name(name: &str) -> Result<()> { char_len_between("name", name, 2, 50) }

/// `local@domain.tld` with no whitespace.
pub fn email(email: &str) -> Result<()> {
  let email = email.trim();
  let valid = !email.chars().any(char::is_whitespace)
    && matches!(email.split_once('@'), Some((local, domain))
      if !local.is_empty()
        && !domain.contains('@')
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty()));
  if valid {
    Ok(())
  } else {
    Err(Error::invalid("valid email required"))
  }
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a
/// digit.
pub fn password(password: &str) -> Result<()> {
  if password.chars().count() < 8 {
    return Err(Error::invalid("password must be at least 8 characters"));
  }
  let upper = password.chars().any(char::is_uppercase);
  let lower = password.chars().any(char::is_lowercase);
  let digit = password.chars().any(|c| c.is_ascii_digit());
  if upper && lower && digit {
    Ok(())
  } else {
    Err(Error::invalid(
      "password must contain uppercase, lowercase, and a number",
    ))
  }
}

/// 7–15 digits, optionally separated by `+ ( ) - .` or spaces.
pub fn phone(phone: &str) -> Result<()> {
  let allowed = phone
    .chars()
    .all(|c| c.is_ascii_digit() || matches!(c, '+' | '(' | ')' | '-' | '.' | ' '));
  let digits = phone.chars().filter(char::is_ascii_digit).count();
  if allowed && (7..=15).contains(&digits) {
    Ok(())
  } else {
    Err(Error::invalid("invalid phone number"))
  }
}

pub fn new_contact(input: &NewContact) -> Result<()> {
  char_len_between("name", &input.name, 2, 100)?;
  email(&input.email)?;
  if let Some(p) = &input.phone {
    phone(p)?;
  }
  at_most("company", input.company.as_deref(), 100)?;
  at_most("notes", input.notes.as_deref(), 1000)
}

pub fn contact_patch(patch: &ContactPatch) -> Result<()> {
  if let Some(name) = &patch.name {
    char_len_between("name", name, 2, 100)?;
  }
  if let Some(e) = &patch.email {
    email(e)?;
  }
  if let Some(p) = &patch.phone {
    phone(p)?;
  }
  at_most("company", patch.company.as_deref(), 100)?;
  at_most("notes", patch.notes.as_deref(), 1000)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn emails() {
    assert!(email("jane@x.com").is_ok());
    assert!(email(" Jane@Example.co.uk ").is_ok());
    assert!(email("jane@x").is_err());
    assert!(email("jane x@x.com").is_err());
    assert!(email("@x.com").is_err());
    assert!(email("jane@@x.com").is_err());
    assert!(email("jane@x..com").is_err());
  }

  #[test]
  fn passwords() {
    assert!(password("Abcd1234").is_ok());
    assert!(password("abcd1234").is_err());
    assert!(password("ABCD1234").is_err());
    assert!(password("Abcdefgh").is_err());
    assert!(password("Ab1").is_err());
  }

  #[test]
  fn phones() {
    assert!(phone("+1 (555) 123-4567").is_ok());
    assert!(phone("555.123.4567").is_ok());
    assert!(phone("12345").is_err());
    assert!(phone("555-CALL-NOW").is_err());
  }

  #[test]
  fn contact_limits() {
    let mut input = NewContact {
      name: "Al".into(),
      email: "al@example.com".into(),
      ..Default::default()
    };
    assert!(new_contact(&input).is_ok());

    input.notes = Some("x".repeat(1001));
    assert!(new_contact(&input).is_err());

    input.notes = None;
    input.name = "A".into();
    assert!(new_contact(&input).is_err());
  }

  #[test]
  fn empty_patch_is_valid() {
    assert!(contact_patch(&ContactPatch::default()).is_ok());
  }
}
