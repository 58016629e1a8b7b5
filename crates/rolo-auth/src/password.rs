//! Password hashing.

use argon2::{
  Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
  password_hash::SaltString,
};
use rand_core::OsRng;
use rolo_core::{Error, Result};

/// An opaque hash/verify capability. Plaintext passwords go in, PHC strings
/// come out; nothing else in the workspace looks inside a hash.
pub trait PasswordScheme: Send + Sync {
  fn hash(&self, password: &str) -> Result<String>;

  /// `false` for a wrong password and for a hash that cannot be parsed.
  fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id with a fresh random salt per hash.
#[derive(Clone, Default)]
pub struct Argon2Scheme {
  params: Params,
}

impl Argon2Scheme {
  /// Use non-default cost parameters. Verification always reads the
  /// parameters back out of the stored hash.
  pub fn with_params(params: Params) -> Self { Self { params } }
}

impl PasswordScheme for Argon2Scheme {
  fn hash(&self, password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(
      Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Internal(format!("argon2 error: {e}")))?
        .to_string(),
    )
  }

  fn verify(&self, password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
      return false;
    };
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn cheap() -> Argon2Scheme { Argon2Scheme::with_params(Params::new(8, 1, 1, None).unwrap()) }

  #[test]
  fn hash_then_verify() {
    let scheme = cheap();
    let hash = scheme.hash("Abcd1234").unwrap();
    assert!(hash.starts_with("$argon2id$"));
    assert!(scheme.verify("Abcd1234", &hash));
    assert!(!scheme.verify("abcd1234", &hash));
  }

  #[test]
  fn salts_differ() {
    let scheme = cheap();
    assert_ne!(scheme.hash("Abcd1234").unwrap(), scheme.hash("Abcd1234").unwrap());
  }

  #[test]
  fn garbage_hash_does_not_verify() {
    assert!(!cheap().verify("Abcd1234", "plaintext"));
  }
}
