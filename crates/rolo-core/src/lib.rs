//! Core types and trait definitions for the Rolo contact service.
//!
//! This crate is deliberately free of HTTP, token, and database dependencies.
//! It owns the identity and contact model, the error taxonomy, the storage
//! traits, and the two pieces of policy that every caller shares: the
//! authorization gate and the audit recorder.

pub mod access;
pub mod activity;
pub mod audit;
pub mod contact;
pub mod contacts;
pub mod diff;
pub mod error;
pub mod identity;
pub mod page;
pub mod store;
pub mod timeout;
pub mod validate;

pub use error::{Error, ErrorKind, Result};
