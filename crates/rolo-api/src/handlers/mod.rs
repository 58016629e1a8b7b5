//! Route handlers, one module per resource.

pub mod activities;
pub mod admin;
pub mod auth;
pub mod contacts;
pub mod health;
