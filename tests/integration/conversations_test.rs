//! Postgres-backed integration tests for the messaging API
//!
//! Requires `TEST_DATABASE_URL` (or `DATABASE_URL`) pointing at a database
//! the tests may migrate.

#![allow(dead_code)]

mod common;
mod conversations;
mod invariants;
