//! `curio-api` — HTTP surface over the reservation/checkout engine.
//!
//! Identity is an explicit request field (`user_id`), resolved by an external
//! collaborator; this crate never parses tokens.

pub mod app;
pub mod config;
