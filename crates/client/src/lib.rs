//! Musicly catalog administration client.
//!
//! Exposes the building blocks (config, session storage, HTTP API, list and
//! detail controllers, authentication flows) so the CLI and integration tests
//! can both access them.

pub mod album_detail;
pub mod api;
pub mod auth;
pub mod config;
pub mod controller;
pub mod envelope;
pub mod error;
pub mod generation;
pub mod notice;
pub mod routes;
pub mod session;
pub mod storage;
