//! Core tusk library (config, session, API client, auth and task flows).

pub mod api;
pub mod auth;
pub mod config;
pub mod session;
pub mod tasks;
