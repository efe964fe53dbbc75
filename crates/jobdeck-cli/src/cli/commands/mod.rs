//! Command handlers.

pub mod applications;
pub mod auth;
pub mod config;
pub mod favorites;
pub mod jobs;
pub mod profile;

use jobdeck_core::session::SessionController;
use jobdeck_core::session::credentials::FileCredentialStore;

/// The controller every session-bound command works against.
pub type Controller = SessionController<FileCredentialStore>;
