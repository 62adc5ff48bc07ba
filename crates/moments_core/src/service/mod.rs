//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into the entry points presentation
//!   collaborators use (capture, gallery, map, detail).
//! - Keep callers decoupled from on-disk details.

pub mod moment_service;
