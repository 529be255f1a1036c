//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into portal use-cases.
//! - Keep boundary layers (CLI, web) decoupled from storage details.

pub mod context;
pub mod portal_service;
pub mod project_service;
pub mod user_directory;
