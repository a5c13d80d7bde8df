//! Anchoring pull request review comments to evolving documents.
//!
//! This crate owns unified-diff parsing, the line and diff-position mappers,
//! comment re-anchoring, thread grouping and reconciliation, and the comment
//! provider facade that ties them to a diff provider and a review backend.

pub mod anchor;
pub mod backend;
pub mod config;
pub mod core;
pub mod diff;
pub mod document;
pub mod model;
pub mod observers;
pub mod scm;
pub mod store;
pub mod threads;
