//! Link Annotator Server Library
//!
//! Rewrites external links in rendered content into numbered annotations
//! with an appended references list. The server binary is in main.rs.
//!
//! # Modules
//!
//! - `annotator`: Link classification, title resolution and content rewriting
//! - `cache`: Expiring title cache backends
//! - `editor`: Per-content enable control
//! - `routes`: HTTP API

pub mod annotator;
pub mod cache;
pub mod config;
pub mod db;
pub mod editor;
pub mod error;
pub mod routes;
pub mod state;
