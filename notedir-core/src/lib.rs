//! Core of notedir: reconciles calendar events with a markdown notes vault.
//!
//! This crate provides the types and engines used by notedir-cli:
//! - `event` and `google` for the calendar input
//! - `filter`, `people`, `attachment` and `drive` for classification and resolution
//! - `document` and `index` for the idempotent note merge
//! - `sync` for the end-to-end run and its report

pub mod attachment;
pub mod command;
pub mod config;
pub mod date_format;
pub mod document;
pub mod drive;
pub mod error;
pub mod event;
pub mod filter;
pub mod google;
pub mod index;
pub mod meeting;
pub mod people;
pub mod sync;
pub mod vault;

// Re-export event types at crate root for convenience
pub use event::*;
