//! Extracts the Excalidraw drawing embedded in an Obsidian markdown note and
//! converts it to a Gliffy diagram with external tools.
//!
//! The core is [`extract::extract`]: parse the note, find the single fenced
//! code block tagged `json`, and return its lines byte for byte.

pub mod actions;
pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod extract;
pub mod fs;

pub use error::ExtractionError;
pub use extract::{extract, extract_to};
