//! Core infrastructure for rubric.
//!
//! This crate provides language-agnostic primitives shared by the other
//! rubric crates:
//!
//! - [`hash`]: SHA-256 content hashes used for convergence checks
//! - [`text`]: byte offset and line/column conversion, line splitting

pub mod hash;
pub mod text;

pub use hash::ContentHash;
pub use text::LineIndex;
