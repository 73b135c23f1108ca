//! # pdx-core
//!
//! Core types, error hierarchy, and configuration shared by every
//! paperdex crate:
//! - [`Paper`] and [`ArtifactPaths`]: a paper and its cached artifacts
//! - [`EntitySpan`] and [`EntitiesArtifact`]: extraction output
//! - [`EntityKind`]: the entity categories the query language can name
//! - Error hierarchy ([`PdxError`], [`QueryError`], [`ExtractError`])
//! - [`Config`]: `paperdex.toml` settings

pub mod config;
pub mod entity;
pub mod error;
pub mod paper;

pub use config::Config;
pub use entity::{EntitiesArtifact, EntityKind, EntitySpan};
pub use error::{ExtractError, PdxError, QueryError, Result};
pub use paper::{ArtifactPaths, Paper};
