// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Musing generation service.
//!
//! This crate provides the item model, the error taxonomy, and the adapter
//! traits for the two external collaborators: the generation provider and the
//! key-value store. Every other crate in the workspace builds on these.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{MusingError, ProviderError, ServingError, StoreError};
pub use types::{
    AdapterType, Attributes, Flavor, GeneratedItem, GenerationContext, HealthStatus, ItemId,
    ServedItem, Tone,
};

pub use traits::{GenerationProvider, KeyValueStore, PluginAdapter};
