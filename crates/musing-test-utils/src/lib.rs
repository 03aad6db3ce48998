// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Musing integration tests.
//!
//! Provides mock adapters for fast, deterministic, CI-runnable tests without
//! external services.
//!
//! # Components
//!
//! - [`MockProvider`] - Scripted generation provider with call capture
//! - [`FailingStore`] - Key-value store whose every operation fails

pub mod failing_store;
pub mod mock_provider;

pub use failing_store::FailingStore;
pub use mock_provider::{MockProvider, MockReply};
