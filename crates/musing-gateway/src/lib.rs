// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Musing generation service.
//!
//! Thin axum layer over [`musing_engine::Engine`]: handlers translate engine
//! outcomes into status codes and JSON bodies and hold no state of their own.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
