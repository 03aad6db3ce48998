// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store key layout. Every key lives under one configurable prefix.

use musing_core::ItemId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keys {
    prefix: String,
}

impl Keys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn queue(&self) -> String {
        format!("{}:queue", self.prefix)
    }

    pub fn timeline(&self) -> String {
        format!("{}:timeline", self.prefix)
    }

    pub fn item(&self, id: &ItemId) -> String {
        format!("{}:item:{id}", self.prefix)
    }

    pub fn rate_limit(&self) -> String {
        format!("{}:ratelimit:last_generation", self.prefix)
    }

    pub fn visitors(&self) -> String {
        format!("{}:stats:visitors", self.prefix)
    }

    pub fn translation(&self, item_id: &str, lang: &str) -> String {
        format!("{}:translation:{item_id}:{lang}", self.prefix)
    }
}
