// SPDX-FileCopyrightText: 2026 Musing Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the provider, store, engine, and gateway crates.

use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Text substituted whenever the provider yields no usable content.
pub const PLACEHOLDER_TEXT: &str = "The void speaks in silence...";

/// Maximum number of prior item texts passed to the provider as context.
pub const MAX_CONTEXT_ITEMS: usize = 5;

/// Lowest intensity an item can be generated with.
pub const MIN_INTENSITY: u8 = 70;

/// Highest intensity an item can be generated with.
pub const MAX_INTENSITY: u8 = 100;

/// Unique identifier of a generated item.
///
/// Built from the creation time in epoch milliseconds plus a random suffix,
/// so ids sort roughly by creation and never collide within a process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Generates a fresh id for an item created at `created_at`.
    pub fn generate(created_at: DateTime<Utc>) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", created_at.timestamp_millis(), &suffix[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The state of mind an item is generated under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Flavor {
    PureInspiration,
    DeepFlowState,
    EurekaExtract,
    ZenClarity,
    CosmicPerspective,
    SyntheticSynesthesia,
}

impl Flavor {
    pub const ALL: [Flavor; 6] = [
        Flavor::PureInspiration,
        Flavor::DeepFlowState,
        Flavor::EurekaExtract,
        Flavor::ZenClarity,
        Flavor::CosmicPerspective,
        Flavor::SyntheticSynesthesia,
    ];

    /// Human-readable name used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Flavor::PureInspiration => "Pure Inspiration",
            Flavor::DeepFlowState => "Deep Flow State",
            Flavor::EurekaExtract => "Eureka Extract",
            Flavor::ZenClarity => "Zen Clarity",
            Flavor::CosmicPerspective => "Cosmic Perspective",
            Flavor::SyntheticSynesthesia => "Synthetic Synesthesia",
        }
    }

    /// Effects description woven into the system prompt.
    pub fn effects(&self) -> &'static str {
        match self {
            Flavor::PureInspiration => "heightened creativity, novel connections, artistic vision",
            Flavor::DeepFlowState => "time dilation, effortless focus, peak performance",
            Flavor::EurekaExtract => {
                "sudden insights, breakthrough moments, pattern recognition"
            }
            Flavor::ZenClarity => "mental stillness, pure awareness, profound peace",
            Flavor::CosmicPerspective => {
                "universal connection, big picture thinking, existential wonder"
            }
            Flavor::SyntheticSynesthesia => {
                "cross-domain thinking, sensory blending, metaphor generation"
            }
        }
    }
}

/// The emotional register of an item.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Tone {
    Euphoric,
    Contemplative,
    Transcendent,
    Serene,
    Electric,
    Mystical,
}

impl Tone {
    pub const ALL: [Tone; 6] = [
        Tone::Euphoric,
        Tone::Contemplative,
        Tone::Transcendent,
        Tone::Serene,
        Tone::Electric,
        Tone::Mystical,
    ];
}

/// Descriptive tags drawn at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub flavor: Flavor,
    pub tone: Tone,
    /// Always within `MIN_INTENSITY..=MAX_INTENSITY`.
    pub intensity: u8,
}

impl Attributes {
    /// Draws a flavor, a tone, and an intensity uniformly at random.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        let flavor = *Flavor::ALL
            .choose(rng)
            .unwrap_or(&Flavor::PureInspiration);
        let tone = *Tone::ALL.choose(rng).unwrap_or(&Tone::Contemplative);
        Self {
            flavor,
            tone,
            intensity: rng.gen_range(MIN_INTENSITY..=MAX_INTENSITY),
        }
    }
}

/// The unit of work and of caching. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedItem {
    pub id: ItemId,
    pub text: String,
    #[serde(flatten)]
    pub attributes: Attributes,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl GeneratedItem {
    /// Creates an item, assigning a fresh id.
    ///
    /// Blank `text` is replaced with [`PLACEHOLDER_TEXT`].
    pub fn new(
        text: impl Into<String>,
        attributes: Attributes,
        created_at: DateTime<Utc>,
        language: Option<String>,
    ) -> Self {
        let text = text.into();
        let text = if text.trim().is_empty() {
            PLACEHOLDER_TEXT.to_string()
        } else {
            text.trim().to_string()
        };
        Self {
            id: ItemId::generate(created_at),
            text,
            attributes,
            created_at,
            language,
        }
    }

    /// Ordering score for the timeline (epoch milliseconds).
    pub fn score(&self) -> f64 {
        self.created_at.timestamp_millis() as f64
    }
}

/// An item as returned to a caller, flagged when replayed from the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServedItem {
    #[serde(flatten)]
    pub item: GeneratedItem,
    /// `true` when the item was replayed from the timeline rather than fresh.
    pub cached: bool,
}

impl ServedItem {
    pub fn fresh(item: GeneratedItem) -> Self {
        Self {
            item,
            cached: false,
        }
    }

    pub fn replayed(item: GeneratedItem) -> Self {
        Self { item, cached: true }
    }
}

/// Input to a single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationContext {
    pub attributes: Attributes,
    /// Recent item texts, most recent first, at most [`MAX_CONTEXT_ITEMS`].
    pub recent: Vec<String>,
    /// Output language, if generation is language-tagged.
    pub language: Option<String>,
}

impl GenerationContext {
    pub fn new(attributes: Attributes) -> Self {
        Self {
            attributes,
            recent: Vec::new(),
            language: None,
        }
    }

    /// Attaches prior texts, keeping only the first [`MAX_CONTEXT_ITEMS`].
    pub fn with_recent(mut self, mut recent: Vec<String>) -> Self {
        recent.truncate(MAX_CONTEXT_ITEMS);
        self.recent = recent;
        self
    }

    pub fn with_language(mut self, language: Option<String>) -> Self {
        self.language = language;
        self
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded(_) => "degraded",
            HealthStatus::Unhealthy(_) => "unhealthy",
        }
    }
}

/// Identifies the kind of an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Store,
    Observability,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn attrs() -> Attributes {
        Attributes {
            flavor: Flavor::ZenClarity,
            tone: Tone::Serene,
            intensity: 80,
        }
    }

    #[test]
    fn item_id_starts_with_creation_millis() {
        let at = fixed_time();
        let id = ItemId::generate(at);
        let (millis, suffix) = id.as_str().split_once('-').unwrap();
        assert_eq!(millis, at.timestamp_millis().to_string());
        assert_eq!(suffix.len(), 8);
    }

    #[test]
    fn item_ids_are_unique_for_same_instant() {
        let at = fixed_time();
        let ids: std::collections::HashSet<_> = (0..2000).map(|_| ItemId::generate(at)).collect();
        assert_eq!(ids.len(), 2000);
    }

    #[test]
    fn blank_text_becomes_placeholder() {
        let item = GeneratedItem::new("   \n", attrs(), fixed_time(), None);
        assert_eq!(item.text, PLACEHOLDER_TEXT);
    }

    #[test]
    fn item_json_shape() {
        let item = GeneratedItem::new("a thought", attrs(), fixed_time(), None);
        let served = ServedItem::replayed(item.clone());
        let json = serde_json::to_value(&served).unwrap();
        assert_eq!(json["text"], "a thought");
        assert_eq!(json["flavor"], "zen_clarity");
        assert_eq!(json["tone"], "serene");
        assert_eq!(json["intensity"], 80);
        assert_eq!(json["cached"], true);
        assert!(json.get("language").is_none());

        let back: ServedItem = serde_json::from_value(json).unwrap();
        assert_eq!(back.item, item);
    }

    #[test]
    fn context_keeps_at_most_five_recent() {
        let recent = (0..8).map(|i| format!("t{i}")).collect();
        let ctx = GenerationContext::new(attrs()).with_recent(recent);
        assert_eq!(ctx.recent, vec!["t0", "t1", "t2", "t3", "t4"]);
    }

    #[test]
    fn flavor_parses_from_snake_case() {
        use std::str::FromStr;
        for flavor in Flavor::ALL {
            assert_eq!(Flavor::from_str(&flavor.to_string()).unwrap(), flavor);
        }
        assert_eq!(Tone::from_str("mystical").unwrap(), Tone::Mystical);
    }

    proptest::proptest! {
        #[test]
        fn random_attributes_stay_in_range(seed in proptest::num::u64::ANY) {
            use rand::SeedableRng;
            let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
            let a = Attributes::random(&mut rng);
            proptest::prop_assert!((MIN_INTENSITY..=MAX_INTENSITY).contains(&a.intensity));
        }
    }
}
