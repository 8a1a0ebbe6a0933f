use serde::{Deserialize, Serialize};

use crate::input::KeyBindings;

/// How a forward step begins its animation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPlayback {
    /// Begin the step's own trigger; the document chains the sub-elements
    #[default]
    Composite,
    /// Begin every sub-element's `_fwd` trigger in listed order
    Sequential,
}

/// How initial visibility is applied on page entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityMode {
    /// Create (once) and fire a `set` trigger per (element, state)
    #[default]
    Triggers,
    /// Write the visibility attribute directly
    Direct,
}

/// Feature switches for the sequencer.
///
/// The defaults enable everything: backward stepping, crossing page
/// boundaries in both directions, composite step playback and trigger-based
/// visibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub supports_backward_navigation: bool,
    pub supports_cross_page: bool,
    pub playback: StepPlayback,
    pub visibility: VisibilityMode,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_backward_navigation: true,
            supports_cross_page: true,
            playback: StepPlayback::Composite,
            visibility: VisibilityMode::Triggers,
        }
    }
}

impl Capabilities {
    /// Forward-only stepping inside a single page.
    pub fn forward_only() -> Self {
        Self {
            supports_backward_navigation: false,
            supports_cross_page: false,
            ..Self::default()
        }
    }
}

/// Host configuration for a deck session.
///
/// Every field is optional in serialized form so a partial file works.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// Where the manifest is fetched from
    pub manifest_url: String,
    pub capabilities: Capabilities,
    pub keys: KeyBindings,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            manifest_url: "http://localhost:8000/test.json".to_string(),
            capabilities: Capabilities::default(),
            keys: KeyBindings::default(),
        }
    }
}

impl DeckConfig {
    /// Parse a TOML config string.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> crate::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Parse a JSON config string.
    pub fn from_json_str(s: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
