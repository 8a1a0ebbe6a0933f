//! Static deck description: pages, initial visibility and ordered steps.

use serde::{Deserialize, Serialize};

use crate::{DeckError, Result};

/// One playable animation unit.
///
/// `id` names the trigger that begins the whole step; `anim_order` lists the
/// sub-element trigger base ids in playback order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    #[serde(default)]
    pub anim_order: Vec<String>,
}

impl Step {
    /// Create a step from its composite id and ordered sub-element ids.
    pub fn new(id: impl Into<String>, anim_order: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            id: id.into(),
            anim_order: anim_order.into_iter().map(Into::into).collect(),
        }
    }

    /// Forward trigger ids in playback order.
    pub fn forward_triggers(&self) -> impl Iterator<Item = String> + '_ {
        self.anim_order.iter().map(|sub| forward_trigger_id(sub))
    }

    /// Reverse trigger ids in undo order (last sub-element first).
    pub fn reverse_triggers(&self) -> impl Iterator<Item = String> + '_ {
        self.anim_order.iter().rev().map(|sub| reverse_trigger_id(sub))
    }
}

/// A single page of the deck.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Id of the page's top-level group
    pub page_id: String,
    /// Elements forced visible on page entry
    #[serde(default)]
    pub init_visible: Vec<String>,
    /// Elements forced hidden on page entry
    #[serde(default)]
    pub init_hidden: Vec<String>,
    /// Steps in authoring order
    #[serde(default, rename = "animations")]
    pub steps: Vec<Step>,
}

impl Page {
    /// Create a page with no initial visibility lists.
    pub fn new(page_id: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            page_id: page_id.into(),
            steps,
            ..Default::default()
        }
    }

    /// Id of the page's background element.
    pub fn background_id(&self) -> String {
        format!("{}_bg", self.page_id)
    }

    #[inline]
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// The whole deck, loaded once and immutable afterwards.
///
/// ## Example
///
/// ```rust
/// use deck_stepper::Manifest;
///
/// let manifest = Manifest::from_json_str(r#"{
///     "pages": [
///         { "page_id": "page_0", "init_hidden": ["obj_a"], "init_visible": [],
///           "animations": [ { "id": "a_0", "anim_order": ["a_0"] } ] }
///     ]
/// }"#).unwrap();
///
/// assert_eq!(manifest.page_count(), 1);
/// assert_eq!(manifest.pages[0].steps[0].id, "a_0");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// HTML document the manifest was generated alongside
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_file: Option<String>,
    pub pages: Vec<Page>,
}

impl Manifest {
    /// Build a manifest from pages, rejecting an empty deck.
    pub fn new(pages: Vec<Page>) -> Result<Self> {
        let manifest = Self {
            html_file: None,
            pages,
        };
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parse and validate a JSON manifest.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(s)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Parse and validate a JSON manifest from raw bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let manifest: Self = serde_json::from_slice(bytes)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// A deck needs at least one page so that a current page always exists.
    pub fn validate(&self) -> Result<()> {
        if self.pages.is_empty() {
            return Err(DeckError::EmptyManifest);
        }
        Ok(())
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    #[inline]
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Index of the page with the given group id.
    pub fn page_index(&self, page_id: &str) -> Option<usize> {
        self.pages.iter().position(|p| p.page_id == page_id)
    }
}

/// Forward trigger id for a sub-element.
pub fn forward_trigger_id(sub: &str) -> String {
    format!("{sub}_fwd")
}

/// Reverse trigger id for a sub-element.
pub fn reverse_trigger_id(sub: &str) -> String {
    format!("{sub}_rev")
}
