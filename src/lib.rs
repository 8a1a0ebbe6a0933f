//! # deck-stepper
//!
//! Step sequencing core for animated multi-page SVG slide decks.
//!
//! A deck is an SVG document with one top-level group per page plus a JSON
//! manifest that lists, per page, the elements to show or hide on entry and
//! the ordered animation steps. This crate provides platform-agnostic logic for:
//! - Loading and validating the manifest
//! - Stepping forward and backward through a page's steps
//! - Crossing page boundaries in both directions
//! - Seeking to any step of the current page
//! - Mapping key presses to navigation commands
//!
//! The rendered document is reached only through the [`ElementRegistry`]
//! trait; [`MemoryRegistry`] is a headless implementation.
//!
//! ## Features
//!
//! - `toml` - Parse [`DeckConfig`] from TOML
//! - `web` - Browser host: DOM registry, fetch loader, keyboard binding
//!
//! ## Example
//!
//! ```rust,ignore
//! use deck_stepper::{Capabilities, Manifest, MemoryRegistry, StepSequencer};
//!
//! let manifest = Manifest::from_json_str(&json)?;
//! let registry = MemoryRegistry::from_manifest(&manifest);
//! let mut deck = StepSequencer::new(manifest, registry, Capabilities::default())?;
//!
//! deck.forward_step()?; // play step 0
//! deck.seek(0)?;        // rewind the page
//! deck.backward_step()?; // enter the previous page at its end
//! deck.complete_backward_page_transition()?;
//! ```

mod config;
mod error;
mod input;
pub mod loader;
mod manifest;
mod registry;
mod sequencer;
mod visibility;
#[cfg(feature = "web")]
pub mod web;

pub use config::{Capabilities, DeckConfig, StepPlayback, VisibilityMode};
pub use error::{DeckError, Result};
pub use input::{dispatch, Command, InputDispatcher, KeyBindings, KEY_N, KEY_P};
pub use loader::{load_manifest, start_session, FileSource, ManifestSource, StaticSource};
pub use manifest::{forward_trigger_id, reverse_trigger_id, Manifest, Page, Step};
pub use registry::{ElementRegistry, MemoryRegistry, RegistryEvent};
pub use sequencer::{StepOutcome, StepSequencer};
pub use visibility::{apply_initial_visibility, set_visibility, visibility_trigger_id, SetTrigger, Visibility};

#[cfg(feature = "web")]
pub use web::{DomRegistry, FetchSource};
