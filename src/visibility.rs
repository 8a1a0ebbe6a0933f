//! Initial-visibility application and the idempotent visibility trigger.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::VisibilityMode;
use crate::manifest::Page;
use crate::registry::ElementRegistry;
use crate::Result;

/// Target state of the SVG `visibility` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    /// Attribute value as written into the document.
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Visible => "visible",
            Visibility::Hidden => "hidden",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An indefinite-begin `set` animation that switches an element's visibility.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetTrigger {
    /// Trigger element id, `<element>_<state>`
    pub id: String,
    /// Value the trigger sets
    pub to: Visibility,
}

impl SetTrigger {
    /// Animated attribute name.
    pub const ATTRIBUTE_NAME: &'static str = "visibility";
    /// Begin value; the trigger only fires when begun explicitly.
    pub const BEGIN: &'static str = "indefinite";

    /// Trigger that sets `element` to `state`.
    pub fn for_element(element: &str, state: Visibility) -> Self {
        Self {
            id: visibility_trigger_id(element, state),
            to: state,
        }
    }
}

/// Id of the visibility trigger for an (element, state) pair.
pub fn visibility_trigger_id(element: &str, state: Visibility) -> String {
    format!("{element}_{state}")
}

/// Fire the visibility trigger for `element`, creating it on first use.
///
/// A second request for the same (element, state) pair reuses the existing
/// trigger instead of adding a duplicate child.
pub fn set_visibility<R: ElementRegistry + ?Sized>(registry: &mut R, element: &str, state: Visibility) -> Result<()> {
    let trigger = SetTrigger::for_element(element, state);
    if !registry.has_trigger(element, &trigger.id)? {
        tracing::trace!(element, trigger = %trigger.id, "creating visibility trigger");
        registry.create_trigger(element, &trigger)?;
    }
    registry.begin(&trigger.id)
}

/// Apply a page's initial visibility lists.
///
/// Visible ids are applied before hidden ids, so an id listed in both ends
/// hidden. Ids in neither list keep their current state.
pub fn apply_initial_visibility<R: ElementRegistry + ?Sized>(registry: &mut R, page: &Page, mode: VisibilityMode) -> Result<()> {
    let lists = [
        (&page.init_visible, Visibility::Visible),
        (&page.init_hidden, Visibility::Hidden),
    ];
    for (ids, state) in lists {
        for id in ids {
            match mode {
                VisibilityMode::Triggers => set_visibility(&mut *registry, id, state)?,
                VisibilityMode::Direct => registry.set_visibility(id, state)?,
            }
        }
    }
    Ok(())
}
