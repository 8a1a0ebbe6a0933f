//! Rendered-document capability interface and an in-memory implementation.

use std::collections::HashMap;

use crate::manifest::{forward_trigger_id, reverse_trigger_id, Manifest};
use crate::visibility::{SetTrigger, Visibility};
use crate::{DeckError, Result};

/// Operations the sequencer needs from the rendered document.
///
/// Implement this for your host (browser DOM, headless test double, ...).
/// Every lookup of an id that does not exist must fail with
/// [`DeckError::ElementNotFound`] rather than hand back a usable result.
///
/// No `Send` bounds: the sequencer runs on a single logical thread.
pub trait ElementRegistry {
    /// Check whether an element with this id exists.
    fn contains(&self, id: &str) -> bool;

    /// Fail with `ElementNotFound` unless `id` exists.
    fn require(&self, id: &str) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(DeckError::ElementNotFound(id.to_string()))
        }
    }

    /// Hide every top-level page group, then show `page_id` and its
    /// `<page_id>_bg` background when one exists.
    fn show_page_group(&mut self, page_id: &str) -> Result<()>;

    /// Write the visibility attribute of an element directly.
    fn set_visibility(&mut self, id: &str, state: Visibility) -> Result<()>;

    /// Check whether `target` already owns a child trigger with `trigger_id`.
    fn has_trigger(&self, target: &str, trigger_id: &str) -> Result<bool>;

    /// Append a new indefinite-begin visibility trigger as a child of `target`.
    fn create_trigger(&mut self, target: &str, trigger: &SetTrigger) -> Result<()>;

    /// Begin an existing animation trigger.
    fn begin(&mut self, trigger_id: &str) -> Result<()>;
}

impl<R: ElementRegistry + ?Sized> ElementRegistry for &mut R {
    fn contains(&self, id: &str) -> bool {
        (**self).contains(id)
    }

    fn show_page_group(&mut self, page_id: &str) -> Result<()> {
        (**self).show_page_group(page_id)
    }

    fn set_visibility(&mut self, id: &str, state: Visibility) -> Result<()> {
        (**self).set_visibility(id, state)
    }

    fn has_trigger(&self, target: &str, trigger_id: &str) -> Result<bool> {
        (**self).has_trigger(target, trigger_id)
    }

    fn create_trigger(&mut self, target: &str, trigger: &SetTrigger) -> Result<()> {
        (**self).create_trigger(target, trigger)
    }

    fn begin(&mut self, trigger_id: &str) -> Result<()> {
        (**self).begin(trigger_id)
    }
}

/// Observable side effect recorded by [`MemoryRegistry`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RegistryEvent {
    /// A page group was made the only visible page
    PageShown(String),
    /// Visibility attribute written directly
    VisibilitySet { id: String, state: Visibility },
    /// Visibility trigger appended to a target element
    TriggerCreated { target: String, id: String },
    /// Trigger begun
    Began(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ElementKind {
    Element,
    PageGroup,
    /// Animation trigger; `Some` when it is a visibility `set`
    Trigger(Option<Visibility>),
}

#[derive(Clone, Debug)]
struct ElementEntry {
    kind: ElementKind,
    parent: Option<String>,
    displayed: bool,
    visibility: Option<Visibility>,
}

impl ElementEntry {
    fn new(kind: ElementKind, parent: Option<String>) -> Self {
        Self {
            kind,
            parent,
            displayed: true,
            visibility: None,
        }
    }
}

/// Headless document model that records every side effect.
///
/// Visibility triggers behave like the SVG `set` they stand for: beginning
/// one updates the visibility of its parent element.
///
/// ## Example
///
/// ```rust
/// use deck_stepper::{ElementRegistry, MemoryRegistry, RegistryEvent};
///
/// let mut reg = MemoryRegistry::new()
///     .with_page_group("page_0")
///     .with_trigger("a_0");
///
/// reg.begin("a_0").unwrap();
/// assert_eq!(reg.events(), &[RegistryEvent::Began("a_0".into())]);
/// assert!(reg.begin("missing").is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryRegistry {
    elements: HashMap<String, ElementEntry>,
    events: Vec<RegistryEvent>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document containing everything a manifest refers to.
    ///
    /// Declares each page group and background, every element in the
    /// initial visibility lists, each step's composite trigger and the
    /// `_fwd`/`_rev` triggers of every sub-element.
    pub fn from_manifest(manifest: &Manifest) -> Self {
        let mut reg = Self::new();
        for page in &manifest.pages {
            reg.add_page_group(&page.page_id);
            reg.add_element(&page.background_id());
            for id in page.init_visible.iter().chain(&page.init_hidden) {
                reg.add_element(id);
            }
            for step in &page.steps {
                reg.add_trigger(&step.id);
                for sub in &step.anim_order {
                    reg.add_trigger(&forward_trigger_id(sub));
                    reg.add_trigger(&reverse_trigger_id(sub));
                }
            }
        }
        reg
    }

    pub fn with_page_group(mut self, id: &str) -> Self {
        self.add_page_group(id);
        self
    }

    pub fn with_element(mut self, id: &str) -> Self {
        self.add_element(id);
        self
    }

    pub fn with_trigger(mut self, id: &str) -> Self {
        self.add_trigger(id);
        self
    }

    /// Declare a top-level page group.
    pub fn add_page_group(&mut self, id: &str) {
        self.insert(id, ElementKind::PageGroup, None);
    }

    /// Declare a plain element.
    pub fn add_element(&mut self, id: &str) {
        self.insert(id, ElementKind::Element, None);
    }

    /// Declare a pre-authored animation trigger.
    pub fn add_trigger(&mut self, id: &str) {
        self.insert(id, ElementKind::Trigger(None), None);
    }

    /// Remove an element (and nothing else).
    pub fn remove(&mut self, id: &str) -> bool {
        self.elements.remove(id).is_some()
    }

    fn insert(&mut self, id: &str, kind: ElementKind, parent: Option<String>) {
        self.elements
            .entry(id.to_string())
            .or_insert_with(|| ElementEntry::new(kind, parent));
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut ElementEntry> {
        self.elements
            .get_mut(id)
            .ok_or_else(|| DeckError::ElementNotFound(id.to_string()))
    }

    /// All recorded side effects in order.
    #[inline]
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// Drain the recorded side effects.
    pub fn take_events(&mut self) -> Vec<RegistryEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Ids of every begun trigger, in firing order.
    pub fn began(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RegistryEvent::Began(id) => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Last visibility applied to an element, if any.
    pub fn visibility(&self, id: &str) -> Option<Visibility> {
        self.elements.get(id).and_then(|e| e.visibility)
    }

    /// Whether an element is currently displayed (page groups toggle this).
    pub fn is_displayed(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|e| e.displayed)
    }

    /// Number of triggers that are children of `target`.
    pub fn trigger_count(&self, target: &str) -> usize {
        self.elements
            .values()
            .filter(|e| matches!(e.kind, ElementKind::Trigger(_)) && e.parent.as_deref() == Some(target))
            .count()
    }
}

impl ElementRegistry for MemoryRegistry {
    fn contains(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn show_page_group(&mut self, page_id: &str) -> Result<()> {
        match self.elements.get(page_id) {
            Some(e) if e.kind == ElementKind::PageGroup => {}
            _ => return Err(DeckError::ElementNotFound(page_id.to_string())),
        }
        for (id, entry) in self.elements.iter_mut() {
            if entry.kind == ElementKind::PageGroup {
                entry.displayed = id == page_id;
            }
        }
        // Pages without their own fill have no background element
        if let Some(bg) = self.elements.get_mut(&format!("{page_id}_bg")) {
            bg.displayed = true;
        }
        self.events.push(RegistryEvent::PageShown(page_id.to_string()));
        Ok(())
    }

    fn set_visibility(&mut self, id: &str, state: Visibility) -> Result<()> {
        self.entry_mut(id)?.visibility = Some(state);
        self.events.push(RegistryEvent::VisibilitySet {
            id: id.to_string(),
            state,
        });
        Ok(())
    }

    fn has_trigger(&self, target: &str, trigger_id: &str) -> Result<bool> {
        self.require(target)?;
        Ok(self
            .elements
            .get(trigger_id)
            .is_some_and(|e| e.parent.as_deref() == Some(target)))
    }

    fn create_trigger(&mut self, target: &str, trigger: &SetTrigger) -> Result<()> {
        self.require(target)?;
        self.elements.insert(
            trigger.id.clone(),
            ElementEntry::new(ElementKind::Trigger(Some(trigger.to)), Some(target.to_string())),
        );
        self.events.push(RegistryEvent::TriggerCreated {
            target: target.to_string(),
            id: trigger.id.clone(),
        });
        Ok(())
    }

    fn begin(&mut self, trigger_id: &str) -> Result<()> {
        let entry = self
            .elements
            .get(trigger_id)
            .ok_or_else(|| DeckError::ElementNotFound(trigger_id.to_string()))?;
        let set_target = match &entry.kind {
            ElementKind::Trigger(Some(state)) => entry.parent.clone().map(|p| (p, *state)),
            ElementKind::Trigger(None) => None,
            _ => return Err(DeckError::Host(format!("{trigger_id} is not an animation trigger"))),
        };
        if let Some((parent, state)) = set_target {
            if let Some(target) = self.elements.get_mut(&parent) {
                target.visibility = Some(state);
            }
        }
        self.events.push(RegistryEvent::Began(trigger_id.to_string()));
        Ok(())
    }
}
