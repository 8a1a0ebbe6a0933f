//! Browser host: DOM-backed registry, fetch loader and keyboard binding.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, Element, KeyboardEvent, Response, SvgAnimationElement, SvgElement};

use crate::config::DeckConfig;
use crate::input::InputDispatcher;
use crate::loader::{start_session, yield_to_event_loop, ManifestSource};
use crate::registry::ElementRegistry;
use crate::sequencer::{StepOutcome, StepSequencer};
use crate::visibility::{SetTrigger, Visibility};
use crate::{DeckError, Result};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const PAGE_GROUP_SELECTOR: &str = "svg > g[id^=page]";

/// Sequencer shared between the key handler and deferred continuations.
pub type SharedDeck = Rc<RefCell<StepSequencer<DomRegistry>>>;

fn host_error(context: &str, value: JsValue) -> DeckError {
    DeckError::Host(format!("{context}: {value:?}"))
}

/// [`ElementRegistry`] over the live SVG document.
#[derive(Clone, Debug)]
pub struct DomRegistry {
    document: Document,
}

impl DomRegistry {
    pub fn new(document: Document) -> Self {
        Self { document }
    }

    /// Registry for the current window's document.
    pub fn from_window() -> Result<Self> {
        let window = web_sys::window().ok_or_else(|| DeckError::Host("No window available".into()))?;
        let document = window
            .document()
            .ok_or_else(|| DeckError::Host("No document available".into()))?;
        Ok(Self::new(document))
    }

    fn element(&self, id: &str) -> Result<Element> {
        self.document
            .get_element_by_id(id)
            .ok_or_else(|| DeckError::ElementNotFound(id.to_string()))
    }

    fn set_display(element: &Element, display: &str) -> Result<()> {
        let svg = element
            .dyn_ref::<SvgElement>()
            .ok_or_else(|| DeckError::Host(format!("{} is not an SVG element", element.id())))?;
        svg.style()
            .set_property("display", display)
            .map_err(|e| host_error("Failed to set display", e))
    }
}

impl ElementRegistry for DomRegistry {
    fn contains(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn show_page_group(&mut self, page_id: &str) -> Result<()> {
        let page = self.element(page_id)?;
        let groups = self
            .document
            .query_selector_all(PAGE_GROUP_SELECTOR)
            .map_err(|e| host_error("Failed to query page groups", e))?;
        for i in 0..groups.length() {
            if let Some(group) = groups.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                Self::set_display(&group, "none")?;
            }
        }
        Self::set_display(&page, "block")?;
        if let Some(bg) = self.document.get_element_by_id(&format!("{page_id}_bg")) {
            Self::set_display(&bg, "block")?;
        }
        Ok(())
    }

    fn set_visibility(&mut self, id: &str, state: Visibility) -> Result<()> {
        self.element(id)?
            .set_attribute("visibility", state.as_str())
            .map_err(|e| host_error("Failed to set visibility", e))
    }

    fn has_trigger(&self, target: &str, trigger_id: &str) -> Result<bool> {
        let found = self
            .element(target)?
            .query_selector(&format!("#{trigger_id}"))
            .map_err(|e| host_error("Failed to query trigger", e))?;
        Ok(found.is_some())
    }

    fn create_trigger(&mut self, target: &str, trigger: &SetTrigger) -> Result<()> {
        let parent = self.element(target)?;
        let anim = self
            .document
            .create_element_ns(Some(SVG_NS), "set")
            .map_err(|e| host_error("Failed to create set element", e))?;
        let attrs = [
            ("attributeName", SetTrigger::ATTRIBUTE_NAME),
            ("to", trigger.to.as_str()),
            ("begin", SetTrigger::BEGIN),
            ("id", trigger.id.as_str()),
        ];
        for (name, value) in attrs {
            anim.set_attribute(name, value)
                .map_err(|e| host_error("Failed to set trigger attribute", e))?;
        }
        parent
            .append_child(&anim)
            .map_err(|e| host_error("Failed to append trigger", e))?;
        Ok(())
    }

    fn begin(&mut self, trigger_id: &str) -> Result<()> {
        let anim = self
            .element(trigger_id)?
            .dyn_into::<SvgAnimationElement>()
            .map_err(|_| DeckError::Host(format!("{trigger_id} is not an animation element")))?;
        anim.begin_element()
            .map_err(|e| host_error("Failed to begin animation", e))
    }
}

/// [`ManifestSource`] backed by the browser fetch API.
#[derive(Clone, Copy, Debug, Default)]
pub struct FetchSource;

impl ManifestSource for FetchSource {
    async fn fetch_manifest(&self, url: &str) -> Result<String> {
        let fetch_error = |e: JsValue| DeckError::Fetch(format!("{url}: {e:?}"));
        let window = web_sys::window().ok_or_else(|| DeckError::Fetch("No window available".into()))?;
        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(fetch_error)?
            .dyn_into()
            .map_err(fetch_error)?;
        if !response.ok() {
            return Err(DeckError::Fetch(format!("{url}: HTTP {}", response.status())));
        }
        let text = JsFuture::from(response.text().map_err(fetch_error)?)
            .await
            .map_err(fetch_error)?;
        text.as_string()
            .ok_or_else(|| DeckError::Fetch(format!("{url}: body is not text")))
    }
}

/// Fetch the manifest, enter the first page and bind the keyboard.
pub async fn start(config: DeckConfig) -> Result<SharedDeck> {
    let registry = DomRegistry::from_window()?;
    let deck = start_session(&FetchSource, registry, &config).await?;
    let deck = Rc::new(RefCell::new(deck));
    bind_keys(deck.clone(), InputDispatcher::new(config.keys.clone()))?;
    Ok(deck)
}

/// Install a `keydown` listener that drives the sequencer.
///
/// Key events that arrive while the sequencer is busy are dropped.
pub fn bind_keys(deck: SharedDeck, input: InputDispatcher) -> Result<()> {
    let document = deck.borrow().registry().document.clone();
    let handler = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
        let outcome = match deck.try_borrow_mut() {
            Ok(mut seq) => input.handle_key(&mut *seq, event.key_code()),
            Err(_) => {
                tracing::trace!("key event dropped while busy");
                return;
            }
        };
        match outcome {
            Ok(Some(StepOutcome::TransitionPending(_))) => schedule_transition(deck.clone()),
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "navigation failed"),
        }
    });
    document
        .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
        .map_err(|e| host_error("Failed to bind keydown", e))?;
    handler.forget();
    Ok(())
}

/// Complete a backward page transition after the page load has rendered.
pub fn schedule_transition(deck: SharedDeck) {
    wasm_bindgen_futures::spawn_local(async move {
        yield_to_event_loop().await;
        // A busy sequencer settles the transition itself on its next call
        if let Ok(mut seq) = deck.try_borrow_mut() {
            if let Err(e) = seq.complete_backward_page_transition() {
                tracing::error!(error = %e, "backward page transition failed");
            }
        }
    });
}
