//! Manifest loading and session start-up.
//!
//! The manifest is fetched exactly once per session. Fetching is delegated
//! to a [`ManifestSource`] so the same orchestration runs against the
//! browser fetch API, the filesystem or an in-memory fixture.

use crate::config::DeckConfig;
use crate::registry::ElementRegistry;
use crate::sequencer::StepSequencer;
use crate::{DeckError, Manifest, Result};

/// Trait for async manifest providers.
///
/// No `Send` bounds — works in both native and WASM (single-threaded) contexts.
pub trait ManifestSource {
    /// Fetch the raw manifest text at `url`.
    fn fetch_manifest(&self, url: &str) -> impl std::future::Future<Output = Result<String>>;
}

/// Serves a fixed manifest body regardless of the URL.
#[derive(Clone, Debug)]
pub struct StaticSource {
    body: String,
}

impl StaticSource {
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }
}

impl ManifestSource for StaticSource {
    async fn fetch_manifest(&self, _url: &str) -> Result<String> {
        Ok(self.body.clone())
    }
}

/// Reads the manifest from the local filesystem, treating the URL as a path.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSource;

impl ManifestSource for FileSource {
    async fn fetch_manifest(&self, url: &str) -> Result<String> {
        let path = url.strip_prefix("file://").unwrap_or(url);
        std::fs::read_to_string(path).map_err(|e| DeckError::Fetch(format!("{path}: {e}")))
    }
}

/// Fetch and parse the manifest. Any failure is fatal to the session.
pub async fn load_manifest<S: ManifestSource>(source: &S, url: &str) -> Result<Manifest> {
    tracing::debug!(url, "fetching manifest");
    let body = source.fetch_manifest(url).await?;
    let manifest = Manifest::from_json_str(&body)?;
    tracing::debug!(pages = manifest.page_count(), "manifest loaded");
    Ok(manifest)
}

/// Load the configured manifest and enter its first page.
pub async fn start_session<S, R>(source: &S, registry: R, config: &DeckConfig) -> Result<StepSequencer<R>>
where
    S: ManifestSource,
    R: ElementRegistry,
{
    let manifest = load_manifest(source, &config.manifest_url).await?;
    StepSequencer::new(manifest, registry, config.capabilities)
}

/// Yield control back to the browser event loop.
///
/// Used as the deferred continuation point of a backward page transition:
/// awaiting it lets the page-load visibility changes take effect before the
/// fast-forward replay runs.
#[cfg(feature = "web")]
pub async fn yield_to_event_loop() {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        if let Some(window) = web_sys::window() {
            let _ = window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0);
        } else {
            let _ = resolve.call0(&wasm_bindgen::JsValue::NULL);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::MemoryRegistry;

    const DECK: &str = r#"{
        "pages": [
            { "page_id": "page_0", "init_hidden": ["obj_a"], "init_visible": [],
              "animations": [ { "id": "a_0", "anim_order": ["a_0"] } ] },
            { "page_id": "page_1", "init_hidden": [], "init_visible": [], "animations": [] }
        ]
    }"#;

    struct FailingSource;

    impl ManifestSource for FailingSource {
        async fn fetch_manifest(&self, url: &str) -> Result<String> {
            Err(DeckError::Fetch(format!("{url}: connection refused")))
        }
    }

    #[test]
    fn load_from_static_source() {
        let manifest = pollster::block_on(load_manifest(&StaticSource::new(DECK), "deck.json")).unwrap();
        assert_eq!(manifest.page_count(), 2);
    }

    #[test]
    fn fetch_failure_is_fatal() {
        let result = pollster::block_on(load_manifest(&FailingSource, "http://localhost:8000/test.json"));
        assert!(matches!(result, Err(DeckError::Fetch(_))));
    }

    #[test]
    fn parse_failure_is_fatal() {
        let result = pollster::block_on(load_manifest(&StaticSource::new("{ not json"), "x"));
        assert!(matches!(result, Err(DeckError::Json(_))));
    }

    #[test]
    fn missing_file_is_fetch_error() {
        let result = pollster::block_on(load_manifest(&FileSource, "file:///definitely/not/here.json"));
        assert!(matches!(result, Err(DeckError::Fetch(_))));
    }

    #[test]
    fn start_session_enters_first_page() {
        let manifest = Manifest::from_json_str(DECK).unwrap();
        let registry = MemoryRegistry::from_manifest(&manifest);
        let deck = pollster::block_on(start_session(&StaticSource::new(DECK), registry, &DeckConfig::default())).unwrap();

        assert_eq!(deck.current_page(), 0);
        assert_eq!(deck.cursor(), 0);
        assert!(deck.registry().is_displayed("page_0"));
    }
}
