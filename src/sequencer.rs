//! Step sequencer: per-page cursor, page loading and cross-page transitions.

use crate::config::{Capabilities, StepPlayback};
use crate::manifest::{Manifest, Page, Step};
use crate::registry::ElementRegistry;
use crate::visibility::apply_initial_visibility;
use crate::Result;

/// What a navigation call did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// A step was played forward
    Played,
    /// A step was undone
    Undone,
    /// A page boundary was crossed forward; nothing played yet
    PageEntered(usize),
    /// A page boundary was crossed backward; the host must call
    /// [`StepSequencer::complete_backward_page_transition`] once the page
    /// load has settled
    TransitionPending(usize),
    /// Request was out of range or disabled; nothing changed
    Ignored,
}

/// Backward page entry waiting for its fast-forward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingTransition {
    page: usize,
}

/// Single-threaded animation step sequencer.
///
/// Owns the manifest, the rendered-document registry, the current page and
/// the cursor (`next_step`, the number of steps played on the current page).
/// All state changes go through [`load_page`](Self::load_page),
/// [`forward_step`](Self::forward_step), [`backward_step`](Self::backward_step)
/// and [`seek`](Self::seek).
///
/// Entering a page backward lands on its fully played state in two phases:
/// `backward_step` loads the page and returns
/// [`StepOutcome::TransitionPending`]; after yielding to the host once, call
/// [`complete_backward_page_transition`](Self::complete_backward_page_transition)
/// to replay every step. Any other operation issued before that completes
/// the pending transition first.
///
/// ## Example
///
/// ```rust
/// use deck_stepper::{Capabilities, Manifest, MemoryRegistry, Page, Step, StepOutcome, StepSequencer};
///
/// let manifest = Manifest::new(vec![
///     Page::new("page_0", vec![Step::new("a_0", ["a_0"])]),
///     Page::new("page_1", vec![Step::new("a_1", ["a_1", "a_2"])]),
/// ]).unwrap();
/// let registry = MemoryRegistry::from_manifest(&manifest);
/// let mut deck = StepSequencer::new(manifest, registry, Capabilities::default()).unwrap();
///
/// assert_eq!(deck.forward_step().unwrap(), StepOutcome::Played);
/// assert_eq!(deck.forward_step().unwrap(), StepOutcome::PageEntered(1));
/// assert_eq!(deck.cursor(), 0);
///
/// assert_eq!(deck.backward_step().unwrap(), StepOutcome::TransitionPending(0));
/// deck.complete_backward_page_transition().unwrap();
/// assert_eq!((deck.current_page(), deck.cursor()), (0, 1));
/// ```
#[derive(Debug)]
pub struct StepSequencer<R> {
    manifest: Manifest,
    registry: R,
    capabilities: Capabilities,
    page_index: usize,
    next_step: usize,
    pending: Option<PendingTransition>,
}

impl<R: ElementRegistry> StepSequencer<R> {
    /// Validate the manifest and enter its first page.
    pub fn new(manifest: Manifest, registry: R, capabilities: Capabilities) -> Result<Self> {
        manifest.validate()?;
        let mut sequencer = Self {
            manifest,
            registry,
            capabilities,
            page_index: 0,
            next_step: 0,
            pending: None,
        };
        sequencer.enter_page(0)?;
        Ok(sequencer)
    }

    #[inline]
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    #[inline]
    pub fn registry(&self) -> &R {
        &self.registry
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut R {
        &mut self.registry
    }

    /// Give back the registry, ending the session.
    pub fn into_registry(self) -> R {
        self.registry
    }

    #[inline]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Index of the current page.
    #[inline]
    pub fn current_page(&self) -> usize {
        self.page_index
    }

    #[inline]
    pub fn page_count(&self) -> usize {
        self.manifest.page_count()
    }

    /// Group id of the current page.
    pub fn current_page_id(&self) -> &str {
        &self.page().page_id
    }

    /// Number of steps played on the current page.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.next_step
    }

    /// Number of steps on the current page.
    pub fn step_count(&self) -> usize {
        self.page().step_count()
    }

    /// Whether every step of the current page has been played.
    pub fn is_page_exhausted(&self) -> bool {
        self.next_step >= self.step_count()
    }

    /// Whether a backward page entry is waiting for its fast-forward.
    #[inline]
    pub fn has_pending_transition(&self) -> bool {
        self.pending.is_some()
    }

    fn page(&self) -> &Page {
        // page_index is only ever set to a validated index
        &self.manifest.pages[self.page_index]
    }

    /// Switch to `target` and reset the cursor.
    ///
    /// Out-of-range targets are ignored and return `Ok(false)`. Any pending
    /// backward transition is discarded.
    pub fn load_page(&mut self, target: usize) -> Result<bool> {
        if target >= self.manifest.page_count() {
            tracing::trace!(index = target, pages = self.manifest.page_count(), "page index out of range");
            return Ok(false);
        }
        self.pending = None;
        self.enter_page(target)?;
        Ok(true)
    }

    /// Jump straight to the front of a page.
    pub fn goto_page(&mut self, target: usize) -> Result<StepOutcome> {
        self.settle()?;
        Ok(if self.load_page(target)? {
            StepOutcome::PageEntered(target)
        } else {
            StepOutcome::Ignored
        })
    }

    fn enter_page(&mut self, target: usize) -> Result<()> {
        let page = &self.manifest.pages[target];
        tracing::debug!(page = target, page_id = %page.page_id, "loading page");
        self.registry.show_page_group(&page.page_id)?;
        apply_initial_visibility(&mut self.registry, page, self.capabilities.visibility)?;
        self.page_index = target;
        self.next_step = 0;
        Ok(())
    }

    /// Play the next step, or enter the next page when this one is exhausted.
    pub fn forward_step(&mut self) -> Result<StepOutcome> {
        self.settle()?;
        if self.next_step < self.step_count() {
            let step = &self.manifest.pages[self.page_index].steps[self.next_step];
            play_step(&mut self.registry, step, self.capabilities.playback)?;
            self.next_step += 1;
            tracing::debug!(page = self.page_index, cursor = self.next_step, "step played");
            return Ok(StepOutcome::Played);
        }
        let next = self.page_index + 1;
        if self.capabilities.supports_cross_page && next < self.page_count() {
            self.load_page(next)?;
            return Ok(StepOutcome::PageEntered(next));
        }
        tracing::trace!(page = self.page_index, "forward step at end of deck");
        Ok(StepOutcome::Ignored)
    }

    /// Undo the last played step, or enter the previous page at its end.
    pub fn backward_step(&mut self) -> Result<StepOutcome> {
        self.settle()?;
        if !self.capabilities.supports_backward_navigation {
            return Ok(StepOutcome::Ignored);
        }
        if self.next_step > 0 {
            let step = &self.manifest.pages[self.page_index].steps[self.next_step - 1];
            undo_step(&mut self.registry, step)?;
            self.next_step -= 1;
            tracing::debug!(page = self.page_index, cursor = self.next_step, "step undone");
            return Ok(StepOutcome::Undone);
        }
        if self.capabilities.supports_cross_page && self.page_index > 0 {
            let prev = self.page_index - 1;
            self.load_page(prev)?;
            self.pending = Some(PendingTransition { page: prev });
            tracing::debug!(page = prev, "backward page transition pending");
            return Ok(StepOutcome::TransitionPending(prev));
        }
        tracing::trace!("backward step at start of deck");
        Ok(StepOutcome::Ignored)
    }

    /// Second phase of a backward page entry: replay every step of the
    /// page so it lands in its fully played state.
    ///
    /// Returns `Ok(false)` when nothing was pending.
    pub fn complete_backward_page_transition(&mut self) -> Result<bool> {
        let Some(pending) = self.pending.take() else {
            return Ok(false);
        };
        if pending.page != self.page_index {
            // Superseded by a later page load
            return Ok(false);
        }
        let end = self.step_count();
        self.seek_within(end)?;
        tracing::debug!(page = self.page_index, cursor = self.next_step, "backward page transition complete");
        Ok(true)
    }

    /// Move the cursor to `target` on the current page, replaying or undoing
    /// every step in between.
    ///
    /// Returns `Ok(false)` when `target` is out of range or already current.
    pub fn seek(&mut self, target: usize) -> Result<bool> {
        self.settle()?;
        self.seek_within(target)
    }

    fn seek_within(&mut self, target: usize) -> Result<bool> {
        let steps = &self.manifest.pages[self.page_index].steps;
        if target > steps.len() || target == self.next_step {
            tracing::trace!(to = target, cursor = self.next_step, "seek rejected");
            return Ok(false);
        }
        if target > self.next_step {
            for step in &steps[self.next_step..target] {
                for id in step.forward_triggers() {
                    fire(&mut self.registry, &id)?;
                }
            }
        } else {
            for step in steps[target..self.next_step].iter().rev() {
                undo_step(&mut self.registry, step)?;
            }
        }
        tracing::debug!(page = self.page_index, from = self.next_step, to = target, "seek");
        self.next_step = target;
        Ok(true)
    }

    /// Run any pending continuation so the next operation sees settled state.
    fn settle(&mut self) -> Result<()> {
        if self.pending.is_some() {
            self.complete_backward_page_transition()?;
        }
        Ok(())
    }
}

fn fire<R: ElementRegistry>(registry: &mut R, id: &str) -> Result<()> {
    tracing::trace!(trigger = id, "begin");
    registry.begin(id)
}

fn play_step<R: ElementRegistry>(registry: &mut R, step: &Step, playback: StepPlayback) -> Result<()> {
    match playback {
        StepPlayback::Composite => fire(registry, &step.id),
        StepPlayback::Sequential => {
            for id in step.forward_triggers() {
                fire(registry, &id)?;
            }
            Ok(())
        }
    }
}

fn undo_step<R: ElementRegistry>(registry: &mut R, step: &Step) -> Result<()> {
    for id in step.reverse_triggers() {
        fire(registry, &id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemoryRegistry, RegistryEvent};
    use crate::visibility::Visibility;
    use crate::DeckError;

    fn two_page_manifest() -> Manifest {
        let mut page_a = Page::new(
            "page_0",
            vec![Step::new("s1", ["e1"]), Step::new("s2", ["e2", "e3"])],
        );
        page_a.init_hidden = vec!["obj_1".into()];
        page_a.init_visible = vec!["obj_2".into()];
        let page_b = Page::new(
            "page_1",
            vec![Step::new("s3", ["e4"]), Step::new("s4", ["e5", "e6"]), Step::new("s5", ["e7"])],
        );
        Manifest::new(vec![page_a, page_b]).unwrap()
    }

    fn sequencer(caps: Capabilities) -> StepSequencer<MemoryRegistry> {
        let manifest = two_page_manifest();
        let registry = MemoryRegistry::from_manifest(&manifest);
        let mut seq = StepSequencer::new(manifest, registry, caps).unwrap();
        seq.registry_mut().clear_events();
        seq
    }

    fn sequential() -> Capabilities {
        Capabilities {
            playback: StepPlayback::Sequential,
            ..Capabilities::default()
        }
    }

    #[test]
    fn starts_on_first_page() {
        let seq = sequencer(Capabilities::default());
        assert_eq!(seq.current_page(), 0);
        assert_eq!(seq.current_page_id(), "page_0");
        assert_eq!(seq.cursor(), 0);
        assert!(seq.registry().is_displayed("page_0"));
        assert!(!seq.registry().is_displayed("page_1"));
        assert_eq!(seq.registry().visibility("obj_1"), Some(Visibility::Hidden));
        assert_eq!(seq.registry().visibility("obj_2"), Some(Visibility::Visible));
    }

    #[test]
    fn load_page_resets_cursor() {
        let mut seq = sequencer(Capabilities::default());
        for target in [1, 0, 1, 1, 0] {
            seq.seek(1).unwrap();
            assert!(seq.load_page(target).unwrap());
            assert_eq!(seq.current_page(), target);
            assert_eq!(seq.cursor(), 0);
        }
    }

    #[test]
    fn load_page_out_of_range_is_silent() {
        let mut seq = sequencer(Capabilities::default());
        seq.forward_step().unwrap();
        assert!(!seq.load_page(2).unwrap());
        assert!(!seq.load_page(usize::MAX).unwrap());
        assert_eq!((seq.current_page(), seq.cursor()), (0, 1));
        assert_eq!(seq.goto_page(5).unwrap(), StepOutcome::Ignored);
    }

    #[test]
    fn forward_and_backward_scenario() {
        let mut seq = sequencer(sequential());

        assert_eq!(seq.forward_step().unwrap(), StepOutcome::Played);
        assert_eq!(seq.registry().began(), vec!["e1_fwd"]);
        assert_eq!(seq.cursor(), 1);
        seq.registry_mut().clear_events();

        assert_eq!(seq.forward_step().unwrap(), StepOutcome::Played);
        assert_eq!(seq.registry().began(), vec!["e2_fwd", "e3_fwd"]);
        assert_eq!(seq.cursor(), 2);
        seq.registry_mut().clear_events();

        assert_eq!(seq.backward_step().unwrap(), StepOutcome::Undone);
        assert_eq!(seq.registry().began(), vec!["e3_rev", "e2_rev"]);
        assert_eq!(seq.cursor(), 1);
    }

    #[test]
    fn composite_playback_begins_step_id() {
        let mut seq = sequencer(Capabilities::default());
        seq.forward_step().unwrap();
        seq.forward_step().unwrap();
        assert_eq!(seq.registry().began(), vec!["s1", "s2"]);
    }

    #[test]
    fn forward_boundary_is_idempotent_on_last_page() {
        let mut seq = sequencer(Capabilities::default());
        seq.load_page(1).unwrap();
        for _ in 0..3 {
            assert_eq!(seq.forward_step().unwrap(), StepOutcome::Played);
        }
        assert_eq!(seq.cursor(), 3);
        assert!(seq.is_page_exhausted());
        seq.registry_mut().clear_events();

        for _ in 0..4 {
            assert_eq!(seq.forward_step().unwrap(), StepOutcome::Ignored);
        }
        assert_eq!((seq.current_page(), seq.cursor()), (1, 3));
        assert!(seq.registry().events().is_empty());
    }

    #[test]
    fn forward_crosses_into_next_page() {
        let mut seq = sequencer(Capabilities::default());
        seq.forward_step().unwrap();
        seq.forward_step().unwrap();
        seq.registry_mut().clear_events();

        assert_eq!(seq.forward_step().unwrap(), StepOutcome::PageEntered(1));
        assert_eq!((seq.current_page(), seq.cursor()), (1, 0));
        // No step played on the crossing call
        assert!(seq.registry().began().is_empty());
        assert_eq!(seq.registry().events(), &[RegistryEvent::PageShown("page_1".into())]);
    }

    #[test]
    fn seek_forward_then_back_is_symmetric() {
        for k in 0..=2 {
            let mut seq = sequencer(Capabilities::default());
            assert_eq!(seq.seek(k).unwrap(), k != 0);
            assert_eq!(seq.seek(0).unwrap(), k != 0);
            assert_eq!(seq.cursor(), 0);

            let began = seq.registry().began();
            let (fwd, rev): (Vec<&str>, Vec<&str>) = began.iter().partition(|id| id.ends_with("_fwd"));
            assert_eq!(fwd.len(), rev.len());
            // Reverse triggers mirror the forward ones in opposite order
            let mirrored: Vec<String> = fwd.iter().rev().map(|id| id.replace("_fwd", "_rev")).collect();
            assert_eq!(rev, mirrored);
        }
    }

    #[test]
    fn seek_forward_fires_every_sub_element_in_order() {
        let mut seq = sequencer(Capabilities::default());
        assert!(seq.seek(2).unwrap());
        assert_eq!(seq.registry().began(), vec!["e1_fwd", "e2_fwd", "e3_fwd"]);
        assert_eq!(seq.cursor(), 2);
    }

    #[test]
    fn seek_backward_fires_reverse_order() {
        let mut seq = sequencer(Capabilities::default());
        seq.load_page(1).unwrap();
        seq.seek(3).unwrap();
        seq.registry_mut().clear_events();

        assert!(seq.seek(1).unwrap());
        assert_eq!(seq.registry().began(), vec!["e7_rev", "e6_rev", "e5_rev"]);
        assert_eq!(seq.cursor(), 1);
    }

    #[test]
    fn seek_rejects_out_of_range_and_current() {
        let mut seq = sequencer(Capabilities::default());
        assert!(!seq.seek(0).unwrap());
        assert!(!seq.seek(3).unwrap());
        assert_eq!(seq.cursor(), 0);
        assert!(seq.registry().events().is_empty());
    }

    #[test]
    fn backward_at_deck_start_is_noop() {
        let mut seq = sequencer(Capabilities::default());
        assert_eq!(seq.backward_step().unwrap(), StepOutcome::Ignored);
        assert_eq!((seq.current_page(), seq.cursor()), (0, 0));
        assert!(seq.registry().events().is_empty());
        assert!(!seq.has_pending_transition());
    }

    #[test]
    fn backward_into_previous_page_lands_at_end() {
        let mut seq = sequencer(Capabilities::default());
        seq.load_page(1).unwrap();
        seq.registry_mut().clear_events();

        assert_eq!(seq.backward_step().unwrap(), StepOutcome::TransitionPending(0));
        assert!(seq.has_pending_transition());
        assert_eq!((seq.current_page(), seq.cursor()), (0, 0));
        assert!(seq.registry().is_displayed("page_0"));
        assert!(seq.registry().began().iter().all(|id| !id.ends_with("_fwd")));

        seq.registry_mut().clear_events();
        assert!(seq.complete_backward_page_transition().unwrap());
        assert_eq!(seq.cursor(), 2);
        assert!(seq.is_page_exhausted());
        assert_eq!(seq.registry().began(), vec!["e1_fwd", "e2_fwd", "e3_fwd"]);

        // Nothing left to complete
        assert!(!seq.complete_backward_page_transition().unwrap());
    }

    #[test]
    fn input_during_pending_transition_settles_first() {
        let mut seq = sequencer(Capabilities::default());
        seq.load_page(1).unwrap();
        seq.backward_step().unwrap();
        seq.registry_mut().clear_events();

        // Undoes the last step of the fully played page
        assert_eq!(seq.backward_step().unwrap(), StepOutcome::Undone);
        assert_eq!(
            seq.registry().began(),
            vec!["e1_fwd", "e2_fwd", "e3_fwd", "e3_rev", "e2_rev"]
        );
        assert_eq!(seq.cursor(), 1);
        assert!(!seq.has_pending_transition());
    }

    #[test]
    fn load_page_discards_pending_transition() {
        let mut seq = sequencer(Capabilities::default());
        seq.load_page(1).unwrap();
        seq.backward_step().unwrap();
        seq.load_page(1).unwrap();
        assert!(!seq.has_pending_transition());
        assert!(!seq.complete_backward_page_transition().unwrap());
        assert_eq!((seq.current_page(), seq.cursor()), (1, 0));
    }

    #[test]
    fn forward_only_capabilities() {
        let mut seq = sequencer(Capabilities::forward_only());
        seq.forward_step().unwrap();
        assert_eq!(seq.backward_step().unwrap(), StepOutcome::Ignored);
        assert_eq!(seq.cursor(), 1);

        seq.forward_step().unwrap();
        assert_eq!(seq.forward_step().unwrap(), StepOutcome::Ignored);
        assert_eq!(seq.current_page(), 0);
    }

    #[test]
    fn backward_without_cross_page_stays_put() {
        let caps = Capabilities {
            supports_cross_page: false,
            ..Capabilities::default()
        };
        let mut seq = sequencer(caps);
        seq.load_page(1).unwrap();
        assert_eq!(seq.backward_step().unwrap(), StepOutcome::Ignored);
        assert_eq!(seq.current_page(), 1);
    }

    #[test]
    fn missing_trigger_is_fatal_and_keeps_cursor() {
        let mut seq = sequencer(Capabilities::default());
        seq.registry_mut().remove("e3_fwd");

        let result = seq.seek(2);
        assert!(matches!(result, Err(DeckError::ElementNotFound(id)) if id == "e3_fwd"));
        assert_eq!(seq.cursor(), 0);

        seq.registry_mut().remove("s1");
        assert!(matches!(seq.forward_step(), Err(DeckError::ElementNotFound(_))));
        assert_eq!(seq.cursor(), 0);
    }

    #[test]
    fn missing_page_group_fails_construction() {
        let manifest = two_page_manifest();
        let registry = MemoryRegistry::new();
        let result = StepSequencer::new(manifest, registry, Capabilities::default());
        assert!(matches!(result, Err(DeckError::ElementNotFound(id)) if id == "page_0"));
    }

    #[test]
    fn reentering_page_reuses_visibility_triggers() {
        let mut seq = sequencer(Capabilities::default());
        seq.load_page(1).unwrap();
        seq.load_page(0).unwrap();
        seq.load_page(0).unwrap();
        assert_eq!(seq.registry().trigger_count("obj_1"), 1);
        assert_eq!(seq.registry().trigger_count("obj_2"), 1);
    }
}
