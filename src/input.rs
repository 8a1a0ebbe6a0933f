//! Key code bindings and command dispatch.

use serde::{Deserialize, Serialize};

use crate::registry::ElementRegistry;
use crate::sequencer::{StepOutcome, StepSequencer};
use crate::Result;

/// Key code for `N`.
pub const KEY_N: u32 = 78;
/// Key code for `P`.
pub const KEY_P: u32 = 80;

/// Logical navigation command.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Play the next step
    Advance,
    /// Undo the last step
    Retreat,
    /// Seek to an absolute cursor on the current page
    Seek(usize),
    /// Enter a page from its front
    GotoPage(usize),
}

/// Key codes bound to the advance and retreat commands.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub advance: Vec<u32>,
    pub retreat: Vec<u32>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            advance: vec![KEY_N],
            retreat: vec![KEY_P],
        }
    }
}

impl KeyBindings {
    /// Command bound to a key code, if any.
    pub fn command_for(&self, key_code: u32) -> Option<Command> {
        if self.advance.contains(&key_code) {
            Some(Command::Advance)
        } else if self.retreat.contains(&key_code) {
            Some(Command::Retreat)
        } else {
            None
        }
    }
}

/// Routes key events and commands to a [`StepSequencer`].
///
/// Calls are serialized: the sequencer completes any pending backward page
/// transition before it handles the next command.
///
/// ## Example
///
/// ```rust
/// use deck_stepper::{Capabilities, InputDispatcher, KeyBindings, Manifest, MemoryRegistry, Page, Step, StepSequencer};
///
/// let manifest = Manifest::new(vec![Page::new("page_0", vec![Step::new("a_0", ["a_0"])])]).unwrap();
/// let registry = MemoryRegistry::from_manifest(&manifest);
/// let mut deck = StepSequencer::new(manifest, registry, Capabilities::default()).unwrap();
/// let input = InputDispatcher::new(KeyBindings::default());
///
/// input.handle_key(&mut deck, 78).unwrap(); // N
/// assert_eq!(deck.cursor(), 1);
/// assert!(input.handle_key(&mut deck, 65).unwrap().is_none()); // unbound
/// ```
#[derive(Clone, Debug, Default)]
pub struct InputDispatcher {
    bindings: KeyBindings,
}

impl InputDispatcher {
    pub fn new(bindings: KeyBindings) -> Self {
        Self { bindings }
    }

    #[inline]
    pub fn bindings(&self) -> &KeyBindings {
        &self.bindings
    }

    /// Handle a raw key code. Unbound keys return `Ok(None)`.
    pub fn handle_key<R: ElementRegistry>(&self, deck: &mut StepSequencer<R>, key_code: u32) -> Result<Option<StepOutcome>> {
        match self.bindings.command_for(key_code) {
            Some(command) => dispatch(deck, command).map(Some),
            None => Ok(None),
        }
    }
}

/// Apply a command to the sequencer.
pub fn dispatch<R: ElementRegistry>(deck: &mut StepSequencer<R>, command: Command) -> Result<StepOutcome> {
    tracing::trace!(?command, "dispatch");
    match command {
        Command::Advance => deck.forward_step(),
        Command::Retreat => deck.backward_step(),
        Command::Seek(target) => Ok(if deck.seek(target)? {
            StepOutcome::Played
        } else {
            StepOutcome::Ignored
        }),
        Command::GotoPage(page) => deck.goto_page(page),
    }
}
