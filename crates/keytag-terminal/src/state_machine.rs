//! Terminal state machine.
//!
//! This module models the access terminal as a sum type of states plus a pure
//! transition function. [`transition`] maps the current state and an
//! [`Event`] to the next state and the side effects the controller must run;
//! it never touches a device or the registry itself.
//!
//! # States
//!
//! - `Idle`: waiting for a tag or a command
//! - `AwaitingUserInput`: a command needs a line of input (name or tag id)
//! - `AwaitingTag`: a tag must be looked up
//! - `CreatingUser`: a name was collected, waiting for the user's tag
//! - `DeletingUser`: waiting for the tag to revoke
//!
//! # Valid Transitions
//!
//! - Idle → AwaitingTag (tag read or `scan`) → Idle + lookup
//! - Idle → AwaitingUserInput(Enroll) → CreatingUser → Idle + enroll
//! - Idle → AwaitingUserInput(Revoke) → DeletingUser → Idle + revoke
//! - any transient state → Idle on timeout or device fault
//!
//! # Examples
//!
//! ```
//! use keytag_core::TagId;
//! use keytag_terminal::{Effect, Event, TerminalState, transition};
//!
//! let tag = TagId::parse("04A1B2C3").unwrap();
//!
//! let step = transition(&TerminalState::Idle, Event::TagRead(tag.clone())).unwrap();
//! assert_eq!(step.next, TerminalState::AwaitingTag { scanned: Some(tag.clone()) });
//!
//! let step = transition(&step.next, Event::TagRead(tag.clone())).unwrap();
//! assert_eq!(step.next, TerminalState::Idle);
//! assert_eq!(step.effects, vec![Effect::Lookup(tag)]);
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use keytag_core::{Error, Result, TagId};

/// Maximum number of state transitions to keep in history.
const MAX_HISTORY_SIZE: usize = 100;

/// Command that started an input prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingCommand {
    /// Enroll a new user; the input is the user name.
    Enroll,
    /// Revoke a tag; the input is a tag id, or blank to scan it.
    Revoke,
}

/// Terminal state, carrying the data collected so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalState {
    /// Waiting for a tag or a command.
    Idle,

    /// Waiting for a line of input for `command`.
    AwaitingUserInput { command: PendingCommand },

    /// Looking up a tag. `scanned` is set when the tag was already read
    /// while idle; otherwise the reader is polled.
    AwaitingTag { scanned: Option<TagId> },

    /// Enrolling `name`, waiting for the tag to bind to it.
    CreatingUser { name: String },

    /// Revoking a tag. `tag_id` is set when it was typed; otherwise the
    /// reader is polled.
    DeletingUser { tag_id: Option<TagId> },
}

impl TerminalState {
    /// Data-less kind of this state.
    pub fn kind(&self) -> StateKind {
        match self {
            TerminalState::Idle => StateKind::Idle,
            TerminalState::AwaitingUserInput { .. } => StateKind::AwaitingUserInput,
            TerminalState::AwaitingTag { .. } => StateKind::AwaitingTag,
            TerminalState::CreatingUser { .. } => StateKind::CreatingUser,
            TerminalState::DeletingUser { .. } => StateKind::DeletingUser,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, TerminalState::Idle)
    }

    /// What the controller must wait for in this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use keytag_core::TagId;
    /// use keytag_terminal::{Awaiting, Event, TerminalState};
    ///
    /// assert_eq!(TerminalState::Idle.awaiting(), Awaiting::CommandOrTag);
    /// assert_eq!(
    ///     TerminalState::DeletingUser { tag_id: None }.awaiting(),
    ///     Awaiting::Tag
    /// );
    ///
    /// let tag = TagId::parse("04A1B2C3").unwrap();
    /// assert_eq!(
    ///     TerminalState::DeletingUser { tag_id: Some(tag.clone()) }.awaiting(),
    ///     Awaiting::Ready(Event::TagRead(tag))
    /// );
    /// ```
    pub fn awaiting(&self) -> Awaiting {
        match self {
            TerminalState::Idle => Awaiting::CommandOrTag,
            TerminalState::AwaitingUserInput { .. } => Awaiting::Input,
            TerminalState::AwaitingTag {
                scanned: Some(tag_id),
            }
            | TerminalState::DeletingUser {
                tag_id: Some(tag_id),
            } => Awaiting::Ready(Event::TagRead(tag_id.clone())),
            TerminalState::AwaitingTag { scanned: None }
            | TerminalState::CreatingUser { .. }
            | TerminalState::DeletingUser { tag_id: None } => Awaiting::Tag,
        }
    }
}

impl fmt::Display for TerminalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// Data-less mirror of [`TerminalState`], used in history and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Idle,
    AwaitingUserInput,
    AwaitingTag,
    CreatingUser,
    DeletingUser,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            StateKind::Idle => "Idle",
            StateKind::AwaitingUserInput => "AwaitingUserInput",
            StateKind::AwaitingTag => "AwaitingTag",
            StateKind::CreatingUser => "CreatingUser",
            StateKind::DeletingUser => "DeletingUser",
        };
        write!(f, "{}", state_str)
    }
}

/// Source of the next event for a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Awaiting {
    /// Race the tag reader against a command line, without a deadline.
    CommandOrTag,
    /// A line of input, bounded by the input timeout.
    Input,
    /// A tag read, bounded by the tag timeout.
    Tag,
    /// The state already holds its event; no device is polled.
    Ready(Event),
}

/// Input to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A tag was presented to the reader (or is already known).
    TagRead(TagId),
    /// `enroll` command while idle.
    EnrollRequested,
    /// `revoke` command while idle.
    RevokeRequested,
    /// `scan` command while idle.
    ScanRequested,
    /// A line of input that is not a command.
    InputReceived(String),
    /// The state's deadline passed.
    Timeout,
    /// The reader or input device failed.
    DeviceFault(String),
}

impl Event {
    /// Interpret a line typed while idle.
    ///
    /// Commands are matched case-insensitively after trimming. Any other
    /// line becomes [`Event::InputReceived`].
    ///
    /// # Examples
    ///
    /// ```
    /// use keytag_terminal::Event;
    ///
    /// assert_eq!(Event::from_command_line(" Enroll\n"), Event::EnrollRequested);
    /// assert_eq!(Event::from_command_line("remove"), Event::RevokeRequested);
    /// assert_eq!(
    ///     Event::from_command_line("hello"),
    ///     Event::InputReceived("hello".to_string())
    /// );
    /// ```
    pub fn from_command_line(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "enroll" | "add" => Event::EnrollRequested,
            "delete" | "remove" | "revoke" => Event::RevokeRequested,
            "scan" => Event::ScanRequested,
            _ => Event::InputReceived(line.to_string()),
        }
    }

    /// Event name without its payload.
    pub fn name(&self) -> &'static str {
        match self {
            Event::TagRead(_) => "TagRead",
            Event::EnrollRequested => "EnrollRequested",
            Event::RevokeRequested => "RevokeRequested",
            Event::ScanRequested => "ScanRequested",
            Event::InputReceived(_) => "InputReceived",
            Event::Timeout => "Timeout",
            Event::DeviceFault(_) => "DeviceFault",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::TagRead(tag_id) => write!(f, "TagRead({tag_id})"),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// Short message shown when a flow ends without a registry operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    TimedOut,
    ReaderError,
    InvalidName,
    InvalidTagId,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Look the tag up and show the result.
    Lookup(TagId),
    /// Enroll `name` with `tag_id` and show the result.
    Enroll { name: String, tag_id: TagId },
    /// Revoke the tag and show the result.
    Revoke(TagId),
    /// Show a notice.
    Notify(Notice),
}

/// Result of [`transition`]: the next state and the effects to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: TerminalState,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: TerminalState) -> Self {
        Self {
            next,
            effects: Vec::new(),
        }
    }

    fn idle_with(effect: Effect) -> Self {
        Self {
            next: TerminalState::Idle,
            effects: vec![effect],
        }
    }
}

/// Compute the next state for `event` in `state`.
///
/// # Errors
///
/// Returns `Error::InvalidStateTransition` if `event` cannot occur in
/// `state` (for example a tag read while a line of input is expected).
pub fn transition(state: &TerminalState, event: Event) -> Result<Transition> {
    use TerminalState as S;

    match (state, event) {
        // From Idle
        (S::Idle, Event::TagRead(tag_id)) => Ok(Transition::to(S::AwaitingTag {
            scanned: Some(tag_id),
        })),
        (S::Idle, Event::ScanRequested) => Ok(Transition::to(S::AwaitingTag { scanned: None })),
        (S::Idle, Event::EnrollRequested) => Ok(Transition::to(S::AwaitingUserInput {
            command: PendingCommand::Enroll,
        })),
        (S::Idle, Event::RevokeRequested) => Ok(Transition::to(S::AwaitingUserInput {
            command: PendingCommand::Revoke,
        })),
        (S::Idle, Event::InputReceived(_) | Event::DeviceFault(_)) => Ok(Transition::to(S::Idle)),

        // From AwaitingUserInput
        (
            S::AwaitingUserInput {
                command: PendingCommand::Enroll,
            },
            Event::InputReceived(line),
        ) => {
            let name = line.trim();
            if name.is_empty() {
                Ok(Transition::idle_with(Effect::Notify(Notice::InvalidName)))
            } else {
                Ok(Transition::to(S::CreatingUser {
                    name: name.to_string(),
                }))
            }
        }
        (
            S::AwaitingUserInput {
                command: PendingCommand::Revoke,
            },
            Event::InputReceived(line),
        ) => {
            if line.trim().is_empty() {
                return Ok(Transition::to(S::DeletingUser { tag_id: None }));
            }
            match TagId::parse(&line) {
                Ok(tag_id) => Ok(Transition::to(S::DeletingUser {
                    tag_id: Some(tag_id),
                })),
                Err(_) => Ok(Transition::idle_with(Effect::Notify(Notice::InvalidTagId))),
            }
        }

        // Tag arrived for a pending operation
        (S::AwaitingTag { .. }, Event::TagRead(tag_id)) => {
            Ok(Transition::idle_with(Effect::Lookup(tag_id)))
        }
        (S::CreatingUser { name }, Event::TagRead(tag_id)) => {
            Ok(Transition::idle_with(Effect::Enroll {
                name: name.clone(),
                tag_id,
            }))
        }
        (S::DeletingUser { .. }, Event::TagRead(tag_id)) => {
            Ok(Transition::idle_with(Effect::Revoke(tag_id)))
        }

        // Deadlines and faults abandon any transient state
        (state, Event::Timeout) if !state.is_idle() => {
            Ok(Transition::idle_with(Effect::Notify(Notice::TimedOut)))
        }
        (state, Event::DeviceFault(_)) if !state.is_idle() => {
            Ok(Transition::idle_with(Effect::Notify(Notice::ReaderError)))
        }

        (state, event) => Err(Error::InvalidStateTransition {
            from: state.kind().to_string(),
            event: event.name().to_string(),
        }),
    }
}

/// Represents a single state transition with timestamp.
///
/// # Serialization Note
///
/// The `timestamp` field is not serialized as `Instant` is process-specific.
/// When deserializing, the timestamp will be set to the current time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: StateKind,

    /// The state transitioned to.
    pub to: StateKind,

    /// When the transition occurred.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: StateKind, to: StateKind) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }
}

/// State holder that applies events through [`transition`].
///
/// The machine keeps the current state, when it was entered, and the last
/// transitions for diagnostics.
///
/// # Thread Safety
///
/// Not synchronized. The controller owns it and mutates it through `&mut self`.
///
/// # Examples
///
/// ```
/// use keytag_terminal::{Event, StateKind, StateMachine, TerminalState};
///
/// let mut machine = StateMachine::new();
///
/// machine.apply(Event::EnrollRequested).unwrap();
/// machine.apply(Event::InputReceived("Alice".into())).unwrap();
///
/// assert_eq!(
///     machine.current_state(),
///     &TerminalState::CreatingUser { name: "Alice".into() }
/// );
/// assert_eq!(machine.history().len(), 2);
/// assert_eq!(machine.history()[1].to, StateKind::CreatingUser);
/// ```
#[derive(Debug)]
pub struct StateMachine {
    /// Current state of the terminal.
    current_state: TerminalState,

    /// When the current state was entered.
    state_entered_at: Instant,

    /// History of state transitions (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a new state machine in the Idle state.
    pub fn new() -> Self {
        Self::with_state(TerminalState::Idle)
    }

    /// Create a state machine starting in `state`.
    pub fn with_state(state: TerminalState) -> Self {
        Self {
            current_state: state,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> &TerminalState {
        &self.current_state
    }

    /// Get the time elapsed in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Get the transition history, ordered from oldest to newest.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Get the last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Apply `event` and return the effects to run.
    ///
    /// A transition that leaves the state unchanged (an ignored line while
    /// idle) is not recorded in history.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the event cannot occur in
    /// the current state. The state is left unchanged in that case.
    pub fn apply(&mut self, event: Event) -> Result<Vec<Effect>> {
        let Transition { next, effects } = transition(&self.current_state, event)?;

        if next != self.current_state {
            let record = StateTransition::new(self.current_state.kind(), next.kind());
            self.perform_state_change(next, record);
        }

        Ok(effects)
    }

    /// Reset the state machine to Idle regardless of the current state.
    ///
    /// Used to recover from an invalid transition.
    pub fn reset(&mut self) -> StateTransition {
        let transition = StateTransition::new(self.current_state.kind(), StateKind::Idle);
        self.perform_state_change(TerminalState::Idle, transition.clone());
        transition
    }

    fn perform_state_change(&mut self, new_state: TerminalState, transition: StateTransition) {
        self.current_state = new_state;
        self.state_entered_at = Instant::now();

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
