//! Access terminal core.
//!
//! This crate contains the state machine and control loop of the keytag
//! terminal, plus a virtual character LCD used by the console emulator and
//! by tests.

pub mod config;
pub mod controller;
pub mod display;
pub mod messages;
pub mod state_machine;

pub use config::TerminalConfig;
pub use controller::StateController;
pub use display::{VirtualDisplay, VirtualDisplayBuilder, truncate_text};
pub use messages::{DisplayMessages, Screen};
pub use state_machine::{
    Awaiting, Effect, Event, Notice, PendingCommand, StateKind, StateMachine, StateTransition,
    TerminalState, Transition, transition,
};
