//! Controller state machine.
//!
//! # States
//!
//! - `Booting`: reader bring-up in progress
//! - `Idle`: waiting for the next read cycle or enrollment trigger
//! - `Verifying`: reader mode, read window open
//! - `EnrollingWait`: enroller mode, read window open
//! - `Signaling`: card captured, remote outcome pending or cue playing
//! - `Faulted`: reader unusable, terminal
//!
//! # Valid Transitions
//!
//! - Booting → Idle | Faulted
//! - Idle → Verifying | EnrollingWait
//! - Verifying → Idle | Signaling
//! - EnrollingWait → Signaling | Idle
//! - Signaling → Idle
//! - any → Faulted
//!
//! # Examples
//!
//! ```
//! use tapgate_controller::{ControllerState, StateMachine};
//!
//! let mut machine = StateMachine::new();
//! assert_eq!(machine.current_state(), ControllerState::Booting);
//!
//! machine.transition_to(ControllerState::Idle).unwrap();
//! machine.transition_to(ControllerState::Verifying).unwrap();
//! assert!(machine.transition_to(ControllerState::EnrollingWait).is_err());
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::Instant;
use tapgate_core::{Error, Result};

/// Maximum number of state transitions to keep in history.
///
/// A verification cycle takes two to three transitions, so this covers the
/// last few dozen card events.
const MAX_HISTORY_SIZE: usize = 100;

/// Every state of the device controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    /// Reader bring-up in progress.
    Booting,

    /// Waiting for the next read cycle or enrollment trigger.
    Idle,

    /// Reader mode: read window open.
    Verifying,

    /// Enroller mode: read window open.
    EnrollingWait,

    /// Remote outcome pending or indicator cue playing.
    Signaling,

    /// Reader unusable; the process exits after cleanup.
    Faulted,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            ControllerState::Booting => "Booting",
            ControllerState::Idle => "Idle",
            ControllerState::Verifying => "Verifying",
            ControllerState::EnrollingWait => "EnrollingWait",
            ControllerState::Signaling => "Signaling",
            ControllerState::Faulted => "Faulted",
        };
        write!(f, "{}", state_str)
    }
}

impl ControllerState {
    /// Check if transition to `target` is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use tapgate_controller::ControllerState;
    ///
    /// assert!(ControllerState::Idle.can_transition_to(&ControllerState::Verifying));
    /// assert!(ControllerState::Signaling.can_transition_to(&ControllerState::Faulted));
    /// assert!(!ControllerState::Faulted.can_transition_to(&ControllerState::Idle));
    /// ```
    pub fn can_transition_to(&self, target: &ControllerState) -> bool {
        matches!(
            (self, target),
            // Any state may fault
            (_, ControllerState::Faulted)
            // From Booting
            | (ControllerState::Booting, ControllerState::Idle)
            // From Idle
            | (ControllerState::Idle, ControllerState::Verifying | ControllerState::EnrollingWait)
            // From Verifying
            | (ControllerState::Verifying, ControllerState::Idle | ControllerState::Signaling)
            // From EnrollingWait
            | (ControllerState::EnrollingWait, ControllerState::Signaling | ControllerState::Idle)
            // From Signaling
            | (ControllerState::Signaling, ControllerState::Idle)
        )
    }

    /// Whether the state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ControllerState::Faulted)
    }
}

/// A single state transition with timestamp.
///
/// The `timestamp` field is not serialized as `Instant` is process-specific.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: ControllerState,

    pub to: ControllerState,

    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl StateTransition {
    pub fn new(from: ControllerState, to: ControllerState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }
}

/// State machine of the device controller.
///
/// Not thread-safe by itself; the controller keeps it behind a mutex.
#[derive(Debug)]
pub struct StateMachine {
    current_state: ControllerState,
    history: VecDeque<StateTransition>,
}

impl StateMachine {
    /// Create a new state machine in the `Booting` state.
    pub fn new() -> Self {
        Self {
            current_state: ControllerState::Booting,
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn current_state(&self) -> ControllerState {
        self.current_state
    }

    /// Recent transitions, oldest first.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// The last `count` transitions, oldest first.
    pub fn last_transitions(&self, count: usize) -> Vec<StateTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    /// Transition to `new_state`, validating the move.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` and leaves the machine
    /// untouched if the move is not allowed.
    pub fn transition_to(&mut self, new_state: ControllerState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.current_state = new_state;

        self.history.push_back(transition.clone());
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }

        Ok(transition)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
