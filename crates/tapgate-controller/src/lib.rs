//! Tapgate controller crate.
//!
//! Ties the reader, the indicators, the remote service and the command
//! surface of one unit together behind a validated state machine.

pub mod controller;
pub mod error;
pub mod state_machine;

pub use controller::{CardEvent, DeviceController};
pub use error::{ControllerError, ControllerResult};
pub use state_machine::{ControllerState, StateMachine, StateTransition};
