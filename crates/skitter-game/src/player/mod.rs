//! Player movement core
//!
//! [`Brain`] picks a [`PlayerState`] from intent, the state hooks configure the
//! [`Motor`], and the motor moves the body through a collision oracle while
//! its [`PlatformPass`] opens and closes one-way platforms.

mod brain;
mod controller;
mod motor;
mod movement;
mod platform_pass;
mod state;

pub use brain::{Brain, BrainConfig};
pub use controller::{PlayerConfig, PlayerController};
pub use motor::{Motor, MotorMode, MotorSnapshot};
pub use movement::{HorizontalAxis, MovementConfig, ProbeConfig};
pub use platform_pass::{PassThroughConfig, PlatformPass};
pub use state::{PlayerState, StateContext, StateHooks, StateMachine};
