//! Lesson session
//!
//! Shared session state and the controller that owns the audio engine and
//! coordinates generation, navigation, and playback.

pub mod controller;
pub mod state;

pub use controller::SessionController;
pub use state::{SessionCommand, SessionPhase, SessionSnapshot, SlideAudioPhase};
