//! Avatar presentation state
//!
//! Derives the teacher avatar's binary speaking/idle presentation from the
//! session snapshot: which animation runs, what the status indicator shows,
//! and whether the transient speech bubble is visible. Pure derivation — the
//! playback lifecycle itself lives in the engine and session controller.

use crate::session::state::{SessionSnapshot, SlideAudioPhase};

/// Caption shown in the speech bubble while narrating
pub const BUBBLE_TEXT: &str = "讲解中...";

/// Which idle/active animation the avatar runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarAnimation {
    /// Fast pulse synced to narration
    Talking,
    /// Slow idle breathing
    Breathing,
}

/// Status indicator color next to the avatar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorState {
    /// Narration playing (green, glowing)
    Live,
    /// Narration loading
    Busy,
    /// Idle / paused / finished
    Off,
}

/// Derived avatar presentation for one rendered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AvatarState {
    pub is_speaking: bool,
    pub animation: AvatarAnimation,
    pub indicator: IndicatorState,
    pub show_bubble: bool,
}

impl AvatarState {
    /// Derive the presentation from the current session snapshot
    pub fn derive(snapshot: &SessionSnapshot) -> Self {
        let is_speaking = snapshot.is_speaking();
        let indicator = match snapshot.audio {
            SlideAudioPhase::Playing if is_speaking => IndicatorState::Live,
            SlideAudioPhase::Loading => IndicatorState::Busy,
            _ => IndicatorState::Off,
        };
        Self {
            is_speaking,
            animation: if is_speaking {
                AvatarAnimation::Talking
            } else {
                AvatarAnimation::Breathing
            },
            indicator,
            show_bubble: is_speaking,
        }
    }
}

/// Animated avatar radius for the given UI tick.
///
/// Talking bobs fast and visibly; breathing drifts slowly.
pub fn animated_radius(base_radius: f32, animation: AvatarAnimation, tick: u64) -> f32 {
    let t = tick as f32;
    match animation {
        AvatarAnimation::Talking => base_radius * (1.0 + 0.05 * (t * 0.6).sin()),
        AvatarAnimation::Breathing => base_radius * (1.0 + 0.02 * (t * 0.08).sin()),
    }
}
