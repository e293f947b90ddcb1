//! Shared session state and commands
//!
//! `SessionCommand` is the command type sent by the UI (and by worker threads
//! reporting back). `SessionSnapshot` is the shared state the UI polls.

use std::sync::Arc;

use lectern::audio::PcmClip;

use crate::data::types::{LessonContent, Slide};

/// Which screen of the session is active and which operations are valid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    GeneratingContent,
    Ready,
    Error,
}

/// The audio lifecycle of the currently selected slide.
///
/// One enum instead of loading/playing/finished flags, so impossible
/// combinations cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlideAudioPhase {
    /// No narration available (not fetched, or fetch failed)
    #[default]
    Idle,
    /// Narration fetch/decode in flight
    Loading,
    /// Narration playing (autoplay after a successful fetch)
    Playing,
    /// Narration paused mid-clip
    Paused,
    /// Narration played out to its natural end
    Finished,
}

/// Commands processed by the session controller
pub enum SessionCommand {
    /// Generate a lesson for the topic (must be non-empty after trimming)
    SubmitTopic(String),
    /// Advance to the next slide (no-op at the last slide)
    NextSlide,
    /// Go back to the previous slide (no-op at the first slide)
    PrevSlide,
    /// Pause/resume narration; replays a finished clip from the start
    TogglePlay,
    /// Discard the lesson and return to the start screen
    Reset,
    /// Set narration volume
    SetVolume(f32),
    Mute,
    Unmute,
    /// Shut down the controller loop
    Shutdown,

    // Internal: worker-thread results (not sent by the UI)
    InternalLessonReady {
        generation: u64,
        result: Result<LessonContent, String>,
    },
    InternalSpeechReady {
        generation: u64,
        result: Result<Vec<u8>, String>,
    },
}

/// Snapshot of session state — shared between controller and UI
#[derive(Clone)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    /// Generated course, immutable once stored
    pub lesson: Option<Arc<LessonContent>>,
    pub slide_index: usize,
    pub audio: SlideAudioPhase,
    /// Decoded narration for the current slide, once available
    pub clip: Option<PcmClip>,
    /// Content-generation failure shown on the Error screen
    pub last_error: Option<String>,
    /// Local narration failure; the session stays Ready
    pub audio_error: Option<String>,
    pub volume: f32,
    pub is_muted: bool,
    /// False when no audio output device could be opened
    pub engine_active: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            lesson: None,
            slide_index: 0,
            audio: SlideAudioPhase::Idle,
            clip: None,
            last_error: None,
            audio_error: None,
            volume: 1.0,
            is_muted: false,
            engine_active: false,
        }
    }
}

impl SessionSnapshot {
    /// The currently selected slide, if a lesson is loaded
    pub fn current_slide(&self) -> Option<&Slide> {
        self.lesson.as_ref()?.slide(self.slide_index)
    }

    /// Number of slides in the loaded lesson (0 when none)
    pub fn slide_count(&self) -> usize {
        self.lesson.as_ref().map_or(0, |l| l.slide_count())
    }

    /// True while narration is audibly playing
    pub fn is_speaking(&self) -> bool {
        self.audio == SlideAudioPhase::Playing && self.engine_active
    }
}
