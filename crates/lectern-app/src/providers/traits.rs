//! Generative service provider traits
//!
//! The lesson pipeline treats the generative service as two collaborators:
//! one producing structured lesson content, one synthesizing narration audio.
//! Both are fallible and called from worker threads, so implementations must
//! be `Send + Sync`.

use crate::data::types::LessonContent;
use crate::error::Result;

/// A source of structured lesson content
pub trait ContentProvider: Send + Sync {
    /// Display name for the provider (e.g., "Gemini")
    fn name(&self) -> &'static str;

    /// Generate a complete lesson for the given (non-empty) topic.
    ///
    /// The returned content satisfies `LessonContent::validate`; a malformed
    /// or missing response fails the call.
    fn generate_lesson(&self, topic: &str) -> Result<LessonContent>;
}

/// A speech synthesizer for narration scripts
pub trait SpeechProvider: Send + Sync {
    /// Display name for the provider
    fn name(&self) -> &'static str;

    /// Synthesize the script into raw signed 16-bit little-endian PCM at
    /// 24 kHz mono. Fails if the service returns no audio payload.
    fn synthesize(&self, script: &str) -> Result<Vec<u8>>;
}
