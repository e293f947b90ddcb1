//! Audio subsystem
//!
//! Handles narration decoding, playback, and spectrum analysis.
//!

pub mod analyzer;
pub mod decoder;
pub mod engine;
pub mod types;

pub use analyzer::AnalyzingSource;
pub use decoder::decode_pcm16;
pub use engine::AudioEngine;
pub use types::{AudioAnalysis, AudioCommand, AudioEvent, PcmClip, PlaybackState};
