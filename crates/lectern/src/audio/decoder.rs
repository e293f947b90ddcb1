//! PCM narration decoder
//!
//! The speech service delivers headerless signed 16-bit little-endian PCM at
//! 24 kHz mono. Decoding is a straight integer-to-float conversion — there is
//! no container to probe.

use crate::config::audio::{CHANNELS, SAMPLE_RATE};
use crate::error::{LecternError, Result};

use super::types::PcmClip;

/// Decode a raw s16le PCM payload into a playable clip.
///
/// Each 16-bit sample is divided by 32768 to land in [-1.0, 1.0). The frame
/// count is `bytes.len() / 2`. An odd byte length means a truncated payload
/// and is rejected rather than silently dropping the trailing byte.
pub fn decode_pcm16(bytes: &[u8]) -> Result<PcmClip> {
    if bytes.is_empty() {
        return Err(LecternError::Decode("empty audio payload".to_string()));
    }
    if bytes.len() % 2 != 0 {
        return Err(LecternError::Decode(format!(
            "PCM payload length {} is not a multiple of 2",
            bytes.len()
        )));
    }

    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect();

    Ok(PcmClip {
        samples: samples.into(),
        sample_rate: SAMPLE_RATE,
        channels: CHANNELS,
    })
}
