//! Audio engine
//!
//! Runs narration playback on a dedicated thread, accepting commands via
//! crossbeam channels and emitting events back. Spectrum data is shared via
//! `Arc<Mutex<AudioAnalysis>>`.
//!
//! The engine owns the single audible source: `Play` always stops whatever is
//! currently in the sink before appending the new clip, so two narrations can
//! never overlap no matter how quickly slides change.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use rodio::{DeviceSinkBuilder, Player};

use crate::error::{LecternError, Result};

use super::analyzer::AnalyzingSource;
use super::types::{AudioAnalysis, AudioCommand, AudioEvent, PcmClip, PlaybackState};

/// Poll interval of the engine loop; bounds the latency of the
/// natural-completion check.
const TICK: Duration = Duration::from_millis(50);

/// Audio engine that manages playback on a dedicated thread
pub struct AudioEngine {
    cmd_tx: Sender<AudioCommand>,
    event_rx: Receiver<AudioEvent>,
    analysis: Arc<Mutex<AudioAnalysis>>,
    thread: Option<JoinHandle<()>>,
}

impl AudioEngine {
    /// Create a new audio engine, spawning the engine thread.
    ///
    /// Blocks until the audio output stream is initialized (or fails). When
    /// no output device is available this returns an error and the caller is
    /// expected to run without playback.
    pub fn new() -> Result<Self> {
        let (cmd_tx, cmd_rx) = bounded::<AudioCommand>(16);
        let (event_tx, event_rx) = bounded::<AudioEvent>(64);
        let (init_tx, init_rx) = bounded::<std::result::Result<(), String>>(1);

        let analysis = Arc::new(Mutex::new(AudioAnalysis::default()));
        let analysis_thread = analysis.clone();

        let thread = thread::Builder::new()
            .name("audio-engine".to_string())
            .spawn(move || {
                Self::run(cmd_rx, event_tx, init_tx, analysis_thread);
            })
            .map_err(|e| LecternError::Audio(format!("Failed to spawn audio thread: {}", e)))?;

        // Wait for initialization
        let init_result = init_rx
            .recv()
            .map_err(|_| LecternError::Audio("Audio thread terminated during init".to_string()))?;

        init_result.map_err(LecternError::Audio)?;

        Ok(Self {
            cmd_tx,
            event_rx,
            analysis,
            thread: Some(thread),
        })
    }

    /// Send a command to the engine
    pub fn send(&self, cmd: AudioCommand) {
        let _ = self.cmd_tx.send(cmd);
    }

    /// Stop the current source (if any) and start playing the clip
    pub fn play(&self, clip: PcmClip) {
        self.send(AudioCommand::Play(clip));
    }

    /// Stop playback. Safe to call when nothing is playing.
    pub fn stop(&self) {
        self.send(AudioCommand::Stop);
    }

    /// Pause playback
    pub fn pause(&self) {
        self.send(AudioCommand::Pause);
    }

    /// Resume paused playback
    pub fn resume(&self) {
        self.send(AudioCommand::Resume);
    }

    /// Set volume (clamped to 0.0..=2.0)
    pub fn set_volume(&self, volume: f32) {
        self.send(AudioCommand::SetVolume(volume));
    }

    /// Non-blocking poll for the next event
    pub fn try_recv_event(&self) -> Option<AudioEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Get a handle to the shared analysis data
    pub fn analysis(&self) -> Arc<Mutex<AudioAnalysis>> {
        self.analysis.clone()
    }

    /// Graceful shutdown (consumes self)
    pub fn shutdown(mut self) {
        self.shutdown_inner();
    }

    fn shutdown_inner(&mut self) {
        let _ = self.cmd_tx.send(AudioCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }

    /// The engine's main loop, running on the dedicated thread
    fn run(
        cmd_rx: Receiver<AudioCommand>,
        event_tx: Sender<AudioEvent>,
        init_tx: Sender<std::result::Result<(), String>>,
        analysis: Arc<Mutex<AudioAnalysis>>,
    ) {
        // Create audio output on this thread (cpal streams may be !Send)
        let mut stream = match DeviceSinkBuilder::open_default_sink() {
            Ok(s) => s,
            Err(e) => {
                let _ = init_tx.send(Err(format!("Failed to open audio output: {}", e)));
                return;
            }
        };
        stream.log_on_drop(false);

        // `stream` must be declared before `sink` so Rust drops sink first
        let sink = Player::connect_new(stream.mixer());

        let _ = init_tx.send(Ok(()));

        let mut state = PlaybackState::Stopped;
        let mut current_volume: f32 = 1.0;

        loop {
            match cmd_rx.recv_timeout(TICK) {
                Ok(cmd) => match cmd {
                    AudioCommand::Play(clip) => {
                        // Release the previous source before starting the new
                        // one — the single-owner rule for the audio output.
                        sink.stop();
                        if let Ok(mut data) = analysis.lock() {
                            data.reset();
                        }

                        let analyzing = AnalyzingSource::new(clip.to_source(), analysis.clone());
                        sink.append(analyzing);
                        sink.set_volume(current_volume);
                        sink.play();
                        state = PlaybackState::Playing;
                        let _ = event_tx.send(AudioEvent::Playing);
                    }
                    AudioCommand::Stop => {
                        sink.stop();
                        if let Ok(mut data) = analysis.lock() {
                            data.reset();
                        }
                        if state != PlaybackState::Stopped {
                            state = PlaybackState::Stopped;
                            let _ = event_tx.send(AudioEvent::Stopped);
                        }
                    }
                    AudioCommand::Pause => {
                        if state == PlaybackState::Playing {
                            sink.pause();
                            state = PlaybackState::Paused;
                            let _ = event_tx.send(AudioEvent::Paused);
                        }
                    }
                    AudioCommand::Resume => {
                        if state == PlaybackState::Paused {
                            sink.play();
                            state = PlaybackState::Playing;
                            let _ = event_tx.send(AudioEvent::Resumed);
                        }
                    }
                    AudioCommand::SetVolume(vol) => {
                        current_volume = vol.clamp(0.0, 2.0);
                        sink.set_volume(current_volume);
                    }
                    AudioCommand::Shutdown => {
                        sink.stop();
                        break;
                    }
                },
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    // Natural completion: the clip played out on its own
                    if state == PlaybackState::Playing && sink.empty() {
                        state = PlaybackState::Stopped;
                        if let Ok(mut data) = analysis.lock() {
                            data.reset();
                        }
                        let _ = event_tx.send(AudioEvent::Finished);
                    }
                }
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    break;
                }
            }
        }
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        self.shutdown_inner();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::decoder::decode_pcm16;

    /// One second of mono sine narration as raw s16le bytes, decoded
    fn one_second_clip() -> PcmClip {
        let bytes: Vec<u8> = (0..24_000i32)
            .flat_map(|i| (((i as f32 * 0.1).sin() * 10_000.0) as i16).to_le_bytes())
            .collect();
        decode_pcm16(&bytes).unwrap()
    }

    /// A very short clip (~10 ms)
    fn short_clip() -> PcmClip {
        let bytes: Vec<u8> = (0..240i32)
            .flat_map(|i| (((i as f32 * 0.5).sin() * 5_000.0) as i16).to_le_bytes())
            .collect();
        decode_pcm16(&bytes).unwrap()
    }

    /// Helper: wait for the next event within a timeout
    fn wait_for_event(engine: &AudioEngine, timeout_ms: u64) -> Option<AudioEvent> {
        let deadline = std::time::Instant::now() + Duration::from_millis(timeout_ms);
        loop {
            if let Some(evt) = engine.try_recv_event() {
                return Some(evt);
            }
            if std::time::Instant::now() >= deadline {
                return None;
            }
            thread::sleep(Duration::from_millis(25));
        }
    }

    /// Helper: try to create an engine; return None if audio hardware is unavailable
    fn try_engine() -> Option<AudioEngine> {
        AudioEngine::new().ok()
    }

    // --- Lifecycle ---

    #[test]
    fn create_and_shutdown() {
        let Some(engine) = try_engine() else { return };
        engine.shutdown();
    }

    #[test]
    fn drop_triggers_shutdown() {
        let Some(engine) = try_engine() else { return };
        drop(engine);
        // If we get here without hanging, shutdown worked
    }

    // --- Play / Stop ---

    #[test]
    fn play_and_stop() {
        let Some(engine) = try_engine() else { return };

        engine.play(one_second_clip());
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Playing) => {}
            other => panic!("Expected Playing event, got {:?}", other),
        }

        engine.stop();
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Stopped) => {}
            other => panic!("Expected Stopped event, got {:?}", other),
        }

        engine.shutdown();
    }

    #[test]
    fn stop_when_not_playing_does_not_emit_event() {
        let Some(engine) = try_engine() else { return };

        engine.stop();
        thread::sleep(Duration::from_millis(200));

        let evt = engine.try_recv_event();
        assert!(
            evt.is_none(),
            "Stop when already stopped should not emit event, got {:?}",
            evt
        );

        engine.shutdown();
    }

    #[test]
    fn double_stop_only_emits_one_stopped_event() {
        let Some(engine) = try_engine() else { return };

        engine.play(one_second_clip());
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Playing) => {}
            other => panic!("Expected Playing, got {:?}", other),
        }

        engine.stop();
        thread::sleep(Duration::from_millis(100));
        engine.stop();

        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Stopped) => {}
            other => panic!("Expected Stopped, got {:?}", other),
        }

        thread::sleep(Duration::from_millis(200));
        let evt = engine.try_recv_event();
        assert!(
            evt.is_none(),
            "Second stop should not emit event, got {:?}",
            evt
        );

        engine.shutdown();
    }

    #[test]
    fn play_replaces_current_playback() {
        let Some(engine) = try_engine() else { return };

        engine.play(one_second_clip());
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Playing) => {}
            other => panic!("Expected first Playing, got {:?}", other),
        }

        // Play a second clip without stopping the first — the engine must
        // swap sources, not layer them
        engine.play(one_second_clip());
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Playing) => {}
            other => panic!("Expected second Playing, got {:?}", other),
        }

        engine.shutdown();
    }

    // --- Natural completion ---

    #[test]
    fn short_clip_finishes_on_its_own() {
        let Some(engine) = try_engine() else { return };

        engine.play(short_clip());
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Playing) => {}
            other => panic!("Expected Playing, got {:?}", other),
        }

        match wait_for_event(&engine, 3000) {
            Some(AudioEvent::Finished) => {}
            other => panic!("Expected Finished for short clip, got {:?}", other),
        }

        engine.shutdown();
    }

    #[test]
    fn analysis_reset_after_finish() {
        let Some(engine) = try_engine() else { return };

        engine.play(short_clip());
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Playing) => {}
            _ => {
                engine.shutdown();
                return;
            }
        }
        match wait_for_event(&engine, 3000) {
            Some(AudioEvent::Finished) => {}
            _ => {}
        }
        thread::sleep(Duration::from_millis(100));

        let data = engine.analysis();
        let analysis = data.lock().unwrap();
        assert!(analysis.bins.iter().all(|&v| v == 0.0));
        assert_eq!(analysis.sample_count, 0);

        drop(analysis);
        engine.shutdown();
    }

    // --- Pause / Resume ---

    #[test]
    fn pause_and_resume() {
        let Some(engine) = try_engine() else { return };

        engine.play(one_second_clip());
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Playing) => {}
            other => panic!("Expected Playing, got {:?}", other),
        }

        engine.pause();
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Paused) => {}
            other => panic!("Expected Paused, got {:?}", other),
        }

        engine.resume();
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Resumed) => {}
            other => panic!("Expected Resumed, got {:?}", other),
        }

        engine.shutdown();
    }

    #[test]
    fn pause_when_stopped_is_noop() {
        let Some(engine) = try_engine() else { return };

        engine.pause();
        thread::sleep(Duration::from_millis(200));
        assert!(engine.try_recv_event().is_none());

        engine.shutdown();
    }

    #[test]
    fn paused_clip_does_not_finish() {
        let Some(engine) = try_engine() else { return };

        engine.play(one_second_clip());
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Playing) => {}
            _ => {
                engine.shutdown();
                return;
            }
        }

        engine.pause();
        match wait_for_event(&engine, 2000) {
            Some(AudioEvent::Paused) => {}
            other => panic!("Expected Paused, got {:?}", other),
        }

        // While paused the sink still holds the source, so no Finished event
        thread::sleep(Duration::from_millis(300));
        assert!(engine.try_recv_event().is_none());

        engine.shutdown();
    }

    // --- Volume ---

    #[test]
    fn set_volume_does_not_crash() {
        let Some(engine) = try_engine() else { return };
        engine.set_volume(0.5);
        engine.set_volume(0.0);
        engine.set_volume(5.0); // should clamp to 2.0
        engine.set_volume(-1.0); // should clamp to 0.0
        engine.shutdown();
    }

    // --- Analysis handle ---

    #[test]
    fn analysis_starts_at_zero() {
        let Some(engine) = try_engine() else { return };

        let data = engine.analysis();
        let analysis = data.lock().unwrap();
        assert!(analysis.bins.iter().all(|&v| v == 0.0));

        drop(analysis);
        engine.shutdown();
    }

    #[test]
    fn analysis_returns_same_arc() {
        let Some(engine) = try_engine() else { return };

        let a1 = engine.analysis();
        let a2 = engine.analysis();
        assert!(Arc::ptr_eq(&a1, &a2));

        engine.shutdown();
    }
}
