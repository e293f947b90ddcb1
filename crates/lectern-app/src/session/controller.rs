//! Session controller
//!
//! Owns the audio engine and the shared snapshot, and processes commands from
//! the UI through a single crossbeam channel. Provider calls run on worker
//! threads; their results come back as `Internal*` commands tagged with a
//! generation counter so anything superseded by navigation or a new topic is
//! discarded instead of clobbering the current slide.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};

use lectern::audio::{decode_pcm16, AudioAnalysis, AudioEngine, AudioEvent};

use crate::data::types::LessonContent;
use crate::error::AppError;
use crate::providers::{ContentProvider, SpeechProvider};

use super::state::{SessionCommand, SessionPhase, SessionSnapshot, SlideAudioPhase};

pub struct SessionController {
    cmd_rx: Receiver<SessionCommand>,
    cmd_tx: Sender<SessionCommand>,
    shared_state: Arc<Mutex<SessionSnapshot>>,
    content: Arc<dyn ContentProvider>,
    speech: Arc<dyn SpeechProvider>,
    engine: Option<AudioEngine>,
    /// Monotonically increasing counter to discard stale generation results
    lesson_generation: u64,
    /// Monotonically increasing counter to discard stale narration results
    fetch_generation: u64,
    /// One-shot channel to send the engine's analysis Arc to the UI thread
    analysis_tx: Option<Sender<Arc<Mutex<AudioAnalysis>>>>,
    /// Saved volume level before mute (for restoring on unmute)
    volume_before_mute: f32,
}

impl SessionController {
    pub fn new(
        cmd_rx: Receiver<SessionCommand>,
        cmd_tx: Sender<SessionCommand>,
        shared_state: Arc<Mutex<SessionSnapshot>>,
        content: Arc<dyn ContentProvider>,
        speech: Arc<dyn SpeechProvider>,
        analysis_tx: Option<Sender<Arc<Mutex<AudioAnalysis>>>>,
    ) -> Self {
        Self {
            cmd_rx,
            cmd_tx,
            shared_state,
            content,
            speech,
            engine: None,
            lesson_generation: 0,
            fetch_generation: 0,
            analysis_tx,
            volume_before_mute: 1.0,
        }
    }

    /// Run the controller event loop (blocking, call from a dedicated thread).
    ///
    /// Initializes the audio engine first; when no output device is available
    /// the session still runs, with playback documented-inert.
    pub fn run(&mut self) {
        let engine = match AudioEngine::new() {
            Ok(engine) => Some(engine),
            Err(e) => {
                eprintln!("Audio unavailable, continuing without narration: {e}");
                None
            }
        };
        self.run_with_engine(engine);
    }

    /// Run the loop with an explicit engine (or none). Exposed so tests can
    /// drive the state machine without audio hardware.
    pub fn run_with_engine(&mut self, engine: Option<AudioEngine>) {
        if let Some(ref engine) = engine {
            if let Some(tx) = self.analysis_tx.take() {
                let _ = tx.send(engine.analysis());
            }
        }
        {
            let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
            state.engine_active = engine.is_some();
        }
        self.engine = engine;

        loop {
            match self.cmd_rx.recv_timeout(Duration::from_millis(50)) {
                Ok(cmd) => {
                    if self.handle_command(cmd) {
                        break;
                    }
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
            }

            self.poll_engine_events();
        }

        if let Some(engine) = self.engine.take() {
            engine.shutdown();
        }
    }

    /// Handle a single command. Returns true if the loop should exit.
    fn handle_command(&mut self, cmd: SessionCommand) -> bool {
        match cmd {
            SessionCommand::Shutdown => return true,

            SessionCommand::SubmitTopic(text) => {
                self.submit_topic(text);
            }
            SessionCommand::NextSlide => {
                self.navigate(1);
            }
            SessionCommand::PrevSlide => {
                self.navigate(-1);
            }
            SessionCommand::TogglePlay => {
                self.toggle_play();
            }
            SessionCommand::Reset => {
                self.reset();
            }
            SessionCommand::SetVolume(vol) => {
                let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                state.volume = vol;
                // Auto-unmute when volume is changed to a non-zero value
                if state.is_muted && vol > 0.0 {
                    state.is_muted = false;
                }
                let engine_vol = if state.is_muted { 0.0 } else { vol };
                drop(state);
                if let Some(engine) = &self.engine {
                    engine.set_volume(engine_vol);
                }
            }
            SessionCommand::Mute => {
                let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                self.volume_before_mute = state.volume;
                state.is_muted = true;
                drop(state);
                if let Some(engine) = &self.engine {
                    engine.set_volume(0.0);
                }
            }
            SessionCommand::Unmute => {
                let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                state.is_muted = false;
                state.volume = self.volume_before_mute;
                let vol = self.volume_before_mute;
                drop(state);
                if let Some(engine) = &self.engine {
                    engine.set_volume(vol);
                }
            }
            SessionCommand::InternalLessonReady { generation, result } => {
                self.handle_lesson_ready(generation, result);
            }
            SessionCommand::InternalSpeechReady { generation, result } => {
                self.handle_speech_ready(generation, result);
            }
        }
        false
    }

    /// Kick off lesson generation on a worker thread.
    ///
    /// Valid from any phase; an empty (trimmed) topic is ignored.
    fn submit_topic(&mut self, text: String) {
        let topic = text.trim().to_string();
        if topic.is_empty() {
            return;
        }

        if let Some(engine) = &self.engine {
            engine.stop();
        }

        // Bump both generations: in-flight lesson AND narration results are
        // superseded by the new topic.
        self.lesson_generation += 1;
        self.fetch_generation += 1;
        let generation = self.lesson_generation;

        {
            let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
            state.phase = SessionPhase::GeneratingContent;
            state.lesson = None;
            state.slide_index = 0;
            state.audio = SlideAudioPhase::Idle;
            state.clip = None;
            state.last_error = None;
            state.audio_error = None;
        }

        let content = self.content.clone();
        let cmd_tx = self.cmd_tx.clone();

        std::thread::Builder::new()
            .name("lesson-generate".into())
            .spawn(move || {
                let result = content.generate_lesson(&topic).map_err(|e| e.to_string());
                let _ = cmd_tx.send(SessionCommand::InternalLessonReady { generation, result });
            })
            .expect("Failed to spawn lesson-generate thread");
    }

    /// Handle the generated lesson — enter Ready and fetch slide 0's
    /// narration (or store the error).
    ///
    /// Results with a stale `generation` are silently discarded.
    fn handle_lesson_ready(&mut self, generation: u64, result: Result<LessonContent, String>) {
        if generation != self.lesson_generation {
            // A newer topic was submitted while this one was generating.
            return;
        }

        match result {
            Ok(lesson) => {
                let first_script = lesson.slides.first().map(|s| s.script.clone());
                {
                    let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                    state.lesson = Some(Arc::new(lesson));
                    state.slide_index = 0;
                    state.phase = SessionPhase::Ready;
                }
                // Autoplay the first slide's narration
                if let Some(script) = first_script {
                    self.start_fetch(script);
                }
            }
            Err(e) => {
                eprintln!("Lesson generation failed: {e}");
                let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                state.phase = SessionPhase::Error;
                state.lesson = None;
                state.last_error = Some(e);
            }
        }
    }

    /// Start the fetch → decode → autoplay cycle for a slide's script.
    ///
    /// Stops the current narration first and clears the stored clip, so stale
    /// audio can never play over the newly selected slide.
    fn start_fetch(&mut self, script: String) {
        self.fetch_generation += 1;
        let generation = self.fetch_generation;

        if let Some(engine) = &self.engine {
            engine.stop();
        }

        {
            let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
            state.audio = SlideAudioPhase::Loading;
            state.clip = None;
            state.audio_error = None;
        }

        let speech = self.speech.clone();
        let cmd_tx = self.cmd_tx.clone();

        std::thread::Builder::new()
            .name("speech-synth".into())
            .spawn(move || {
                let result = speech.synthesize(&script).map_err(|e| e.to_string());
                let _ = cmd_tx.send(SessionCommand::InternalSpeechReady { generation, result });
            })
            .expect("Failed to spawn speech-synth thread");
    }

    /// Handle synthesized narration — decode and autoplay.
    ///
    /// Stale results are discarded; failures clear the loading state and
    /// leave the session Ready (slide content stays visible, only audio is
    /// absent).
    fn handle_speech_ready(&mut self, generation: u64, result: Result<Vec<u8>, String>) {
        if generation != self.fetch_generation {
            // Navigation started a newer fetch while this one was in flight.
            return;
        }

        let decoded = result.and_then(|bytes| {
            decode_pcm16(&bytes).map_err(|e| AppError::from(e).to_string())
        });

        match decoded {
            Ok(clip) => {
                {
                    let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                    state.clip = Some(clip.clone());
                    state.audio = SlideAudioPhase::Playing;
                }
                if let Some(engine) = &self.engine {
                    engine.play(clip);
                }
            }
            Err(e) => {
                eprintln!("Narration failed: {e}");
                let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                state.audio = SlideAudioPhase::Idle;
                state.audio_error = Some(e);
            }
        }
    }

    /// Move the slide index by delta and fetch the new slide's narration.
    ///
    /// Valid only in Ready; out-of-range moves are no-ops (no new fetch).
    fn navigate(&mut self, delta: i64) {
        let target = {
            let state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
            if state.phase != SessionPhase::Ready {
                return;
            }
            let Some(lesson) = state.lesson.as_ref() else {
                return;
            };
            let new_index = state.slide_index as i64 + delta;
            if new_index < 0 || new_index >= lesson.slide_count() as i64 {
                return;
            }
            let new_index = new_index as usize;
            lesson.slide(new_index).map(|s| (new_index, s.script.clone()))
        };

        let Some((new_index, script)) = target else {
            return;
        };

        {
            let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
            state.slide_index = new_index;
        }
        self.start_fetch(script);
    }

    /// Pause, resume, or replay the current narration.
    fn toggle_play(&mut self) {
        let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
        if state.phase != SessionPhase::Ready {
            return;
        }
        match state.audio {
            SlideAudioPhase::Playing => {
                state.audio = SlideAudioPhase::Paused;
                drop(state);
                if let Some(engine) = &self.engine {
                    engine.pause();
                }
            }
            SlideAudioPhase::Paused => {
                state.audio = SlideAudioPhase::Playing;
                drop(state);
                if let Some(engine) = &self.engine {
                    engine.resume();
                }
            }
            SlideAudioPhase::Finished | SlideAudioPhase::Idle => {
                // Replay from the start when a decoded clip is available
                let Some(clip) = state.clip.clone() else {
                    return;
                };
                state.audio = SlideAudioPhase::Playing;
                drop(state);
                if let Some(engine) = &self.engine {
                    engine.play(clip);
                }
            }
            SlideAudioPhase::Loading => {}
        }
    }

    /// Return to Idle, discarding the lesson and any narration state.
    fn reset(&mut self) {
        if let Some(engine) = &self.engine {
            engine.stop();
        }
        // Orphan any in-flight provider results
        self.lesson_generation += 1;
        self.fetch_generation += 1;

        let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
        state.phase = SessionPhase::Idle;
        state.lesson = None;
        state.slide_index = 0;
        state.audio = SlideAudioPhase::Idle;
        state.clip = None;
        state.last_error = None;
        state.audio_error = None;
    }

    /// Poll audio engine events
    fn poll_engine_events(&mut self) {
        let Some(engine) = &self.engine else { return };
        while let Some(event) = engine.try_recv_event() {
            if event == AudioEvent::Finished {
                let mut state = self.shared_state.lock().unwrap_or_else(|e| e.into_inner());
                if state.audio == SlideAudioPhase::Playing {
                    state.audio = SlideAudioPhase::Finished;
                }
            }
            // Playing/Stopped/Paused/Resumed confirm transitions the
            // controller already applied when it sent the command.
        }
    }
}
