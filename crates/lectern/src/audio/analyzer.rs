//! Audio analysis source
//!
//! `AnalyzingSource` wraps any `rodio::Source<Item=f32>` and computes a
//! byte-valued frequency spectrum per FFT window, writing results to shared
//! `AudioAnalysis` state. The bin values follow the Web-Audio-style mapping:
//! smoothed linear magnitudes converted to dB, then scaled from the
//! [MIN_DECIBELS, MAX_DECIBELS] range onto 0..=255.

use std::num::NonZero;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rodio::Source;
use rustfft::{num_complex::Complex, FftPlanner};

use crate::config::audio::{FFT_SIZE, MAX_DECIBELS, MIN_DECIBELS, SMOOTHING, SPECTRUM_BINS};

use super::types::AudioAnalysis;

/// Wrapper source that captures samples for visualization
pub struct AnalyzingSource<S> {
    inner: S,
    analysis: Arc<Mutex<AudioAnalysis>>,
    window: Vec<f32>,
    // Downmix accumulator for one interleaved frame
    frame_acc: f32,
    frame_fill: u16,
    channels: NonZero<u16>,
    sample_rate: NonZero<u32>,
    fft_planner: FftPlanner<f32>,
    smoothed: [f32; SPECTRUM_BINS],
    local_sample_count: u64,
}

impl<S> AnalyzingSource<S>
where
    S: Source<Item = f32>,
{
    /// Create a new analyzing wrapper around the given source
    pub fn new(source: S, analysis: Arc<Mutex<AudioAnalysis>>) -> Self {
        let channels = source.channels();
        let sample_rate = source.sample_rate();
        Self {
            inner: source,
            analysis,
            window: Vec::with_capacity(FFT_SIZE),
            frame_acc: 0.0,
            frame_fill: 0,
            channels,
            sample_rate,
            fft_planner: FftPlanner::new(),
            smoothed: [0.0; SPECTRUM_BINS],
            local_sample_count: 0,
        }
    }

    fn process_window(&mut self) {
        let fft = self.fft_planner.plan_fft_forward(FFT_SIZE);
        let mut fft_input: Vec<Complex<f32>> = self
            .window
            .iter()
            .take(FFT_SIZE)
            .enumerate()
            .map(|(i, &s)| {
                // Hann window
                let w =
                    0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / FFT_SIZE as f32).cos());
                Complex::new(s * w, 0.0)
            })
            .collect();

        fft.process(&mut fft_input);

        let fft_norm = 1.0 / FFT_SIZE as f32;
        let db_span = MAX_DECIBELS - MIN_DECIBELS;

        let mut bins = [0.0f32; SPECTRUM_BINS];
        for (i, bin) in bins.iter_mut().enumerate() {
            let mag = fft_input[i].norm() * fft_norm;
            self.smoothed[i] = self.smoothed[i] * SMOOTHING + mag * (1.0 - SMOOTHING);
            let db = 20.0 * self.smoothed[i].max(1e-10).log10();
            let scaled = ((db - MIN_DECIBELS) / db_span).clamp(0.0, 1.0);
            *bin = scaled * 255.0;
        }

        if let Ok(mut analysis) = self.analysis.lock() {
            analysis.bins = bins;
            analysis.sample_count = self.local_sample_count;
        }

        self.window.clear();
    }
}

impl<S> Iterator for AnalyzingSource<S>
where
    S: Source<Item = f32>,
{
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.inner.next()?;
        self.local_sample_count += 1;

        // Downmix interleaved frames to mono before windowing
        self.frame_acc += sample;
        self.frame_fill += 1;
        if self.frame_fill == self.channels.get() {
            self.window.push(self.frame_acc / self.channels.get() as f32);
            self.frame_acc = 0.0;
            self.frame_fill = 0;
        }

        if self.window.len() >= FFT_SIZE {
            self.process_window();
        }

        Some(sample)
    }
}

impl<S> Source for AnalyzingSource<S>
where
    S: Source<Item = f32>,
{
    fn current_span_len(&self) -> Option<usize> {
        self.inner.current_span_len()
    }

    fn channels(&self) -> NonZero<u16> {
        self.channels
    }

    fn sample_rate(&self) -> NonZero<u32> {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        self.inner.total_duration()
    }
}
