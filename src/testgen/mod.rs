// src/testgen/mod.rs
//
// Synthetic signal generation for SilentTrace.
// Produces int16 PCM tones and silence plus complete encoded frame streams,
// so the full ingestion pipeline can be driven from an in-memory reader
// without a capture process.

use std::f64::consts::PI;

use crate::core::codec::encode_frame;

/// One tone component of a synthetic chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneSpec {
    pub frequency: f64,
    /// Linear amplitude, 1.0 = full scale
    pub amplitude: f64,
}

impl ToneSpec {
    pub fn new(frequency: f64, amplitude: f64) -> Self {
        Self { frequency, amplitude }
    }
}

fn to_i16(value: f64) -> i16 {
    (value * 32767.0).round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Mono sine tone as int16 PCM
pub fn sine_pcm(frequency: f64, amplitude: f64, sample_rate: u32, frames: usize) -> Vec<i16> {
    mixed_pcm(&[ToneSpec::new(frequency, amplitude)], sample_rate, frames)
}

/// Sum of tones as mono int16 PCM, clipped to full scale
pub fn mixed_pcm(tones: &[ToneSpec], sample_rate: u32, frames: usize) -> Vec<i16> {
    let rate = sample_rate.max(1) as f64;
    (0..frames)
        .map(|i| {
            let t = i as f64 / rate;
            let v: f64 = tones
                .iter()
                .map(|tone| tone.amplitude * (2.0 * PI * tone.frequency * t).sin())
                .sum();
            to_i16(v)
        })
        .collect()
}

pub fn silence_pcm(frames: usize) -> Vec<i16> {
    vec![0; frames]
}

/// Repeat every mono sample across `channels` interleaved channels
pub fn interleave(mono: &[i16], channels: u32) -> Vec<i16> {
    let channels = channels.max(1) as usize;
    mono.iter()
        .flat_map(|&s| std::iter::repeat(s).take(channels))
        .collect()
}

/// Builds a byte stream of consecutive encoded frames
#[derive(Debug, Clone)]
pub struct FrameStreamBuilder {
    sample_rate: u32,
    channels: u32,
    frames_per_chunk: usize,
    next_timestamp_ms: u64,
    bytes: Vec<u8>,
    chunks: usize,
}

impl FrameStreamBuilder {
    pub fn new(sample_rate: u32, frames_per_chunk: usize) -> Self {
        Self {
            sample_rate,
            channels: 1,
            frames_per_chunk,
            next_timestamp_ms: 0,
            bytes: Vec::new(),
            chunks: 0,
        }
    }

    /// Interleave every chunk across this many channels
    pub fn channels(mut self, channels: u32) -> Self {
        self.channels = channels.max(1);
        self
    }

    fn push_mono(mut self, mono: Vec<i16>) -> Self {
        let samples = interleave(&mono, self.channels);
        self.bytes.extend(encode_frame(
            self.next_timestamp_ms,
            self.sample_rate,
            self.channels,
            &samples,
        ));
        let chunk_ms = self.frames_per_chunk as u64 * 1000 / self.sample_rate.max(1) as u64;
        self.next_timestamp_ms += chunk_ms;
        self.chunks += 1;
        self
    }

    pub fn tone(self, frequency: f64, amplitude: f64) -> Self {
        let pcm = sine_pcm(frequency, amplitude, self.sample_rate, self.frames_per_chunk);
        self.push_mono(pcm)
    }

    pub fn silence(self) -> Self {
        let pcm = silence_pcm(self.frames_per_chunk);
        self.push_mono(pcm)
    }

    /// Append raw bytes, e.g. a deliberately corrupt header
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    /// Number of complete frames added so far
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}
