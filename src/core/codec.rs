// src/core/codec.rs
//
// Wire framing between the capture process and the monitor.
//
// Each chunk is a 24-byte little-endian header followed by interleaved
// signed 16-bit PCM:
//
//   offset  size  field
//   0       8     timestamp_ms  (u64)
//   8       4     sample_rate   (u32, non-zero)
//   12      4     frame_count   (u32, samples per channel)
//   16      4     channels      (u32, 1..=MAX_CHANNELS)
//   20      4     padding       (ignored on decode, zero on encode)
//
// This is the capture side's native `{u64, u32, u32, u32}` struct including
// its trailing alignment padding on LP64 targets.

use std::io::{ErrorKind, Read};

use super::ingest::ShutdownSignal;
use crate::error::TransportError;

/// Exact header size on the wire
pub const HEADER_LEN: usize = 24;
/// Bytes per PCM sample
pub const BYTES_PER_SAMPLE: usize = 2;
pub const MAX_CHANNELS: u32 = 8;
/// Upper bound on samples per channel in one chunk
pub const MAX_FRAME_COUNT: u32 = 1 << 22;

/// Decoded chunk of audio, interleaved and normalized
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Capture-side timestamp in milliseconds
    pub timestamp: u64,
    pub sample_rate: u32,
    pub channel_count: u32,
    /// Interleaved samples, `i16 / 32768.0`
    pub samples: Vec<f32>,
}

impl AudioChunk {
    /// Samples per channel
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channel_count.max(1) as usize
    }

    /// Per-frame channel average; mono chunks are returned as-is
    pub fn mono(&self) -> Vec<f32> {
        let channels = self.channel_count.max(1) as usize;
        if channels == 1 {
            return self.samples.clone();
        }

        self.samples
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    }
}

/// Fixed-size chunk header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub timestamp_ms: u64,
    pub sample_rate: u32,
    pub frame_count: u32,
    pub channels: u32,
}

impl FrameHeader {
    /// Decode and validate a header; anything but exactly [`HEADER_LEN`]
    /// bytes is rejected
    pub fn decode(bytes: &[u8]) -> Result<Self, TransportError> {
        if bytes.len() != HEADER_LEN {
            return Err(TransportError::malformed(format!(
                "expected {} header bytes, got {}",
                HEADER_LEN,
                bytes.len()
            )));
        }

        let header = Self {
            timestamp_ms: u64::from_le_bytes(le_bytes(&bytes[0..8])),
            sample_rate: u32::from_le_bytes(le_bytes(&bytes[8..12])),
            frame_count: u32::from_le_bytes(le_bytes(&bytes[12..16])),
            channels: u32::from_le_bytes(le_bytes(&bytes[16..20])),
        };
        header.validate()?;
        Ok(header)
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        out[0..8].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        out[8..12].copy_from_slice(&self.sample_rate.to_le_bytes());
        out[12..16].copy_from_slice(&self.frame_count.to_le_bytes());
        out[16..20].copy_from_slice(&self.channels.to_le_bytes());
        out
    }

    fn validate(&self) -> Result<(), TransportError> {
        if self.sample_rate == 0 {
            return Err(TransportError::malformed("sample rate is zero"));
        }
        if self.channels == 0 || self.channels > MAX_CHANNELS {
            return Err(TransportError::malformed(format!(
                "channel count {} outside 1..={}",
                self.channels, MAX_CHANNELS
            )));
        }
        if self.frame_count > MAX_FRAME_COUNT {
            return Err(TransportError::malformed(format!(
                "frame count {} exceeds {}",
                self.frame_count, MAX_FRAME_COUNT
            )));
        }
        Ok(())
    }

    /// Payload size in bytes declared by this header
    pub fn payload_len(&self) -> usize {
        self.frame_count as usize * self.channels as usize * BYTES_PER_SAMPLE
    }
}

fn le_bytes<const N: usize>(slice: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(slice);
    out
}

/// Decode one chunk from its header and payload bytes
pub fn decode(header_bytes: &[u8], payload_bytes: &[u8]) -> Result<AudioChunk, TransportError> {
    let header = FrameHeader::decode(header_bytes)?;
    decode_payload(&header, payload_bytes)
}

/// Decode a payload against an already validated header
pub fn decode_payload(header: &FrameHeader, payload: &[u8]) -> Result<AudioChunk, TransportError> {
    let expected = header.payload_len();
    if payload.len() != expected {
        return Err(TransportError::malformed(format!(
            "header declares {} payload bytes, received {}",
            expected,
            payload.len()
        )));
    }

    let samples = payload
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|b| normalize_sample(i16::from_le_bytes([b[0], b[1]])))
        .collect();

    Ok(AudioChunk {
        timestamp: header.timestamp_ms,
        sample_rate: header.sample_rate,
        channel_count: header.channels,
        samples,
    })
}

/// Linear int16 -> float; full scale negative maps to -1.0, positive tops
/// out just below 1.0
#[inline]
pub fn normalize_sample(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

/// Encode a complete frame (header + payload) from interleaved PCM
pub fn encode_frame(timestamp_ms: u64, sample_rate: u32, channels: u32, samples: &[i16]) -> Vec<u8> {
    let channels = channels.max(1);
    let header = FrameHeader {
        timestamp_ms,
        sample_rate,
        frame_count: (samples.len() / channels as usize) as u32,
        channels,
    };

    let mut out = Vec::with_capacity(HEADER_LEN + samples.len() * BYTES_PER_SAMPLE);
    out.extend_from_slice(&header.encode());
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}

/// Reads whole chunks from a byte stream.
///
/// Short reads are accumulated until the requested byte count is satisfied.
/// Read timeouts on the underlying stream are only used to poll the
/// shutdown signal.
pub struct FrameReader<R> {
    inner: R,
    shutdown: ShutdownSignal,
}

enum Fill {
    Complete,
    /// EOF after this many bytes
    Eof(usize),
}

impl<R: Read> FrameReader<R> {
    pub fn new(inner: R, shutdown: ShutdownSignal) -> Self {
        Self { inner, shutdown }
    }

    /// Block until one full chunk has been read and decoded.
    ///
    /// EOF before any header byte is `Closed`, EOF inside a header is a
    /// truncated (malformed) header, and EOF inside a payload is `Closed`.
    pub fn read_chunk(&mut self) -> Result<AudioChunk, TransportError> {
        let mut header_bytes = [0u8; HEADER_LEN];
        match self.fill(&mut header_bytes)? {
            Fill::Complete => {}
            Fill::Eof(0) => return Err(TransportError::Closed),
            Fill::Eof(n) => {
                return Err(TransportError::malformed(format!(
                    "stream ended after {} of {} header bytes",
                    n, HEADER_LEN
                )))
            }
        }

        let header = FrameHeader::decode(&header_bytes)?;

        let mut payload = vec![0u8; header.payload_len()];
        match self.fill(&mut payload)? {
            Fill::Complete => decode_payload(&header, &payload),
            Fill::Eof(_) => Err(TransportError::Closed),
        }
    }

    fn fill(&mut self, buf: &mut [u8]) -> Result<Fill, TransportError> {
        let mut filled = 0;
        while filled < buf.len() {
            if self.shutdown.is_triggered() {
                return Err(TransportError::Cancelled);
            }
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Ok(Fill::Eof(filled)),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    continue
                }
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Ok(Fill::Complete)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    fn header(frame_count: u32, channels: u32) -> FrameHeader {
        FrameHeader {
            timestamp_ms: 1_700_000_000_123,
            sample_rate: 44100,
            frame_count,
            channels,
        }
    }

    #[test]
    fn test_header_layout() {
        let bytes = header(2048, 1).encode();
        assert_eq!(bytes.len(), HEADER_LEN);
        assert_eq!(&bytes[8..12], &44100u32.to_le_bytes());
        assert_eq!(&bytes[20..24], &[0, 0, 0, 0]);
        assert_eq!(FrameHeader::decode(&bytes).unwrap(), header(2048, 1));
    }

    #[test]
    fn test_header_padding_is_ignored() {
        let mut bytes = header(16, 2).encode();
        bytes[20..24].copy_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
        assert_eq!(FrameHeader::decode(&bytes).unwrap().channels, 2);
    }

    #[test]
    fn test_wrong_header_length_is_malformed() {
        let bytes = header(16, 1).encode();
        let err = FrameHeader::decode(&bytes[..16]).unwrap_err();
        assert!(matches!(err, TransportError::MalformedHeader { .. }));
    }

    #[test]
    fn test_invalid_fields_are_malformed() {
        let mut zero_rate = header(16, 1);
        zero_rate.sample_rate = 0;
        assert!(FrameHeader::decode(&zero_rate.encode()).is_err());
        assert!(FrameHeader::decode(&header(16, 0).encode()).is_err());
        assert!(FrameHeader::decode(&header(16, 9).encode()).is_err());
        assert!(FrameHeader::decode(&header(MAX_FRAME_COUNT + 1, 1).encode()).is_err());
    }

    #[test]
    fn test_normalization_is_linear() {
        let samples = [0i16, 16384, -16384, i16::MAX, i16::MIN, 1];
        let frame = encode_frame(5, 44100, 1, &samples);
        let chunk = decode(&frame[..HEADER_LEN], &frame[HEADER_LEN..]).unwrap();
        for (decoded, &raw) in chunk.samples.iter().zip(&samples) {
            assert!((decoded - raw as f32 / 32768.0).abs() < f32::EPSILON);
        }
        assert_eq!(chunk.samples[4], -1.0);
        assert!(chunk.samples[3] < 1.0);
        assert_eq!(chunk.timestamp, 5);
    }

    #[test]
    fn test_payload_size_mismatch_is_malformed() {
        let frame = encode_frame(0, 44100, 1, &[1, 2, 3, 4]);
        let err = decode(&frame[..HEADER_LEN], &frame[HEADER_LEN..HEADER_LEN + 6]).unwrap_err();
        assert!(matches!(err, TransportError::MalformedHeader { .. }));
    }

    #[test]
    fn test_mono_downmix() {
        let frame = encode_frame(0, 48000, 2, &[16384, 0, -16384, -16384]);
        let chunk = decode(&frame[..HEADER_LEN], &frame[HEADER_LEN..]).unwrap();
        assert_eq!(chunk.frame_count(), 2);
        assert_eq!(chunk.mono(), vec![0.25, -0.5]);
    }

    /// Yields at most `step` bytes per read and one spurious interrupt
    struct Trickle {
        data: Cursor<Vec<u8>>,
        step: usize,
        interrupted: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(ErrorKind::Interrupted, "signal"));
            }
            let n = buf.len().min(self.step);
            self.data.read(&mut buf[..n])
        }
    }

    #[test]
    fn test_short_reads_are_accumulated() {
        let samples: Vec<i16> = (0..300).map(|i| i as i16 * 7).collect();
        let mut stream = encode_frame(9, 44100, 1, &samples);
        stream.extend(encode_frame(10, 44100, 1, &samples));
        let trickle = Trickle {
            data: Cursor::new(stream),
            step: 5,
            interrupted: false,
        };
        let mut reader = FrameReader::new(trickle, ShutdownSignal::new());
        assert_eq!(reader.read_chunk().unwrap().timestamp, 9);
        let second = reader.read_chunk().unwrap();
        assert_eq!(second.timestamp, 10);
        assert_eq!(second.samples.len(), 300);
        assert!(matches!(reader.read_chunk(), Err(TransportError::Closed)));
    }

    #[test]
    fn test_truncated_header_is_malformed() {
        let frame = encode_frame(0, 44100, 1, &[0; 8]);
        let mut reader = FrameReader::new(Cursor::new(frame[..10].to_vec()), ShutdownSignal::new());
        assert!(matches!(
            reader.read_chunk(),
            Err(TransportError::MalformedHeader { .. })
        ));
    }

    #[test]
    fn test_truncated_payload_is_closed() {
        let frame = encode_frame(0, 44100, 1, &[0; 8]);
        let mut reader = FrameReader::new(
            Cursor::new(frame[..HEADER_LEN + 4].to_vec()),
            ShutdownSignal::new(),
        );
        assert!(matches!(reader.read_chunk(), Err(TransportError::Closed)));
    }

    #[test]
    fn test_shutdown_cancels_read() {
        let shutdown = ShutdownSignal::new();
        shutdown.trigger();
        let frame = encode_frame(0, 44100, 1, &[0; 8]);
        let mut reader = FrameReader::new(Cursor::new(frame), shutdown);
        assert!(matches!(reader.read_chunk(), Err(TransportError::Cancelled)));
    }
}
