//! Audio decoding via symphonia.
//!
//! Supports MP3, M4A, AAC, and WAV input. All input is downmixed to mono
//! 16-bit samples at the file's native rate; the rest of the pipeline never
//! sees the container format again.

use crate::audio::waveform::Waveform;
use crate::error::{NotateError, Result};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Trait for decoding an audio file into a waveform.
///
/// This trait allows swapping implementations (real symphonia vs test stubs).
pub trait Decoder: Send + Sync {
    /// Decode the file at `path` into a mono waveform.
    ///
    /// Fails with [`NotateError::Decode`] on unsupported or corrupt input;
    /// such a failure is fatal for the whole run.
    fn decode(&self, path: &Path) -> Result<Waveform>;
}

/// Symphonia-backed decoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for SymphoniaDecoder {
    fn decode(&self, path: &Path) -> Result<Waveform> {
        let decode_err = |message: String| NotateError::Decode {
            path: path.display().to_string(),
            message,
        };

        let file = File::open(path).map_err(|e| decode_err(e.to_string()))?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| decode_err(format!("unrecognized format: {e}")))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| decode_err("no audio track found".to_string()))?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();
        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| decode_err("unknown sample rate".to_string()))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| decode_err(format!("unsupported codec: {e}")))?;

        let mut samples: Vec<i16> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => return Err(decode_err(format!("read error: {e}"))),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => downmix_into(&decoded, &mut samples),
                // Per symphonia docs, decode errors on single packets are
                // recoverable; skip the packet and continue.
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(e) => return Err(decode_err(format!("decode error: {e}"))),
            }
        }

        if samples.is_empty() {
            return Err(decode_err("no decodable audio".to_string()));
        }

        Ok(Waveform::new(samples, sample_rate))
    }
}

/// Downmix a decoded buffer of any channel count to mono i16 and append it.
fn downmix_into(buffer: &AudioBufferRef, out: &mut Vec<i16>) {
    let frames = buffer.frames();
    if frames == 0 {
        return;
    }

    // Convert the packet to f32 planes, then average channels per frame.
    let spec = *buffer.spec();
    let channels = spec.channels.count();
    let mut planes: Vec<Vec<f32>> = vec![Vec::with_capacity(frames); channels];

    macro_rules! copy_planes {
        ($buf:expr, $to_f32:expr) => {
            for (ch, plane) in planes.iter_mut().enumerate() {
                plane.extend($buf.chan(ch).iter().map($to_f32));
            }
        };
    }

    match buffer {
        AudioBufferRef::F32(buf) => copy_planes!(buf, |&s| s),
        AudioBufferRef::F64(buf) => copy_planes!(buf, |&s| s as f32),
        AudioBufferRef::S32(buf) => copy_planes!(buf, |&s| s as f32 / i32::MAX as f32),
        AudioBufferRef::S16(buf) => copy_planes!(buf, |&s| s as f32 / i16::MAX as f32),
        AudioBufferRef::U8(buf) => copy_planes!(buf, |&s| (s as f32 - 128.0) / 128.0),
        AudioBufferRef::S8(buf) => copy_planes!(buf, |&s| s as f32 / i8::MAX as f32),
        AudioBufferRef::U16(buf) => {
            copy_planes!(buf, |&s| (s as f32 - 32768.0) / 32768.0)
        }
        AudioBufferRef::U32(buf) => {
            copy_planes!(buf, |&s| (s as f64 / u32::MAX as f64 * 2.0 - 1.0) as f32)
        }
        AudioBufferRef::S24(buf) => {
            copy_planes!(buf, |&s| s.inner() as f32 / 8_388_607.0)
        }
        AudioBufferRef::U24(buf) => {
            copy_planes!(buf, |&s| (s.inner() as f32 - 8_388_608.0) / 8_388_608.0)
        }
    }

    out.reserve(frames);
    for frame in 0..frames {
        let mut sum = 0.0f32;
        for plane in &planes {
            sum += plane[frame];
        }
        let mixed = (sum / channels as f32).clamp(-1.0, 1.0);
        out.push((mixed * i16::MAX as f32) as i16);
    }
}
