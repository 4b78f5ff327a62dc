//! Audio decoding, loudness measurement, and silence splitting.

pub mod decoder;
pub mod splitter;
pub mod waveform;

pub use decoder::{Decoder, SymphoniaDecoder};
pub use splitter::{FrameSplitter, SilenceSplitter};
pub use waveform::Waveform;
