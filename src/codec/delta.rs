use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use tracing::debug;

use super::ANCHOR_BITS;
use crate::{
    collections::{words_for_bits, BitPacker},
    error::{Capacity, CodecError, Result},
    math::MIN_WIDTH,
};

mod track;
pub use track::*;

mod decoder;
pub use decoder::*;

/// samples per window before smoothing
pub const WINDOW_SIZE: usize = 8;

/// default cap on samples read from a file and accepted by the encoder
pub const MAX_SAMPLES: usize = 50_000;

/// default size of the flash array the stream has to fit in
pub const MAX_COMPRESSED_WORDS: usize = 10_000;

/// width changes are announced as `width - MIN_WIDTH` in this many bits
pub const SELECTOR_BITS: u32 = 3;

/// widest difference the selector can announce
pub const MAX_WIDTH: u32 = MIN_WIDTH + (1 << SELECTOR_BITS) - 1;

/// # Description
/// maps a width onto the value written after an escape
/// ## Returns
/// `WidthOverflow` when `width` is outside `[MIN_WIDTH, MAX_WIDTH]`
pub fn selector_for(width: u32) -> Result<u32> {
    if !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
        return Err(CodecError::WidthOverflow { width });
    }
    Ok(width - MIN_WIDTH)
}

/// the pattern `1 << (width-1)`, written at `width` it reads back as `-2^(width-1)`
pub fn escape_code(width: u32) -> i32 {
    1 << (width - 1)
}

/// # Description
/// Knobs of the encoder, defaults match the AVR player's expectations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    pub window_size: usize,
    pub max_samples: usize,
    pub max_words: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
            max_samples: MAX_SAMPLES,
            max_words: MAX_COMPRESSED_WORDS,
        }
    }
}

impl EncoderConfig {
    /// window sizes below 1 are forced to 1
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size.max(1);
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn with_max_words(mut self, max_words: usize) -> Self {
        self.max_words = max_words;
        self
    }
}

/// # Description
/// Output of the encoder: the packed words plus what is needed to read them back
/// ## Comments
/// - `words.len()` is always `ceil(bit_count/16)`
/// - the C array only carries `words`, `sample_count` is kept for decoding here
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedStream {
    words: Vec<u16>,
    bit_count: usize,
    sample_count: usize,
    /// escape codes in the stream
    transitions: usize,
}

impl PackedStream {
    pub fn from_parts(
        words: Vec<u16>,
        bit_count: usize,
        sample_count: usize,
        transitions: usize,
    ) -> Result<Self> {
        if words.len() != words_for_bits(bit_count) {
            return Err(CodecError::CorruptStream {
                index: 0,
                reason: "word count does not match bit count",
            });
        }
        Ok(Self {
            words,
            bit_count,
            sample_count,
            transitions,
        })
    }

    pub fn words(&self) -> &[u16] {
        &self.words
    }

    pub fn word_len(&self) -> usize {
        self.words.len()
    }

    pub fn bit_count(&self) -> usize {
        self.bit_count
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// number of width changes after the first selector
    pub fn transitions(&self) -> usize {
        self.transitions
    }

    /// packed size over the size of the raw 8-bit samples
    pub fn compression_ratio(&self) -> f32 {
        if self.sample_count == 0 {
            return 0.0;
        }
        self.bit_count as f32 / (self.sample_count * ANCHOR_BITS as usize) as f32
    }

    pub fn decode(&self) -> Result<Vec<i8>> {
        StreamDecoder::new(self).samples()
    }

    /// # Description
    /// Writes the stream to `Resource` with bincode
    /// ## Comments
    /// - `Resource` is usually `Vec<u8>` or `fs::File`
    pub fn save_to<Resource>(&self, res: Resource) -> Result<()>
    where
        Resource: Write,
    {
        bincode::serialize_into(res, self)?;
        Ok(())
    }

    pub fn load<Resource>(res: Resource) -> Result<Self>
    where
        Resource: Read,
    {
        let stream = bincode::deserialize_from::<_, PackedStream>(res)?;
        Self::from_parts(
            stream.words,
            stream.bit_count,
            stream.sample_count,
            stream.transitions,
        )
    }
}

/// # Description
/// Adaptive width delta encoder
/// ## Comments
/// holds configuration only, every call builds its own sample track and packer,
/// so one encoder can be shared between threads
#[derive(Copy, Clone, Debug, Default)]
pub struct DeltaEncoder {
    config: EncoderConfig,
}

impl DeltaEncoder {
    pub fn new() -> Self {
        Self {
            config: EncoderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EncoderConfig) -> Self {
        self.config = config.with_window_size(config.window_size);
        self
    }

    /// # Description
    /// runs every pass up to (not including) packing
    pub fn plan(&self, samples: &[i8]) -> Result<SampleTrack> {
        if samples.is_empty() {
            return Err(CodecError::EmptyInput);
        }
        if samples.len() > self.config.max_samples {
            return Err(CodecError::CapacityExceeded {
                kind: Capacity::Samples,
                required: samples.len(),
                capacity: self.config.max_samples,
            });
        }

        let mut track = SampleTrack::load(samples);
        track.difference();
        track.assign_windows(self.config.window_size);
        track.smooth();
        Ok(track)
    }

    pub fn encode(&self, samples: &[i8]) -> Result<PackedStream> {
        let track = self.plan(samples)?;

        let mut packer = BitPacker::new().with_word_capacity(self.config.max_words);
        track.pack(&mut packer)?;
        let (words, bit_count) = packer.finish();
        let transitions = track.transitions();

        debug!(
            samples = samples.len(),
            bit_count,
            words = words.len(),
            transitions,
            "encoded delta stream"
        );

        Ok(PackedStream {
            words,
            bit_count,
            sample_count: samples.len(),
            transitions,
        })
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;
    #[allow(unused_imports)]
    use std::io::Cursor;

    #[allow(dead_code)]
    const SCENARIO: [i8; 10] = [10, 12, 11, 11, 11, 11, 11, 11, 11, 100];

    #[test]
    fn selector_range() {
        assert_eq!(9, MAX_WIDTH);
        assert_eq!(0, selector_for(2).unwrap());
        assert_eq!(7, selector_for(9).unwrap());
        assert!(matches!(
            selector_for(10),
            Err(CodecError::WidthOverflow { width: 10 })
        ));
        assert!(matches!(
            selector_for(1),
            Err(CodecError::WidthOverflow { width: 1 })
        ));
    }

    #[test]
    fn scenario_words_are_exact() {
        let stream = DeltaEncoder::new().encode(&SCENARIO).unwrap();
        assert_eq!(49, stream.bit_count());
        assert_eq!(&[0x710A, 0x0000, 0x4FA0, 0x0001], stream.words());
        assert_eq!(SCENARIO.to_vec(), stream.decode().unwrap());
    }

    #[test]
    fn scenario_escapes_once_before_last_difference() {
        let stream = DeltaEncoder::new().encode(&SCENARIO).unwrap();
        let tokens = StreamDecoder::new(&stream).tokens().unwrap();

        let escapes = tokens.iter().filter(|&&t| t == Token::Escape).count();
        assert_eq!(1, escapes);
        assert_eq!(escapes, stream.transitions());

        let tail = &tokens[tokens.len() - 3..];
        assert_eq!(
            &[Token::Escape, Token::Width(8), Token::Difference(-89)],
            tail
        );
        assert_eq!(Token::Anchor(10), tokens[0]);
        assert_eq!(Token::Width(3), tokens[1]);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            DeltaEncoder::new().encode(&[]),
            Err(CodecError::EmptyInput)
        ));
    }

    #[test]
    fn anchor_only() {
        let stream = DeltaEncoder::new().encode(&[-42]).unwrap();
        assert_eq!(8, stream.bit_count());
        assert_eq!(&[0x00D6], stream.words());
        assert_eq!(vec![-42], stream.decode().unwrap());
    }

    #[test]
    fn sample_capacity_boundary() {
        let config = EncoderConfig::default().with_max_samples(64);
        let encoder = DeltaEncoder::new().with_config(config);
        let samples = (0..65).map(|i| (i % 7) as i8).collect::<Vec<_>>();

        let stream = encoder.encode(&samples[..64]).unwrap();
        assert_eq!(samples[..64].to_vec(), stream.decode().unwrap());

        let err = encoder.encode(&samples).unwrap_err();
        assert!(matches!(
            err,
            CodecError::CapacityExceeded {
                kind: Capacity::Samples,
                required: 65,
                capacity: 64,
            }
        ));
    }

    #[test]
    fn default_capacity_boundary() {
        let encoder = DeltaEncoder::new();
        let samples = vec![0i8; MAX_SAMPLES + 1];
        assert!(encoder.encode(&samples[..MAX_SAMPLES]).is_ok());
        assert!(matches!(
            encoder.encode(&samples),
            Err(CodecError::CapacityExceeded {
                kind: Capacity::Samples,
                ..
            })
        ));
    }

    #[test]
    fn word_capacity_is_enforced() {
        let config = EncoderConfig::default().with_max_words(3);
        let encoder = DeltaEncoder::new().with_config(config);
        assert!(matches!(
            encoder.encode(&SCENARIO),
            Err(CodecError::CapacityExceeded {
                kind: Capacity::Words,
                required: 4,
                capacity: 3,
            })
        ));

        let config = EncoderConfig::default().with_max_words(4);
        let encoder = DeltaEncoder::new().with_config(config);
        assert!(encoder.encode(&SCENARIO).is_ok());
    }

    #[test]
    fn window_size_is_clamped() {
        let config = EncoderConfig::default().with_window_size(0);
        assert_eq!(1, config.window_size);

        let stream = DeltaEncoder::new()
            .with_config(config)
            .encode(&SCENARIO)
            .unwrap();
        assert_eq!(SCENARIO.to_vec(), stream.decode().unwrap());
    }

    #[test]
    fn extremes_round_trip() {
        let samples = [
            i8::MIN, i8::MAX, i8::MIN, i8::MAX, 0, 0, 0, 0, 0, 0, 0, 0, 0, -1, 1, i8::MIN,
        ];
        let stream = DeltaEncoder::new().encode(&samples).unwrap();
        assert_eq!(samples.to_vec(), stream.decode().unwrap());
    }

    #[test]
    fn save_then_load() {
        let stream = DeltaEncoder::new().encode(&SCENARIO).unwrap();
        let mut binary = Vec::new();
        stream.save_to(&mut binary).unwrap();

        let loaded = PackedStream::load(Cursor::new(binary)).unwrap();
        assert_eq!(stream, loaded);
        assert_eq!(1, loaded.transitions());
        assert_eq!(SCENARIO.to_vec(), loaded.decode().unwrap());
    }

    #[test]
    fn mismatched_parts_are_rejected() {
        assert!(PackedStream::from_parts(vec![0, 0], 8, 1, 0).is_err());
        assert!(PackedStream::from_parts(vec![0], 8, 1, 0).is_ok());
    }

    #[test]
    fn compression_ratio_of_scenario() {
        let stream = DeltaEncoder::new().encode(&SCENARIO).unwrap();
        let ratio = stream.compression_ratio();
        assert!((ratio - 49.0 / 80.0).abs() < 1e-6);
    }
}
