use std::{
    fmt::{self, Display},
    io::Read,
};

use tracing::debug;

use super::StreamInfo;
use crate::error::{CodecError, Result};

const RIFF_HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const FMT_CHUNK_MIN_LEN: usize = 16;

/// fields of the `fmt ` chunk the encoder cares about
#[derive(Debug, Default, Clone, Copy)]
struct WavHeader {
    audio_format: u16,
    num_channels: u16,
    frequency: u32,
    bytes_per_sec: u32,
    block_align: u16,
    bits_per_sample: u16,
}

impl Display for WavHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "sample_type:{}", self.audio_format)?;
        writeln!(f, "channels:{}", self.num_channels)?;
        writeln!(f, "frequency:{}", self.frequency)?;
        writeln!(f, "bytes_per_sec:{}", self.bytes_per_sec)?;
        writeln!(f, "block_align:{}", self.block_align)?;
        write!(f, "bits_per_sample:{}", self.bits_per_sample)
    }
}

impl WavHeader {
    fn parse(chunk: &[u8]) -> Result<Self> {
        if chunk.len() < FMT_CHUNK_MIN_LEN {
            return Err(CodecError::InvalidWav("fmt chunk too short"));
        }
        Ok(Self {
            audio_format: u16::from_le_bytes([chunk[0], chunk[1]]),
            num_channels: u16::from_le_bytes([chunk[2], chunk[3]]),
            frequency: u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]),
            bytes_per_sec: u32::from_le_bytes([chunk[8], chunk[9], chunk[10], chunk[11]]),
            block_align: u16::from_le_bytes([chunk[12], chunk[13]]),
            bits_per_sample: u16::from_le_bytes([chunk[14], chunk[15]]),
        })
    }
}

/// # Description
/// Loads mono PCM wav files and hands the audio out as signed 8-bit samples
/// ## Comments
/// - 8-bit files are stored unsigned, they get re-centred around zero
/// - 16-bit files keep their upper byte
pub struct WavReader {
    info: StreamInfo,
    samples: Vec<i8>,
}

impl WavReader {
    pub fn info(&self) -> StreamInfo {
        self.info
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// # Description
    /// first `max` samples of the file, or all of them when `max` is `None`
    pub fn samples(&self, max: Option<usize>) -> &[i8] {
        let len = max.map_or(self.samples.len(), |max| max.min(self.samples.len()));
        &self.samples[..len]
    }

    /// parses and loads wav file
    pub fn load<Resource>(mut wav_res: Resource) -> Result<Self>
    where
        Resource: Read,
    {
        let mut wav_binary = Vec::new();
        wav_res.read_to_end(&mut wav_binary)?;

        if wav_binary.len() < RIFF_HEADER_LEN {
            return Err(CodecError::InvalidWav("file too short for a RIFF header"));
        }
        if &wav_binary[0..4] != b"RIFF" || &wav_binary[8..12] != b"WAVE" {
            return Err(CodecError::InvalidWav("missing RIFF/WAVE magic"));
        }

        let mut header = None;
        let mut pcm = None;
        let mut chunks = &wav_binary[RIFF_HEADER_LEN..];

        while chunks.len() >= CHUNK_HEADER_LEN {
            let id = &chunks[0..4];
            let size = u32::from_le_bytes([chunks[4], chunks[5], chunks[6], chunks[7]]) as usize;
            let body = &chunks[CHUNK_HEADER_LEN..];
            // writers sometimes leave a bogus size on the data chunk
            let body = &body[..size.min(body.len())];

            match id {
                b"fmt " => header = Some(WavHeader::parse(body)?),
                b"data" => pcm = Some(body),
                _ => debug!(chunk = %String::from_utf8_lossy(id), "skipping wav chunk"),
            }
            if header.is_some() && pcm.is_some() {
                break;
            }

            // chunks are padded to an even length
            let advance = CHUNK_HEADER_LEN + body.len() + (body.len() & 1);
            chunks = &chunks[advance.min(chunks.len())..];
        }

        let header = header.ok_or(CodecError::InvalidWav("fmt chunk not found"))?;
        let pcm = pcm.ok_or(CodecError::InvalidWav("data region not found"))?;

        if header.audio_format != 1 {
            return Err(CodecError::UnsupportedFormat(format!(
                "audio format {}, only linear PCM is supported",
                header.audio_format
            )));
        }
        if header.num_channels != 1 {
            return Err(CodecError::UnsupportedFormat(format!(
                "{} channels, only mono is supported",
                header.num_channels
            )));
        }

        let samples = match header.bits_per_sample {
            8 => pcm.iter().map(|&b| (b as i16 - 128) as i8).collect(),
            16 => pcm
                .chunks_exact(2)
                .map(|pair| (i16::from_le_bytes([pair[0], pair[1]]) >> 8) as i8)
                .collect(),
            bits => {
                return Err(CodecError::UnsupportedFormat(format!(
                    "{} bits per sample, either 16 or 8 bits per sample is supported",
                    bits
                )))
            }
        };

        debug!("parsed header:\n{}", header);

        Ok(Self {
            info: StreamInfo::new(
                header.frequency,
                header.num_channels as u32,
                header.bits_per_sample as u32,
            ),
            samples,
        })
    }
}

mod test {
    #[allow(unused_imports)]
    use super::WavReader;
    #[allow(unused_imports)]
    use crate::error::CodecError;
    #[allow(unused_imports)]
    use std::io::Cursor;

    /// builds a minimal RIFF file around `pcm`
    #[allow(dead_code)]
    fn wav_file(channels: u16, bits_per_sample: u16, pcm: &[u8]) -> Vec<u8> {
        let sample_rate = 8000u32;
        let block_align = channels * bits_per_sample / 8;
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + pcm.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        out.extend_from_slice(&block_align.to_le_bytes());
        out.extend_from_slice(&bits_per_sample.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
        out.extend_from_slice(pcm);
        out
    }

    #[test]
    fn parse_8bit_mono() {
        let wav = wav_file(1, 8, &[128, 130, 0, 255]);
        let reader = WavReader::load(Cursor::new(wav)).unwrap();
        assert_eq!(8000, reader.info().sample_rate);
        assert_eq!(1, reader.info().channels());
        assert_eq!(8, reader.info().bits_per_sample);
        assert_eq!(&[0, 2, -128, 127], reader.samples(None));
        assert_eq!(&[0, 2], reader.samples(Some(2)));
        assert_eq!(4, reader.samples(Some(100)).len());
        assert!(!reader.is_empty());
    }

    #[test]
    fn empty_data_chunk() {
        let reader = WavReader::load(Cursor::new(wav_file(1, 8, &[]))).unwrap();
        assert!(reader.is_empty());
        assert_eq!(0, reader.len());
        assert!(reader.samples(Some(10)).is_empty());
    }

    #[test]
    fn parse_16bit_mono() {
        let mut pcm = Vec::new();
        for sample in [0i16, 256, -256, i16::MAX, i16::MIN] {
            pcm.extend_from_slice(&sample.to_le_bytes());
        }
        let reader = WavReader::load(Cursor::new(wav_file(1, 16, &pcm))).unwrap();
        assert_eq!(&[0, 1, -1, 127, -128], reader.samples(None));
    }

    #[test]
    fn skips_unknown_chunks() {
        let mut wav = wav_file(1, 8, &[129]);
        // splice a LIST chunk in front of fmt
        let list = [b'L', b'I', b'S', b'T', 3, 0, 0, 0, 1, 2, 3, 0];
        let tail = wav.split_off(12);
        wav.extend_from_slice(&list);
        wav.extend_from_slice(&tail);

        let reader = WavReader::load(Cursor::new(wav)).unwrap();
        assert_eq!(&[1], reader.samples(None));
    }

    #[test]
    fn rejects_stereo() {
        let wav = wav_file(2, 8, &[128, 128]);
        assert!(matches!(
            WavReader::load(Cursor::new(wav)),
            Err(CodecError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            WavReader::load(Cursor::new(b"not a wav file at all".to_vec())),
            Err(CodecError::InvalidWav(_))
        ));
        let mut wav = wav_file(1, 8, &[1]);
        wav.truncate(20);
        assert!(matches!(
            WavReader::load(Cursor::new(wav)),
            Err(CodecError::InvalidWav(_))
        ));
    }
}
