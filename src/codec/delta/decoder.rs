use super::*;
use crate::collections::BitUnpacker;

/// one field read back from a packed stream
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Anchor(i8),
    /// width in bits of the differences that follow
    Width(u32),
    Escape,
    Difference(i32),
}

/// # Description
/// Walks a packed stream field by field
/// ## Comments
/// - escapes are recognised by reading a difference first and comparing it
///   against the sign-extended escape pattern of the current width
/// - the stream itself has no length marker so the sample count has to be known
pub struct StreamDecoder<'a> {
    reader: BitUnpacker<'a>,
    sample_count: usize,
}

impl<'a> StreamDecoder<'a> {
    pub fn new(stream: &'a PackedStream) -> Self {
        Self::from_words(stream.words(), stream.bit_count(), stream.sample_count())
    }

    pub fn from_words(words: &'a [u16], bit_count: usize, sample_count: usize) -> Self {
        Self {
            reader: BitUnpacker::new(words).with_bit_len(bit_count),
            sample_count,
        }
    }

    pub fn tokens(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::with_capacity(self.sample_count + 1);
        self.walk(|token| {
            tokens.push(token);
            Ok(())
        })?;
        Ok(tokens)
    }

    /// reconstructs the original samples
    pub fn samples(mut self) -> Result<Vec<i8>> {
        let mut samples: Vec<i8> = Vec::with_capacity(self.sample_count);
        self.walk(|token| {
            match token {
                Token::Anchor(value) => samples.push(value),
                Token::Difference(difference) => {
                    let previous = samples.last().copied().unwrap_or_default() as i32;
                    let value = i8::try_from(previous - difference).map_err(|_| {
                        CodecError::CorruptStream {
                            index: samples.len(),
                            reason: "sample leaves the 8-bit range",
                        }
                    })?;
                    samples.push(value);
                }
                Token::Width(_) | Token::Escape => {}
            }
            Ok(())
        })?;
        Ok(samples)
    }

    fn walk<F>(&mut self, mut visit: F) -> Result<()>
    where
        F: FnMut(Token) -> Result<()>,
    {
        if self.sample_count == 0 {
            return Ok(());
        }

        let anchor = self.reader.get_bits(ANCHOR_BITS)? as i8;
        visit(Token::Anchor(anchor))?;
        if self.sample_count == 1 {
            return Ok(());
        }

        let mut width = self.read_width()?;
        visit(Token::Width(width))?;

        let mut decoded = 1;
        while decoded < self.sample_count {
            let value = self.reader.get_bits(width)?;
            if value == -escape_code(width) {
                visit(Token::Escape)?;
                width = self.read_width()?;
                visit(Token::Width(width))?;
                continue;
            }
            visit(Token::Difference(value))?;
            decoded += 1;
        }
        Ok(())
    }

    fn read_width(&mut self) -> Result<u32> {
        Ok(self.reader.read_bits(SELECTOR_BITS)? + MIN_WIDTH)
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[test]
    fn tokens_of_hand_packed_stream() {
        let mut packer = BitPacker::new();
        packer.put_bits(-5, ANCHOR_BITS).unwrap();
        packer.put_bits(0, SELECTOR_BITS).unwrap();
        packer.put_bits(1, 2).unwrap();
        packer.put_bits(escape_code(2), 2).unwrap();
        packer.put_bits(2, SELECTOR_BITS).unwrap();
        packer.put_bits(-7, 4).unwrap();
        let (words, bit_count) = packer.finish();

        let tokens = StreamDecoder::from_words(&words, bit_count, 3)
            .tokens()
            .unwrap();
        assert_eq!(
            vec![
                Token::Anchor(-5),
                Token::Width(2),
                Token::Difference(1),
                Token::Escape,
                Token::Width(4),
                Token::Difference(-7),
            ],
            tokens
        );

        let samples = StreamDecoder::from_words(&words, bit_count, 3)
            .samples()
            .unwrap();
        assert_eq!(vec![-5, -6, 1], samples);
    }

    #[test]
    fn truncated_stream() {
        let stream = DeltaEncoder::new().encode(&[1, 2, 3, 4]).unwrap();
        let result = StreamDecoder::from_words(stream.words(), stream.bit_count(), 9).samples();
        assert!(matches!(result, Err(CodecError::UnexpectedEnd { .. })));
    }

    #[test]
    fn out_of_range_sample() {
        let mut packer = BitPacker::new();
        packer.put_bits(-128, ANCHOR_BITS).unwrap();
        packer.put_bits(0, SELECTOR_BITS).unwrap();
        packer.put_bits(1, 2).unwrap();
        let (words, bit_count) = packer.finish();

        let result = StreamDecoder::from_words(&words, bit_count, 2).samples();
        assert!(matches!(
            result,
            Err(CodecError::CorruptStream { index: 1, .. })
        ));
    }

    #[test]
    fn nothing_to_decode() {
        let tokens = StreamDecoder::from_words(&[], 0, 0).tokens().unwrap();
        assert!(tokens.is_empty());
    }
}
