use crate::error::{Capacity, CodecError, Result};

// ---------------NEVER CHANGE THESE ---------------
const WORD_SIZE_IN_BITS: usize = 16;
const MAX_FIELD_WIDTH: u32 = 16;
//--------------------------------------------------

/*

LAYOUT OF THE PACKED WORDS

  words:          0                     1
  bits:       15 14 ... 2 1 0 | 31 30 ... 17 16 |
  bit_cursor:            ^

  fields are written LSB first, a field that does not fit in the
  remaining bits of a word continues at bit 0 of the next word.

CASE 1: field fits within word

    word |= field << word_bit_idx
    cursor += width

CASE 2: field straddles the boundary ( 16-word_bit_idx < width )

    word      |= field << word_bit_idx
    next_word  = field >> (16-word_bit_idx)
    cursor += width

*/

fn low_mask(width: u32) -> u32 {
    (1u32 << width) - 1
}

fn check_width(width: u32) -> Result<()> {
    if width == 0 || width > MAX_FIELD_WIDTH {
        return Err(CodecError::InvalidWidth { width });
    }
    Ok(())
}

fn word_index(bit_cursor: usize) -> usize {
    bit_cursor / WORD_SIZE_IN_BITS
}

fn word_bit_index(bit_cursor: usize) -> usize {
    bit_cursor % WORD_SIZE_IN_BITS
}

/// number of whole words needed to hold `num_bits`
pub fn words_for_bits(num_bits: usize) -> usize {
    (num_bits + WORD_SIZE_IN_BITS - 1) / WORD_SIZE_IN_BITS
}

/// # Description
/// Appends fields of 1 to 16 bits into a growing list of 16-bit words.
/// ## Comments
/// - writes are strictly forward, the word after the cursor is assumed untouched
#[derive(Clone, Default)]
pub struct BitPacker {
    words: Vec<u16>,
    bit_cursor: usize,
    word_capacity: Option<usize>,
}

impl BitPacker {
    pub fn new() -> Self {
        Self {
            words: Vec::new(),
            bit_cursor: 0,
            word_capacity: None,
        }
    }

    /// # Description
    /// refuse writes that would need more than `words` words
    pub fn with_word_capacity(mut self, words: usize) -> Self {
        self.word_capacity = Some(words);
        self
    }

    /// number of bits written so far
    pub fn len(&self) -> usize {
        self.bit_cursor
    }

    pub fn is_empty(&self) -> bool {
        self.bit_cursor == 0
    }

    /// number of words holding valid bits, `ceil(len/16)`
    pub fn word_len(&self) -> usize {
        words_for_bits(self.bit_cursor)
    }

    pub fn words(&self) -> &[u16] {
        &self.words[..self.word_len()]
    }

    /// # Description
    /// Writes the low `width` bits of `value` at the cursor
    /// # Parameters
    /// - `value` - two's-complement value, bits above `width` are dropped
    /// - `width` - 1 to 16
    pub fn put_bits(&mut self, value: i32, width: u32) -> Result<()> {
        check_width(width)?;

        let required = words_for_bits(self.bit_cursor + width as usize);
        if let Some(capacity) = self.word_capacity {
            if required > capacity {
                return Err(CodecError::CapacityExceeded {
                    kind: Capacity::Words,
                    required,
                    capacity,
                });
            }
        }

        let field = (value as u32) & low_mask(width);
        let cur_word_idx = word_index(self.bit_cursor);
        let word_bit_idx = word_bit_index(self.bit_cursor);
        self.allocate_if_needed(cur_word_idx);

        self.words[cur_word_idx] |= (field << word_bit_idx) as u16;

        let remaining_bits = (WORD_SIZE_IN_BITS - word_bit_idx) as u32;
        if width > remaining_bits {
            let nxt_word_idx = cur_word_idx + 1;
            self.allocate_if_needed(nxt_word_idx);
            //overwrite, nothing has been written past the cursor yet
            self.words[nxt_word_idx] = (field >> remaining_bits) as u16;
        }

        self.offset_bit_cursor(width as usize);
        Ok(())
    }

    /// consumes the packer returning the valid words and the bit count
    pub fn finish(mut self) -> (Vec<u16>, usize) {
        let valid_words = self.word_len();
        self.words.truncate(valid_words);
        (self.words, self.bit_cursor)
    }

    fn allocate_if_needed(&mut self, word_idx: usize) {
        while word_idx >= self.words.len() {
            self.words.push(0);
        }
    }

    fn offset_bit_cursor(&mut self, offset: usize) {
        self.bit_cursor += offset;
    }
}

/// # Description
/// Reads fields back out of words produced by [`BitPacker`]
/// ## Comments
/// keeps its own cursor, any number of readers can share one word slice
pub struct BitUnpacker<'a> {
    words: &'a [u16],
    bit_cursor: usize,
    bit_len: usize,
}

impl<'a> BitUnpacker<'a> {
    pub fn new(words: &'a [u16]) -> Self {
        Self {
            words,
            bit_cursor: 0,
            bit_len: words.len() * WORD_SIZE_IN_BITS,
        }
    }

    /// # Description
    /// limits reads to the first `bit_len` bits instead of the whole slice
    pub fn with_bit_len(mut self, bit_len: usize) -> Self {
        self.bit_len = bit_len.min(self.words.len() * WORD_SIZE_IN_BITS);
        self
    }

    pub fn remaining(&self) -> usize {
        self.bit_len - self.bit_cursor
    }

    pub fn seek_start(&mut self) {
        self.bit_cursor = 0;
    }

    /// reads `width` bits as an unsigned field
    pub fn read_bits(&mut self, width: u32) -> Result<u32> {
        check_width(width)?;
        if self.remaining() < width as usize {
            return Err(CodecError::UnexpectedEnd {
                bit_cursor: self.bit_cursor,
            });
        }

        let cur_word_idx = word_index(self.bit_cursor);
        let word_bit_idx = word_bit_index(self.bit_cursor);

        let mut bits = (self.words[cur_word_idx] as u32) >> word_bit_idx;
        let remaining_bits = (WORD_SIZE_IN_BITS - word_bit_idx) as u32;
        if width > remaining_bits {
            bits |= (self.words[cur_word_idx + 1] as u32) << remaining_bits;
        }

        self.bit_cursor += width as usize;
        Ok(bits & low_mask(width))
    }

    /// reads `width` bits and sign-extends them
    pub fn get_bits(&mut self, width: u32) -> Result<i32> {
        let bits = self.read_bits(width)?;
        let shift = 32 - width;
        Ok(((bits << shift) as i32) >> shift)
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::{words_for_bits, BitPacker, BitUnpacker};
    #[allow(unused_imports)]
    use crate::error::{Capacity, CodecError};

    #[test]
    fn sanity() {
        let mut packer = BitPacker::new();
        let write_numbers = vec![1i32, 10, 15, 20, 25];
        for &x in write_numbers.iter() {
            packer.put_bits(x, 6).unwrap();
        }
        assert_eq!(30, packer.len());
        assert_eq!(2, packer.word_len());

        let mut reader = BitUnpacker::new(packer.words());
        let read_numbers = (0..write_numbers.len())
            .map(|_| reader.read_bits(6).unwrap() as i32)
            .collect::<Vec<_>>();
        assert_eq!(write_numbers, read_numbers);
    }

    #[test]
    fn full_width_words() {
        let mut packer = BitPacker::new();
        packer.put_bits(0xBEEF, 16).unwrap();
        packer.put_bits(-1, 16).unwrap();
        packer.put_bits(i16::MIN as i32, 16).unwrap();
        assert_eq!(&[0xBEEF, 0xFFFF, 0x8000], packer.words());

        let mut reader = BitUnpacker::new(packer.words());
        assert_eq!(0xBEEF, reader.read_bits(16).unwrap());
        assert_eq!(-1, reader.get_bits(16).unwrap());
        assert_eq!(i16::MIN as i32, reader.get_bits(16).unwrap());
    }

    #[test]
    fn single_bits() {
        let pattern = [1, 0, 1, 1, 0, 0, 1, 0, 1, 1, 1, 0, 0, 0, 1, 0, 1, 1];
        let mut packer = BitPacker::new();
        pattern.iter().for_each(|&b| packer.put_bits(b, 1).unwrap());
        assert_eq!(pattern.len(), packer.len());

        let mut reader = BitUnpacker::new(packer.words()).with_bit_len(packer.len());
        let read_back = pattern
            .iter()
            .map(|_| reader.read_bits(1).unwrap() as i32)
            .collect::<Vec<_>>();
        assert_eq!(pattern.to_vec(), read_back);
    }

    #[test]
    fn boundary() {
        let mut packer = BitPacker::new();
        packer.put_bits(0, 14).unwrap();
        packer.put_bits(-7, 5).unwrap();
        packer.put_bits(0b101, 3).unwrap();
        assert_eq!(22, packer.len());

        let mut reader = BitUnpacker::new(packer.words());
        assert_eq!(0, reader.read_bits(14).unwrap());
        assert_eq!(-7, reader.get_bits(5).unwrap());
        assert_eq!(0b101, reader.read_bits(3).unwrap());
    }

    #[test]
    fn straddle_every_offset() {
        for offset in 0..16 {
            for width in 1..=16u32 {
                let min = -(1i32 << (width - 1));
                let max = (1i32 << (width - 1)) - 1;
                // width 1 only holds -1 and 0
                for &value in &[min, (-1).max(min), 0, 1.min(max), max] {
                    let mut packer = BitPacker::new();
                    if offset > 0 {
                        packer.put_bits(-1, offset).unwrap();
                    }
                    packer.put_bits(value, width).unwrap();
                    packer.put_bits(-1, 3).unwrap();

                    let mut reader = BitUnpacker::new(packer.words());
                    if offset > 0 {
                        reader.read_bits(offset).unwrap();
                    }
                    let read = reader.get_bits(width).unwrap();
                    assert_eq!(
                        value, read,
                        "offset={} width={} value={}",
                        offset, width, value
                    );
                    assert_eq!(-1, reader.get_bits(3).unwrap());
                }
            }
        }
    }

    #[test]
    fn sign_extension() {
        let mut packer = BitPacker::new();
        packer.put_bits(-2, 3).unwrap();
        packer.put_bits(3, 3).unwrap();
        let mut reader = BitUnpacker::new(packer.words());
        assert_eq!(-2, reader.get_bits(3).unwrap());
        assert_eq!(3, reader.get_bits(3).unwrap());

        // a single set bit is the sign bit
        let mut packer = BitPacker::new();
        packer.put_bits(1, 1).unwrap();
        packer.put_bits(0, 1).unwrap();
        let mut single = BitUnpacker::new(packer.words()).with_bit_len(packer.len());
        assert_eq!(-1, single.get_bits(1).unwrap());
        assert_eq!(0, single.get_bits(1).unwrap());

        reader.seek_start();
        assert_eq!(6, reader.read_bits(3).unwrap());
    }

    #[test]
    fn rejects_bad_widths() {
        let mut packer = BitPacker::new();
        assert!(matches!(
            packer.put_bits(1, 0),
            Err(CodecError::InvalidWidth { width: 0 })
        ));
        assert!(matches!(
            packer.put_bits(1, 17),
            Err(CodecError::InvalidWidth { width: 17 })
        ));
        assert!(packer.is_empty());

        let words = [0u16; 2];
        let mut reader = BitUnpacker::new(&words);
        assert!(matches!(
            reader.read_bits(17),
            Err(CodecError::InvalidWidth { width: 17 })
        ));
    }

    #[test]
    fn reading_past_end() {
        let mut packer = BitPacker::new();
        packer.put_bits(5, 4).unwrap();
        let mut reader = BitUnpacker::new(packer.words()).with_bit_len(packer.len());
        assert_eq!(5, reader.read_bits(4).unwrap());
        assert!(matches!(
            reader.read_bits(1),
            Err(CodecError::UnexpectedEnd { bit_cursor: 4 })
        ));
    }

    #[test]
    fn word_capacity_is_enforced() {
        let mut packer = BitPacker::new().with_word_capacity(2);
        packer.put_bits(0x1234, 16).unwrap();
        packer.put_bits(0x7, 12).unwrap();
        packer.put_bits(0x5, 4).unwrap();
        let err = packer.put_bits(1, 1).unwrap_err();
        assert!(matches!(
            err,
            CodecError::CapacityExceeded {
                kind: Capacity::Words,
                required: 3,
                capacity: 2,
            }
        ));
        assert_eq!(32, packer.len());
        assert_eq!(&[0x1234, 0x5007], packer.words());
    }

    #[test]
    fn finish_trims_to_valid_words() {
        let mut packer = BitPacker::new();
        packer.put_bits(0x3, 2).unwrap();
        let (words, bits) = packer.finish();
        assert_eq!(vec![0x3], words);
        assert_eq!(2, bits);
        assert_eq!(0, words_for_bits(0));
        assert_eq!(1, words_for_bits(16));
        assert_eq!(2, words_for_bits(17));
    }

    #[test]
    fn shotgun_unaligned() {
        for trial in 0..200 {
            let length = rand::random::<usize>() % 500;
            let fields = (0..length)
                .map(|_| {
                    let width = 1 + rand::random::<u32>() % 16;
                    let span = 1i32 << width;
                    let value = (rand::random::<u32>() % span as u32) as i32 - span / 2;
                    (value, width)
                })
                .collect::<Vec<_>>();

            let mut packer = BitPacker::new();
            for &(value, width) in fields.iter() {
                packer.put_bits(value, width).unwrap();
            }

            let mut reader = BitUnpacker::new(packer.words()).with_bit_len(packer.len());
            let read_back = fields
                .iter()
                .map(|&(_, width)| (reader.get_bits(width).unwrap(), width))
                .collect::<Vec<_>>();
            assert_eq!(fields, read_back, "trial number: {}", trial + 1);
            assert_eq!(0, reader.remaining());
        }
    }
}
