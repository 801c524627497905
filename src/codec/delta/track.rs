use tracing::trace;

use super::*;
use crate::math::min_bits_for;

/// # Description
/// One input sample plus everything the encoder derives for it
/// ## Comments
/// the anchor (index 0) only uses `value`
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Sample {
    pub value: i8,
    /// `previous.value - value`
    pub difference: i32,
    pub min_bits: u32,
    pub window_bits: u32,
}

/// # Description
/// Per-encode working copy of the input, each pass below mutates it in place
#[derive(Clone, Debug, Default)]
pub struct SampleTrack {
    samples: Vec<Sample>,
}

impl SampleTrack {
    pub fn load(values: &[i8]) -> Self {
        Self {
            samples: values
                .iter()
                .map(|&value| Sample {
                    value,
                    ..Sample::default()
                })
                .collect(),
        }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// replaces every sample after the anchor with its delta to the previous one
    pub fn difference(&mut self) {
        let samples = &mut self.samples;
        for i in (1..samples.len()).rev() {
            let difference = samples[i - 1].value as i32 - samples[i].value as i32;
            samples[i].difference = difference;
            samples[i].min_bits = min_bits_for(difference);
        }
    }

    /// # Description
    /// gives every sample the widest `min_bits` of its window
    /// ## Comments
    /// windows start right after the anchor, the last one may be short
    pub fn assign_windows(&mut self, window_size: usize) {
        let window_size = window_size.max(1);
        let body = match self.samples.get_mut(1..) {
            Some(body) => body,
            None => return,
        };
        for window in body.chunks_mut(window_size) {
            let window_bits = window
                .iter()
                .map(|s| s.min_bits)
                .max()
                .unwrap_or(MIN_WIDTH);
            window.iter_mut().for_each(|s| s.window_bits = window_bits);
        }
    }

    /// # Description
    /// Moves small samples across window borders to cut down on escapes
    /// ## Comments
    /// - when a wider window starts, its leading sample keeps the previous,
    ///   narrower width as long as the difference still fits
    /// - output has to stay bit-exact with existing players, keep the strict
    ///   comparisons as they are
    pub fn smooth(&mut self) {
        let body = match self.samples.get_mut(1..) {
            Some(body) if !body.is_empty() => body,
            _ => return,
        };

        let mut cur_bits = body[0].window_bits;
        let mut last_bits: Option<u32> = None;
        for sample in body.iter_mut() {
            if sample.min_bits < cur_bits {
                last_bits = Some(cur_bits);
                cur_bits = sample.window_bits;
            }
            if let Some(last) = last_bits.filter(|&last| last < cur_bits) {
                if sample.min_bits < last {
                    sample.window_bits = last;
                } else {
                    last_bits = None;
                }
            }
        }
    }

    /// number of width changes the packed stream will carry
    pub fn transitions(&self) -> usize {
        self.samples
            .iter()
            .skip(1)
            .zip(self.samples.iter().skip(2))
            .filter(|(a, b)| a.window_bits != b.window_bits)
            .count()
    }

    /// # Description
    /// Serializes the track: anchor, first width, then differences with an
    /// escape plus new width in front of every width change
    pub fn pack(&self, packer: &mut BitPacker) -> Result<()> {
        let (anchor, body) = match self.samples.split_first() {
            Some(split) => split,
            None => return Err(CodecError::EmptyInput),
        };
        packer.put_bits(anchor.value as i32, ANCHOR_BITS)?;

        let mut cur_bits = match body.first() {
            Some(first) => first.window_bits,
            None => return Ok(()),
        };
        packer.put_bits(selector_for(cur_bits)? as i32, SELECTOR_BITS)?;

        for (offset, sample) in body.iter().enumerate() {
            if sample.window_bits != cur_bits {
                let selector = selector_for(sample.window_bits)?;
                trace!(
                    index = offset + 1,
                    from = cur_bits,
                    to = sample.window_bits,
                    "width change"
                );
                packer.put_bits(escape_code(cur_bits), cur_bits)?;
                packer.put_bits(selector as i32, SELECTOR_BITS)?;
                cur_bits = sample.window_bits;
            }
            if sample.min_bits > cur_bits {
                return Err(CodecError::WidthOverflow {
                    width: sample.min_bits,
                });
            }
            packer.put_bits(sample.difference, cur_bits)?;
        }
        Ok(())
    }
}

mod tests {
    #[allow(unused_imports)]
    use super::*;

    #[allow(dead_code)]
    fn planned(values: &[i8], window_size: usize) -> SampleTrack {
        let mut track = SampleTrack::load(values);
        track.difference();
        track.assign_windows(window_size);
        track
    }

    #[test]
    fn differences_and_min_bits() {
        let track = planned(&[10, 12, 11, 11, 100], 8);
        let samples = track.samples();
        assert_eq!(10, samples[0].value);
        assert_eq!(0, samples[0].difference);
        assert_eq!(
            vec![-2, 1, 0, -89],
            samples[1..].iter().map(|s| s.difference).collect::<Vec<_>>()
        );
        assert_eq!(
            vec![3, 2, 2, 8],
            samples[1..].iter().map(|s| s.min_bits).collect::<Vec<_>>()
        );
    }

    #[test]
    fn windows_take_the_widest_member() {
        // 1 anchor + 8 small deltas + 3 samples in a short window
        let values = [0, 1, 0, 1, 0, 1, 0, 1, 0, 20, 0, 1];
        let track = planned(&values, 8);
        let samples = track.samples();
        assert!(samples[1..9].iter().all(|s| s.window_bits == 2));
        assert!(samples[9..].iter().all(|s| s.window_bits == 6));
        for s in &samples[1..] {
            assert!(s.window_bits >= s.min_bits);
        }
    }

    #[test]
    fn smoothing_keeps_narrow_width_into_wider_window() {
        // window one is all 3-bit deltas, window two opens with a 2-bit delta
        // and then needs 8 bits
        let mut values = vec![0i8, 2, 0, 2, 0, 2, 0, 2, 0];
        values.extend_from_slice(&[1, 100, 0, 100, 0]);
        let mut track = planned(&values, 8);
        assert_eq!(8, track.samples()[9].window_bits);

        track.smooth();
        let samples = track.samples();
        assert!(samples[1..9].iter().all(|s| s.window_bits == 3));
        assert_eq!(3, samples[9].window_bits);
        assert!(samples[10..].iter().all(|s| s.window_bits == 8));
        assert_eq!(1, track.transitions());
    }

    #[test]
    fn smoothing_never_narrows_below_min_bits() {
        let values = (0..200)
            .map(|i: i32| ((i * 37) % 256 - 128) as i8)
            .collect::<Vec<_>>();
        for window_size in 1..12 {
            let mut track = planned(&values, window_size);
            track.smooth();
            for s in &track.samples()[1..] {
                assert!(s.window_bits >= s.min_bits, "window size {}", window_size);
            }
        }
    }

    #[test]
    fn narrowing_window_is_left_alone() {
        let mut values = vec![0i8, 100, 0, 100, 0, 100, 0, 100, 0];
        values.extend_from_slice(&[1, 0, 1]);
        let mut track = planned(&values, 8);
        track.smooth();
        let samples = track.samples();
        assert!(samples[1..9].iter().all(|s| s.window_bits == 8));
        assert!(samples[9..].iter().all(|s| s.window_bits == 2));
        assert_eq!(1, track.transitions());
    }

    #[test]
    fn anchor_only_track() {
        let mut track = planned(&[5], 8);
        track.smooth();
        assert_eq!(0, track.transitions());

        let mut packer = BitPacker::new();
        track.pack(&mut packer).unwrap();
        assert_eq!(8, packer.len());
    }

    #[test]
    fn overflowing_width_is_reported() {
        let mut track = planned(&[0, 1, 2], 8);
        track.samples[2].window_bits = 10;
        let mut packer = BitPacker::new();
        assert!(matches!(
            track.pack(&mut packer),
            Err(CodecError::WidthOverflow { width: 10 })
        ));
    }
}
