pub mod delta;
pub use delta::*;

pub mod emit;
pub mod wav;

/// samples are stored as raw 8-bit values at the start of every stream
pub const ANCHOR_BITS: u32 = 8;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamInfo {
    pub sample_rate: u32,
    pub channels: u32,
    /// bit depth of the source file, samples handed out are always 8-bit
    pub bits_per_sample: u32,
}
impl StreamInfo {
    pub fn new(sample_rate: u32, channels: u32, bits_per_sample: u32) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }
    pub fn channels(&self) -> usize {
        self.channels as usize
    }

    /// # Description
    /// playback length of `num_samples` in milliseconds
    pub fn duration_millis(&self, num_samples: usize) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (num_samples as u64 * 1000) / self.sample_rate as u64
    }
}
