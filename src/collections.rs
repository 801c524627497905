mod bitstream;

pub use bitstream::*;
