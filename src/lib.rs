pub mod codec;
pub mod collections;
pub mod error;
pub mod math;

pub use codec::{
    emit::write_c_source, wav::WavReader, DeltaEncoder, EncoderConfig, PackedStream,
    StreamDecoder, StreamInfo, Token,
};
pub use error::{CodecError, Result};
