pub mod width;

pub use width::*;
