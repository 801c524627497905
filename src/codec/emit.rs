use std::io::Write;

use super::PackedStream;
use crate::error::{CodecError, Result};

/// words per line of the generated array
pub const WORDS_PER_LINE: usize = 20;

/// avr-libc's attribute for keeping constants in flash
pub const PROGMEM: &str = "PROGMEM";

fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// # Description
/// Renders `stream` as C source: a `<name>_length` constant holding the word
/// count and a `<name>_data` array placed in program memory
/// ## Comments
/// - `dst` is usually a `fs::File` or a `Vec<u8>`
pub fn write_c_source<Resource>(mut dst: Resource, name: &str, stream: &PackedStream) -> Result<()>
where
    Resource: Write,
{
    if !is_c_identifier(name) {
        return Err(CodecError::InvalidName(name.to_string()));
    }

    writeln!(dst, "const int {}_length = {};", name, stream.word_len())?;
    writeln!(dst)?;
    writeln!(dst, "const int {}_data[] {} ={{", name, PROGMEM)?;
    for line in stream.words().chunks(WORDS_PER_LINE) {
        for word in line {
            write!(dst, "0x{:X},", word)?;
        }
        writeln!(dst)?;
    }
    writeln!(dst, "}};")?;
    dst.flush()?;
    Ok(())
}

mod tests {
    #[allow(unused_imports)]
    use super::*;
    #[allow(unused_imports)]
    use crate::codec::DeltaEncoder;

    #[test]
    fn renders_scenario() {
        let stream = DeltaEncoder::new()
            .encode(&[10, 12, 11, 11, 11, 11, 11, 11, 11, 100])
            .unwrap();
        let mut out = Vec::new();
        write_c_source(&mut out, "blip", &stream).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            "const int blip_length = 4;\n\nconst int blip_data[] PROGMEM ={\n0x710A,0x0,0x4FA0,0x1,\n};\n",
            text
        );
    }

    #[test]
    fn wraps_long_arrays() {
        let samples = (0..200).map(|i| ((i * 13) % 97) as i8).collect::<Vec<_>>();
        let stream = DeltaEncoder::new().encode(&samples).unwrap();
        let mut out = Vec::new();
        write_c_source(&mut out, "_tone2", &stream).unwrap();
        let text = String::from_utf8(out).unwrap();

        let array_lines = text
            .lines()
            .skip(3)
            .take_while(|line| *line != "};")
            .collect::<Vec<_>>();
        let expected_lines = (stream.word_len() + WORDS_PER_LINE - 1) / WORDS_PER_LINE;
        assert_eq!(expected_lines, array_lines.len());
        assert!(array_lines
            .iter()
            .all(|line| line.matches(',').count() <= WORDS_PER_LINE));
        let total = array_lines
            .iter()
            .map(|line| line.matches(',').count())
            .sum::<usize>();
        assert_eq!(stream.word_len(), total);
    }

    #[test]
    fn rejects_bad_names() {
        let stream = DeltaEncoder::new().encode(&[1]).unwrap();
        for name in ["", "9lives", "my-sound", "a b"] {
            assert!(matches!(
                write_c_source(Vec::new(), name, &stream),
                Err(CodecError::InvalidName(_))
            ));
        }
    }
}
