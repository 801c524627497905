use delta_audio::{write_c_source, DeltaEncoder};
use std::io;

fn main() {
    println!("packing a synthetic chirp...");

    //a quiet chirp followed by a loud burst, so the encoder has to switch widths
    let samples = (0..2000)
        .map(|i| {
            let t = i as f32 / 8000.0;
            let amplitude = if i < 1500 { 12.0 } else { 120.0 };
            (amplitude * (2.0 * std::f32::consts::PI * (200.0 + 400.0 * t) * t).sin()) as i8
        })
        .collect::<Vec<_>>();

    let stream = DeltaEncoder::new()
        .encode(&samples)
        .expect("chirp fits the default capacity");

    let decoded = stream.decode().expect("stream decodes");
    assert_eq!(samples, decoded);

    println!(
        "{} samples -> {} bits ({} words), {} width changes, ratio {:.3}",
        stream.sample_count(),
        stream.bit_count(),
        stream.word_len(),
        stream.transitions(),
        stream.compression_ratio()
    );

    write_c_source(io::stdout().lock(), "chirp", &stream).expect("stdout is writable");
}
