#![cfg(feature = "cli")]

use std::{fs, path::PathBuf, process::Command};

use delta_audio::PackedStream;

fn scratch_dir(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("delta_audio_{}_{}", test, std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir is writable");
    dir
}

/// 8-bit mono wav holding `samples`
fn write_wav(path: &PathBuf, samples: &[i8]) {
    let pcm = samples
        .iter()
        .map(|&s| (s as i16 + 128) as u8)
        .collect::<Vec<_>>();
    let mut out = Vec::new();
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + pcm.len() as u32).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&8000u32.to_le_bytes());
    out.extend_from_slice(&8000u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&8u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
    out.extend_from_slice(&pcm);
    fs::write(path, out).expect("wav written");
}

#[test]
fn writes_c_array() {
    let dir = scratch_dir("c_array");
    let input = dir.join("blip.wav");
    let output = dir.join("blip.c");
    write_wav(&input, &[10, 12, 11, 11, 11, 11, 11, 11, 11, 100]);

    let status = Command::new(env!("CARGO_BIN_EXE_delta_audio"))
        .arg(&input)
        .arg(&output)
        .arg("blip")
        .status()
        .expect("binary runs");
    assert!(status.success());

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("const int blip_length = 4;"));
    assert!(text.contains("const int blip_data[] PROGMEM ={\n0x710A,0x0,0x4FA0,0x1,\n};"));
}

#[test]
fn honours_sample_cap_and_bin_format() {
    let dir = scratch_dir("bin_format");
    let input = dir.join("ramp.wav");
    let output = dir.join("ramp.bin");
    let samples = (0..100).map(|i| (i - 50) as i8).collect::<Vec<_>>();
    write_wav(&input, &samples);

    let status = Command::new(env!("CARGO_BIN_EXE_delta_audio"))
        .args(["--format", "bin"])
        .arg(&input)
        .arg(&output)
        .arg("ramp")
        .arg("40")
        .status()
        .expect("binary runs");
    assert!(status.success());

    let stream = PackedStream::load(fs::File::open(&output).unwrap()).unwrap();
    assert_eq!(40, stream.sample_count());
    assert_eq!(samples[..40].to_vec(), stream.decode().unwrap());
}

#[test]
fn fails_on_invalid_wav() {
    let dir = scratch_dir("invalid");
    let input = dir.join("junk.wav");
    let output = dir.join("junk.c");
    fs::write(&input, b"definitely not riff data").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_delta_audio"))
        .arg(&input)
        .arg(&output)
        .arg("junk")
        .status()
        .expect("binary runs");
    assert!(!status.success());
    assert!(!output.exists());
}

#[test]
fn usage_on_missing_arguments() {
    let output = Command::new(env!("CARGO_BIN_EXE_delta_audio"))
        .arg("only_one.wav")
        .output()
        .expect("binary runs");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("USAGE"));
}
