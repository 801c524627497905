use std::{fs, process};

use clap::{crate_version, value_t, App, Arg, ArgMatches};
use tracing::{error, info, Level};

use delta_audio::{
    codec::{MAX_COMPRESSED_WORDS, MAX_SAMPLES, WINDOW_SIZE},
    write_c_source, DeltaEncoder, EncoderConfig, WavReader,
};

fn main() {
    let matches = App::new("delta_audio")
        .version(crate_version!())
        .about("Packs an 8-bit mono wav file into a delta coded array for flash")
        .arg(
            Arg::with_name("input")
                .help("wav file to read")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::with_name("output")
                .help("file to write, C source unless --format bin")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::with_name("name")
                .help("prefix of the generated <name>_length and <name>_data symbols")
                .required(true)
                .index(3),
        )
        .arg(
            Arg::with_name("max_samples")
                .help("number of samples to read from the file")
                .index(4),
        )
        .arg(
            Arg::with_name("window")
                .long("window")
                .takes_value(true)
                .help("samples per window"),
        )
        .arg(
            Arg::with_name("max_words")
                .long("max-words")
                .takes_value(true)
                .help("refuse streams longer than this many 16-bit words"),
        )
        .arg(
            Arg::with_name("format")
                .long("format")
                .takes_value(true)
                .possible_values(&["c", "bin"])
                .default_value("c")
                .help("C source array or bincode dump of the packed stream"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("more logging, repeat for more"),
        )
        .get_matches();

    init_logging(matches.occurrences_of("verbose"));

    if let Err(err) = run(&matches) {
        error!("{}", err);
        process::exit(1);
    }
}

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// numeric option or `default` when absent, exits with clap's usage on garbage
fn numeric_arg(matches: &ArgMatches, name: &str, default: usize) -> usize {
    if matches.is_present(name) {
        value_t!(matches, name, usize).unwrap_or_else(|e| e.exit())
    } else {
        default
    }
}

fn run(matches: &ArgMatches) -> delta_audio::Result<()> {
    // all three are required, clap has already bailed if they are missing
    let input = matches.value_of("input").unwrap_or_default();
    let output = matches.value_of("output").unwrap_or_default();
    let name = matches.value_of("name").unwrap_or_default();

    let max_samples = numeric_arg(matches, "max_samples", MAX_SAMPLES);
    let config = EncoderConfig::default()
        .with_window_size(numeric_arg(matches, "window", WINDOW_SIZE))
        .with_max_words(numeric_arg(matches, "max_words", MAX_COMPRESSED_WORDS));

    let wav = WavReader::load(fs::File::open(input)?)?;
    let samples = wav.samples(Some(max_samples));
    info!(
        "{}: {} Hz, {} bit, {} of {} samples ({} ms)",
        input,
        wav.info().sample_rate,
        wav.info().bits_per_sample,
        samples.len(),
        wav.len(),
        wav.info().duration_millis(samples.len())
    );

    let stream = DeltaEncoder::new().with_config(config).encode(samples)?;

    // render fully before touching the output file
    let mut rendered = Vec::new();
    match matches.value_of("format") {
        Some("bin") => stream.save_to(&mut rendered)?,
        _ => write_c_source(&mut rendered, name, &stream)?,
    }
    fs::write(output, rendered)?;

    info!(
        "{} -> {}: {} bits in {} words, {} width changes, ratio {:.3}",
        input,
        output,
        stream.bit_count(),
        stream.word_len(),
        stream.transitions(),
        stream.compression_ratio()
    );
    Ok(())
}
