use delta_audio::{
    codec::{escape_code, MAX_SAMPLES},
    error::Capacity,
    CodecError, DeltaEncoder, EncoderConfig, StreamDecoder, Token,
};
use proptest::prelude::*;
use rayon::prelude::*;

prop_compose! {
    /// a random walk, closer to real audio than uniform noise
    fn arb_walk()(
        start in any::<i8>(),
        steps in prop::collection::vec(-40i16..=40, 0..2000),
    ) -> Vec<i8> {
        let mut value = start as i16;
        let mut samples = vec![start];
        for step in steps {
            value = (value + step).clamp(i8::MIN as i16, i8::MAX as i16);
            samples.push(value as i8);
        }
        samples
    }
}

proptest! {
    /// Property: any walk decodes back bit-exact
    #[test]
    fn prop_walk_roundtrip(samples in arb_walk()) {
        let stream = DeltaEncoder::new().encode(&samples).unwrap();
        prop_assert_eq!(samples, stream.decode().unwrap());
    }

    /// Property: uniform noise (worst case deltas) decodes back bit-exact
    #[test]
    fn prop_noise_roundtrip(samples in prop::collection::vec(any::<i8>(), 1..1500)) {
        let stream = DeltaEncoder::new().encode(&samples).unwrap();
        prop_assert_eq!(samples, stream.decode().unwrap());
    }

    /// Property: round trip holds for every window size
    #[test]
    fn prop_window_sizes(samples in arb_walk(), window_size in 1usize..32) {
        let config = EncoderConfig::default().with_window_size(window_size);
        let stream = DeltaEncoder::new().with_config(config).encode(&samples).unwrap();
        prop_assert_eq!(samples, stream.decode().unwrap());
    }

    /// Property: every sample's assigned width can hold its difference
    #[test]
    fn prop_widths_cover_differences(samples in arb_walk()) {
        let track = DeltaEncoder::new().plan(&samples).unwrap();
        for sample in &track.samples()[1..] {
            prop_assert!(sample.window_bits >= sample.min_bits);
            prop_assert!((2..=9).contains(&sample.window_bits));
        }
    }

    /// Property: no difference ever reads back as the escape pattern
    #[test]
    fn prop_escapes_are_unambiguous(samples in arb_walk()) {
        let stream = DeltaEncoder::new().encode(&samples).unwrap();
        let tokens = StreamDecoder::new(&stream).tokens().unwrap();

        let mut width = 0;
        let mut differences = 0;
        let mut escapes = 0;
        for token in tokens {
            match token {
                Token::Width(w) => width = w,
                Token::Difference(d) => {
                    prop_assert_ne!(d, -escape_code(width));
                    differences += 1;
                }
                Token::Escape => escapes += 1,
                Token::Anchor(_) => {}
            }
        }
        prop_assert_eq!(samples.len() - 1, differences);
        prop_assert_eq!(stream.transitions(), escapes);
    }

    /// Property: bit count and word count agree
    #[test]
    fn prop_word_count(samples in arb_walk()) {
        let stream = DeltaEncoder::new().encode(&samples).unwrap();
        prop_assert_eq!(stream.word_len(), (stream.bit_count() + 15) / 16);
    }
}

#[test]
fn shotgun_roundtrip() {
    for trial in 0..100 {
        let length = 1 + rand::random::<usize>() % 4000;
        let loudness = 1 + rand::random::<i16>().rem_euclid(127);
        let samples = (0..length)
            .map(|_| (rand::random::<i16>() % loudness) as i8)
            .collect::<Vec<_>>();

        let stream = DeltaEncoder::new().encode(&samples).unwrap();
        assert_eq!(samples, stream.decode().unwrap(), "trial number: {}", trial + 1);
    }
}

#[test]
fn concurrent_encodes_are_independent() {
    let inputs = (0..32)
        .map(|seed: i32| {
            (0..3000)
                .map(|i: i32| (((i * (seed + 3)) % 61) - 30) as i8)
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();

    let encoder = DeltaEncoder::new();
    let serial = inputs
        .iter()
        .map(|samples| encoder.encode(samples).unwrap())
        .collect::<Vec<_>>();
    let parallel = inputs
        .par_iter()
        .map(|samples| encoder.encode(samples).unwrap())
        .collect::<Vec<_>>();

    assert_eq!(serial, parallel);
    for (samples, stream) in inputs.iter().zip(parallel.iter()) {
        assert_eq!(samples, &stream.decode().unwrap());
    }
}

#[test]
fn capacity_boundary_at_default() {
    let samples = (0..=MAX_SAMPLES)
        .map(|i| ((i % 200) as i32 - 100) as i8)
        .collect::<Vec<_>>();
    let encoder = DeltaEncoder::new();

    let stream = encoder.encode(&samples[..MAX_SAMPLES]).unwrap();
    assert_eq!(MAX_SAMPLES, stream.sample_count());

    match encoder.encode(&samples) {
        Err(CodecError::CapacityExceeded {
            kind: Capacity::Samples,
            required,
            capacity,
        }) => {
            assert_eq!(MAX_SAMPLES + 1, required);
            assert_eq!(MAX_SAMPLES, capacity);
        }
        other => panic!("expected sample capacity error, got {:?}", other.map(|_| ())),
    }
}
