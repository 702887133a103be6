//! End-to-end correctness of the row-block engine against the scalar
//! oracles, over random shapes, lane widths and block sizes.

mod common;

use proptest::prelude::*;
use vconv2d::core::{conv2d_naive, conv2d_reference};
use vconv2d::{convolve, convolve_into, Conv2d, ConvShape, LaneConfig, SameWidth};

fn filter_size() -> impl Strategy<Value = usize> {
    prop::sample::select(vec![1usize, 3, 5, 7])
}

/// `(shape, lane cap, block rows, seed)`
fn config() -> impl Strategy<Value = (ConvShape, usize, usize, u64)> {
    filter_size().prop_flat_map(|f| {
        (f..f + 14, f..f + 40, 1usize..5, 1usize..4, f..f + 24, 1usize..10, any::<u64>()).prop_map(
            move |(h, w, cin, cout, cap, b, seed)| (ConvShape::new(h, w, cin, f, cout), cap, b, seed),
        )
    })
}

fn run<P: vconv2d::Precision>(
    p: &P,
    shape: ConvShape,
    cap: usize,
    b: usize,
    input: &[P::Input],
    filter: &[P::Weight],
) -> Vec<P::Output> {
    Conv2d::new(shape)
        .lanes(LaneConfig::default().with_lane_cap(cap))
        .block_rows(b)
        .execute_into(p, input, filter)
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_i32_matches_naive((shape, cap, b, seed) in config()) {
        let mut rng = common::rng(seed);
        let input = common::random_vec(&mut rng, shape.input_len(), -100i32..=100);
        let filter = common::random_vec(&mut rng, shape.filter_len(), -20i32..=20);
        let out = run(&SameWidth::<i32>::new(), shape, cap, b, &input, &filter);
        prop_assert_eq!(out, conv2d_naive(&input, &filter, shape));
    }

    #[test]
    fn prop_f32_bit_identical_to_reference((shape, cap, b, seed) in config()) {
        let mut rng = common::rng(seed);
        let input = common::random_vec(&mut rng, shape.input_len(), -1.0f32..=1.0);
        let filter = common::random_vec(&mut rng, shape.filter_len(), -1.0f32..=1.0);
        let out = run(&SameWidth::<f32>::new(), shape, cap, b, &input, &filter);
        let expected = conv2d_reference(&input, &filter, shape);
        prop_assert!(out.iter().zip(&expected).all(|(a, e)| a.to_bits() == e.to_bits()));
    }

    #[test]
    fn prop_f64_close_to_naive((shape, cap, b, seed) in config()) {
        let mut rng = common::rng(seed);
        let input = common::random_vec(&mut rng, shape.input_len(), -1.0f64..=1.0);
        let filter = common::random_vec(&mut rng, shape.filter_len(), -1.0f64..=1.0);
        let out = run(&SameWidth::<f64>::new(), shape, cap, b, &input, &filter);
        for (a, e) in out.iter().zip(conv2d_naive(&input, &filter, shape)) {
            prop_assert!((a - e).abs() <= 1e-9, "{} vs {}", a, e);
        }
    }

    #[test]
    fn prop_tile_and_block_invariance((shape, cap, b, seed) in config()) {
        let mut rng = common::rng(seed);
        let input = common::random_vec(&mut rng, shape.input_len(), -1.0f32..=1.0);
        let filter = common::random_vec(&mut rng, shape.filter_len(), -1.0f32..=1.0);
        let p = SameWidth::<f32>::new();
        // One tile covering the whole row, one row per block.
        let wide = run(&p, shape, shape.w, 1, &input, &filter);
        let narrow = run(&p, shape, cap, b, &input, &filter);
        prop_assert_eq!(wide, narrow);
    }
}

#[test]
fn test_all_ones_16x16() {
    let shape = ConvShape::new(16, 16, 1, 3, 1);
    let mut out = vec![0.0f32; 14 * 14];
    convolve(&SameWidth::<f32>::new(), &mut out, &[1.0; 256], &[1.0; 9], shape).unwrap();
    assert!(out.iter().all(|&v| v == 9.0));
}

#[test]
fn test_every_filter_size_every_remainder() {
    let mut rng = common::rng(7);
    for f in [1, 3, 5, 7] {
        for b in 1..=8 {
            for hout in 1..=2 * b + 1 {
                let shape = ConvShape::new(hout + f - 1, 2 * f + 5, 2, f, 2);
                let input = common::random_vec(&mut rng, shape.input_len(), -9i64..=9);
                let filter = common::random_vec(&mut rng, shape.filter_len(), -9i64..=9);
                let out = run(&SameWidth::<i64>::new(), shape, f + 2, b, &input, &filter);
                assert_eq!(
                    out,
                    conv2d_naive(&input, &filter, shape),
                    "F = {f}, B = {b}, hout = {hout}"
                );
            }
        }
    }
}

#[test]
fn test_single_window() {
    // h = w = F: exactly one output per channel.
    let mut rng = common::rng(11);
    for f in [1, 3, 5, 7] {
        let shape = ConvShape::new(f, f, 3, f, 2);
        let input = common::random_vec(&mut rng, shape.input_len(), -5i32..=5);
        let filter = common::random_vec(&mut rng, shape.filter_len(), -5i32..=5);
        let out = convolve_into(&SameWidth::<i32>::new(), &input, &filter, shape).unwrap();
        let expected: Vec<i32> = filter
            .chunks(input.len())
            .map(|bank| bank.iter().zip(&input).map(|(k, x)| k * x).sum())
            .collect();
        assert_eq!(out, expected);
    }
}

#[test]
fn test_integer_wraparound_matches_naive() {
    let mut rng = common::rng(3);
    let shape = ConvShape::new(9, 12, 4, 3, 2);
    let input = common::random_vec(&mut rng, shape.input_len(), i8::MIN..=i8::MAX);
    let filter = common::random_vec(&mut rng, shape.filter_len(), i8::MIN..=i8::MAX);
    let out = convolve_into(&SameWidth::<i8>::new(), &input, &filter, shape).unwrap();
    assert_eq!(out, conv2d_naive(&input, &filter, shape));
}

#[test]
fn test_zero_output_channels() {
    let shape = ConvShape::new(5, 5, 1, 3, 0);
    let out = convolve_into(&SameWidth::<f64>::new(), &[0.0; 25], &[], shape).unwrap();
    assert!(out.is_empty());
}
