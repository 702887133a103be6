use super::engine::RowBlockEngine;
use super::planes::InputPlanes;
use super::tiling::Tile;
use crate::types::Precision;

impl<P: Precision, const F: usize> RowBlockEngine<'_, P, F> {
    /// Finish the last `remainder` output rows of a tile.
    ///
    /// `remainder` is in `1..=B`. The last `remainder` input rows are fed with
    /// the output limit set to `hout`, so rows past the output height are
    /// never started, and then exactly `remainder` accumulators are stored.
    /// Returns the number of rows stored.
    pub(super) fn drain(
        &mut self,
        input: &InputPlanes<'_, P::Input>,
        taps: &[P::Tap],
        tile: Tile,
        out: &mut [P::Output],
        base: usize,
        remainder: usize,
    ) -> usize {
        debug_assert!(remainder >= 1 && remainder <= self.block);
        let hout = base + remainder;
        let wout = input.width() + 1 - F;
        let first = base + Self::CARRY;
        self.feed_rows(input, taps, tile.col, first..first + remainder, base, hout);
        self.store_rows(out, wout, tile, base, remainder);
        remainder
    }
}

#[cfg(test)]
mod tests {
    use crate::core::engine::RowBlockEngine;
    use crate::core::planes::InputPlanes;
    use crate::core::reference::conv2d_reference;
    use crate::core::shape::ConvShape;
    use crate::core::tiling::tiles;
    use crate::types::{Precision, SameWidth};

    /// Run a 3x3 `f64` plane with block size `b` and return the output.
    fn plane_3x3(h: usize, w: usize, b: usize) -> Vec<f64> {
        let p = SameWidth::<f64>::new();
        let input: Vec<f64> = (0..h * w).map(|i| (i as f64 * 0.37).sin()).collect();
        let weights: Vec<f64> = (0..9).map(|i| (i as f64 * 1.1).cos()).collect();
        let planes = InputPlanes::new(&input, 1, h, w);
        let taps = p.prepare_filter(&weights, 1, RowBlockEngine::<SameWidth<f64>, 3>::filter_size());
        let mut out = vec![0.0; (h - 2) * (w - 2)];
        let mut engine = RowBlockEngine::<_, 3>::new(&p, b, 1, 16);
        for tile in tiles(w, 3, 16) {
            engine.run_tile(&planes, &taps, tile, &mut out);
        }
        let expected = conv2d_reference(&input, &weights, ConvShape::new(h, w, 1, 3, 1));
        assert_eq!(out, expected, "h = {h}, b = {b}");
        out
    }

    #[test]
    fn test_drain_each_remainder() {
        // hout = 6 * k + r for every r in 1..=6
        for hout in 7..=12 {
            plane_3x3(hout + 2, 9, 6);
        }
    }

    #[test]
    fn test_drain_hout_smaller_than_block() {
        for hout in 1..6 {
            plane_3x3(hout + 2, 5, 6);
        }
    }

    #[test]
    fn test_block_size_does_not_change_bits() {
        let reference = plane_3x3(17, 20, 1);
        for b in 2..=9 {
            assert_eq!(plane_3x3(17, 20, b), reference);
        }
    }

    #[test]
    fn test_drain_single_row_overwrites_output() {
        let p = SameWidth::<i32>::new();
        let input = vec![2i32; 3 * 4];
        let weights = vec![1i32; 9];
        let planes = InputPlanes::new(&input, 1, 3, 4);
        let taps = p.prepare_filter(&weights, 1, RowBlockEngine::<SameWidth<i32>, 3>::filter_size());
        let mut out = vec![-1i32; 2];
        let mut engine = RowBlockEngine::<_, 3>::new(&p, 4, 1, 8);
        let stats = tiles(4, 3, 8)
            .map(|t| engine.run_tile(&planes, &taps, t, &mut out))
            .collect::<Vec<_>>();
        assert_eq!(out, vec![18, 18]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].drained_rows, 1);
    }
}
