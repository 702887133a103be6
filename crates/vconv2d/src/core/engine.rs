//! Row-block engine: the register-carry state machine run on every tile.
//!
//! For one output channel and one width tile the engine keeps `B + F - 1`
//! accumulators in flight. Accumulator slot `k` always belongs to output
//! row `base + k`, where `base` is the first row not yet stored.
//!
//! ```text
//! PRELOAD   input rows 0 .. F-1            -> partial rows 0 .. F-2
//! STEADY    input rows base+F-1 .. +B      -> store rows base .. base+B,
//!           (while more than B rows left)     rotate the F-1 partial rows
//!                                             to slots 0 .. F-2, base += B
//! DRAIN     remaining 1 ..= B input rows   -> store the last rows
//! ```
//!
//! Rows are loaded lazily by the phase that first needs them. The first
//! input row of the next block is therefore not fetched ahead during
//! PRELOAD but at the start of STEADY (or DRAIN), which consumes the same
//! rows in the same order and gives identical results.
//!
//! Input row `j` feeds output row `j - dr` through kernel row `dr`. Each row
//! is loaded once per channel group and slid down one lane per kernel
//! column, so a single load serves all `F x F` taps it takes part in.
//!
//! Contributions reach an accumulator ordered by kernel row, then channel
//! group, then kernel column. The first one (kernel row 0, group 0, column 0)
//! is a multiply, every later one a multiply-accumulate. That order is fixed
//! by the output row alone, so neither the tile width nor `B` changes any
//! result bit.

use std::ops::Range;

use super::filter::FilterSize;
use super::planes::InputPlanes;
use super::tiling::Tile;
use crate::lane::VReg;
use crate::types::Precision;

/// What one tile did, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileStats {
    /// Row-blocks finished by the steady state.
    pub steady_blocks: usize,
    /// Rows stored by the drain.
    pub drained_rows: usize,
}

/// Register-blocked direct convolution for one filter size `F`.
pub struct RowBlockEngine<'p, P: Precision, const F: usize> {
    pub(super) precision: &'p P,
    pub(super) block: usize,
    pub(super) groups: usize,
    pub(super) vreg: VReg<P::Lane>,
    pub(super) accs: Vec<P::Acc>,
}

impl<'p, P: Precision, const F: usize> RowBlockEngine<'p, P, F> {
    /// Engine with `block` rows per block, `groups` channel groups and
    /// registers of `max_lanes` lanes.
    pub fn new(precision: &'p P, block: usize, groups: usize, max_lanes: usize) -> Self {
        debug_assert!(block >= 1 && max_lanes >= F);
        let filter = Self::filter_size();
        let accs = (0..block + F - 1)
            .map(|_| precision.new_acc(filter, max_lanes))
            .collect();
        Self {
            precision,
            block,
            groups,
            vreg: VReg::new(max_lanes),
            accs,
        }
    }

    pub(crate) const fn filter_size() -> FilterSize {
        match F {
            1 => FilterSize::F1,
            3 => FilterSize::F3,
            5 => FilterSize::F5,
            7 => FilterSize::F7,
            _ => panic!("engine instantiated for an unsupported filter size"),
        }
    }

    /// Rows kept partially accumulated across a block boundary.
    pub const CARRY: usize = Self::filter_size().carry();

    /// Convolve one tile of one output channel.
    ///
    /// `taps` is the channel's prepared filter (`[group][dr][dc]`), `out` the
    /// full `hout x wout` output plane.
    pub fn run_tile(
        &mut self,
        input: &InputPlanes<'_, P::Input>,
        taps: &[P::Tap],
        tile: Tile,
        out: &mut [P::Output],
    ) -> TileStats {
        let hout = input.height() + 1 - F;
        let wout = input.width() + 1 - F;
        debug_assert_eq!(out.len(), hout * wout);
        debug_assert_eq!(taps.len(), self.groups * F * F);

        self.vreg.set_vl(tile.in_width);
        for acc in &mut self.accs {
            self.precision.set_acc_vl(acc, tile.out_width);
        }

        let mut stats = TileStats::default();

        // PRELOAD
        self.feed_rows(input, taps, tile.col, 0..Self::CARRY, 0, hout);

        // STEADY
        let mut base = 0;
        while hout - base > self.block {
            let first = base + Self::CARRY;
            self.feed_rows(input, taps, tile.col, first..first + self.block, base, hout);
            self.store_rows(out, wout, tile, base, self.block);
            // The last F - 1 accumulators move to the front; slots B.. are
            // reused for the next block's new rows.
            self.accs.rotate_left(self.block);
            base += self.block;
            stats.steady_blocks += 1;
        }

        // DRAIN
        stats.drained_rows = self.drain(input, taps, tile, out, base, hout - base);

        log::trace!(
            "tile col={} width={} F={} B={}: {} steady blocks, {} drained rows",
            tile.col,
            tile.out_width,
            F,
            self.block,
            stats.steady_blocks,
            stats.drained_rows
        );
        stats
    }

    /// Apply input rows `rows` to every in-flight output row below `limit`.
    pub(super) fn feed_rows(
        &mut self,
        input: &InputPlanes<'_, P::Input>,
        taps: &[P::Tap],
        col: usize,
        rows: Range<usize>,
        base: usize,
        limit: usize,
    ) {
        for j in rows {
            self.feed_row(input, taps, col, j, base, limit);
        }
    }

    fn feed_row(
        &mut self,
        input: &InputPlanes<'_, P::Input>,
        taps: &[P::Tap],
        col: usize,
        j: usize,
        base: usize,
        limit: usize,
    ) {
        let p = self.precision;
        // Output rows fed by input row j: j - dr for dr in 0..=dr_max.
        let dr_max = (F - 1).min(j);
        let dr_min = (j + 1).saturating_sub(limit);
        if dr_min > dr_max {
            return;
        }

        for g in 0..self.groups {
            p.load_row(input, g, j, col, &mut self.vreg);
            let group_taps = &taps[g * F * F..(g + 1) * F * F];

            for dc in 0..F {
                for dr in dr_min..=dr_max {
                    let o = j - dr;
                    debug_assert!(o >= base && o - base < self.accs.len());
                    let acc = &mut self.accs[o - base];
                    let tap = group_taps[dr * F + dc];
                    if dr == 0 && g == 0 && dc == 0 {
                        p.mul(acc, &self.vreg, tap);
                    } else {
                        p.macc(acc, &self.vreg, tap);
                    }
                }
                if dc + 1 < F {
                    self.vreg.slide_down(1);
                }
            }

            for dr in dr_min..=dr_max {
                p.end_group(&mut self.accs[j - dr - base], g, self.groups);
            }
        }
    }

    /// Write accumulator slots `0..count` to output rows `base..base + count`.
    pub(super) fn store_rows(
        &self,
        out: &mut [P::Output],
        wout: usize,
        tile: Tile,
        base: usize,
        count: usize,
    ) {
        for (k, acc) in self.accs[..count].iter().enumerate() {
            let start = (base + k) * wout + tile.col;
            self.precision
                .store(acc, &mut out[start..start + tile.out_width]);
        }
    }
}
