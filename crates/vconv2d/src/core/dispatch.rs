//! Validation and filter-size dispatch.
//!
//! [`ConvPlan::new`] performs every check a call needs and fixes the
//! run-time parameters (`Lmax`, `B`, group count). [`conv2d_dispatch`] then
//! matches on the [`FilterSize`] to pick a row-block engine monomorphized for
//! that `F` and runs it over every output channel and tile.

use super::engine::RowBlockEngine;
use super::filter::FilterSize;
use super::planes::InputPlanes;
use super::shape::ConvShape;
use super::tiling::tiles;
use crate::error::{ConvError, Result};
use crate::lane::LaneConfig;
use crate::types::Precision;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Validated parameters of one convolution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvPlan {
    pub shape: ConvShape,
    pub filter: FilterSize,
    /// Lanes per register (`Lmax`).
    pub lmax: usize,
    /// Output rows per row-block (`B`).
    pub block: usize,
    /// Channel groups consumed per output row.
    pub groups: usize,
}

impl ConvPlan {
    /// Validate `shape` for `precision` and derive the run-time parameters.
    ///
    /// `block` overrides the precision's default row-block size.
    pub fn new<P: Precision>(
        precision: &P,
        shape: ConvShape,
        lanes: &LaneConfig,
        block: Option<usize>,
    ) -> Result<Self> {
        let filter = shape.validate()?;
        lanes.validate()?;
        precision.validate(filter, shape.cin)?;

        let lmax = lanes
            .max_lanes(precision.register_bits(), precision.lmul())
            .min(shape.w);
        if lmax < filter.size() {
            return Err(ConvError::Config(format!(
                "{lmax} lanes cannot hold one {filter} window"
            )));
        }

        let block = block.unwrap_or_else(|| precision.block_rows(filter));
        if block == 0 {
            return Err(ConvError::Config("row-block size must be at least 1".into()));
        }

        Ok(Self {
            shape,
            filter,
            lmax,
            block,
            groups: precision.groups(shape.cin),
        })
    }

    /// Width tiles per output plane.
    pub fn tile_count(&self) -> usize {
        tiles(self.shape.w, self.filter.size(), self.lmax).len()
    }
}

/// Run a validated plan. Buffer lengths must match `plan.shape`.
pub fn conv2d_dispatch<P: Precision>(
    precision: &P,
    plan: &ConvPlan,
    output: &mut [P::Output],
    input: &[P::Input],
    filter: &[P::Weight],
) {
    log::debug!(
        "conv2d {}: {}x{}x{} -> {}x{}x{}, {} filter, Lmax={}, B={}, {} tiles",
        precision.name(),
        plan.shape.cin,
        plan.shape.h,
        plan.shape.w,
        plan.shape.cout,
        plan.shape.hout(),
        plan.shape.wout(),
        plan.filter,
        plan.lmax,
        plan.block,
        plan.tile_count()
    );

    match plan.filter {
        FilterSize::F1 => run::<P, 1>(precision, plan, output, input, filter),
        FilterSize::F3 => run::<P, 3>(precision, plan, output, input, filter),
        FilterSize::F5 => run::<P, 5>(precision, plan, output, input, filter),
        FilterSize::F7 => run::<P, 7>(precision, plan, output, input, filter),
    }
}

fn run<P: Precision, const F: usize>(
    precision: &P,
    plan: &ConvPlan,
    output: &mut [P::Output],
    input: &[P::Input],
    filter: &[P::Weight],
) {
    let shape = plan.shape;
    let planes = InputPlanes::new(input, shape.cin, shape.h, shape.w);
    let plane_len = shape.hout() * shape.wout();
    let bank_len = shape.cin * F * F;

    let channel = |engine: &mut RowBlockEngine<'_, P, F>, o: usize, out: &mut [P::Output]| {
        let taps = precision.prepare_filter(
            &filter[o * bank_len..(o + 1) * bank_len],
            shape.cin,
            plan.filter,
        );
        for tile in tiles(shape.w, F, plan.lmax) {
            engine.run_tile(&planes, &taps, tile, out);
        }
    };

    #[cfg(feature = "parallel")]
    {
        output.par_chunks_mut(plane_len).enumerate().for_each_init(
            || RowBlockEngine::<P, F>::new(precision, plan.block, plan.groups, plan.lmax),
            |engine, (o, out)| channel(engine, o, out),
        );
    }

    #[cfg(not(feature = "parallel"))]
    {
        let mut engine = RowBlockEngine::<P, F>::new(precision, plan.block, plan.groups, plan.lmax);
        for (o, out) in output.chunks_mut(plane_len).enumerate() {
            channel(&mut engine, o, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::conv2d_naive;
    use crate::types::{Packed, SameWidth};

    #[test]
    fn test_plan_defaults() {
        let p = SameWidth::<f32>::new();
        let plan = ConvPlan::new(&p, ConvShape::new(16, 300, 2, 3, 4), &LaneConfig::default(), None)
            .unwrap();
        // 4096 bits * 2 / 32
        assert_eq!(plan.lmax, 256);
        assert_eq!(plan.block, 6);
        assert_eq!(plan.groups, 2);
        assert_eq!(plan.tile_count(), 2);
    }

    #[test]
    fn test_plan_rejects_small_registers() {
        let p = SameWidth::<f32>::new();
        let lanes = LaneConfig::default().with_lane_cap(4);
        assert!(matches!(
            ConvPlan::new(&p, ConvShape::new(8, 8, 1, 5, 1), &lanes, None),
            Err(ConvError::Config(_))
        ));
        assert!(matches!(
            ConvPlan::new(&p, ConvShape::new(8, 8, 1, 3, 1), &lanes, Some(0)),
            Err(ConvError::Config(_))
        ));
    }

    #[test]
    fn test_plan_packed_groups() {
        let p = Packed::<u16>::new(2, 2);
        let plan =
            ConvPlan::new(&p, ConvShape::new(8, 8, 5, 3, 1), &LaneConfig::default(), None).unwrap();
        assert_eq!(plan.groups, 3);
        assert_eq!(plan.block, 4);
        // 4096 bits * 1 / 16 = 256, clamped to the row width
        assert_eq!(plan.lmax, 8);
    }

    #[test]
    fn test_plan_clamps_lanes_to_row_width() {
        let p = SameWidth::<f64>::new();
        let shape = ConvShape::new(6, 4, 1, 3, 1);
        let plan = ConvPlan::new(&p, shape, &LaneConfig::new(1 << 16), None).unwrap();
        assert_eq!(plan.lmax, 4);
        assert_eq!(plan.tile_count(), 1);

        let engine = RowBlockEngine::<_, 3>::new(&p, plan.block, plan.groups, plan.lmax);
        assert_eq!(engine.vreg.max_lanes(), 4);
        assert!(engine.accs.iter().all(|acc| acc.max_lanes() == 4));
    }

    #[test]
    fn test_plan_rejects_oversized_registers() {
        let p = SameWidth::<f32>::new();
        assert!(matches!(
            ConvPlan::new(&p, ConvShape::new(8, 8, 1, 3, 1), &LaneConfig::new(1 << 63), None),
            Err(ConvError::Config(_))
        ));
    }

    #[test]
    fn test_dispatch_every_filter_size() {
        let p = SameWidth::<i32>::new();
        let lanes = LaneConfig::default().with_lane_cap(9);
        for f in [1, 3, 5, 7] {
            let shape = ConvShape::new(13, 17, 2, f, 3);
            let input: Vec<i32> = (0..shape.input_len() as i32).map(|i| i % 11 - 5).collect();
            let filter: Vec<i32> = (0..shape.filter_len() as i32).map(|i| i % 5 - 2).collect();
            let plan = ConvPlan::new(&p, shape, &lanes, None).unwrap();
            let mut out = vec![0; shape.output_len()];
            conv2d_dispatch(&p, &plan, &mut out, &input, &filter);
            assert_eq!(out, conv2d_naive(&input, &filter, shape), "F = {f}");
        }
    }
}
