use std::marker::PhantomData;

use super::traits::{MacElement, Precision};
use crate::core::{FilterSize, InputPlanes};
use crate::lane::VReg;

/// Narrow operands, double-width products and accumulators.
///
/// Every product is formed in the wide type, starting with the very first
/// multiply, so no partial sum ever lives in the narrow type. `i8` inputs
/// are first sign-extended to 16-bit operands and then MAC'd into `i32`.
///
/// # Example
///
/// ```
/// use vconv2d::{convolve_into, ConvShape, Widening};
///
/// let input = vec![127i8; 3 * 3];
/// let filter = vec![127i8; 3 * 3];
/// let out = convolve_into(&Widening::<i8>::new(), &input, &filter, ConvShape::new(3, 3, 1, 3, 1))
///     .unwrap();
/// assert_eq!(out, vec![9 * 127 * 127]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Widening<T> {
    _elem: PhantomData<T>,
}

impl<T> Widening<T> {
    pub const fn new() -> Self {
        Self { _elem: PhantomData }
    }
}

impl<T> Default for Widening<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Narrow element types and their widening chain.
pub trait Widen: Copy + Default + Send + Sync + 'static {
    /// Lane type after loading (sign extension where the ISA needs it).
    type Operand: Copy + Default + Send + Sync;
    /// Product and accumulator type.
    type Wide: MacElement;

    const NAME: &'static str;
    /// Row-block sizes indexed `[F1, F3, F5, F7]`.
    const BLOCK_ROWS: [usize; 4];

    fn operand(self) -> Self::Operand;
    fn widen(op: Self::Operand) -> Self::Wide;
}

impl Widen for i8 {
    type Operand = i16;
    type Wide = i32;
    const NAME: &'static str = "i8->i32";
    const BLOCK_ROWS: [usize; 4] = [4, 8, 6, 6];

    #[inline(always)]
    fn operand(self) -> i16 {
        i16::from(self)
    }

    #[inline(always)]
    fn widen(op: i16) -> i32 {
        i32::from(op)
    }
}

impl Widen for i16 {
    type Operand = i16;
    type Wide = i32;
    const NAME: &'static str = "i16->i32";
    const BLOCK_ROWS: [usize; 4] = [4, 8, 6, 6];

    #[inline(always)]
    fn operand(self) -> i16 {
        self
    }

    #[inline(always)]
    fn widen(op: i16) -> i32 {
        i32::from(op)
    }
}

impl Widen for i32 {
    type Operand = i32;
    type Wide = i64;
    const NAME: &'static str = "i32->i64";
    const BLOCK_ROWS: [usize; 4] = [4, 4, 8, 6];

    #[inline(always)]
    fn operand(self) -> i32 {
        self
    }

    #[inline(always)]
    fn widen(op: i32) -> i64 {
        i64::from(op)
    }
}

impl<T: Widen> Precision for Widening<T> {
    type Input = T;
    type Weight = T;
    type Output = T::Wide;
    type Lane = T::Operand;
    type Tap = T::Operand;
    type Acc = VReg<T::Wide>;

    fn name(&self) -> &'static str {
        T::NAME
    }

    fn register_bits(&self) -> u32 {
        (std::mem::size_of::<T::Wide>() * 8) as u32
    }

    fn block_rows(&self, filter: FilterSize) -> usize {
        T::BLOCK_ROWS[filter.index()]
    }

    fn prepare_filter(&self, weights: &[T], cin: usize, filter: FilterSize) -> Vec<T::Operand> {
        weights[..cin * filter.taps()]
            .iter()
            .map(|&w| w.operand())
            .collect()
    }

    #[inline]
    fn load_row(
        &self,
        input: &InputPlanes<'_, T>,
        group: usize,
        row: usize,
        col: usize,
        dst: &mut VReg<T::Operand>,
    ) {
        dst.load_map(&input.row(group, row)[col..], T::operand);
    }

    fn new_acc(&self, _filter: FilterSize, max_lanes: usize) -> VReg<T::Wide> {
        VReg::new(max_lanes)
    }

    #[inline]
    fn set_acc_vl(&self, acc: &mut VReg<T::Wide>, vl: usize) {
        acc.set_vl(vl);
    }

    #[inline]
    fn mul(&self, acc: &mut VReg<T::Wide>, v: &VReg<T::Operand>, tap: T::Operand) {
        let k = T::widen(tap);
        acc.zip_apply(v, |a, x| *a = <T::Wide>::mul(T::widen(x), k));
    }

    #[inline]
    fn macc(&self, acc: &mut VReg<T::Wide>, v: &VReg<T::Operand>, tap: T::Operand) {
        let k = T::widen(tap);
        acc.zip_apply(v, |a, x| *a = <T::Wide>::mac(*a, T::widen(x), k));
    }

    #[inline]
    fn store(&self, acc: &VReg<T::Wide>, out: &mut [T::Wide]) {
        let lanes = acc.as_slice();
        out[..lanes.len()].copy_from_slice(lanes);
    }
}
