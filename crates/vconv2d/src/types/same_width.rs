use std::marker::PhantomData;

use super::traits::{MacElement, Precision};
use crate::core::{FilterSize, InputPlanes};
use crate::lane::VReg;

/// Input, weights, accumulator and output all share one element type.
///
/// Used for `f32` and `f64`, and for the wrap-around integer kernels
/// (`i8`, `i16`, `i32`, `i64`).
///
/// # Example
///
/// ```
/// use vconv2d::{convolve_into, ConvShape, SameWidth};
///
/// let input = vec![1.0f64; 4 * 4];
/// let filter = vec![1.0f64; 3 * 3];
/// let out = convolve_into(&SameWidth::<f64>::new(), &input, &filter, ConvShape::new(4, 4, 1, 3, 1))
///     .unwrap();
/// assert_eq!(out, vec![9.0; 4]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SameWidth<T> {
    _elem: PhantomData<T>,
}

impl<T> SameWidth<T> {
    pub const fn new() -> Self {
        Self { _elem: PhantomData }
    }
}

impl<T> Default for SameWidth<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Element types usable with [`SameWidth`].
pub trait SameWidthElement: MacElement {
    const NAME: &'static str;
}

macro_rules! impl_same_width_element {
    ($($t:ty => $name:expr),*) => {$(
        impl SameWidthElement for $t {
            const NAME: &'static str = $name;
        }
    )*};
}

impl_same_width_element!(
    f32 => "f32",
    f64 => "f64",
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64"
);

/// Row-block sizes indexed `[F1, F3, F5, F7]`.
const BLOCK_ROWS: [usize; 4] = [4, 6, 6, 4];

impl<T: SameWidthElement> Precision for SameWidth<T> {
    type Input = T;
    type Weight = T;
    type Output = T;
    type Lane = T;
    type Tap = T;
    type Acc = VReg<T>;

    fn name(&self) -> &'static str {
        T::NAME
    }

    fn register_bits(&self) -> u32 {
        (std::mem::size_of::<T>() * 8) as u32
    }

    fn block_rows(&self, filter: FilterSize) -> usize {
        BLOCK_ROWS[filter.index()]
    }

    fn prepare_filter(&self, weights: &[T], cin: usize, filter: FilterSize) -> Vec<T> {
        weights[..cin * filter.taps()].to_vec()
    }

    #[inline]
    fn load_row(
        &self,
        input: &InputPlanes<'_, T>,
        group: usize,
        row: usize,
        col: usize,
        dst: &mut VReg<T>,
    ) {
        dst.load(&input.row(group, row)[col..]);
    }

    fn new_acc(&self, _filter: FilterSize, max_lanes: usize) -> VReg<T> {
        VReg::new(max_lanes)
    }

    #[inline]
    fn set_acc_vl(&self, acc: &mut VReg<T>, vl: usize) {
        acc.set_vl(vl);
    }

    #[inline]
    fn mul(&self, acc: &mut VReg<T>, v: &VReg<T>, tap: T) {
        acc.zip_apply(v, |a, x| *a = T::mul(x, tap));
    }

    #[inline]
    fn macc(&self, acc: &mut VReg<T>, v: &VReg<T>, tap: T) {
        acc.zip_apply(v, |a, x| *a = T::mac(*a, x, tap));
    }

    #[inline]
    fn store(&self, acc: &VReg<T>, out: &mut [T]) {
        let lanes = acc.as_slice();
        out[..lanes.len()].copy_from_slice(lanes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_then_macc() {
        let p = SameWidth::<f32>::new();
        let mut v = VReg::new(4);
        v.load(&[1.0, 2.0, 3.0, 4.0]);
        let mut acc = p.new_acc(FilterSize::F3, 4);
        p.set_acc_vl(&mut acc, 3);
        p.mul(&mut acc, &v, 2.0);
        p.macc(&mut acc, &v, 0.5);
        let mut out = [0.0f32; 4];
        p.store(&acc, &mut out);
        assert_eq!(out, [2.5, 5.0, 7.5, 0.0]);
    }

    #[test]
    fn test_integer_wraps() {
        let p = SameWidth::<i8>::new();
        let mut v = VReg::new(1);
        v.load(&[100i8]);
        let mut acc = p.new_acc(FilterSize::F1, 1);
        p.mul(&mut acc, &v, 2);
        assert_eq!(acc.as_slice(), &[100i8.wrapping_mul(2)]);
    }

    #[test]
    fn test_register_bits_and_blocks() {
        assert_eq!(SameWidth::<f64>::new().register_bits(), 64);
        assert_eq!(SameWidth::<i16>::new().register_bits(), 16);
        assert_eq!(SameWidth::<f32>::new().block_rows(FilterSize::F3), 6);
        assert_eq!(SameWidth::<f32>::new().block_rows(FilterSize::F7), 4);
    }
}
