use crate::core::{FilterSize, InputPlanes};
use crate::error::Result;
use crate::lane::{Lmul, VReg};

/// Scalar arithmetic used by every multiply-accumulate.
///
/// Floating point uses separate multiply and add (no fusion) so that the
/// engine and [`conv2d_reference`](crate::core::conv2d_reference) round
/// identically. Integers wrap, as vector integer instructions do.
pub trait MacElement: Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    /// `a * b`
    fn mul(a: Self, b: Self) -> Self;

    /// `acc + a * b`
    fn mac(acc: Self, a: Self, b: Self) -> Self;
}

macro_rules! impl_mac_float {
    ($($t:ty),*) => {$(
        impl MacElement for $t {
            #[inline(always)]
            fn mul(a: Self, b: Self) -> Self {
                a * b
            }

            #[inline(always)]
            fn mac(acc: Self, a: Self, b: Self) -> Self {
                acc + a * b
            }
        }
    )*};
}

macro_rules! impl_mac_int {
    ($($t:ty),*) => {$(
        impl MacElement for $t {
            #[inline(always)]
            fn mul(a: Self, b: Self) -> Self {
                a.wrapping_mul(b)
            }

            #[inline(always)]
            fn mac(acc: Self, a: Self, b: Self) -> Self {
                acc.wrapping_add(a.wrapping_mul(b))
            }
        }
    )*};
}

impl_mac_float!(f32, f64);
impl_mac_int!(i8, i16, i32, i64, u16, u32);

/// Precision adapter: how one numeric regime loads, multiplies, accumulates
/// and stores.
///
/// The row-block engine is written once against this trait. An adapter
/// decides:
///
/// - the lane type an input row is loaded into (plain, sign-extended, or two
///   channels packed into one lane),
/// - the filter tap layout, prepared once per output channel as
///   `taps[group][dr][dc]`,
/// - the accumulator register and its first-touch `mul` / subsequent `macc`,
/// - what happens at the end of each channel group (`end_group`), which is
///   where packed accumulators are periodically widened.
///
/// A *group* is the set of input channels consumed by one load. It is one
/// channel for every regime except packed precision, which consumes two.
pub trait Precision: Send + Sync {
    type Input: Copy + Default + Send + Sync;
    type Weight: Copy + Default + Send + Sync;
    type Output: Copy + Default + Send + Sync;
    type Lane: Copy + Default;
    type Tap: Copy + Default + Send + Sync;
    type Acc;

    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Element width of the register group that bounds `Lmax`.
    fn register_bits(&self) -> u32;

    /// Register grouping used for the accumulators.
    fn lmul(&self) -> Lmul {
        Lmul::M2
    }

    /// Default row-block size `B` for a filter size.
    fn block_rows(&self, filter: FilterSize) -> usize;

    /// Number of channel groups for `cin` input channels.
    fn groups(&self, cin: usize) -> usize {
        cin
    }

    /// Dispatch-time checks specific to this regime.
    fn validate(&self, _filter: FilterSize, _cin: usize) -> Result<()> {
        Ok(())
    }

    /// Rearrange one output channel's `cin x F x F` weights into taps
    /// indexed `[group][dr][dc]`.
    fn prepare_filter(&self, weights: &[Self::Weight], cin: usize, filter: FilterSize)
        -> Vec<Self::Tap>;

    /// Load `dst.vl()` lanes of input row `row` of `group`, starting at `col`.
    fn load_row(
        &self,
        input: &InputPlanes<'_, Self::Input>,
        group: usize,
        row: usize,
        col: usize,
        dst: &mut VReg<Self::Lane>,
    );

    /// Allocate one accumulator register of `max_lanes` lanes.
    fn new_acc(&self, filter: FilterSize, max_lanes: usize) -> Self::Acc;

    /// Select the active width of an accumulator.
    fn set_acc_vl(&self, acc: &mut Self::Acc, vl: usize);

    /// First contribution to an output row: overwrite the accumulator.
    fn mul(&self, acc: &mut Self::Acc, v: &VReg<Self::Lane>, tap: Self::Tap);

    /// Every later contribution.
    fn macc(&self, acc: &mut Self::Acc, v: &VReg<Self::Lane>, tap: Self::Tap);

    /// Called on each accumulator an input row touched, after `group` of
    /// `groups` has been fully applied to it.
    fn end_group(&self, _acc: &mut Self::Acc, _group: usize, _groups: usize) {}

    /// Write the active lanes of a finished accumulator.
    fn store(&self, acc: &Self::Acc, out: &mut [Self::Output]);
}
