use std::marker::PhantomData;

use super::traits::{MacElement, Precision};
use crate::core::{FilterSize, InputPlanes};
use crate::error::{ConvError, Result};
use crate::lane::{Lmul, VReg};

/// A native lane that holds two sub-precision fields.
///
/// The lane is split into a low and a high field of `FIELD_BITS` each.
/// Packing places the second operand above the first by multiplying it with
/// `2^FIELD_BITS`; unpacking separates the fields with a mask and a logical
/// shift and widens both to `u32`.
pub trait PackedLane: MacElement {
    const FIELD_BITS: u32;
    const NAME: &'static str;

    /// `lo + hi * 2^FIELD_BITS`
    fn pack_low_precision(lo: u8, hi: u8) -> Self;

    /// `(low field, high field)` widened to `u32`.
    fn unpack_and_widen(self) -> (u32, u32);
}

impl PackedLane for u16 {
    const FIELD_BITS: u32 = 8;
    const NAME: &'static str = "packed-u16";

    #[inline(always)]
    fn pack_low_precision(lo: u8, hi: u8) -> u16 {
        u16::from(lo).wrapping_add(u16::from(hi).wrapping_mul(1 << Self::FIELD_BITS))
    }

    #[inline(always)]
    fn unpack_and_widen(self) -> (u32, u32) {
        (u32::from(self & 0xff), u32::from(self >> Self::FIELD_BITS))
    }
}

impl PackedLane for u32 {
    const FIELD_BITS: u32 = 16;
    const NAME: &'static str = "packed-u32";

    #[inline(always)]
    fn pack_low_precision(lo: u8, hi: u8) -> u32 {
        u32::from(lo).wrapping_add(u32::from(hi).wrapping_mul(1 << Self::FIELD_BITS))
    }

    #[inline(always)]
    fn unpack_and_widen(self) -> (u32, u32) {
        (self & 0xffff, self >> Self::FIELD_BITS)
    }
}

/// Sub-byte unsigned activations and weights, two channels per lane.
///
/// For channel group `g` the activation lane is `a[2g+1] + a[2g] * S` and
/// the tap is `w[2g] + w[2g+1] * S` with `S = 2^FIELD_BITS`. Modulo the lane
/// width their product is
///
/// ```text
/// a[2g+1]*w[2g]  +  S * (a[2g]*w[2g] + a[2g+1]*w[2g+1])
/// ```
///
/// so the high field accumulates the two-channel dot product while the low
/// field collects a by-product that is discarded.
///
/// Both fields overflow after a bounded number of MACs. Each input row adds
/// at most `F` products per group to an accumulator, each worth at most
/// `2 * amax * wmax` in the high field, so the narrow accumulator is widened
/// into a `u32` accumulator and cleared every `N` groups:
///
/// ```text
/// N = floor((2^FIELD_BITS - 1) / (2 * F * (2^act_bits - 1) * (2^weight_bits - 1)))
/// ```
///
/// and after the last group. Widening on any later schedule corrupts the
/// result silently, so a custom interval above `N` is rejected at dispatch.
///
/// An odd channel count pairs the last channel with an all-zero channel.
///
/// # Example
///
/// ```
/// use vconv2d::{Packed, FilterSize};
///
/// let p = Packed::<u16>::new(2, 2);
/// assert_eq!(p.max_flush_interval(FilterSize::F3), 4);
/// assert_eq!(Packed::<u16>::new(1, 1).max_flush_interval(FilterSize::F7), 18);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Packed<L = u16> {
    act_bits: u32,
    weight_bits: u32,
    flush_every: Option<usize>,
    _lane: PhantomData<L>,
}

impl<L: PackedLane> Packed<L> {
    /// Activations of `act_bits` and weights of `weight_bits` bits (1 to 8).
    pub fn new(act_bits: u32, weight_bits: u32) -> Self {
        Self {
            act_bits,
            weight_bits,
            flush_every: None,
            _lane: PhantomData,
        }
    }

    /// Widen after every `groups` channel groups instead of the maximum
    /// safe interval.
    pub fn with_flush_every(mut self, groups: usize) -> Self {
        self.flush_every = Some(groups);
        self
    }

    pub fn act_bits(&self) -> u32 {
        self.act_bits
    }

    pub fn weight_bits(&self) -> u32 {
        self.weight_bits
    }

    /// Largest activation value.
    pub fn act_max(&self) -> u8 {
        ((1u32 << self.act_bits) - 1) as u8
    }

    /// Largest weight value.
    pub fn weight_max(&self) -> u8 {
        ((1u32 << self.weight_bits) - 1) as u8
    }

    /// Longest overflow-free run of channel groups between widenings.
    ///
    /// Zero means the precision does not fit the lane fields for this
    /// filter size.
    pub fn max_flush_interval(&self, filter: FilterSize) -> usize {
        let field_max = (1u64 << L::FIELD_BITS) - 1;
        let per_group =
            2 * filter.size() as u64 * u64::from(self.act_max()) * u64::from(self.weight_max());
        (field_max / per_group.max(1)) as usize
    }

    /// Interval in effect for `filter`.
    pub fn flush_interval(&self, filter: FilterSize) -> usize {
        self.flush_every
            .unwrap_or_else(|| self.max_flush_interval(filter))
    }
}

/// Narrow packed accumulator plus its widened total.
#[derive(Debug, Clone)]
pub struct PackedAcc<L> {
    narrow: VReg<L>,
    wide: VReg<u32>,
    flush_every: usize,
}

impl<L: PackedLane> PackedAcc<L> {
    /// Move the high fields into the wide accumulator and clear the narrow one.
    #[inline]
    fn flush(&mut self) {
        self.wide.zip_apply(&self.narrow, |w, lane| {
            let (_, hi) = lane.unpack_and_widen();
            *w = w.wrapping_add(hi);
        });
        self.narrow.fill(L::default());
    }
}

impl<L: PackedLane> Precision for Packed<L> {
    type Input = u8;
    type Weight = u8;
    type Output = u32;
    type Lane = L;
    type Tap = L;
    type Acc = PackedAcc<L>;

    fn name(&self) -> &'static str {
        L::NAME
    }

    fn register_bits(&self) -> u32 {
        (std::mem::size_of::<L>() * 8) as u32
    }

    fn lmul(&self) -> Lmul {
        Lmul::M1
    }

    fn block_rows(&self, _filter: FilterSize) -> usize {
        4
    }

    fn groups(&self, cin: usize) -> usize {
        cin.div_ceil(2)
    }

    fn validate(&self, filter: FilterSize, _cin: usize) -> Result<()> {
        for (what, bits) in [("activation", self.act_bits), ("weight", self.weight_bits)] {
            if !(1..=8).contains(&bits) {
                return Err(ConvError::UnsupportedPrecision(format!(
                    "{what} precision must be 1..=8 bits, got {bits}"
                )));
            }
        }
        let max = self.max_flush_interval(filter);
        if max == 0 {
            return Err(ConvError::UnsupportedPrecision(format!(
                "A{}W{} does not fit {}-bit fields for a {filter} filter",
                self.act_bits,
                self.weight_bits,
                L::FIELD_BITS
            )));
        }
        match self.flush_every {
            Some(0) => Err(ConvError::Config("flush interval must be at least 1".into())),
            Some(n) if n > max => Err(ConvError::FlushInterval { requested: n, max }),
            _ => Ok(()),
        }
    }

    fn prepare_filter(&self, weights: &[u8], cin: usize, filter: FilterSize) -> Vec<L> {
        let taps = filter.taps();
        let groups = self.groups(cin);
        let mut packed = Vec::with_capacity(groups * taps);
        for g in 0..groups {
            let first = &weights[2 * g * taps..(2 * g + 1) * taps];
            if 2 * g + 1 < cin {
                let second = &weights[(2 * g + 1) * taps..(2 * g + 2) * taps];
                packed.extend(
                    first
                        .iter()
                        .zip(second)
                        .map(|(&w0, &w1)| L::pack_low_precision(w0, w1)),
                );
            } else {
                packed.extend(first.iter().map(|&w0| L::pack_low_precision(w0, 0)));
            }
        }
        packed
    }

    #[inline]
    fn load_row(
        &self,
        input: &InputPlanes<'_, u8>,
        group: usize,
        row: usize,
        col: usize,
        dst: &mut VReg<L>,
    ) {
        let first = &input.row(2 * group, row)[col..];
        if 2 * group + 1 < input.channels() {
            let second = &input.row(2 * group + 1, row)[col..];
            dst.load_zip(second, first, L::pack_low_precision);
        } else {
            dst.load_map(first, |a0| L::pack_low_precision(0, a0));
        }
    }

    fn new_acc(&self, filter: FilterSize, max_lanes: usize) -> PackedAcc<L> {
        PackedAcc {
            narrow: VReg::new(max_lanes),
            wide: VReg::new(max_lanes),
            flush_every: self.flush_interval(filter).max(1),
        }
    }

    #[inline]
    fn set_acc_vl(&self, acc: &mut PackedAcc<L>, vl: usize) {
        acc.narrow.set_vl(vl);
        acc.wide.set_vl(vl);
    }

    #[inline]
    fn mul(&self, acc: &mut PackedAcc<L>, v: &VReg<L>, tap: L) {
        acc.narrow.zip_apply(v, |a, x| *a = L::mul(x, tap));
        acc.wide.fill(0);
    }

    #[inline]
    fn macc(&self, acc: &mut PackedAcc<L>, v: &VReg<L>, tap: L) {
        acc.narrow.zip_apply(v, |a, x| *a = L::mac(*a, x, tap));
    }

    #[inline]
    fn end_group(&self, acc: &mut PackedAcc<L>, group: usize, groups: usize) {
        if (group + 1) % acc.flush_every == 0 || group + 1 == groups {
            acc.flush();
        }
    }

    #[inline]
    fn store(&self, acc: &PackedAcc<L>, out: &mut [u32]) {
        debug_assert!(acc.narrow.as_slice().iter().all(|&l| l == L::default()));
        let lanes = acc.wide.as_slice();
        out[..lanes.len()].copy_from_slice(lanes);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack_u16() {
        let lane = u16::pack_low_precision(0x12, 0x34);
        assert_eq!(lane, 0x3412);
        assert_eq!(lane.unpack_and_widen(), (0x12, 0x34));
    }

    #[test]
    fn test_pack_unpack_u32() {
        let lane = u32::pack_low_precision(200, 7);
        assert_eq!(lane, 7 << 16 | 200);
        assert_eq!(lane.unpack_and_widen(), (200, 7));
    }

    #[test]
    fn test_product_high_field_is_pair_dot_product() {
        // a = (a0, a1) = (3, 2), w = (w0, w1) = (1, 3)
        let act = u16::pack_low_precision(2, 3);
        let tap = u16::pack_low_precision(1, 3);
        let (lo, hi) = u16::mul(act, tap).unpack_and_widen();
        assert_eq!(hi, 3 * 1 + 2 * 3);
        assert_eq!(lo, 2 * 1);
    }

    #[test]
    fn test_max_flush_interval() {
        assert_eq!(Packed::<u16>::new(1, 1).max_flush_interval(FilterSize::F3), 42);
        assert_eq!(Packed::<u16>::new(2, 2).max_flush_interval(FilterSize::F1), 14);
        assert_eq!(Packed::<u16>::new(3, 3).max_flush_interval(FilterSize::F7), 0);
        assert_eq!(Packed::<u32>::new(3, 3).max_flush_interval(FilterSize::F7), 95);
    }

    #[test]
    fn test_validate() {
        assert!(Packed::<u16>::new(2, 2).validate(FilterSize::F3, 8).is_ok());
        assert!(matches!(
            Packed::<u16>::new(3, 3).validate(FilterSize::F7, 8),
            Err(ConvError::UnsupportedPrecision(_))
        ));
        assert!(matches!(
            Packed::<u16>::new(0, 2).validate(FilterSize::F3, 8),
            Err(ConvError::UnsupportedPrecision(_))
        ));
        assert_eq!(
            Packed::<u16>::new(2, 2)
                .with_flush_every(5)
                .validate(FilterSize::F3, 8),
            Err(ConvError::FlushInterval {
                requested: 5,
                max: 4
            })
        );
        assert!(matches!(
            Packed::<u16>::new(2, 2).with_flush_every(0).validate(FilterSize::F3, 8),
            Err(ConvError::Config(_))
        ));
    }

    #[test]
    fn test_prepare_filter_odd_channels() {
        let p = Packed::<u16>::new(2, 2);
        let weights = [1u8, 2, 3];
        let taps = p.prepare_filter(&weights, 3, FilterSize::F1);
        assert_eq!(taps, vec![u16::pack_low_precision(1, 2), u16::pack_low_precision(3, 0)]);
    }

    #[test]
    fn test_flush_schedule() {
        let p = Packed::<u16>::new(1, 1).with_flush_every(2);
        let mut v = VReg::new(1);
        v.load(&[u16::pack_low_precision(1, 1)]);
        let tap = u16::pack_low_precision(1, 1);
        let mut acc = p.new_acc(FilterSize::F1, 1);

        p.mul(&mut acc, &v, tap);
        p.end_group(&mut acc, 0, 5);
        assert_eq!(acc.wide.as_slice(), &[0]);
        p.macc(&mut acc, &v, tap);
        p.end_group(&mut acc, 1, 5);
        assert_eq!(acc.wide.as_slice(), &[4]);
        assert_eq!(acc.narrow.as_slice(), &[0]);
        p.macc(&mut acc, &v, tap);
        p.end_group(&mut acc, 2, 3);
        assert_eq!(acc.wide.as_slice(), &[6]);
    }
}
