use std::marker::PhantomData;
use std::ops::{BitAnd, BitOrAssign};

use super::traits::Precision;
use crate::core::{FilterSize, InputPlanes};
use crate::error::{ConvError, Result};
use crate::lane::{Lmul, VReg};

/// Most bit planes an operand can be split into.
pub const MAX_PLANES: usize = 8;

/// One lane of bit-serial data: plane `p` holds bit `p` of every channel
/// in the group, channel `k` at bit position `k` of the word.
pub type BitPlanes<W> = [W; MAX_PLANES];

/// Machine word carrying one bit per input channel.
pub trait BitWord:
    Copy + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static + BitAnd<Output = Self> + BitOrAssign
{
    /// Channels packed into one word.
    const CHANNELS: usize;
    const NAME: &'static str;

    /// Word with only bit `pos` set.
    fn bit(pos: usize) -> Self;

    fn popcount(self) -> u32;
}

macro_rules! impl_bit_word {
    ($($t:ty => $name:literal),*) => {$(
        impl BitWord for $t {
            const CHANNELS: usize = <$t>::BITS as usize;
            const NAME: &'static str = $name;

            #[inline(always)]
            fn bit(pos: usize) -> Self {
                1 << pos
            }

            #[inline(always)]
            fn popcount(self) -> u32 {
                self.count_ones()
            }
        }
    )*};
}

impl_bit_word!(u8 => "bitserial-u8", u32 => "bitserial-u32", u64 => "bitserial-u64");

/// Set bit `pos` of plane `p` for every bit `p` set in `value`.
#[inline(always)]
fn scatter_bits<W: BitWord>(planes: &mut BitPlanes<W>, bits: usize, value: u8, pos: usize) {
    for (p, plane) in planes.iter_mut().take(bits).enumerate() {
        if (value >> p) & 1 != 0 {
            *plane |= W::bit(pos);
        }
    }
}

/// Bit-serial unsigned activations and weights, one channel per word bit.
///
/// A group is `W::CHANNELS` input channels. Activations of `act_bits` bits
/// are split into bit planes, plane `i` gathering bit `i` of every channel
/// in the group into one word, and weights likewise into `weight_bits`
/// planes. The group's dot product is then
///
/// ```text
/// sum over i, j of  popcount(a_i & w_j) * 2^(i + j)
/// ```
///
/// The multiply-accumulate only ANDs words and counts ones. Counts are kept
/// apart per plane weight `k = i + j` and are shifted into place when a row
/// is stored.
///
/// A channel count that is not a multiple of the word width leaves the high
/// bits of the last group clear. Only the low `act_bits` / `weight_bits`
/// bits of each value take part.
///
/// # Example
///
/// ```
/// use vconv2d::{convolve_into, BitSerial, ConvShape};
///
/// let shape = ConvShape::new(4, 4, 8, 3, 1);
/// let out = convolve_into(&BitSerial::<u8>::new(2, 2), &vec![3u8; 128], &[3u8; 72], shape)?;
/// assert!(out.iter().all(|&v| v == 72 * 9));
/// # Ok::<(), vconv2d::ConvError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct BitSerial<W = u8> {
    act_bits: u32,
    weight_bits: u32,
    _word: PhantomData<W>,
}

impl<W: BitWord> BitSerial<W> {
    /// Activations of `act_bits` and weights of `weight_bits` bits (1 to 8).
    pub fn new(act_bits: u32, weight_bits: u32) -> Self {
        Self {
            act_bits,
            weight_bits,
            _word: PhantomData,
        }
    }

    pub fn act_bits(&self) -> u32 {
        self.act_bits
    }

    pub fn weight_bits(&self) -> u32 {
        self.weight_bits
    }

    /// Largest activation value.
    pub fn act_max(&self) -> u8 {
        ((1u32 << self.act_bits.min(8)) - 1) as u8
    }

    /// Largest weight value.
    pub fn weight_max(&self) -> u8 {
        ((1u32 << self.weight_bits.min(8)) - 1) as u8
    }

    /// Distinct plane weights `i + j`.
    fn weights(&self) -> usize {
        (self.act_bits + self.weight_bits - 1) as usize
    }

    /// Popcounts of one activation lane against one tap, by plane weight.
    #[inline(always)]
    fn plane_counts(&self, a: &BitPlanes<W>, w: &BitPlanes<W>, k: usize) -> u32 {
        let (abits, wbits) = (self.act_bits as usize, self.weight_bits as usize);
        let lo = k.saturating_sub(wbits - 1);
        let hi = k.min(abits - 1);
        (lo..=hi).map(|i| (a[i] & w[k - i]).popcount()).sum()
    }
}

/// Popcount totals, one register per plane weight.
#[derive(Debug, Clone)]
pub struct BitSerialAcc {
    counts: Vec<VReg<u32>>,
}

impl<W: BitWord> Precision for BitSerial<W> {
    type Input = u8;
    type Weight = u8;
    type Output = u32;
    type Lane = BitPlanes<W>;
    type Tap = BitPlanes<W>;
    type Acc = BitSerialAcc;

    fn name(&self) -> &'static str {
        W::NAME
    }

    fn register_bits(&self) -> u32 {
        W::CHANNELS as u32
    }

    fn lmul(&self) -> Lmul {
        Lmul::M2
    }

    fn block_rows(&self, _filter: FilterSize) -> usize {
        4
    }

    fn groups(&self, cin: usize) -> usize {
        cin.div_ceil(W::CHANNELS)
    }

    fn validate(&self, _filter: FilterSize, _cin: usize) -> Result<()> {
        for (what, bits) in [("activation", self.act_bits), ("weight", self.weight_bits)] {
            if !(1..=MAX_PLANES as u32).contains(&bits) {
                return Err(ConvError::UnsupportedPrecision(format!(
                    "{what} precision must be 1..={MAX_PLANES} bits, got {bits}"
                )));
            }
        }
        Ok(())
    }

    fn prepare_filter(&self, weights: &[u8], cin: usize, filter: FilterSize) -> Vec<BitPlanes<W>> {
        let taps = filter.taps();
        let bits = self.weight_bits as usize;
        let groups = self.groups(cin);
        let mut packed = vec![BitPlanes::<W>::default(); groups * taps];
        for (ch, bank) in weights.chunks(taps).take(cin).enumerate() {
            let (g, pos) = (ch / W::CHANNELS, ch % W::CHANNELS);
            for (tap, &w) in packed[g * taps..(g + 1) * taps].iter_mut().zip(bank) {
                scatter_bits(tap, bits, w, pos);
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
        dst: &mut VReg<BitPlanes<W>>,
    ) {
        let first = group * W::CHANNELS;
        let last = (first + W::CHANNELS).min(input.channels());
        let bits = self.act_bits as usize;
        dst.load_with(|x| {
            let mut planes = BitPlanes::<W>::default();
            for (pos, ch) in (first..last).enumerate() {
                scatter_bits(&mut planes, bits, input.row(ch, row)[col + x], pos);
            }
            planes
        });
    }

    fn new_acc(&self, _filter: FilterSize, max_lanes: usize) -> BitSerialAcc {
        BitSerialAcc {
            counts: (0..self.weights()).map(|_| VReg::new(max_lanes)).collect(),
        }
    }

    #[inline]
    fn set_acc_vl(&self, acc: &mut BitSerialAcc, vl: usize) {
        for c in &mut acc.counts {
            c.set_vl(vl);
        }
    }

    #[inline]
    fn mul(&self, acc: &mut BitSerialAcc, v: &VReg<BitPlanes<W>>, tap: BitPlanes<W>) {
        for (k, c) in acc.counts.iter_mut().enumerate() {
            c.zip_apply(v, |n, a| *n = self.plane_counts(&a, &tap, k));
        }
    }

    #[inline]
    fn macc(&self, acc: &mut BitSerialAcc, v: &VReg<BitPlanes<W>>, tap: BitPlanes<W>) {
        for (k, c) in acc.counts.iter_mut().enumerate() {
            c.zip_apply(v, |n, a| *n = n.wrapping_add(self.plane_counts(&a, &tap, k)));
        }
    }

    #[inline]
    fn store(&self, acc: &BitSerialAcc, out: &mut [u32]) {
        let vl = acc.counts[0].vl();
        let out = &mut out[..vl];
        out.fill(0);
        for (k, c) in acc.counts.iter().enumerate() {
            for (o, &n) in out.iter_mut().zip(c.as_slice()) {
                *o = o.wrapping_add(n << k);
            }
        }
    }
}
