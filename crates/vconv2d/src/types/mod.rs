//! Numeric regimes.
//!
//! Each regime is a [`Precision`] adapter plugged into the same row-block
//! engine:
//!
//! | Regime | Input / weight | Lane | Accumulator / output | Default `B` (F1, F3, F5, F7) |
//! |--------|----------------|------|----------------------|------------------------------|
//! | [`SameWidth<f32>`], [`SameWidth<f64>`] | `T` | `T` | `T` | 4, 6, 6, 4 |
//! | [`SameWidth<i8>`] .. [`SameWidth<i64>`] | `T` | `T` | `T` (wrapping) | 4, 6, 6, 4 |
//! | [`Widening<i8>`] | `i8` | `i16` | `i32` | 4, 8, 6, 6 |
//! | [`Widening<i16>`] | `i16` | `i16` | `i32` | 4, 8, 6, 6 |
//! | [`Widening<i32>`] | `i32` | `i32` | `i64` | 4, 4, 8, 6 |
//! | [`Packed<u16>`], [`Packed<u32>`] | `u8`, 1 to 8 bits used | two channels per lane | `u32` | 4 |
//! | [`BitSerial<u8>`], [`BitSerial<u32>`], [`BitSerial<u64>`] | `u8`, 1 to 8 bits used | one bit plane per word, one channel per bit | `u32` | 4 |

mod bitserial;
mod packed;
mod same_width;
mod traits;
mod widening;

pub use bitserial::{BitPlanes, BitSerial, BitSerialAcc, BitWord, MAX_PLANES};
pub use packed::{Packed, PackedAcc, PackedLane};
pub use same_width::{SameWidth, SameWidthElement};
pub use traits::{MacElement, Precision};
pub use widening::{Widen, Widening};
