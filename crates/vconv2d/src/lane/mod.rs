//! Vector-length-agnostic lane model.
//!
//! The kernels are written against a vector unit whose register length is
//! only known at run time. Two pieces model it:
//!
//! | Type | Role |
//! |------|------|
//! | [`LaneConfig`] | Register length (`VLEN`), optional lane cap, derived `Lmax` |
//! | [`VReg`] | One logical vector register holding up to `Lmax` lanes with a settable `vl` |
//!
//! A tile picks its width once (`vl ≤ Lmax`); boundary tiles simply run with
//! a smaller `vl`. The same register is then loaded once per input row and
//! slid down one lane per kernel column:
//!
//! ```text
//! load   v = in[r][c .. c+vl]
//! for dc in 0..F:
//!     acc[k] += v * f[dr][dc]      for every row k the input row feeds
//!     v = slide_down(v, 1)         // lane i now holds in[r][c+i+dc+1]
//! ```

mod config;
mod vreg;

pub use config::{LaneConfig, Lmul, DEFAULT_VLEN_BITS, LANES_ENV, MAX_VLEN_BITS, VLEN_ENV};
pub use vreg::VReg;
