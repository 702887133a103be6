//! Register-blocked direct 2-D convolution for vector-length-agnostic SIMD.
//!
//! `vconv2d` computes a valid (unpadded, stride 1) convolution of a
//! `cin x h x w` input with a `cout x cin x f x f` filter bank for
//! `f ∈ {1, 3, 5, 7}`, without im2col or any other intermediate buffer.
//!
//! # Quick Start
//!
//! ```
//! use vconv2d::{convolve_into, ConvShape, SameWidth};
//!
//! let input = vec![1.0f32; 16 * 16];
//! let filter = vec![1.0f32; 9];
//!
//! let out = convolve_into(&SameWidth::<f32>::new(), &input, &filter, ConvShape::new(16, 16, 1, 3, 1))?;
//! assert_eq!(out.len(), 14 * 14);
//! assert!(out.iter().all(|&v| v == 9.0));
//! # Ok::<(), vconv2d::ConvError>(())
//! ```
//!
//! # Numeric Regimes
//!
//! | Adapter | Use |
//! |---------|-----|
//! | [`SameWidth`] | `f32`, `f64` and wrapping `i8`..`i64` |
//! | [`Widening`] | `i8`/`i16` into `i32`, `i32` into `i64` |
//! | [`Packed`] | 1 to 8 bit unsigned activations and weights, two channels per lane |
//! | [`BitSerial`] | 1 to 8 bit unsigned operands as bit planes, AND and popcount per MAC |
//!
//! # Lane Configuration
//!
//! The register length defaults to 4096 bits. It can be changed per call
//! with [`Conv2d::lanes`] or for the whole process through the
//! `VCONV2D_VLEN` and `VCONV2D_LANES` environment variables, read once by
//! [`LaneConfig::global`].
//!
//! # Logging
//!
//! Dispatch decisions are emitted through the `log` facade (`debug` per
//! call, `trace` per tile). No logger is installed by this crate.
//!
//! # Features
//!
//! - `parallel` (default): output channels are convolved on the `rayon`
//!   thread pool.

pub mod api;
pub mod core;
pub mod error;
pub mod lane;
pub mod types;

pub use api::{conv2d, convolve, convolve_into, Conv2d};
pub use crate::core::{ConvPlan, ConvShape, FilterSize};
pub use error::{ConvError, Result};
pub use lane::LaneConfig;
pub use types::{BitSerial, Packed, Precision, SameWidth, Widening};
