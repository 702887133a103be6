//! Core convolution algorithm.
//!
//! The output plane of each output channel is cut into vertical strips
//! (tiles) no wider than one vector register, and each strip is swept top to
//! bottom in blocks of `B` output rows:
//!
//! ```text
//!            col 0        col T        col 2T
//!            +------------+------------+------+
//! block 0    | B rows     |            |      |
//! block 1    | B rows     |  tile 1    | tile |
//!   ...      |            |            |  2   |
//! drain      | 1..=B rows |            |      |
//!            +------------+------------+------+
//! ```
//!
//! Inside a tile, the `F - 1` output rows a block leaves half finished stay
//! in registers and are completed by the next block, so every input row is
//! loaded once per channel group regardless of `F`.
//!
//! # Module Contents
//!
//! | Module | Role |
//! |--------|------|
//! | `filter` | [`FilterSize`], the dispatch key |
//! | `shape` | [`ConvShape`], dimensions and buffer checks |
//! | `tiling` | [`tiles`], the width tiling |
//! | `planes` | [`InputPlanes`], row access into the input tensor |
//! | `engine` | [`RowBlockEngine`], preload and steady state |
//! | `drain` | the final partial row-block |
//! | `dispatch` | [`ConvPlan`] and [`conv2d_dispatch`] |
//! | `reference` | scalar oracles [`conv2d_naive`] and [`conv2d_reference`] |

mod dispatch;
mod drain;
mod engine;
mod filter;
mod planes;
mod reference;
mod shape;
mod tiling;

pub use dispatch::{conv2d_dispatch, ConvPlan};
pub use engine::{RowBlockEngine, TileStats};
pub use filter::FilterSize;
pub use planes::InputPlanes;
pub use reference::{conv2d_naive, conv2d_reference};
pub use shape::ConvShape;
pub use tiling::{tiles, Tile, TileIter};
