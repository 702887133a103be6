/// One vertical strip of the convolution.
///
/// A tile reads `in_width` input columns starting at `col` and produces
/// `out_width = in_width - F + 1` output columns starting at the same `col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub col: usize,
    pub in_width: usize,
    pub out_width: usize,
}

/// Iterator over the width tiles of a plane.
///
/// Full tiles span `Lmax` input columns (`Lmax - F + 1` outputs); the last
/// tile takes whatever output columns remain.
///
/// # Example
///
/// ```
/// use vconv2d::core::tiles;
///
/// // W = 20, F = 3, Lmax = 8: six outputs per full tile, 18 outputs total.
/// let widths: Vec<_> = tiles(20, 3, 8).map(|t| (t.col, t.in_width)).collect();
/// assert_eq!(widths, vec![(0, 8), (6, 8), (12, 8)]);
/// ```
#[derive(Debug, Clone)]
pub struct TileIter {
    out_total: usize,
    step: usize,
    carry: usize,
    next_col: usize,
}

/// Tiles covering an input row of width `w` for filter size `f` and lane
/// width `lmax`. Requires `w >= f` and `lmax >= f`.
pub fn tiles(w: usize, f: usize, lmax: usize) -> TileIter {
    debug_assert!(w >= f && lmax >= f);
    TileIter {
        out_total: w + 1 - f,
        step: lmax + 1 - f,
        carry: f - 1,
        next_col: 0,
    }
}

impl TileIter {
    /// Number of tiles still to come.
    pub fn remaining(&self) -> usize {
        (self.out_total - self.next_col).div_ceil(self.step)
    }
}

impl Iterator for TileIter {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        if self.next_col >= self.out_total {
            return None;
        }
        let col = self.next_col;
        let out_width = self.step.min(self.out_total - col);
        self.next_col += out_width;
        Some(Tile {
            col,
            in_width: out_width + self.carry,
            out_width,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining();
        (n, Some(n))
    }
}

impl ExactSizeIterator for TileIter {}
