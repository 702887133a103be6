/// Read-only view of a `channels x h x w` row-major input tensor.
#[derive(Debug, Clone, Copy)]
pub struct InputPlanes<'a, T> {
    data: &'a [T],
    channels: usize,
    h: usize,
    w: usize,
}

impl<'a, T> InputPlanes<'a, T> {
    pub fn new(data: &'a [T], channels: usize, h: usize, w: usize) -> Self {
        debug_assert_eq!(data.len(), channels * h * w);
        Self { data, channels, h, w }
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.h
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.w
    }

    /// Row `r` of channel `ch`.
    #[inline]
    pub fn row(&self, ch: usize, r: usize) -> &'a [T] {
        let start = (ch * self.h + r) * self.w;
        &self.data[start..start + self.w]
    }
}
