/// A vector register of run-time length.
///
/// Storage is sized once for `Lmax` lanes; `vl` selects how many of them
/// take part in each operation, so a narrow boundary tile reuses the same
/// register without reallocating.
#[derive(Debug, Clone)]
pub struct VReg<T> {
    lanes: Vec<T>,
    vl: usize,
}

impl<T: Copy + Default> VReg<T> {
    /// Allocate a register of `max_lanes` lanes, all active.
    pub fn new(max_lanes: usize) -> Self {
        Self {
            lanes: vec![T::default(); max_lanes],
            vl: max_lanes,
        }
    }

    #[inline]
    pub fn max_lanes(&self) -> usize {
        self.lanes.len()
    }

    #[inline]
    pub fn vl(&self) -> usize {
        self.vl
    }

    /// Select the active width.
    #[inline]
    pub fn set_vl(&mut self, vl: usize) {
        debug_assert!(vl <= self.lanes.len(), "vl {vl} exceeds Lmax {}", self.lanes.len());
        self.vl = vl;
    }

    /// Load `vl` contiguous elements.
    #[inline]
    pub fn load(&mut self, src: &[T]) {
        let vl = self.vl;
        self.lanes[..vl].copy_from_slice(&src[..vl]);
    }

    /// Load `vl` elements, converting each one (sign extension, packing...).
    #[inline]
    pub fn load_map<S: Copy>(&mut self, src: &[S], f: impl Fn(S) -> T) {
        let vl = self.vl;
        for (dst, &s) in self.lanes[..vl].iter_mut().zip(&src[..vl]) {
            *dst = f(s);
        }
    }

    /// Load `vl` elements from two sources at once.
    #[inline]
    pub fn load_zip<S: Copy>(&mut self, a: &[S], b: &[S], f: impl Fn(S, S) -> T) {
        let vl = self.vl;
        for ((dst, &x), &y) in self.lanes[..vl].iter_mut().zip(&a[..vl]).zip(&b[..vl]) {
            *dst = f(x, y);
        }
    }

    /// Build each of the `vl` lanes from its index, for loads that gather
    /// from several rows at once.
    #[inline]
    pub fn load_with(&mut self, f: impl FnMut(usize) -> T) {
        let vl = self.vl;
        for (dst, value) in self.lanes[..vl].iter_mut().zip((0..vl).map(f)) {
            *dst = value;
        }
    }

    /// Shift the active lanes down by `offset`; vacated top lanes become zero.
    #[inline]
    pub fn slide_down(&mut self, offset: usize) {
        let vl = self.vl;
        if offset >= vl {
            self.lanes[..vl].fill(T::default());
            return;
        }
        self.lanes.copy_within(offset..vl, 0);
        self.lanes[vl - offset..vl].fill(T::default());
    }

    /// Combine every active lane with the matching lane of `src`.
    #[inline]
    pub fn zip_apply<S: Copy + Default>(&mut self, src: &VReg<S>, f: impl Fn(&mut T, S)) {
        let vl = self.vl;
        debug_assert!(vl <= src.vl);
        for (dst, &s) in self.lanes[..vl].iter_mut().zip(&src.lanes[..vl]) {
            f(dst, s);
        }
    }

    /// Set every active lane to `value`.
    #[inline]
    pub fn fill(&mut self, value: T) {
        let vl = self.vl;
        self.lanes[..vl].fill(value);
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.lanes[..self.vl]
    }
}
