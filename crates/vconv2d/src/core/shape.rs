use super::filter::FilterSize;
use crate::error::{ConvError, Result};

/// Dimensions of one convolution call.
///
/// - input: `cin x h x w`
/// - filter bank: `cout x cin x f x f`
/// - output: `cout x (h - f + 1) x (w - f + 1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConvShape {
    pub h: usize,
    pub w: usize,
    pub cin: usize,
    pub f: usize,
    pub cout: usize,
}

impl ConvShape {
    pub const fn new(h: usize, w: usize, cin: usize, f: usize, cout: usize) -> Self {
        Self { h, w, cin, f, cout }
    }

    /// Output rows. Only meaningful once the shape is valid.
    #[inline]
    pub const fn hout(&self) -> usize {
        self.h + 1 - self.f
    }

    /// Output columns. Only meaningful once the shape is valid.
    #[inline]
    pub const fn wout(&self) -> usize {
        self.w + 1 - self.f
    }

    pub const fn input_len(&self) -> usize {
        self.cin * self.h * self.w
    }

    pub const fn filter_len(&self) -> usize {
        self.cout * self.cin * self.f * self.f
    }

    pub const fn output_len(&self) -> usize {
        self.cout * self.hout() * self.wout()
    }

    /// Check the filter size and that the input covers at least one window.
    pub fn validate(&self) -> Result<FilterSize> {
        let filter = FilterSize::try_from(self.f)?;
        if self.h < self.f || self.w < self.f {
            return Err(ConvError::InvalidShape(format!(
                "input {}x{} is smaller than the {filter} filter",
                self.h, self.w
            )));
        }
        if self.cin == 0 {
            return Err(ConvError::InvalidShape("at least one input channel is required".into()));
        }
        Ok(filter)
    }

    /// Check the three buffer lengths against this shape.
    pub fn check_buffers(&self, input: usize, filter: usize, output: usize) -> Result<()> {
        for (name, expected, actual) in [
            ("input", self.input_len(), input),
            ("filter", self.filter_len(), filter),
            ("output", self.output_len(), output),
        ] {
            if expected != actual {
                return Err(ConvError::BufferSize {
                    name,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}
