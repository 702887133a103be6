use crate::core::{conv2d_dispatch, ConvPlan, ConvShape};
use crate::error::Result;
use crate::lane::LaneConfig;
use crate::types::Precision;

/// Direct 2-D convolution into a caller-provided buffer.
///
/// Computes, for every output channel `o` and output position `(r, c)`:
///
/// ```text
/// out[o][r][c] = sum over ch, dr, dc of in[ch][r+dr][c+dc] * filter[o][ch][dr][dc]
/// ```
///
/// # Arguments
/// - `precision`: numeric regime ([`SameWidth`](crate::SameWidth),
///   [`Widening`](crate::Widening) or [`Packed`](crate::Packed))
/// - `output`: `cout x (h-f+1) x (w-f+1)` row-major, fully overwritten
/// - `input`: `cin x h x w` row-major
/// - `filter`: `cout x cin x f x f` row-major
/// - `shape`: the call's dimensions
///
/// Uses the process-wide [`LaneConfig::global`] and the regime's default
/// row-block sizes.
///
/// # Example
///
/// ```
/// use vconv2d::{convolve, ConvShape, SameWidth};
///
/// let input = vec![1.0f32; 16 * 16];
/// let filter = vec![1.0f32; 3 * 3];
/// let mut output = vec![0.0f32; 14 * 14];
///
/// convolve(&SameWidth::<f32>::new(), &mut output, &input, &filter, ConvShape::new(16, 16, 1, 3, 1))
///     .unwrap();
/// assert!(output.iter().all(|&v| v == 9.0));
/// ```
pub fn convolve<P: Precision>(
    precision: &P,
    output: &mut [P::Output],
    input: &[P::Input],
    filter: &[P::Weight],
    shape: ConvShape,
) -> Result<()> {
    Conv2d::new(shape).execute(precision, output, input, filter)
}

/// Like [`convolve`], but allocates and returns the output.
pub fn convolve_into<P: Precision>(
    precision: &P,
    input: &[P::Input],
    filter: &[P::Weight],
    shape: ConvShape,
) -> Result<Vec<P::Output>> {
    Conv2d::new(shape).execute_into(precision, input, filter)
}

/// Positional form of [`convolve`].
#[allow(clippy::too_many_arguments)]
pub fn conv2d<P: Precision>(
    precision: &P,
    output: &mut [P::Output],
    input: &[P::Input],
    filter: &[P::Weight],
    h: usize,
    w: usize,
    cin: usize,
    f: usize,
    cout: usize,
) -> Result<()> {
    convolve(precision, output, input, filter, ConvShape::new(h, w, cin, f, cout))
}

/// Builder for configuring a convolution.
///
/// Overrides the lane configuration and row-block size used by
/// [`convolve`].
///
/// # Example
///
/// ```
/// use vconv2d::{Conv2d, ConvShape, LaneConfig, Widening};
///
/// let input = vec![3i16; 2 * 10 * 10];
/// let filter = vec![-2i16; 2 * 5 * 5];
///
/// let out = Conv2d::new(ConvShape::new(10, 10, 2, 5, 1))
///     .lanes(LaneConfig::new(256))
///     .block_rows(3)
///     .execute_into(&Widening::<i16>::new(), &input, &filter)
///     .unwrap();
/// assert_eq!(out, vec![-6 * 50; 36]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Conv2d {
    shape: ConvShape,
    lanes: Option<LaneConfig>,
    block_rows: Option<usize>,
}

impl Conv2d {
    /// Create a new convolution builder.
    pub fn new(shape: ConvShape) -> Self {
        Self {
            shape,
            lanes: None,
            block_rows: None,
        }
    }

    /// Use `lanes` instead of the process-wide configuration.
    pub fn lanes(mut self, lanes: LaneConfig) -> Self {
        self.lanes = Some(lanes);
        self
    }

    /// Use `b` output rows per row-block instead of the regime's default.
    pub fn block_rows(mut self, b: usize) -> Self {
        self.block_rows = Some(b);
        self
    }

    /// Validate everything and build the plan without running it.
    pub fn plan<P: Precision>(&self, precision: &P) -> Result<ConvPlan> {
        let lanes = self.lanes.unwrap_or_else(|| *LaneConfig::global());
        ConvPlan::new(precision, self.shape, &lanes, self.block_rows)
    }

    /// Execute the convolution into `output`.
    ///
    /// Nothing is written unless every check passes.
    pub fn execute<P: Precision>(
        &self,
        precision: &P,
        output: &mut [P::Output],
        input: &[P::Input],
        filter: &[P::Weight],
    ) -> Result<()> {
        let plan = self.plan(precision)?;
        self.shape
            .check_buffers(input.len(), filter.len(), output.len())?;
        conv2d_dispatch(precision, &plan, output, input, filter);
        Ok(())
    }

    /// Execute the convolution into a new buffer.
    pub fn execute_into<P: Precision>(
        &self,
        precision: &P,
        input: &[P::Input],
        filter: &[P::Weight],
    ) -> Result<Vec<P::Output>> {
        let plan = self.plan(precision)?;
        let mut output = vec![P::Output::default(); self.shape.output_len()];
        self.shape
            .check_buffers(input.len(), filter.len(), output.len())?;
        conv2d_dispatch(precision, &plan, &mut output, input, filter);
        Ok(output)
    }
}
