//! Scalar convolutions used as test oracles.

use super::shape::ConvShape;
use crate::types::MacElement;

/// Textbook convolution: `out[o][r][c] = sum over ch, dr, dc` in that order,
/// starting from zero.
///
/// Integer results match every engine configuration exactly. Floating point
/// results differ from the engine in the last bits because the summation
/// order differs; compare those against [`conv2d_reference`] instead.
pub fn conv2d_naive<T: MacElement>(input: &[T], filter: &[T], shape: ConvShape) -> Vec<T> {
    let ConvShape { h, w, cin, f, cout } = shape;
    let (hout, wout) = (shape.hout(), shape.wout());
    let mut out = vec![T::default(); shape.output_len()];
    for o in 0..cout {
        for r in 0..hout {
            for c in 0..wout {
                let mut acc = T::default();
                for ch in 0..cin {
                    for dr in 0..f {
                        for dc in 0..f {
                            let x = input[(ch * h + r + dr) * w + c + dc];
                            let k = filter[((o * cin + ch) * f + dr) * f + dc];
                            acc = T::mac(acc, x, k);
                        }
                    }
                }
                out[(o * hout + r) * wout + c] = acc;
            }
        }
    }
    out
}

/// Scalar convolution in the engine's accumulation order.
///
/// Each output is a multiply of the first tap followed by multiply-adds
/// ordered kernel row, channel, kernel column. Floating point results are
/// bit-identical to the engine for every tile width and block size.
pub fn conv2d_reference<T: MacElement>(input: &[T], filter: &[T], shape: ConvShape) -> Vec<T> {
    let ConvShape { h, w, cin, f, cout } = shape;
    let (hout, wout) = (shape.hout(), shape.wout());
    let mut out = vec![T::default(); shape.output_len()];
    for o in 0..cout {
        for r in 0..hout {
            for c in 0..wout {
                let mut acc = T::default();
                for dr in 0..f {
                    for ch in 0..cin {
                        for dc in 0..f {
                            let x = input[(ch * h + r + dr) * w + c + dc];
                            let k = filter[((o * cin + ch) * f + dr) * f + dc];
                            acc = if dr == 0 && ch == 0 && dc == 0 {
                                T::mul(x, k)
                            } else {
                                T::mac(acc, x, k)
                            };
                        }
                    }
                }
                out[(o * hout + r) * wout + c] = acc;
            }
        }
    }
    out
}
