use crate::error::ConvError;

/// Supported square filter sizes.
///
/// Each variant gets its own monomorphized row-block engine; the
/// dispatcher matches on this enum instead of on a raw integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterSize {
    F1,
    F3,
    F5,
    F7,
}

impl FilterSize {
    pub const ALL: [FilterSize; 4] = [FilterSize::F1, FilterSize::F3, FilterSize::F5, FilterSize::F7];

    /// Side length `F`.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            FilterSize::F1 => 1,
            FilterSize::F3 => 3,
            FilterSize::F5 => 5,
            FilterSize::F7 => 7,
        }
    }

    /// Number of partially accumulated rows carried between row-blocks (`F - 1`).
    #[inline]
    pub const fn carry(self) -> usize {
        self.size() - 1
    }

    /// Taps per channel (`F * F`).
    #[inline]
    pub const fn taps(self) -> usize {
        self.size() * self.size()
    }

    /// Position of this size in per-size tables indexed `[F1, F3, F5, F7]`.
    #[inline]
    pub(crate) const fn index(self) -> usize {
        match self {
            FilterSize::F1 => 0,
            FilterSize::F3 => 1,
            FilterSize::F5 => 2,
            FilterSize::F7 => 3,
        }
    }
}

impl TryFrom<usize> for FilterSize {
    type Error = ConvError;

    fn try_from(f: usize) -> Result<Self, Self::Error> {
        match f {
            1 => Ok(FilterSize::F1),
            3 => Ok(FilterSize::F3),
            5 => Ok(FilterSize::F5),
            7 => Ok(FilterSize::F7),
            other => Err(ConvError::UnsupportedFilterSize(other)),
        }
    }
}

impl std::fmt::Display for FilterSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{0}x{0}", self.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_from() {
        for fs in FilterSize::ALL {
            assert_eq!(FilterSize::try_from(fs.size()).unwrap(), fs);
        }
        for bad in [0, 2, 4, 9] {
            assert_eq!(
                FilterSize::try_from(bad),
                Err(ConvError::UnsupportedFilterSize(bad))
            );
        }
    }

    #[test]
    fn test_derived_quantities() {
        assert_eq!(FilterSize::F1.carry(), 0);
        assert_eq!(FilterSize::F7.carry(), 6);
        assert_eq!(FilterSize::F5.taps(), 25);
        assert_eq!(FilterSize::F3.to_string(), "3x3");
    }
}
