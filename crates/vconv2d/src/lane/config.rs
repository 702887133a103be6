use once_cell::sync::OnceCell;

use crate::error::{ConvError, Result};

/// Vector register length assumed when nothing else is configured.
pub const DEFAULT_VLEN_BITS: usize = 4096;

/// Longest vector register length accepted, in bits.
pub const MAX_VLEN_BITS: usize = 65536;

/// Environment variable overriding the vector register length in bits.
pub const VLEN_ENV: &str = "VCONV2D_VLEN";

/// Environment variable capping the number of lanes used per tile.
pub const LANES_ENV: &str = "VCONV2D_LANES";

static GLOBAL_CONFIG: OnceCell<LaneConfig> = OnceCell::new();

/// Register grouping factor: how many architectural registers one
/// logical vector spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lmul {
    M1,
    #[default]
    M2,
    M4,
    M8,
}

impl Lmul {
    /// Number of registers in the group.
    #[inline]
    pub const fn factor(self) -> usize {
        match self {
            Lmul::M1 => 1,
            Lmul::M2 => 2,
            Lmul::M4 => 4,
            Lmul::M8 => 8,
        }
    }
}

/// Run-time description of the vector unit.
///
/// The maximum lane count `Lmax` is derived per precision from the register
/// length, the precision's register grouping and its accumulator width:
///
/// ```text
/// Lmax = vlen_bits * lmul / element_bits      (then clamped by lane_cap,
///                                              and by the row width at dispatch)
/// ```
///
/// # Example
///
/// ```
/// use vconv2d::lane::{LaneConfig, Lmul};
///
/// let cfg = LaneConfig::default();
/// assert_eq!(cfg.max_lanes(64, Lmul::M2), 128);
///
/// let narrow = cfg.with_lane_cap(16);
/// assert_eq!(narrow.max_lanes(64, Lmul::M2), 16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaneConfig {
    vlen_bits: usize,
    lane_cap: Option<usize>,
}

impl Default for LaneConfig {
    fn default() -> Self {
        Self {
            vlen_bits: DEFAULT_VLEN_BITS,
            lane_cap: None,
        }
    }
}

impl LaneConfig {
    /// Create a configuration for a vector unit with `vlen_bits` per register.
    pub fn new(vlen_bits: usize) -> Self {
        Self {
            vlen_bits,
            lane_cap: None,
        }
    }

    /// Never use more than `lanes` lanes, whatever the register length allows.
    pub fn with_lane_cap(mut self, lanes: usize) -> Self {
        self.lane_cap = Some(lanes);
        self
    }

    pub fn vlen_bits(&self) -> usize {
        self.vlen_bits
    }

    pub fn lane_cap(&self) -> Option<usize> {
        self.lane_cap
    }

    /// Maximum lanes for elements of `element_bits` grouped by `lmul`.
    pub fn max_lanes(&self, element_bits: u32, lmul: Lmul) -> usize {
        let lanes = self.vlen_bits.saturating_mul(lmul.factor()) / element_bits as usize;
        match self.lane_cap {
            Some(cap) => cap.min(lanes),
            None => lanes,
        }
    }

    /// Check that the register length is a power of two between 64 and
    /// [`MAX_VLEN_BITS`] bits and that a lane cap, if any, is non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.vlen_bits < 64 || !self.vlen_bits.is_power_of_two() {
            return Err(ConvError::Config(format!(
                "vector length must be a power of two >= 64 bits, got {}",
                self.vlen_bits
            )));
        }
        if self.vlen_bits > MAX_VLEN_BITS {
            return Err(ConvError::Config(format!(
                "vector length {} exceeds {MAX_VLEN_BITS} bits",
                self.vlen_bits
            )));
        }
        if self.lane_cap == Some(0) {
            return Err(ConvError::Config("lane cap must be at least 1".into()));
        }
        Ok(())
    }

    /// Build a configuration from `VCONV2D_VLEN` and `VCONV2D_LANES`.
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Process-wide configuration, read from the environment once.
    ///
    /// A malformed environment is logged and replaced by the default.
    pub fn global() -> &'static LaneConfig {
        GLOBAL_CONFIG.get_or_init(|| match Self::from_env() {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("ignoring lane configuration from environment: {e}");
                LaneConfig::default()
            }
        })
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = LaneConfig::default();
        if let Some(vlen) = parse_var(&lookup, VLEN_ENV)? {
            cfg.vlen_bits = vlen;
        }
        if let Some(lanes) = parse_var(&lookup, LANES_ENV)? {
            cfg.lane_cap = Some(lanes);
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<F>(lookup: &F, key: &str) -> Result<Option<usize>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<usize>()
            .map(Some)
            .map_err(|e| ConvError::Config(format!("{key}={raw:?}: {e}"))),
    }
}
