//! Low-pass filter kernels.
//!
//! A filter returns a field at the input's own resolution. The cutoff is
//! expressed as the resolution whose resolved band should survive, so a
//! cutoff of `nc` along an axis keeps wavenumbers below `nc / 2` there.
//!
//! | Kernel | Transfer function |
//! |--------|-------------------|
//! | Sharp | `1` inside the cutoff band, `0` outside |
//! | Trapezoidal | 9-point physical-space stencil, cutoff ignored |
//! | Gaussian | `exp(-(π²/24) · |k|² / |kc|²)` |
//! | Elliptic | `1 / (1 + |k|² / |kc|²)` |
//!
//! Every kernel has unit gain at `k = 0`, so the domain mean survives.

use std::f64::consts::PI;
use std::fmt;

use eddy_core::{ConfigError, GridSize, PeriodicField, SgsError};

use crate::transform::SpectralCache;

/// Which low-pass kernel to apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterKind {
    /// Spectral cutoff: zero every mode outside the cutoff band.
    Sharp,
    /// Physical-space trapezoidal average over the 3×3 neighbourhood.
    Trapezoidal,
    /// Gaussian spectral kernel.
    Gaussian,
    /// Elliptic (Helmholtz-inverse) spectral kernel, exponent 1.
    Elliptic,
}

impl FilterKind {
    /// Map the integer selector `1..=4` to a kernel.
    pub fn from_selector(value: i64) -> Result<Self, ConfigError> {
        match value {
            1 => Ok(Self::Sharp),
            2 => Ok(Self::Trapezoidal),
            3 => Ok(Self::Gaussian),
            4 => Ok(Self::Elliptic),
            _ => Err(ConfigError::UnknownSelector {
                name: "filter",
                value,
            }),
        }
    }

    /// Inverse of [`from_selector`](Self::from_selector).
    pub fn selector(self) -> i64 {
        match self {
            Self::Sharp => 1,
            Self::Trapezoidal => 2,
            Self::Gaussian => 3,
            Self::Elliptic => 4,
        }
    }

    /// Lower-case kernel name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sharp => "sharp",
            Self::Trapezoidal => "trapezoidal",
            Self::Gaussian => "gaussian",
            Self::Elliptic => "elliptic",
        }
    }

    /// Filter `field`, keeping the band resolved by `cutoff`.
    ///
    /// Returns `ConfigError::CutoffExceedsGrid` if `cutoff` is larger
    /// than the field on either axis.
    pub fn apply(
        self,
        cache: &SpectralCache,
        field: &PeriodicField,
        cutoff: GridSize,
    ) -> Result<PeriodicField, SgsError> {
        let size = field.size();
        cutoff.check_non_empty()?;
        if !cutoff.fits_within(size) {
            return Err(ConfigError::CutoffExceedsGrid { size, cutoff }.into());
        }

        match self {
            Self::Trapezoidal => trapezoidal(field).ensure_finite("trapezoidal filter"),
            Self::Sharp => {
                let mut hat = cache.forward(field)?;
                let (x0, x1) = (cutoff.nx / 2, size.nx - cutoff.nx / 2);
                let (y0, y1) = (cutoff.ny / 2, size.ny - cutoff.ny / 2);
                hat.scale_by(|i, j| {
                    let outside = (x0..x1).contains(&i) || (y0..y1).contains(&j);
                    if outside {
                        0.0
                    } else {
                        1.0
                    }
                });
                cache.inverse(&hat, "sharp filter")
            }
            Self::Gaussian | Self::Elliptic => {
                let plan = cache.plan(size)?;
                let k = plan.wavenumbers();
                let (sx, sy) = cache.domain().wavenumber_scale();
                // Largest |k| representable on the cutoff grid, per axis.
                let kcx = sx * (cutoff.nx / 2) as f64;
                let kcy = sy * (cutoff.ny / 2) as f64;
                let kc2 = kcx * kcx + kcy * kcy;
                if kc2 == 0.0 {
                    return Err(ConfigError::InvalidParameter {
                        name: "cutoff",
                        reason: format!("{cutoff} resolves no wavenumber"),
                    }
                    .into());
                }
                let gaussian = self == Self::Gaussian;
                let mut hat = plan.forward(field)?;
                hat.scale_by(|i, j| {
                    let ratio = k.k_squared(i, j) / kc2;
                    if gaussian {
                        (-(PI * PI / 24.0) * ratio).exp()
                    } else {
                        1.0 / (1.0 + ratio)
                    }
                });
                let stage = if gaussian {
                    "gaussian filter"
                } else {
                    "elliptic filter"
                };
                cache.inverse(&hat, stage)
            }
        }
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn wrap(val: isize, len: usize) -> usize {
    let len = len as isize;
    (((val % len) + len) % len) as usize
}

/// `(4·center + 2·edges + corners) / 16` with periodic neighbours.
fn trapezoidal(field: &PeriodicField) -> PeriodicField {
    let GridSize { nx, ny } = field.size();
    let at = |i: usize, di: isize, j: usize, dj: isize| {
        field.get(wrap(i as isize + di, nx), wrap(j as isize + dj, ny))
    };
    PeriodicField::from_fn(field.size(), |i, j| {
        let center = at(i, 0, j, 0);
        let edges = at(i, 1, j, 0) + at(i, -1, j, 0) + at(i, 0, j, 1) + at(i, 0, j, -1);
        let corners = at(i, 1, j, 1) + at(i, 1, j, -1) + at(i, -1, j, 1) + at(i, -1, j, -1);
        (4.0 * center + 2.0 * edges + corners) / 16.0
    })
}
