//! Velocity-gradient kinematics on one grid.

use eddy_core::{ConfigError, PeriodicField, SgsError, SymmetricTensor};
use eddy_spectral::{gradient, SpectralCache};

/// Which rotation–strain correlation the Horiuti basis uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HoriutiVariant {
    /// Variant 1: strain–rotation product.
    ///
    /// ```text
    /// a11 =  ½(uy + vx)(vx − uy)
    /// a12 =  ½(vy − ux)(vx − uy)
    /// a22 = −½(uy + vx)(vx − uy)
    /// ```
    StrainRotation,
    /// Variant 2: quadratic velocity-gradient terms.
    ///
    /// ```text
    /// a11 = −ux² − ½vx² − ½uy²
    /// a12 = −½(uy + vx)(ux + vy)
    /// a22 = −vy² − ½vx² − ½uy²
    /// ```
    GradientSquare,
    /// Variant 3: sum of variants 1 and 2.
    Combined,
}

impl HoriutiVariant {
    /// Map the selector `1..=3` to a variant.
    pub fn from_selector(value: i64) -> Result<Self, ConfigError> {
        match value {
            1 => Ok(Self::StrainRotation),
            2 => Ok(Self::GradientSquare),
            3 => Ok(Self::Combined),
            _ => Err(ConfigError::UnknownSelector {
                name: "horiuti variant",
                value,
            }),
        }
    }

    /// Inverse of [`from_selector`](Self::from_selector).
    pub fn selector(self) -> i64 {
        match self {
            Self::StrainRotation => 1,
            Self::GradientSquare => 2,
            Self::Combined => 3,
        }
    }
}

/// Gradients and derived invariants of a velocity pair.
#[derive(Clone, Debug)]
pub struct Kinematics {
    /// `∂u/∂x`.
    pub ux: PeriodicField,
    /// `∂u/∂y`.
    pub uy: PeriodicField,
    /// `∂v/∂x`.
    pub vx: PeriodicField,
    /// `∂v/∂y`.
    pub vy: PeriodicField,
    /// Strain rate: `d11 = ux`, `d12 = ½(uy + vx)`, `d22 = vy`.
    pub strain: SymmetricTensor,
    /// `|S| = sqrt((ux − vy)² + (uy + vx)²)`.
    pub strain_magnitude: PeriodicField,
    /// `ω = vx − uy`.
    pub vorticity: PeriodicField,
    /// `|∇ω|`.
    pub vorticity_gradient: PeriodicField,
}

impl Kinematics {
    /// Differentiate `(u, v)` spectrally and derive the invariants.
    pub fn compute(
        cache: &SpectralCache,
        u: &PeriodicField,
        v: &PeriodicField,
    ) -> Result<Self, SgsError> {
        u.check_same_size(v)?;
        let (ux, uy) = gradient(cache, u)?;
        let (vx, vy) = gradient(cache, v)?;

        let shear = &uy + &vx;
        let strain = SymmetricTensor::new(ux.clone(), shear.scale(0.5), vy.clone())?;
        let strain_magnitude = (&ux - &vy).zip_map(&shear, |a, b| (a * a + b * b).sqrt());

        let vorticity = &vx - &uy;
        let (wx, wy) = gradient(cache, &vorticity)?;
        let vorticity_gradient = wx.zip_map(&wy, |a, b| (a * a + b * b).sqrt());

        Ok(Self {
            ux,
            uy,
            vx,
            vy,
            strain,
            strain_magnitude,
            vorticity,
            vorticity_gradient,
        })
    }

    /// The rotation correlation tensor `a_ij` for `variant`.
    pub fn rotation_correlation(&self, variant: HoriutiVariant) -> SymmetricTensor {
        let rot = |ux: f64, uy: f64, vx: f64, vy: f64| {
            let w = vx - uy;
            [
                0.5 * (uy + vx) * w,
                0.5 * (vy - ux) * w,
                -0.5 * (uy + vx) * w,
            ]
        };
        let sq = |ux: f64, uy: f64, vx: f64, vy: f64| {
            [
                -ux * ux - 0.5 * vx * vx - 0.5 * uy * uy,
                -0.5 * (uy + vx) * (ux + vy),
                -vy * vy - 0.5 * vx * vx - 0.5 * uy * uy,
            ]
        };
        let component = |c: usize| {
            PeriodicField::from_fn(self.ux.size(), |i, j| {
                let g = (
                    self.ux.get(i, j),
                    self.uy.get(i, j),
                    self.vx.get(i, j),
                    self.vy.get(i, j),
                );
                match variant {
                    HoriutiVariant::StrainRotation => rot(g.0, g.1, g.2, g.3)[c],
                    HoriutiVariant::GradientSquare => sq(g.0, g.1, g.2, g.3)[c],
                    HoriutiVariant::Combined => {
                        rot(g.0, g.1, g.2, g.3)[c] + sq(g.0, g.1, g.2, g.3)[c]
                    }
                }
            })
        };
        SymmetricTensor {
            t11: component(0),
            t12: component(1),
            t22: component(2),
        }
    }
}

/// Unmixed second derivatives of a velocity pair.
#[derive(Clone, Debug)]
pub struct SecondDerivatives {
    /// `∂²u/∂x²`.
    pub uxx: PeriodicField,
    /// `∂²u/∂y²`.
    pub uyy: PeriodicField,
    /// `∂²v/∂x²`.
    pub vxx: PeriodicField,
    /// `∂²v/∂y²`.
    pub vyy: PeriodicField,
}

impl SecondDerivatives {
    /// Differentiate the first derivatives held in `kin` once more.
    pub fn compute(cache: &SpectralCache, kin: &Kinematics) -> Result<Self, SgsError> {
        let (uxx, _) = gradient(cache, &kin.ux)?;
        let (_, uyy) = gradient(cache, &kin.uy)?;
        let (vxx, _) = gradient(cache, &kin.vx)?;
        let (_, vyy) = gradient(cache, &kin.vy)?;
        Ok(Self { uxx, uyy, vxx, vyy })
    }
}
