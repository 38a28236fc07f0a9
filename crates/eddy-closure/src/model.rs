//! Closure families and their basis records.
//!
//! Every eddy-viscosity family is a sum of basis terms
//! `τ_ij = −2 · C · δ^p · B_ij`:
//!
//! | Basis | `B_ij` | `p` | Static `C` | Viscosity scale |
//! |-------|--------|-----|------------|-----------------|
//! | Smagorinsky | `|S| · d_ij` | 2 | 0.18² | `|S|` |
//! | Leith | `|∇ω| · d_ij` | 3 | 0.11³ | `|∇ω|` |
//! | Horiuti | `a_ij` | 2 | 1/24 | `1` |
//!
//! Bardina is a similarity model with no basis and no coefficient.

use std::fmt;

use smallvec::{smallvec, SmallVec};

use eddy_core::{ConfigError, GridSize, PeriodicField, SymmetricTensor};

use crate::kinematics::{HoriutiVariant, Kinematics};

// ── Basis ──────────────────────────────────────────────────────────

/// One eddy-viscosity basis term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Basis {
    /// Strain-magnitude driven.
    Smagorinsky,
    /// Vorticity-gradient driven.
    Leith,
    /// Rotation-correlation driven.
    Horiuti(HoriutiVariant),
}

impl Basis {
    /// Exponent of the filter width `δ`.
    pub fn length_power(self) -> i32 {
        match self {
            Self::Smagorinsky | Self::Horiuti(_) => 2,
            Self::Leith => 3,
        }
    }

    /// Literature constant used in static mode.
    pub fn static_coefficient(self) -> f64 {
        match self {
            Self::Smagorinsky => 0.18 * 0.18,
            Self::Leith => 0.11 * 0.11 * 0.11,
            Self::Horiuti(_) => 1.0 / 24.0,
        }
    }

    /// The basis tensor `B_ij` evaluated on `kin`.
    pub fn tensor(self, kin: &Kinematics) -> SymmetricTensor {
        match self {
            Self::Smagorinsky => kin.strain.weighted(&kin.strain_magnitude),
            Self::Leith => kin.strain.weighted(&kin.vorticity_gradient),
            Self::Horiuti(variant) => kin.rotation_correlation(variant),
        }
    }

    /// Scalar multiplying `C · δ^p` in the eddy viscosity.
    pub fn viscosity_scale(self, kin: &Kinematics) -> PeriodicField {
        match self {
            Self::Smagorinsky => kin.strain_magnitude.clone(),
            Self::Leith => kin.vorticity_gradient.clone(),
            Self::Horiuti(_) => PeriodicField::constant(kin.ux.size(), 1.0),
        }
    }

    /// Short name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Smagorinsky => "smagorinsky",
            Self::Leith => "leith",
            Self::Horiuti(_) => "horiuti",
        }
    }
}

// ── ClosureModel ───────────────────────────────────────────────────

/// The closed set of SGS closure families.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClosureModel {
    /// One Smagorinsky coefficient `CS²`.
    Smagorinsky,
    /// One Leith coefficient `CL³`.
    Leith,
    /// One Horiuti coefficient `CH²`.
    Horiuti(HoriutiVariant),
    /// `CS²`, `CL³` and `CH²` solved jointly.
    Hybrid(HoriutiVariant),
    /// Scale-similarity stress; no coefficient.
    Bardina,
}

impl ClosureModel {
    /// Build from the closure selector `1..=5` (Smagorinsky, Leith,
    /// Horiuti, Hybrid, Bardina) and the Horiuti variant selector.
    ///
    /// The variant selector is validated even for families that ignore it.
    pub fn from_selectors(model: i64, horiuti: i64) -> Result<Self, ConfigError> {
        let variant = HoriutiVariant::from_selector(horiuti)?;
        match model {
            1 => Ok(Self::Smagorinsky),
            2 => Ok(Self::Leith),
            3 => Ok(Self::Horiuti(variant)),
            4 => Ok(Self::Hybrid(variant)),
            5 => Ok(Self::Bardina),
            _ => Err(ConfigError::UnknownSelector {
                name: "closure model",
                value: model,
            }),
        }
    }

    /// The closure selector for this family.
    pub fn selector(self) -> i64 {
        match self {
            Self::Smagorinsky => 1,
            Self::Leith => 2,
            Self::Horiuti(_) => 3,
            Self::Hybrid(_) => 4,
            Self::Bardina => 5,
        }
    }

    /// Basis terms, in coefficient order. Empty for Bardina.
    pub fn bases(self) -> SmallVec<[Basis; 3]> {
        match self {
            Self::Smagorinsky => smallvec![Basis::Smagorinsky],
            Self::Leith => smallvec![Basis::Leith],
            Self::Horiuti(v) => smallvec![Basis::Horiuti(v)],
            Self::Hybrid(v) => smallvec![Basis::Smagorinsky, Basis::Leith, Basis::Horiuti(v)],
            Self::Bardina => SmallVec::new(),
        }
    }

    /// Static-mode constants, one per basis.
    ///
    /// The hybrid family has its own set (0.04, 0.008, 0.04) rather than
    /// the single-family values.
    pub fn static_coefficients(self) -> SmallVec<[f64; 3]> {
        match self {
            Self::Hybrid(_) => smallvec![0.04, 0.008, 0.04],
            _ => self.bases().iter().map(|b| b.static_coefficient()).collect(),
        }
    }

    /// Short name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Smagorinsky => "smagorinsky",
            Self::Leith => "leith",
            Self::Horiuti(_) => "horiuti",
            Self::Hybrid(_) => "hybrid",
            Self::Bardina => "bardina",
        }
    }
}

impl fmt::Display for ClosureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Horiuti(v) | Self::Hybrid(v) => {
                write!(f, "{} (variant {})", self.name(), v.selector())
            }
            _ => f.write_str(self.name()),
        }
    }
}

// ── CoefficientMode ────────────────────────────────────────────────

/// How closure coefficients are obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CoefficientMode {
    /// Germano–Lilly procedure at the test-filter scale.
    #[default]
    Dynamic,
    /// Fixed literature constants.
    Static,
}

impl CoefficientMode {
    /// `1` = dynamic, `2` = static.
    pub fn from_selector(value: i64) -> Result<Self, ConfigError> {
        match value {
            1 => Ok(Self::Dynamic),
            2 => Ok(Self::Static),
            _ => Err(ConfigError::UnknownSelector {
                name: "coefficient mode",
                value,
            }),
        }
    }

    /// Inverse of [`from_selector`](Self::from_selector).
    pub fn selector(self) -> i64 {
        match self {
            Self::Dynamic => 1,
            Self::Static => 2,
        }
    }
}

// ── ModelCoefficient ───────────────────────────────────────────────

/// A closure coefficient, either domain-uniform or pointwise.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelCoefficient {
    /// One value broadcast over the grid.
    Uniform(f64),
    /// One value per grid point (hybrid dynamic solve).
    Field(PeriodicField),
}

impl ModelCoefficient {
    /// Multiply a scalar field by the coefficient.
    pub fn times(&self, field: &PeriodicField) -> PeriodicField {
        match self {
            Self::Uniform(c) => field.scale(*c),
            Self::Field(c) => c * field,
        }
    }

    /// Multiply every tensor component by the coefficient.
    pub fn times_tensor(&self, tensor: &SymmetricTensor) -> SymmetricTensor {
        tensor.map_components(|c| self.times(c))
    }

    /// Domain mean (the value itself when uniform).
    pub fn mean(&self) -> f64 {
        match self {
            Self::Uniform(c) => *c,
            Self::Field(c) => c.mean(),
        }
    }

    /// The coefficient as a field on `size`.
    pub fn to_field(&self, size: GridSize) -> PeriodicField {
        match self {
            Self::Uniform(c) => PeriodicField::constant(size, *c),
            Self::Field(c) => c.clone(),
        }
    }
}
