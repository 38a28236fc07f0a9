//! Spectral differentiation.
//!
//! `∂/∂x` multiplies coefficient `(i, j)` by `i·kx[i]`, `∂/∂y` by
//! `i·ky[j]`. Exact to rounding for band-limited data.

use rustfft::num_complex::Complex64;

use eddy_core::{PeriodicField, SgsError};

use crate::transform::SpectralCache;

/// `(∂f/∂x, ∂f/∂y)` at the field's own resolution.
pub fn gradient(
    cache: &SpectralCache,
    field: &PeriodicField,
) -> Result<(PeriodicField, PeriodicField), SgsError> {
    let plan = cache.plan(field.size())?;
    let k = plan.wavenumbers();
    let hat = plan.forward(field)?;

    let mut dx = hat.clone();
    dx.multiply_by(|i, _| Complex64::new(0.0, k.kx()[i]));
    let mut dy = hat;
    dy.multiply_by(|_, j| Complex64::new(0.0, k.ky()[j]));

    Ok((
        cache.inverse(&dx, "x derivative")?,
        cache.inverse(&dy, "y derivative")?,
    ))
}

/// `(∂²f/∂x², ∂²f/∂y²)`, each obtained by differentiating twice.
pub fn second_derivatives(
    cache: &SpectralCache,
    field: &PeriodicField,
) -> Result<(PeriodicField, PeriodicField), SgsError> {
    let (fx, fy) = gradient(cache, field)?;
    let (fxx, _) = gradient(cache, &fx)?;
    let (_, fyy) = gradient(cache, &fy)?;
    Ok((fxx, fyy))
}
