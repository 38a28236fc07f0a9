//! Analytic and seeded-random periodic fields on the default `[0, 2π)²` box.
//!
//! - [`sin_sum`]: `sin x + sin y`, the standard differentiation check.
//! - [`cos_mode`]: a single Fourier mode with a phase.
//! - [`taylor_green_streamfunction`]: `sin(kx) sin(ky)`.
//! - [`band_limited`]: random smooth field below a wavenumber cap,
//!   reproducible from a seed via `ChaCha8Rng`.

use std::f64::consts::PI;

use eddy_core::{GridSize, PeriodicField};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Physical coordinates `(x, y)` of grid point `(i, j)`.
pub fn grid_coords(size: GridSize, i: usize, j: usize) -> (f64, f64) {
    (
        2.0 * PI * i as f64 / size.nx as f64,
        2.0 * PI * j as f64 / size.ny as f64,
    )
}

/// `sin x + sin y`: derivatives are `cos x` and `cos y`.
pub fn sin_sum(size: GridSize) -> PeriodicField {
    PeriodicField::from_fn(size, |i, j| {
        let (x, y) = grid_coords(size, i, j);
        x.sin() + y.sin()
    })
}

/// `cos(kx·x + ky·y + phase)`.
pub fn cos_mode(size: GridSize, kx: i32, ky: i32, phase: f64) -> PeriodicField {
    PeriodicField::from_fn(size, |i, j| {
        let (x, y) = grid_coords(size, i, j);
        (kx as f64 * x + ky as f64 * y + phase).cos()
    })
}

/// `sin(k·x) · sin(k·y)`: a steady cellular flow whose strain and
/// vorticity are both non-trivial.
pub fn taylor_green_streamfunction(size: GridSize, k: i32) -> PeriodicField {
    PeriodicField::from_fn(size, |i, j| {
        let (x, y) = grid_coords(size, i, j);
        (k as f64 * x).sin() * (k as f64 * y).sin()
    })
}

/// Zero-mean random field built from every mode with
/// `|kx|, |ky| <= kmax`, clipped below each axis' Nyquist wavenumber.
///
/// Amplitudes decay like `1 / (1 + |k|)`. The same `seed` always
/// produces the same field.
pub fn band_limited(size: GridSize, kmax: usize, seed: u64) -> PeriodicField {
    let kxm = kmax.min((size.nx.max(1) - 1) / 2) as i32;
    let kym = kmax.min((size.ny.max(1) - 1) / 2) as i32;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut modes = Vec::new();
    for kx in -kxm..=kxm {
        for ky in 0..=kym {
            if kx == 0 && ky == 0 {
                continue;
            }
            let k = ((kx * kx + ky * ky) as f64).sqrt();
            let amp = (rng.random::<f64>() * 2.0 - 1.0) / (1.0 + k);
            let phase = rng.random::<f64>() * 2.0 * PI;
            modes.push((kx as f64, ky as f64, amp, phase));
        }
    }

    PeriodicField::from_fn(size, |i, j| {
        let (x, y) = grid_coords(size, i, j);
        modes
            .iter()
            .map(|&(kx, ky, amp, phase)| amp * (kx * x + ky * y + phase).cos())
            .sum()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_limited_is_reproducible() {
        let size = GridSize::square(16);
        assert_eq!(band_limited(size, 5, 42), band_limited(size, 5, 42));
        assert_ne!(band_limited(size, 5, 42), band_limited(size, 5, 43));
    }

    #[test]
    fn band_limited_has_zero_mean() {
        let f = band_limited(GridSize::new(16, 12), 4, 9);
        assert!(f.mean().abs() < 1e-12);
    }

    #[test]
    fn cos_mode_wraps() {
        let f = cos_mode(GridSize::square(8), 1, 3, 0.5);
        assert!(f.is_wrap_consistent());
        assert!((f.get(0, 0) - 0.5f64.cos()).abs() < 1e-15);
    }
}
