//! Spectral truncation onto a coarser grid.
//!
//! The four low-wavenumber quadrants of the fine spectrum are copied
//! into a zero coarse spectrum. Along each axis, coarse bin `c` takes
//! fine bin `c` for `c < nc/2` and fine bin `n - nc + c` otherwise.
//! The copy is scaled by `(ncx · ncy) / (nx · ny)` so that physical
//! amplitudes survive the change of normalization.

use eddy_core::{ConfigError, GridSize, PeriodicField, SgsError};

use crate::transform::{SpectralCache, Spectrum};

/// Validate a fine → coarse pair without transforming anything.
pub fn check_coarsening(fine: GridSize, coarse: GridSize) -> Result<(), ConfigError> {
    fine.check_non_empty()?;
    coarse.check_non_empty()?;
    if !fine.is_even() {
        return Err(ConfigError::OddGrid {
            name: "fine",
            size: fine,
        });
    }
    if !coarse.is_even() {
        return Err(ConfigError::OddGrid {
            name: "coarse",
            size: coarse,
        });
    }
    if !coarse.fits_within(fine) {
        return Err(ConfigError::CoarseExceedsFine { fine, coarse });
    }
    Ok(())
}

fn source_bin(c: usize, n: usize, nc: usize) -> usize {
    if c < nc / 2 {
        c
    } else {
        n - nc + c
    }
}

/// Truncate `field` to the `coarse` resolution.
///
/// Coarsening to the field's own size is the identity.
pub fn coarsen(
    cache: &SpectralCache,
    field: &PeriodicField,
    coarse: GridSize,
) -> Result<PeriodicField, SgsError> {
    let fine = field.size();
    check_coarsening(fine, coarse)?;

    let hat = cache.forward(field)?;
    let scale = coarse.cell_count() as f64 / fine.cell_count() as f64;
    let mut out = Spectrum::zeros(coarse);
    for ci in 0..coarse.nx {
        let fi = source_bin(ci, fine.nx, coarse.nx);
        for cj in 0..coarse.ny {
            let fj = source_bin(cj, fine.ny, coarse.ny);
            out.set(ci, cj, hat.get(fi, fj) * scale);
        }
    }
    cache.inverse(&out, "coarsen")
}

#[cfg(test)]
mod tests {
    use super::*;
    use eddy_core::Domain;
    use eddy_test_utils::{assert_fields_close, band_limited, cos_mode};

    fn cache() -> SpectralCache {
        SpectralCache::new(Domain::default()).unwrap()
    }

    #[test]
    fn source_bins_keep_low_wavenumbers() {
        let bins: Vec<usize> = (0..4).map(|c| source_bin(c, 8, 4)).collect();
        assert_eq!(bins, vec![0, 1, 6, 7]);
    }

    #[test]
    fn band_limited_field_coarsens_losslessly() {
        let fine = GridSize::square(64);
        let coarse = GridSize::square(32);
        let f = band_limited(fine, 10, 7);
        let c = coarsen(&cache(), &f, coarse).unwrap();
        // Band-limited content sampled on the coarse grid is every other point.
        let expected = PeriodicField::from_fn(coarse, |i, j| f.get(2 * i, 2 * j));
        assert_fields_close(&c, &expected, 1e-10);
    }

    #[test]
    fn modes_above_coarse_nyquist_are_removed() {
        let fine = GridSize::square(32);
        let high = cos_mode(fine, 12, 0, 0.3);
        let c = coarsen(&cache(), &high, GridSize::square(16)).unwrap();
        assert!(c.max_abs() < 1e-12, "got max {}", c.max_abs());
    }

    #[test]
    fn mean_is_preserved() {
        let size = GridSize::new(32, 16);
        let f = &band_limited(size, 6, 3) + &PeriodicField::constant(size, 1.75);
        let c = coarsen(&cache(), &f, GridSize::square(8)).unwrap();
        assert!((c.mean() - f.mean()).abs() < 1e-12);
        assert!(c.is_wrap_consistent());
    }

    #[test]
    fn identity_when_sizes_match() {
        let f = band_limited(GridSize::square(16), 5, 11);
        let c = coarsen(&cache(), &f, GridSize::square(16)).unwrap();
        assert_fields_close(&c, &f, 1e-12);
    }

    #[test]
    fn rejects_odd_and_oversized_grids() {
        assert!(matches!(
            check_coarsening(GridSize::square(32), GridSize::new(15, 16)),
            Err(ConfigError::OddGrid { name: "coarse", .. })
        ));
        assert!(matches!(
            check_coarsening(GridSize::new(33, 32), GridSize::square(16)),
            Err(ConfigError::OddGrid { name: "fine", .. })
        ));
        assert!(matches!(
            check_coarsening(GridSize::square(16), GridSize::square(32)),
            Err(ConfigError::CoarseExceedsFine { .. })
        ));
    }

    #[test]
    fn bad_sizes_fail_before_any_transform() {
        let c = cache();
        let f = PeriodicField::zeros(GridSize::square(16));
        let err = coarsen(&c, &f, GridSize::square(32)).unwrap_err();
        assert!(matches!(
            err,
            SgsError::Config(ConfigError::CoarseExceedsFine { .. })
        ));
        assert!(c.cached_sizes().is_empty());
    }
}
