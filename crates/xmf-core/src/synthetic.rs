//! Deterministic synthetic measurement helpers.
//!
//! Used by tests and demos to build coordinate grids and to corrupt
//! generated maps with reproducible Gaussian noise (explicit seeds, no
//! thread-local RNG).

use rand::{rngs::StdRng, SeedableRng};
use rand_distr::{Distribution, Normal, NormalError};

use crate::{Grid, Real};

/// `n` evenly spaced samples over `[start, stop]` (both ends included).
pub fn linspace(start: Real, stop: Real, n: usize) -> Vec<Real> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as Real;
            (0..n)
                .map(|i| {
                    if i + 1 == n {
                        stop
                    } else {
                        start + step * i as Real
                    }
                })
                .collect()
        }
    }
}

/// Coordinate grids with `rows = ys.len()` and `cols = xs.len()`: `x`
/// varies along columns, `y` along rows.
pub fn meshgrid(xs: &[Real], ys: &[Real]) -> (Grid, Grid) {
    let x = Grid::from_fn(ys.len(), xs.len(), |_, j| xs[j]);
    let y = Grid::from_fn(ys.len(), xs.len(), |i, _| ys[i]);
    (x, y)
}

/// Additive white Gaussian noise with a fixed seed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianNoise {
    pub seed: u64,
    pub sigma: Real,
}

impl GaussianNoise {
    pub fn new(seed: u64, sigma: Real) -> Self {
        Self { seed, sigma }
    }

    /// Noise grid of the given shape. Identical seeds give identical grids.
    pub fn sample(&self, rows: usize, cols: usize) -> Result<Grid, NormalError> {
        let normal = Normal::new(0.0, self.sigma)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        // Column-major fill, matching the grid storage order.
        Ok(Grid::from_iterator(
            rows,
            cols,
            (0..rows * cols).map(|_| normal.sample(&mut rng)),
        ))
    }

    /// `values` plus noise; non-finite entries stay untouched.
    pub fn apply(&self, values: &Grid) -> Result<Grid, NormalError> {
        let noise = self.sample(values.nrows(), values.ncols())?;
        Ok(values.zip_map(&noise, |v, n| if v.is_finite() { v + n } else { v }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::nan_rms;

    #[test]
    fn linspace_hits_both_ends() {
        let v = linspace(-0.1, 0.1, 201);
        assert_eq!(v.len(), 201);
        assert_eq!(v[0], -0.1);
        assert_eq!(v[200], 0.1);
        assert!(v[100].abs() < 1e-16);
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
    }

    #[test]
    fn meshgrid_layout() {
        let (x, y) = meshgrid(&[1.0, 2.0, 3.0], &[10.0, 20.0]);
        assert_eq!(x.shape(), (2, 3));
        assert_eq!(x[(1, 2)], 3.0);
        assert_eq!(y[(1, 2)], 20.0);
        assert_eq!(y[(0, 2)], 10.0);
    }

    #[test]
    fn noise_is_reproducible_and_scaled() {
        let noise = GaussianNoise::new(7, 0.5e-9);
        let a = noise.sample(21, 201).unwrap();
        let b = noise.sample(21, 201).unwrap();
        assert_eq!(a, b);
        let rms = nan_rms(a.iter().copied());
        assert!((rms - 0.5e-9).abs() < 0.05e-9, "rms={rms:e}");
        assert_ne!(a, GaussianNoise::new(8, 0.5e-9).sample(21, 201).unwrap());
    }

    #[test]
    fn noise_skips_missing_samples() {
        let mut v = Grid::zeros(3, 3);
        v[(1, 1)] = Real::NAN;
        let noisy = GaussianNoise::new(1, 1.0).apply(&v).unwrap();
        assert!(noisy[(1, 1)].is_nan());
        assert!(noisy[(0, 0)] != 0.0);
    }

    #[test]
    fn negative_sigma_is_an_error() {
        assert!(GaussianNoise::new(0, -1.0).sample(2, 2).is_err());
    }
}
