//! Hubble parameter, comoving distance, luminosity distance and distance modulus.
use rayon::prelude::*;

use super::{Cosmology, RedshiftGrid, EPSILON, FLAT_TOLERANCE, GRID_POINTS, SPEED_OF_LIGHT};

/// Branchless choice between two already-computed values.
///
/// Every candidate is evaluated before the choice, so the curvature
/// parameter never drives control flow of the distance computation.
#[inline]
pub fn select(condition: bool, if_true: f64, if_false: f64) -> f64 {
    [if_false, if_true][condition as usize]
}

/// Numerical settings for the distance computation.
///
/// The defaults are 1000 quadrature points, a `1e-10` floor and a `1e-10`
/// flat tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceModel {
    /// Quadrature points spanning `[0, z]`.
    pub grid_points: usize,
    /// Floor for the expansion radicand and for distances.
    pub epsilon: f64,
    /// `|Ok|` below which the universe is treated as flat.
    pub flat_tolerance: f64,
}

impl Default for DistanceModel {
    fn default() -> Self {
        Self {
            grid_points: GRID_POINTS,
            epsilon: EPSILON,
            flat_tolerance: FLAT_TOLERANCE,
        }
    }
}

impl DistanceModel {
    /// Hubble parameter `H(z)` in km/s/Mpc.
    ///
    /// The radicand is clamped to `epsilon`, so the result is positive for
    /// any `H0 > 0`.
    #[inline]
    pub fn hubble_parameter<C: Cosmology>(&self, cosmology: &C, z: f64) -> f64 {
        cosmology.h0() * cosmology.radicand(z).max(self.epsilon).sqrt()
    }

    pub fn hubble_parameters<C: Cosmology>(&self, cosmology: &C, redshifts: &[f64]) -> Vec<f64> {
        redshifts
            .iter()
            .map(|&z| self.hubble_parameter(cosmology, z))
            .collect()
    }

    #[inline]
    fn integrand<C: Cosmology>(&self, cosmology: &C, z: f64) -> f64 {
        SPEED_OF_LIGHT / self.hubble_parameter(cosmology, z)
    }

    /// Comoving distance in Mpc at a single redshift.
    ///
    /// Rectangle rule: the integrand is sampled at every point of a uniform
    /// grid on `[0, z]` and the sum is multiplied by the grid step.
    pub fn comoving_distance<C: Cosmology>(&self, cosmology: &C, z: f64) -> f64 {
        let grid = RedshiftGrid::new(z, self.grid_points);
        grid.step()
            * grid
                .points()
                .iter()
                .map(|&zp| self.integrand(cosmology, zp))
                .sum::<f64>()
    }

    /// Running comoving distance at every point of `grid`.
    ///
    /// Left-endpoint accumulation: the first value is `0` and each step adds
    /// `step * c / H` evaluated at the lower end of the interval.
    pub fn cumulative_comoving_distance<C: Cosmology>(
        &self,
        cosmology: &C,
        grid: &RedshiftGrid,
    ) -> Vec<f64> {
        let step = grid.step();
        let mut chi = Vec::with_capacity(grid.len());
        let mut acc = 0.0;
        chi.push(acc);
        for pair in grid.points().windows(2) {
            acc += step * self.integrand(cosmology, pair[0]);
            chi.push(acc);
        }
        chi
    }

    /// Comoving distances in Mpc for many redshifts at once.
    ///
    /// A single grid up to `max(z)` is integrated once and every target is
    /// interpolated from it.
    pub fn comoving_distances<C: Cosmology>(&self, cosmology: &C, redshifts: &[f64]) -> Vec<f64> {
        let z_max = redshifts.iter().copied().fold(0.0, f64::max);
        if z_max <= 0.0 {
            return vec![0.0; redshifts.len()];
        }

        let grid = RedshiftGrid::new(z_max, self.grid_points);
        let chi = self.cumulative_comoving_distance(cosmology, &grid);

        redshifts
            .iter()
            .map(|&z| grid.interpolate(&chi, z.max(0.0)))
            .collect()
    }

    /// Transverse comoving distance for a line-of-sight comoving distance `chi`.
    ///
    /// Flat, open and closed geometries are all evaluated; the curvature sign
    /// and magnitude pick one.
    #[inline]
    pub fn transverse_comoving_distance<C: Cosmology>(&self, cosmology: &C, chi: f64) -> f64 {
        let ok = cosmology.ok();
        let hubble_distance = SPEED_OF_LIGHT / cosmology.h0();
        let sqrt_ok = ok.abs().sqrt();
        let x = sqrt_ok * chi / hubble_distance;

        let open = hubble_distance / sqrt_ok * x.sinh();
        let closed = hubble_distance / sqrt_ok * x.sin();

        select(
            ok.abs() < self.flat_tolerance,
            chi,
            select(ok > 0.0, open, closed),
        )
    }

    #[inline]
    fn luminosity_distance_from_comoving<C: Cosmology>(
        &self,
        cosmology: &C,
        z: f64,
        chi: f64,
    ) -> f64 {
        ((1.0 + z) * self.transverse_comoving_distance(cosmology, chi)).max(self.epsilon)
    }

    /// Luminosity distance in Mpc, floored at `epsilon`.
    pub fn luminosity_distance<C: Cosmology>(&self, cosmology: &C, z: f64) -> f64 {
        let chi = self.comoving_distance(cosmology, z);
        self.luminosity_distance_from_comoving(cosmology, z, chi)
    }

    pub fn luminosity_distances<C: Cosmology>(&self, cosmology: &C, redshifts: &[f64]) -> Vec<f64> {
        self.comoving_distances(cosmology, redshifts)
            .into_iter()
            .zip(redshifts)
            .map(|(chi, &z)| self.luminosity_distance_from_comoving(cosmology, z, chi))
            .collect()
    }

    /// `5 log10(dL / Mpc) + 25`, finite even at `z = 0`.
    #[inline]
    pub fn modulus_from_luminosity_distance(&self, dl: f64) -> f64 {
        5.0 * dl.max(self.epsilon).log10() + 25.0
    }

    /// Distance modulus at a single redshift.
    pub fn distance_modulus<C: Cosmology>(&self, cosmology: &C, z: f64) -> f64 {
        self.modulus_from_luminosity_distance(self.luminosity_distance(cosmology, z))
    }

    /// Distance moduli for many redshifts, sharing one integration grid.
    pub fn distance_moduli<C: Cosmology>(&self, cosmology: &C, redshifts: &[f64]) -> Vec<f64> {
        self.luminosity_distances(cosmology, redshifts)
            .into_iter()
            .map(|dl| self.modulus_from_luminosity_distance(dl))
            .collect()
    }

    /// One distance-modulus vector per parameter draw, evaluated in parallel.
    pub fn distance_moduli_batch<C: Cosmology>(
        &self,
        cosmologies: &[C],
        redshifts: &[f64],
    ) -> Vec<Vec<f64>> {
        cosmologies
            .par_iter()
            .map(|cosmology| self.distance_moduli(cosmology, redshifts))
            .collect()
    }
}
