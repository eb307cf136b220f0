//! Simulated distance-modulus catalogues for simulation-based inference.
//!
//! Parameters are drawn from the uniform priors, the forward model is
//! evaluated for every draw in parallel, and Gaussian noise with the observed
//! per-supernova uncertainty is added. Noise is drawn sequentially from the
//! caller's generator, so a seeded generator reproduces a batch exactly.
use rand::Rng;
use rand_distr::{Distribution, StandardNormal, Uniform};

use crate::cosmology::{CosmologicalParameters, DistanceModel, FlatLambdaCdm};
use crate::data::Dataset;
use crate::model::{Bounds, PriorBounds, Variant};

/// Parameter draws and the matching noisy distance-modulus vectors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationBatch {
    pub parameters: Vec<Vec<f64>>,
    pub observations: Vec<Vec<f64>>,
}

impl SimulationBatch {
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// `(parameters, observation)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&[f64], &[f64])> + '_ {
        self.parameters
            .iter()
            .zip(&self.observations)
            .map(|(p, x)| (p.as_slice(), x.as_slice()))
    }
}

/// Forward simulator for one survey layout (redshifts and uncertainties).
#[derive(Debug, Clone)]
pub struct Simulator {
    redshifts: Vec<f64>,
    mu_err: Vec<f64>,
    bounds: Vec<Bounds>,
    variant: Variant,
    distance: DistanceModel,
}

impl Simulator {
    /// Simulate catalogues with the redshifts and uncertainties of `dataset`.
    pub fn new(
        dataset: &Dataset,
        variant: Variant,
        priors: &PriorBounds,
        distance: DistanceModel,
    ) -> Self {
        Self {
            redshifts: dataset.redshifts().to_vec(),
            mu_err: dataset.mu_err().to_vec(),
            bounds: priors.for_variant(variant),
            variant,
            distance,
        }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// `n` independent draws from the uniform priors.
    pub fn draw_parameters<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> Vec<Vec<f64>> {
        let priors = self
            .bounds
            .iter()
            .map(|b| Uniform::new_inclusive(b.lower, b.upper))
            .collect::<Vec<_>>();

        (0..n)
            .map(|_| priors.iter().map(|u| u.sample(rng)).collect())
            .collect()
    }

    /// Noiseless distance moduli for every parameter vector.
    ///
    /// Panics if a parameter vector does not have `variant.dim()` entries.
    pub fn forward(&self, parameters: &[Vec<f64>]) -> Vec<Vec<f64>> {
        for p in parameters {
            assert_eq!(p.len(), self.variant.dim(), "Dimension mismatch");
        }

        match self.variant {
            Variant::Flat => {
                let cosmologies = parameters
                    .iter()
                    .map(|p| FlatLambdaCdm::new(p[0], p[1]))
                    .collect::<Vec<_>>();
                self.distance
                    .distance_moduli_batch(&cosmologies, &self.redshifts)
            }
            Variant::Curved => {
                let cosmologies = parameters
                    .iter()
                    .map(|p| CosmologicalParameters::new(p[0], p[1], p[2]))
                    .collect::<Vec<_>>();
                self.distance
                    .distance_moduli_batch(&cosmologies, &self.redshifts)
            }
        }
    }

    /// Add independent Gaussian noise scaled by each supernova's uncertainty.
    pub fn add_noise<R: Rng + ?Sized>(&self, rng: &mut R, mu: &mut [f64]) {
        for (m, err) in mu.iter_mut().zip(&self.mu_err) {
            let n: f64 = rng.sample(StandardNormal);
            *m += err * n;
        }
    }

    /// Draw `n` parameter vectors and simulate a noisy catalogue for each.
    pub fn simulate<R: Rng + ?Sized>(&self, rng: &mut R, n: usize) -> SimulationBatch {
        let parameters = self.draw_parameters(rng, n);
        let mut observations = self.forward(&parameters);
        for mu in observations.iter_mut() {
            self.add_noise(rng, mu);
        }

        log::debug!(
            "simulated {} catalogues of {} supernovae",
            observations.len(),
            self.redshifts.len()
        );

        SimulationBatch {
            parameters,
            observations,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::data::DistanceModulusObservation;

    fn layout() -> Dataset {
        Dataset::from_observations((1..=25).map(|i| DistanceModulusObservation {
            z: 0.05 * i as f64,
            mu_obs: 0.0,
            mu_err: 0.1 + 0.01 * i as f64,
        }))
    }

    #[test]
    fn test_draws_inside_priors() {
        let priors = PriorBounds::default();
        let simulator =
            Simulator::new(&layout(), Variant::Curved, &priors, DistanceModel::default());
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(1);
        let draws = simulator.draw_parameters(&mut rng, 500);
        assert_eq!(draws.len(), 500);
        for d in &draws {
            assert!(priors.h0.contains(d[0]));
            assert!(priors.om.contains(d[1]));
            assert!(priors.ok.contains(d[2]));
        }
    }

    #[test]
    fn test_simulate_shapes_and_reproducibility() {
        let simulator = Simulator::new(
            &layout(),
            Variant::Flat,
            &PriorBounds::default(),
            DistanceModel::default(),
        );

        let a = simulator.simulate(&mut rand_chacha::ChaCha8Rng::seed_from_u64(5), 16);
        let b = simulator.simulate(&mut rand_chacha::ChaCha8Rng::seed_from_u64(5), 16);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        for (theta, x) in a.iter() {
            assert_eq!(theta.len(), 2);
            assert_eq!(x.len(), 25);
            assert!(x.iter().all(|m| m.is_finite()));
        }
    }

    #[test]
    #[should_panic(expected = "Dimension mismatch")]
    fn test_forward_rejects_short_parameters() {
        let simulator = Simulator::new(
            &layout(),
            Variant::Curved,
            &PriorBounds::default(),
            DistanceModel::default(),
        );
        simulator.forward(&[vec![70.0, 0.3]]);
    }

    #[test]
    fn test_noise_scale() {
        let simulator = Simulator::new(
            &layout(),
            Variant::Flat,
            &PriorBounds::default(),
            DistanceModel::default(),
        );
        let theta = vec![vec![70.0, 0.3]; 2000];
        let clean = simulator.forward(&theta[..1]).remove(0);

        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(9);
        let mut noisy = simulator.forward(&theta);
        for mu in noisy.iter_mut() {
            simulator.add_noise(&mut rng, mu);
        }

        // pulls should be standard normal for the first and last supernova
        for i in [0, 24] {
            let err = simulator.mu_err[i];
            let pulls = noisy.iter().map(|mu| (mu[i] - clean[i]) / err).collect::<Vec<_>>();
            let mean = pulls.iter().sum::<f64>() / pulls.len() as f64;
            let var = pulls.iter().map(|p| (p - mean).powi(2)).sum::<f64>() / pulls.len() as f64;
            assert!(mean.abs() < 0.1, "mean = {mean}");
            assert!((var - 1.0).abs() < 0.1, "var = {var}");
        }
    }
}
