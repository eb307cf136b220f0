use std::fmt::Write;

use cosmo_nuts_rs::{
    fit, Config, CosmologicalParameters, Dataset, DistanceModel, FlatLambdaCdm, SamplerConfig,
    Simulator, Variant,
};
use rand::SeedableRng;
use rand_distr::Distribution;

/// A Pantheon+-formatted table drawn from flat Lambda-CDM.
fn synthetic_table(truth: FlatLambdaCdm, n: usize, seed: u64) -> String {
    let distance = DistanceModel::default();
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
    let noise = rand_distr::Normal::new(0.0, 0.12).unwrap();

    let mut table = String::from("CID IDSURVEY zHD zHDERR MU_SH0ES MU_SH0ES_ERR_DIAG\n");
    for i in 0..n {
        let z = 0.015 + 1.6 * (i as f64 / n as f64).powi(2);
        let mu = distance.distance_modulus(&truth, z) + noise.sample(&mut rng);
        writeln!(table, "SN{i} 1 {z:.5} 0.00100 {mu:.5} 0.12000").unwrap();
    }
    table
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_flat_fit_recovers_truth() {
    init_logger();

    let truth = FlatLambdaCdm::new(70.0, 0.3);
    let dataset = Dataset::from_pantheon_str(&synthetic_table(truth, 80, 2024)).unwrap();
    assert_eq!(dataset.len(), 80);

    let config = Config {
        sampler: SamplerConfig {
            chains: 2,
            tuning: 300,
            samples: 300,
            seed: 17,
        },
        ..Config::default()
    };

    let chains = fit(dataset, &config).unwrap();
    let summary = chains.summary();
    assert_eq!(summary.len(), 2);

    let h0 = &summary[0];
    let om = &summary[1];
    assert_eq!(h0.name, "H0");
    assert_eq!(om.name, "Om");
    assert!((h0.mean - 70.0).abs() < 3.0, "{h0:?}");
    assert!((om.mean - 0.3).abs() < 0.2, "{om:?}");
    assert!(h0.std < 3.0, "{h0:?}");
}

#[test]
fn test_curved_fit_stays_in_priors() {
    init_logger();

    let truth = FlatLambdaCdm::new(72.0, 0.3);
    let dataset = Dataset::from_pantheon_str(&synthetic_table(truth, 40, 7)).unwrap();

    let mut config = Config::from_toml_str(
        r#"
variant = "curved"

[sampler]
chains = 1
tuning = 200
samples = 200
seed = 3
"#,
    )
    .unwrap();
    config.integration.grid_points = 500;

    let chains = fit(dataset, &config).unwrap();
    assert_eq!(chains.parameters, vec!["H0", "Om", "Ok"]);

    let (ok_min, ok_max) = chains.extrema(2);
    assert!(-0.1 <= ok_min && ok_max <= 0.1);
    for draw in chains.draws() {
        let mu = DistanceModel::default()
            .distance_modulus(&CosmologicalParameters::new(draw[0], draw[1], draw[2]), 1.0);
        assert!(mu.is_finite());
    }
}

#[test]
fn test_simulated_catalogue_matches_layout() {
    let truth = FlatLambdaCdm::new(70.0, 0.3);
    let dataset = Dataset::from_pantheon_str(&synthetic_table(truth, 30, 1)).unwrap();
    let simulator = Simulator::new(
        &dataset,
        Variant::Curved,
        &Config::default().priors,
        DistanceModel::default(),
    );

    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(11);
    let batch = simulator.simulate(&mut rng, 64);
    assert_eq!(batch.len(), 64);
    for (theta, x) in batch.iter() {
        assert_eq!(theta.len(), 3);
        assert_eq!(x.len(), dataset.len());
        assert!(x.iter().all(|m| m.is_finite()));
    }
}

#[test]
fn test_invalid_config_is_rejected() {
    let truth = FlatLambdaCdm::new(70.0, 0.3);
    let dataset = Dataset::from_pantheon_str(&synthetic_table(truth, 10, 1)).unwrap();

    let mut config = Config::default();
    config.sampler.chains = 0;
    let err = fit(dataset, &config).err().unwrap();
    assert!(matches!(err, cosmo_nuts_rs::Error::Config(_)));
}

#[test]
fn test_empty_dataset_is_rejected() {
    let truth = FlatLambdaCdm::new(70.0, 0.3);
    let dataset = Dataset::from_pantheon_str(&synthetic_table(truth, 10, 1))
        .unwrap()
        .filter(|obs| obs.z > 10.0);
    assert!(dataset.is_empty());

    let err = fit(dataset, &Config::default()).err().unwrap();
    assert!(matches!(err, cosmo_nuts_rs::Error::Data(cosmo_nuts_rs::DataError::Empty)));
}
