use approx::assert_abs_diff_eq;
use lab_kit::config::toml_config::RegressionConfig;
use lab_kit::core::regression::{synthetic_dataset, GradientDescent};
use lab_kit::{JobRunner, LocalStorage, RegressionJob};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_converges_on_noiseless_data() {
    let mut rng = StdRng::seed_from_u64(7);
    let (x, y) = synthetic_dataset(100, &[3.5, 4.0, -4.0], 1.0, &mut rng);

    let gd = GradientDescent {
        alpha: 0.1,
        steps: 2000,
        ..Default::default()
    }
    .with_seed(11);
    let fit = gd.fit(&x, &y).unwrap();

    assert_abs_diff_eq!(fit.intercept(), 1.0, epsilon = 1e-3);
    for (found, expected) in fit.coefficients().iter().zip([3.5, 4.0, -4.0]) {
        assert_abs_diff_eq!(*found, expected, epsilon = 1e-3);
    }
    assert!(fit.final_cost().unwrap() < 1e-6);
}

#[test]
fn test_cost_never_increases_with_small_step() {
    let mut rng = StdRng::seed_from_u64(3);
    let (x, y) = synthetic_dataset(100, &[3.5, 4.0, -4.0], 1.0, &mut rng);

    let fit = GradientDescent::default().with_seed(5).fit(&x, &y).unwrap();

    assert_eq!(fit.cost_history.len(), 500);
    for pair in fit.cost_history.windows(2) {
        assert!(pair[1] <= pair[0] + 1e-12, "{} > {}", pair[1], pair[0]);
    }
    assert!(fit.cost_history[499] < fit.cost_history[0]);
}

#[test]
fn test_default_hyperparameters_get_close_on_two_features() {
    let mut rng = StdRng::seed_from_u64(2024);
    let (x, y) = synthetic_dataset(500, &[5.0, -1.0], 2.0, &mut rng);

    let fit = GradientDescent::default().with_seed(9).fit(&x, &y).unwrap();
    let coefficients = fit.coefficients();

    assert_abs_diff_eq!(fit.intercept(), 2.0, epsilon = 0.25);
    assert_abs_diff_eq!(coefficients[0], 5.0, epsilon = 0.25);
    assert_abs_diff_eq!(coefficients[1], -1.0, epsilon = 0.25);

    let predicted = fit.predict(&x).unwrap();
    assert_eq!(predicted.len(), 500);
}

#[test]
fn test_job_writes_summary_from_csv_dataset() {
    let temp_dir = TempDir::new().unwrap();
    let dataset = temp_dir.path().join("data.csv");
    // y = 1 + 2x
    let mut csv = String::from("x,y\n");
    for i in 0..20 {
        let x = i as f64 / 10.0 - 1.0;
        csv.push_str(&format!("{},{}\n", x, 1.0 + 2.0 * x));
    }
    fs::write(&dataset, csv).unwrap();

    let config = RegressionConfig {
        alpha: 0.5,
        steps: 3000,
        seed: Some(1),
        dataset: Some(dataset.to_str().unwrap().to_string()),
        ..Default::default()
    };
    let output = temp_dir.path().join("out");
    let job = RegressionJob::new(LocalStorage::default(), config, output.to_str().unwrap());
    let location = JobRunner::new(job).run().unwrap();

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(location).unwrap()).unwrap();
    assert_eq!(summary["samples"], 20);
    assert_eq!(summary["steps"], 3000);
    assert_eq!(summary["cost_history"].as_array().unwrap().len(), 3000);
    assert_abs_diff_eq!(summary["intercept"].as_f64().unwrap(), 1.0, epsilon = 1e-3);
    assert_abs_diff_eq!(
        summary["coefficients"][0].as_f64().unwrap(),
        2.0,
        epsilon = 1e-3
    );
}

#[test]
fn test_seeded_synthetic_job_is_reproducible() {
    let temp_dir = TempDir::new().unwrap();
    let run = |sub: &str| {
        let config = RegressionConfig {
            seed: Some(42),
            steps: 50,
            ..Default::default()
        };
        let output = temp_dir.path().join(sub);
        let job = RegressionJob::new(LocalStorage::default(), config, output.to_str().unwrap());
        fs::read_to_string(JobRunner::new(job).run().unwrap()).unwrap()
    };

    assert_eq!(run("a"), run("b"));
}
