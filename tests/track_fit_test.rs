use anyhow::Result;
use approx::assert_abs_diff_eq;
use lab_kit::config::toml_config::TracksConfig;
use lab_kit::{JobRunner, LabError, LocalStorage, TrackFitJob};
use std::fs;
use tempfile::TempDir;

const EVENTS: &str = r#"[
  {
    "event_id": 1,
    "hit_layers": [0, 1, 2, 3, 5, 6, 7],
    "n_hit_layers_x": 3,
    "n_hit_layers_y": 4,
    "x_layers": { "xpos": [0.0, 1.0, 2.0], "ypos": [1.0, 3.0, 5.0] },
    "y_layers": { "xpos": [0.0, 1.0, 10.0, 11.0], "ypos": [10.0, 11.0, 1.0, 0.0] }
  },
  {
    "hit_layers": [1],
    "n_hit_layers_x": 1,
    "n_hit_layers_y": 1,
    "x_layers": { "xpos": [4.0], "ypos": [2.0] },
    "y_layers": { "xpos": [4.0], "ypos": [2.0] }
  }
]"#;

fn run_job(config: TracksConfig, dir: &TempDir) -> Result<serde_json::Value> {
    let output = dir.path().join("out");
    let job = TrackFitJob::new(LocalStorage::default(), config, output.to_string_lossy());
    let location = JobRunner::new(job).run()?;
    assert!(location.ends_with("track_fits.json"));
    Ok(serde_json::from_str(&fs::read_to_string(location)?)?)
}

#[test]
fn test_fits_each_event_and_keeps_absent_fields_null() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("events.json");
    fs::write(&input, EVENTS)?;

    let config = TracksConfig {
        input: Some(input.to_str().unwrap().to_string()),
        ..Default::default()
    };
    let fits = run_job(config, &temp_dir)?;
    let fits = fits.as_array().unwrap();
    assert_eq!(fits.len(), 2);

    let first = &fits[0];
    assert_eq!(first["event_id"], 1);
    assert_abs_diff_eq!(first["slope_x"].as_f64().unwrap(), 2.0, epsilon = 1e-9);
    assert_eq!(first["line_x"].as_array().unwrap().len(), 50);
    assert_eq!(first["residuals_y"].as_array().unwrap().len(), 4);
    // x 層 5、6、7 只有三個唯一層
    assert!(first["top_x"].is_null());
    assert_eq!(first["top_y"].as_array().unwrap().len(), 50);
    assert_eq!(first["bottom_y"].as_array().unwrap().len(), 50);

    let second = &fits[1];
    assert!(second["event_id"].is_null());
    for field in [
        "line_x",
        "line_y",
        "residuals_x",
        "residuals_y",
        "slope_x",
        "slope_y",
        "top_x",
        "bottom_x",
        "top_y",
        "bottom_y",
    ] {
        assert!(second[field].is_null(), "{} should be null", field);
    }
    Ok(())
}

#[test]
fn test_custom_grid_controls_line_length() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("events.json");
    fs::write(&input, EVENTS)?;

    let config = TracksConfig {
        input: Some(input.to_str().unwrap().to_string()),
        grid_start: 0.0,
        grid_stop: 10.0,
        grid_points: 11,
        ..Default::default()
    };
    let fits = run_job(config, &temp_dir)?;
    let line_x = fits[0]["line_x"].as_array().unwrap();

    assert_eq!(line_x.len(), 11);
    // y = 2x + 1
    assert_abs_diff_eq!(line_x[10].as_f64().unwrap(), 21.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_malformed_events_fail_to_load() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("events.json");
    fs::write(&input, r#"[{"hit_layers": "oops"}]"#).unwrap();

    let config = TracksConfig {
        input: Some(input.to_str().unwrap().to_string()),
        ..Default::default()
    };
    let job = TrackFitJob::new(LocalStorage::default(), config, "unused");
    let err = JobRunner::new(job).run().unwrap_err();
    assert!(matches!(err, LabError::SerializationError(_)));
}

#[test]
fn test_mismatched_hit_lengths_fail_the_batch() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let input = temp_dir.path().join("events.json");
    fs::write(
        &input,
        r#"[{
            "hit_layers": [5, 6, 7, 8],
            "n_hit_layers_x": 4,
            "n_hit_layers_y": 0,
            "x_layers": { "xpos": [0.0, 1.0, 2.0, 3.0], "ypos": [0.0, 1.0, 2.0] },
            "y_layers": { "xpos": [], "ypos": [] }
        }]"#,
    )?;

    let config = TracksConfig {
        input: Some(input.to_string_lossy().into_owned()),
        min_double_layers: 99,
        ..Default::default()
    };
    let job = TrackFitJob::new(LocalStorage::default(), config, "unused");
    let err = JobRunner::new(job).run().unwrap_err();
    assert!(matches!(err, LabError::DimensionMismatch { expected: 4, actual: 3, .. }));
    Ok(())
}
