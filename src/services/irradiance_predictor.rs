/// Irradiance predictor backed by exported nearest-neighbour artifacts.
///
/// The regressor and the optional scaler are JSON exports of the fitted
/// estimators. Both are loaded once at startup; a failed load leaves the
/// predictor in an unavailable state instead of stopping the server.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{FeaturePath, ModelConfig};
use crate::error::PredictError;
use crate::models::features::{FeatureRecord, FEATURE_COUNT, FEATURE_NAMES};
use crate::models::session::ModelStatus;

type Vector = [f64; FEATURE_COUNT];

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("cannot read {path}: {source}")]
    Io { path: String, source: std::io::Error },
    #[error("cannot parse {path}: {source}")]
    Json { path: String, source: serde_json::Error },
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

// ─── Artifact formats ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Weights {
    Uniform,
    Distance,
}

#[derive(Debug, Deserialize)]
struct KnnArtifact {
    feature_names: Vec<String>,
    n_neighbors: usize,
    weights: Weights,
    samples: Vec<Vec<f64>>,
    targets: Vec<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum ScalerArtifact {
    /// (x - mean) / scale
    Standard { feature_names: Vec<String>, mean: Vec<f64>, scale: Vec<f64> },
    /// x * scale + min
    MinMax { feature_names: Vec<String>, min: Vec<f64>, scale: Vec<f64> },
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ArtifactError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path)
        .map_err(|source| ArtifactError::Io { path: display.clone(), source })?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Json { path: display, source })
}

fn check_feature_names(names: &[String]) -> Result<(), ArtifactError> {
    if names.len() != FEATURE_COUNT || names.iter().zip(FEATURE_NAMES).any(|(a, b)| a != b) {
        return Err(ArtifactError::Invalid(format!(
            "feature names {names:?} do not match expected {FEATURE_NAMES:?}"
        )));
    }
    Ok(())
}

fn to_vector(values: &[f64], what: &str) -> Result<Vector, ArtifactError> {
    let vector: Vector = values.try_into().map_err(|_| {
        ArtifactError::Invalid(format!("{what} has {} components, expected {FEATURE_COUNT}", values.len()))
    })?;
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(ArtifactError::Invalid(format!("{what} contains non-finite values")));
    }
    Ok(vector)
}

// ─── K-nearest-neighbour regressor ───────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct KnnRegressor {
    n_neighbors: usize,
    weights: Weights,
    samples: Vec<Vector>,
    targets: Vec<f64>,
}

impl KnnRegressor {
    pub fn new(
        n_neighbors: usize,
        weights: Weights,
        samples: Vec<Vector>,
        targets: Vec<f64>,
    ) -> Result<Self, ArtifactError> {
        if samples.len() != targets.len() {
            return Err(ArtifactError::Invalid(format!(
                "{} samples but {} targets",
                samples.len(),
                targets.len()
            )));
        }
        if n_neighbors == 0 || n_neighbors > samples.len() {
            return Err(ArtifactError::Invalid(format!(
                "n_neighbors {n_neighbors} must be within 1..={}",
                samples.len()
            )));
        }
        if targets.iter().any(|t| !t.is_finite()) {
            return Err(ArtifactError::Invalid("targets contain non-finite values".to_string()));
        }
        Ok(Self { n_neighbors, weights, samples, targets })
    }

    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        let artifact: KnnArtifact = read_json(path)?;
        check_feature_names(&artifact.feature_names)?;
        let samples = artifact
            .samples
            .iter()
            .enumerate()
            .map(|(i, row)| to_vector(row, &format!("sample {i}")))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(artifact.n_neighbors, artifact.weights, samples, artifact.targets)
    }

    pub fn n_neighbors(&self) -> usize {
        self.n_neighbors
    }

    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Euclidean k-NN regression. Ties in distance keep training order.
    pub fn predict(&self, x: &Vector) -> Result<f64, PredictError> {
        if x.iter().any(|v| !v.is_finite()) {
            return Err(PredictError::PredictionFailed("feature vector contains NaN or infinity".to_string()));
        }

        let mut neighbours: Vec<(f64, f64)> = self
            .samples
            .iter()
            .zip(&self.targets)
            .map(|(s, &t)| (euclidean(s, x), t))
            .collect();
        neighbours.sort_by(|a, b| a.0.total_cmp(&b.0));
        neighbours.truncate(self.n_neighbors);

        #[cfg(feature = "verbose_log")]
        tracing::debug!(?neighbours, "nearest neighbours");

        let value = match self.weights {
            Weights::Uniform => neighbours.iter().map(|(_, t)| t).sum::<f64>() / neighbours.len() as f64,
            Weights::Distance => {
                let exact: Vec<f64> = neighbours.iter().filter(|(d, _)| *d == 0.0).map(|(_, t)| *t).collect();
                if exact.is_empty() {
                    let (num, den) = neighbours
                        .iter()
                        .fold((0.0, 0.0), |(num, den), (d, t)| (num + t / d, den + 1.0 / d));
                    num / den
                } else {
                    exact.iter().sum::<f64>() / exact.len() as f64
                }
            }
        };

        if !value.is_finite() {
            return Err(PredictError::PredictionFailed("model produced a non-finite value".to_string()));
        }
        Ok(value)
    }
}

fn euclidean(a: &Vector, b: &Vector) -> f64 {
    a.iter().zip(b).map(|(p, q)| (p - q).powi(2)).sum::<f64>().sqrt()
}

// ─── Feature scaler ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Scaler {
    Standard { mean: Vector, scale: Vector },
    MinMax { min: Vector, scale: Vector },
}

impl Scaler {
    pub fn load(path: &Path) -> Result<Self, ArtifactError> {
        match read_json::<ScalerArtifact>(path)? {
            ScalerArtifact::Standard { feature_names, mean, scale } => {
                check_feature_names(&feature_names)?;
                let mut scale = to_vector(&scale, "scale")?;
                // constant features were fitted with a zero scale
                for s in scale.iter_mut().filter(|s| **s == 0.0) {
                    *s = 1.0;
                }
                Ok(Scaler::Standard { mean: to_vector(&mean, "mean")?, scale })
            }
            ScalerArtifact::MinMax { feature_names, min, scale } => {
                check_feature_names(&feature_names)?;
                Ok(Scaler::MinMax { min: to_vector(&min, "min")?, scale: to_vector(&scale, "scale")? })
            }
        }
    }

    pub fn transform(&self, x: &Vector) -> Result<Vector, PredictError> {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            out[i] = match self {
                Scaler::Standard { mean, scale } => (x[i] - mean[i]) / scale[i],
                Scaler::MinMax { min, scale } => x[i] * scale[i] + min[i],
            };
        }
        if out.iter().any(|v| !v.is_finite()) {
            return Err(PredictError::PredictionFailed("scaled features contain NaN or infinity".to_string()));
        }
        Ok(out)
    }
}

// ─── Predictor ───────────────────────────────────────────────────────────────

#[derive(Debug)]
struct LoadedModel {
    regressor: KnnRegressor,
    scaler: Option<Scaler>,
}

#[derive(Debug)]
pub struct IrradiancePredictor {
    feature_path: FeaturePath,
    model: Result<LoadedModel, String>,
}

impl IrradiancePredictor {
    /// Loads the artifacts named in the config. Never fails; check [`status`](Self::status).
    pub fn load(config: &ModelConfig) -> Self {
        let model = Self::load_model(config).map_err(|e| e.to_string());
        match &model {
            Ok(m) => info!(
                feature_path = ?config.feature_path,
                n_neighbors = m.regressor.n_neighbors(),
                n_samples = m.regressor.n_samples(),
                "Irradiance model loaded"
            ),
            Err(e) => warn!(error = %e, "Failed to load model or scaler, prediction disabled"),
        }
        Self { feature_path: config.feature_path, model }
    }

    fn load_model(config: &ModelConfig) -> Result<LoadedModel, ArtifactError> {
        let regressor = KnnRegressor::load(Path::new(&config.model_path))?;
        let scaler = match config.feature_path {
            FeaturePath::Scaled => Some(Scaler::load(Path::new(&config.scaler_path))?),
            FeaturePath::Raw => None,
        };
        Ok(LoadedModel { regressor, scaler })
    }

    #[cfg(test)]
    pub fn from_parts(feature_path: FeaturePath, regressor: KnnRegressor, scaler: Option<Scaler>) -> Self {
        let model = match (feature_path, scaler) {
            (FeaturePath::Scaled, None) => Err("scaled feature path configured without a scaler".to_string()),
            (FeaturePath::Scaled, scaler) => Ok(LoadedModel { regressor, scaler }),
            (FeaturePath::Raw, _) => Ok(LoadedModel { regressor, scaler: None }),
        };
        Self { feature_path, model }
    }

    #[cfg(test)]
    pub fn unavailable(feature_path: FeaturePath, reason: &str) -> Self {
        Self { feature_path, model: Err(reason.to_string()) }
    }

    pub fn feature_path(&self) -> FeaturePath {
        self.feature_path
    }

    /// Predicted global horizontal irradiance (W/m²).
    pub fn predict(&self, features: &FeatureRecord) -> Result<f64, PredictError> {
        let model = self.model.as_ref().map_err(|e| PredictError::ModelUnavailable(e.clone()))?;
        features.validate()?;

        let raw = features.to_vector();
        let input = match &model.scaler {
            Some(scaler) => scaler.transform(&raw)?,
            None => raw,
        };
        model.regressor.predict(&input)
    }

    pub fn status(&self) -> ModelStatus {
        match &self.model {
            Ok(m) => ModelStatus {
                available: true,
                feature_path: self.feature_path,
                n_neighbors: Some(m.regressor.n_neighbors()),
                n_samples: Some(m.regressor.n_samples()),
                error: None,
            },
            Err(e) => ModelStatus {
                available: false,
                feature_path: self.feature_path,
                n_neighbors: None,
                n_samples: None,
                error: Some(e.clone()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::io::Write;

    fn record(hour: u8, temperature_c: f64) -> FeatureRecord {
        FeatureRecord {
            hour: f64::from(hour),
            temperature_c,
            dew_point_c: 16.8,
            relative_humidity_percent: 46.0,
            surface_albedo: 0.15,
            pressure_hpa: 986.0,
            wind_speed_m_s: 2.9,
        }
    }

    fn three_point_model(weights: Weights, k: usize) -> KnnRegressor {
        KnnRegressor::new(
            k,
            weights,
            vec![
                record(10, 20.0).to_vector(),
                record(12, 20.0).to_vector(),
                record(16, 20.0).to_vector(),
            ],
            vec![500.0, 800.0, 300.0],
        )
        .unwrap()
    }

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("solar-sizer-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    const NAMES: &str =
        r#"["Hour","Temperature","Dew Point","Relative Humidity","Surface Albedo","Pressure","Wind Speed"]"#;

    #[test]
    fn test_uniform_average_of_k_nearest() {
        let model = three_point_model(Weights::Uniform, 2);
        // hour 11 is equidistant to 10 and 12
        let y = model.predict(&record(11, 20.0).to_vector()).unwrap();
        assert_abs_diff_eq!(y, 650.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distance_weighting() {
        let model = three_point_model(Weights::Distance, 3);
        // hour 15: distances 5, 3 and 1
        let y = model.predict(&record(15, 20.0).to_vector()).unwrap();
        let expected = (500.0 / 5.0 + 800.0 / 3.0 + 300.0) / (1.0 / 5.0 + 1.0 / 3.0 + 1.0);
        assert_abs_diff_eq!(y, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_distance_weighting_exact_match() {
        let model = three_point_model(Weights::Distance, 3);
        let y = model.predict(&record(16, 20.0).to_vector()).unwrap();
        assert_eq!(y, 300.0);
    }

    #[test]
    fn test_regressor_validation() {
        let rows = vec![record(10, 20.0).to_vector()];
        assert!(KnnRegressor::new(0, Weights::Uniform, rows.clone(), vec![1.0]).is_err());
        assert!(KnnRegressor::new(2, Weights::Uniform, rows.clone(), vec![1.0]).is_err());
        assert!(KnnRegressor::new(1, Weights::Uniform, rows, vec![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_standard_scaler_transform() {
        let path = write_temp(
            "scaler.json",
            &format!(
                r#"{{ "kind": "standard", "feature_names": {NAMES},
                     "mean": [12, 25, 15, 50, 0.2, 990, 3],
                     "scale": [6, 5, 5, 20, 0.1, 10, 0] }}"#
            ),
        );
        let scaler = Scaler::load(&path).unwrap();
        let out = scaler.transform(&[18.0, 30.0, 10.0, 70.0, 0.3, 1000.0, 5.0]).unwrap();
        let expected = [1.0, 1.0, -1.0, 1.0, 1.0, 1.0, 2.0];
        for (o, e) in out.iter().zip(expected) {
            assert_abs_diff_eq!(*o, e, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_min_max_scaler_transform() {
        let scaler = Scaler::MinMax { min: [0.0; FEATURE_COUNT], scale: [0.5; FEATURE_COUNT] };
        let out = scaler.transform(&[2.0; FEATURE_COUNT]).unwrap();
        assert_eq!(out, [1.0; FEATURE_COUNT]);
    }

    #[test]
    fn test_load_rejects_wrong_feature_order() {
        let path = write_temp(
            "knn.json",
            r#"{ "feature_names": ["Temperature","Hour","Dew Point","Relative Humidity","Surface Albedo","Pressure","Wind Speed"],
                 "n_neighbors": 1, "weights": "uniform",
                 "samples": [[1,2,3,4,0.1,900,1]], "targets": [100] }"#,
        );
        match KnnRegressor::load(&path) {
            Err(ArtifactError::Invalid(msg)) => assert!(msg.contains("feature names")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_load_rejects_short_rows() {
        let path = write_temp(
            "knn.json",
            &format!(
                r#"{{ "feature_names": {NAMES}, "n_neighbors": 1, "weights": "uniform",
                     "samples": [[1,2,3]], "targets": [100] }}"#
            ),
        );
        assert!(matches!(KnnRegressor::load(&path), Err(ArtifactError::Invalid(_))));
    }

    #[test]
    fn test_missing_artifacts_make_predictor_unavailable() {
        let config = ModelConfig {
            model_path: "/nonexistent/knn.json".to_string(),
            scaler_path: "/nonexistent/scaler.json".to_string(),
            feature_path: FeaturePath::Scaled,
        };
        let predictor = IrradiancePredictor::load(&config);
        let status = predictor.status();
        assert!(!status.available);
        assert!(status.error.unwrap().contains("/nonexistent/knn.json"));
        assert!(matches!(
            predictor.predict(&record(12, 20.0)),
            Err(PredictError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn test_raw_path_ignores_missing_scaler() {
        let knn = write_temp(
            "knn.json",
            &format!(
                r#"{{ "feature_names": {NAMES}, "n_neighbors": 1, "weights": "uniform",
                     "samples": [[12, 30, 18, 45, 0.2, 985, 3]], "targets": [870.5] }}"#
            ),
        );
        let config = ModelConfig {
            model_path: knn.display().to_string(),
            scaler_path: "/nonexistent/scaler.json".to_string(),
            feature_path: FeaturePath::Raw,
        };
        let predictor = IrradiancePredictor::load(&config);
        assert!(predictor.status().available);
        assert_eq!(predictor.predict(&record(9, 22.0)).unwrap(), 870.5);
    }

    #[test]
    fn test_scaled_and_raw_paths_differ() {
        // samples live in the scaled space, where the hour axis is shrunk 100x
        let samples = vec![
            [0.02, 22.0, 16.8, 46.0, 0.15, 986.0, 2.9],
            [2.0, 22.5, 16.8, 46.0, 0.15, 986.0, 2.9],
        ];
        let model = KnnRegressor::new(1, Weights::Uniform, samples, vec![900.0, 50.0]).unwrap();
        let scaler = Scaler::Standard {
            mean: [0.0; FEATURE_COUNT],
            scale: [100.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        };
        // raw query sits 2.5 from the second sample and ~2.81 from the first;
        // scaled to [0.02, 20, ..] it sits 2.0 from the first
        let query = record(2, 20.0);

        let raw = IrradiancePredictor::from_parts(FeaturePath::Raw, model.clone(), None);
        let scaled = IrradiancePredictor::from_parts(FeaturePath::Scaled, model.clone(), Some(scaler));
        assert_eq!(raw.predict(&query).unwrap(), 50.0);
        assert_eq!(scaled.predict(&query).unwrap(), 900.0);

        let broken = IrradiancePredictor::from_parts(FeaturePath::Scaled, model, None);
        assert!(!broken.status().available);
    }

    #[test]
    fn test_invalid_features_fail_prediction() {
        let predictor = IrradiancePredictor::from_parts(FeaturePath::Raw, three_point_model(Weights::Uniform, 1), None);
        let nan = FeatureRecord { wind_speed_m_s: f64::NAN, ..record(12, 20.0) };
        assert!(matches!(predictor.predict(&nan), Err(PredictError::PredictionFailed(_))));
        // the predictor stays usable afterwards
        assert_eq!(predictor.predict(&record(12, 20.0)).unwrap(), 800.0);
    }

    #[test]
    fn test_shipped_artifacts() {
        let root = env!("CARGO_MANIFEST_DIR");
        let config = ModelConfig {
            model_path: format!("{root}/artifacts/knn.json"),
            scaler_path: format!("{root}/artifacts/scaler.json"),
            feature_path: FeaturePath::Scaled,
        };
        let predictor = IrradiancePredictor::load(&config);
        assert!(predictor.status().available, "{:?}", predictor.status().error);

        let night = FeatureRecord { dew_point_c: 12.0, relative_humidity_percent: 70.0, ..record(1, 18.0) };
        assert_eq!(predictor.predict(&night).unwrap(), 0.0);

        let noon = FeatureRecord { dew_point_c: 19.4, relative_humidity_percent: 42.0, ..record(13, 31.0) };
        assert!(predictor.predict(&noon).unwrap() > 500.0);
    }
}
