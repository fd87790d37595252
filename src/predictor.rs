//! Pre-trained model artifacts, loaded from disk and invoked through
//! `predict`/`predict_proba`-style calls. Artifacts are linear models
//! serialized as JSON: feature names, one coefficient row per class (or a
//! single row for regressors), intercepts, and class labels.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed model artifact {path}: {source}")]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("inconsistent model artifact: {0}")]
    Shape(String),

    #[error("model is a {actual}, expected a {expected}")]
    WrongKind {
        expected: &'static str,
        actual: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    Classifier,
    Regressor,
}

impl ModelType {
    fn as_str(self) -> &'static str {
        match self {
            ModelType::Classifier => "classifier",
            ModelType::Regressor => "regressor",
        }
    }
}

#[derive(Debug, Deserialize)]
struct Artifact {
    model_type: ModelType,
    feature_names: Vec<String>,
    #[serde(default)]
    classes: Vec<String>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
}

/// Classifier output: the winning label and, when the model exposes class
/// probabilities, the probability of that label.
#[derive(Debug, Clone)]
pub struct Prediction {
    pub label: String,
    pub confidence: Option<f64>,
}

/// A loaded model. Read-only after construction; safe to share across
/// requests behind an `Arc`.
#[derive(Debug)]
pub struct Predictor {
    artifact: Artifact,
}

impl Predictor {
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let raw = std::fs::read_to_string(path).map_err(|source| PredictError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let artifact: Artifact =
            serde_json::from_str(&raw).map_err(|source| PredictError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        Self::check_shape(&artifact)?;
        Ok(Self { artifact })
    }

    fn check_shape(artifact: &Artifact) -> Result<(), PredictError> {
        let rows = artifact.coefficients.len();
        if rows == 0 {
            return Err(PredictError::Shape("no coefficient rows".into()));
        }
        if artifact.intercepts.len() != rows {
            return Err(PredictError::Shape(format!(
                "{} coefficient rows but {} intercepts",
                rows,
                artifact.intercepts.len()
            )));
        }
        for row in &artifact.coefficients {
            if row.len() != artifact.feature_names.len() {
                return Err(PredictError::Shape(format!(
                    "coefficient row of length {} does not match {} feature names",
                    row.len(),
                    artifact.feature_names.len()
                )));
            }
        }
        match artifact.model_type {
            ModelType::Classifier if artifact.classes.len() != rows => {
                Err(PredictError::Shape(format!(
                    "{} classes but {} coefficient rows",
                    artifact.classes.len(),
                    rows
                )))
            }
            ModelType::Regressor if rows != 1 => Err(PredictError::Shape(
                "regressor must have exactly one coefficient row".into(),
            )),
            _ => Ok(()),
        }
    }

    pub fn model_type(&self) -> ModelType {
        self.artifact.model_type
    }

    /// Aligns inputs by feature name. Names the model was not trained with
    /// are ignored; trained names absent from the input contribute zero,
    /// which is how one-hot categorical columns are resolved.
    fn align(&self, features: &[(String, f64)]) -> Vec<f64> {
        self.artifact
            .feature_names
            .iter()
            .map(|name| {
                features
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, v)| *v)
                    .unwrap_or(0.0)
            })
            .collect()
    }

    fn scores(&self, aligned: &[f64]) -> Vec<f64> {
        self.artifact
            .coefficients
            .iter()
            .zip(&self.artifact.intercepts)
            .map(|(row, intercept)| {
                row.iter().zip(aligned).map(|(w, x)| w * x).sum::<f64>() + intercept
            })
            .collect()
    }

    /// Single classifier call: winning label plus softmax probability.
    pub fn predict(&self, features: &[(String, f64)]) -> Result<Prediction, PredictError> {
        if self.artifact.model_type != ModelType::Classifier {
            return Err(PredictError::WrongKind {
                expected: "classifier",
                actual: self.artifact.model_type.as_str(),
            });
        }

        let scores = self.scores(&self.align(features));
        let proba = softmax(&scores);
        let (best, confidence) = proba
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, p)| (i, *p))
            .expect("classifier has at least one class");

        Ok(Prediction {
            label: self.artifact.classes[best].clone(),
            confidence: Some(confidence),
        })
    }

    /// Class labels the classifier was trained with.
    pub fn classes(&self) -> &[String] {
        &self.artifact.classes
    }

    /// Single regressor call.
    pub fn predict_value(&self, features: &[(String, f64)]) -> Result<f64, PredictError> {
        if self.artifact.model_type != ModelType::Regressor {
            return Err(PredictError::WrongKind {
                expected: "regressor",
                actual: self.artifact.model_type.as_str(),
            });
        }
        Ok(self.scores(&self.align(features))[0])
    }
}

fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

/// The four predictors the API dispatches into. Loaded once at startup.
#[derive(Debug)]
pub struct ModelRegistry {
    pub crop: Predictor,
    pub yield_: Predictor,
    pub fertilizer: Predictor,
    pub stress: Predictor,
}

impl ModelRegistry {
    pub fn load(dir: &Path) -> Result<Self, PredictError> {
        let load = |file: &str| -> Result<Predictor, PredictError> {
            let predictor = Predictor::load(&dir.join(file))?;
            tracing::info!(artifact = file, "model loaded");
            Ok(predictor)
        };

        Ok(Self {
            crop: load("crop_model.json")?,
            yield_: load("yield_model.json")?,
            fertilizer: load("fert_model.json")?,
            stress: load("stress_model.json")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn classifier_json() -> &'static str {
        r#"{
            "model_type": "classifier",
            "feature_names": ["a", "b"],
            "classes": ["low", "high"],
            "coefficients": [[1.0, 0.0], [0.0, 1.0]],
            "intercepts": [0.0, 0.0]
        }"#
    }

    fn write_artifact(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn classifier_picks_argmax_class() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), "m.json", classifier_json());
        let model = Predictor::load(&path).unwrap();

        let prediction = model
            .predict(&[("a".into(), 3.0), ("b".into(), 1.0)])
            .unwrap();
        assert_eq!(prediction.label, "low");

        let prediction = model
            .predict(&[("a".into(), 1.0), ("b".into(), 3.0)])
            .unwrap();
        assert_eq!(prediction.label, "high");
    }

    #[test]
    fn confidence_is_a_probability() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), "m.json", classifier_json());
        let model = Predictor::load(&path).unwrap();

        let prediction = model
            .predict(&[("a".into(), 2.0), ("b".into(), 0.0)])
            .unwrap();
        let confidence = prediction.confidence.unwrap();
        assert!(confidence > 0.5 && confidence <= 1.0);
    }

    #[test]
    fn unknown_feature_names_contribute_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(dir.path(), "m.json", classifier_json());
        let model = Predictor::load(&path).unwrap();

        // "b" missing, stray name ignored: equivalent to b = 0.
        let with_gap = model
            .predict(&[("a".into(), 1.0), ("stage_early".into(), 9.0)])
            .unwrap();
        let explicit = model
            .predict(&[("a".into(), 1.0), ("b".into(), 0.0)])
            .unwrap();
        assert_eq!(with_gap.label, explicit.label);
    }

    #[test]
    fn regressor_evaluates_linear_form() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(
            dir.path(),
            "m.json",
            r#"{
                "model_type": "regressor",
                "feature_names": ["x", "y"],
                "coefficients": [[2.0, -1.0]],
                "intercepts": [5.0]
            }"#,
        );
        let model = Predictor::load(&path).unwrap();
        let value = model
            .predict_value(&[("x".into(), 3.0), ("y".into(), 4.0)])
            .unwrap();
        assert_eq!(value, 7.0);
    }

    #[test]
    fn classifier_call_on_regressor_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(
            dir.path(),
            "m.json",
            r#"{
                "model_type": "regressor",
                "feature_names": ["x"],
                "coefficients": [[1.0]],
                "intercepts": [0.0]
            }"#,
        );
        let model = Predictor::load(&path).unwrap();
        assert!(matches!(
            model.predict(&[("x".into(), 1.0)]),
            Err(PredictError::WrongKind { .. })
        ));
    }

    #[test]
    fn mismatched_shapes_are_rejected_at_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(
            dir.path(),
            "m.json",
            r#"{
                "model_type": "classifier",
                "feature_names": ["a", "b"],
                "classes": ["only-one"],
                "coefficients": [[1.0, 0.0], [0.0, 1.0]],
                "intercepts": [0.0, 0.0]
            }"#,
        );
        assert!(matches!(
            Predictor::load(&path),
            Err(PredictError::Shape(_))
        ));
    }

    #[test]
    fn registry_loads_the_shipped_artifacts() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("model");
        let registry = ModelRegistry::load(&dir).unwrap();
        assert_eq!(registry.crop.model_type(), ModelType::Classifier);
        assert_eq!(registry.yield_.model_type(), ModelType::Regressor);
        assert_eq!(registry.crop.classes().len(), 8);
    }
}
