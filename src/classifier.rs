//! Contamination-type classification.
//!
//! The model itself sits behind the [`Classifier`] port.  This module
//! owns label selection (arg-max with a strict comparison, so the first
//! class wins ties) and ships a small nearest-centroid model used when no
//! trained model is linked in.

use log::warn;

use crate::app::ports::{ClassScore, Classifier, ClassifierError};

/// Label shown before the first inference completes.
pub const INITIAL_LABEL: &str = "Initializing...";
/// Label when no class scores above zero.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Pick the class with the strictly highest confidence.  The scan starts
/// from zero, so an all-zero (or empty) score list yields
/// [`UNKNOWN_LABEL`].
pub fn select_label(scores: &[ClassScore]) -> &'static str {
    let mut best = UNKNOWN_LABEL;
    let mut max = 0.0_f32;
    for s in scores {
        if s.confidence > max {
            max = s.confidence;
            best = s.label;
        }
    }
    best
}

/// Run `model` over `features` and select a label.  `None` on model
/// failure; the caller keeps its previous label.
pub fn classify(model: &mut dyn Classifier, features: &[f32; 4]) -> Option<&'static str> {
    match model.scores(features) {
        Ok(scores) => Some(select_label(&scores)),
        Err(ClassifierError) => {
            warn!("Classifier: inference failed, keeping previous label");
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Nearest-centroid model
// ---------------------------------------------------------------------------

/// One class prototype in feature space
/// `[temperature °C, pH, TDS ppm, turbidity %]`.
#[derive(Debug, Clone, Copy)]
pub struct Centroid {
    pub label: &'static str,
    pub center: [f32; 4],
}

/// Per-feature scale so that distances are comparable across units.
const FEATURE_SCALE: [f32; 4] = [10.0, 1.0, 100.0, 10.0];

/// Default prototypes.
pub const DEFAULT_CENTROIDS: [Centroid; 4] = [
    Centroid { label: "Clean", center: [25.0, 7.2, 80.0, 2.0] },
    Centroid { label: "Chemical", center: [25.0, 4.5, 600.0, 5.0] },
    Centroid { label: "Sediment", center: [25.0, 7.5, 250.0, 60.0] },
    Centroid { label: "Thermal", center: [45.0, 7.0, 120.0, 5.0] },
];

/// Softmax over negative scaled distances to each centroid.
pub struct CentroidClassifier {
    centroids: Vec<Centroid>,
}

impl Default for CentroidClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_CENTROIDS.to_vec())
    }
}

impl CentroidClassifier {
    pub fn new(centroids: Vec<Centroid>) -> Self {
        Self { centroids }
    }

    fn distance(a: &[f32; 4], b: &[f32; 4]) -> f32 {
        a.iter()
            .zip(b)
            .zip(FEATURE_SCALE)
            .map(|((x, y), s)| {
                let d = (x - y) / s;
                d * d
            })
            .sum::<f32>()
            .sqrt()
    }
}

impl Classifier for CentroidClassifier {
    fn scores(&mut self, features: &[f32; 4]) -> Result<Vec<ClassScore>, ClassifierError> {
        // An open thermocouple yields NaN; there is nothing to classify.
        if features.iter().any(|f| !f.is_finite()) {
            return Err(ClassifierError);
        }
        let logits: Vec<f32> = self
            .centroids
            .iter()
            .map(|c| -Self::distance(features, &c.center))
            .collect();
        let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
        let total: f32 = exps.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(ClassifierError);
        }
        Ok(self
            .centroids
            .iter()
            .zip(exps)
            .map(|(c, e)| ClassScore {
                label: c.label,
                confidence: e / total,
            })
            .collect())
    }
}
