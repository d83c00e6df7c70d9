use std::ops::RangeInclusive;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LEAF_SPOT_TREATMENT: &str = "
I see the leaf in the picture is affected by a fungal or bacterial disease – the brown spots with yellowish edges are common symptoms of leaf spot disease (often caused by fungi like Alternaria, Cercospora, or Colletotrichum).
Here are some simple solutions you can try:

### 🌱 Natural/Home Remedies:
- **Neem Spray:** Mix neem oil ($5$ ml) in $1$ liter of water with a few drops of soap. Spray on both sides of the leaves every $7$ days.
- **Baking Soda Spray:** Mix $1$ teaspoon baking soda + $1$ liter water + few drops of liquid soap. Spray on infected leaves to reduce fungal growth.
- **Garlic Extract:** Crush garlic, mix with water, filter, and spray on the plants. It acts as a natural antifungal.

### 🌿 Good Gardening Practices:
- Remove and destroy infected leaves (don’t compost them).
- Water at the base of the plant, not on the leaves.
- Give plants good spacing for airflow.
- Rotate crops (don’t grow the same plant in the same soil every season).

### 💊 If Natural Methods Fail (Chemical Option):
- Use a fungicide like Mancozeb, Chlorothalonil, or Copper oxychloride (follow instructions on the pack).
";

const POWDERY_MILDEW_TREATMENT: &str = "
I see the leaf has a powdery white or grayish coating on its surface, which is a classic symptom of Powdery Mildew, a common fungal disease.
Here are some simple solutions you can try:

### 🌱 Natural/Home Remedies:
- **Milk Spray:** Mix milk with water in a 1:1 ratio. The milk proteins have antifungal properties that can fight the mildew.
- **Baking Soda Spray:** Mix 1 teaspoon baking soda + 1 liter water + few drops of liquid soap. This is effective for reducing fungal growth.
- **Pruning:** Prune away and dispose of the most heavily affected leaves and stems to prevent the disease from spreading.

### 🌿 Good Gardening Practices:
- Improve air circulation by spacing plants appropriately.
- Water at the base of the plant to keep leaves dry.
- Avoid over-fertilizing with nitrogen, which promotes soft new growth that is susceptible to mildew.

### 💊 If Natural Methods Fail (Chemical Option):
- Use a fungicide containing sulfur or potassium bicarbonate (follow instructions on the pack).
";

const LEAF_RUST_TREATMENT: &str = "
The leaf in the picture shows small, rusty-brown spots or pustules, which are characteristic signs of Leaf Rust. This is a fungal disease that can reduce a plant’s ability to photosynthesize.
Here are some simple solutions you can try:

### 🌱 Natural/Home Remedies:
- **Neem Spray:** Mix neem oil ($5$ ml) in $1$ liter of water with a few drops of soap. Spray on both sides of the leaves every $7$ days.
- **Horticultural Oil:** Apply horticultural oil to the leaves. It can smother fungal spores and prevent them from spreading.
- **Copper Fungicide:** Natural copper fungicides are available and can be effective.

### 🌿 Good Gardening Practices:
- Remove and destroy infected leaves (don’t compost them).
- Water in the morning to allow leaves to dry out during the day.
- Ensure good air circulation around the plants.

### 💊 If Natural Methods Fail (Chemical Option):
- Use a systemic fungicide containing chlorothalonil or myclobutanil (follow instructions on the pack).
";

const HEALTHY_TREATMENT: &str = "
Your plant looks healthy! I see no signs of common diseases. Keep up the good work.
To maintain your plant's health, make sure to follow these best practices:

### 🌿 Good Gardening Practices:
- Water at the base of the plant, not on the leaves, to prevent fungal growth.
- Give plants good spacing for airflow.
- Provide the right amount of light for your plant species.
- Use a balanced fertilizer as needed.
";

/// One row of the diagnosis table.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnosis {
    pub disease: String,
    pub confidence: RangeInclusive<f64>,
    pub treatment: String,
}

impl Diagnosis {
    pub fn new(
        disease: impl Into<String>,
        confidence: RangeInclusive<f64>,
        treatment: impl Into<String>,
    ) -> Self {
        Self {
            disease: disease.into(),
            confidence,
            treatment: treatment.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub disease: String,
    pub confidence: f64,
    pub treatment: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("diagnosis table is empty")]
    EmptyTable,
    #[error("invalid confidence range {start}..={end} for {disease}")]
    InvalidRange {
        disease: String,
        start: f64,
        end: f64,
    },
}

/// Stand-in for a trained classifier. Returns a canned diagnosis drawn from a
/// fixed table; the uploaded bytes are never inspected.
pub struct Model {
    table: Vec<Diagnosis>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Self::with_table(vec![
            Diagnosis::new("Leaf Spot Disease", 90.0..=99.9, LEAF_SPOT_TREATMENT),
            Diagnosis::new("Powdery Mildew", 90.0..=99.9, POWDERY_MILDEW_TREATMENT),
            Diagnosis::new("Leaf Rust", 90.0..=99.9, LEAF_RUST_TREATMENT),
            Diagnosis::new("Healthy", 98.0..=99.9, HEALTHY_TREATMENT),
        ])
    }

    pub fn with_table(table: Vec<Diagnosis>) -> Self {
        Model { table }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.table.iter().map(|row| row.disease.as_str())
    }

    pub fn table(&self) -> &[Diagnosis] {
        &self.table
    }

    pub fn predict(&self, image_data: &[u8]) -> Result<Prediction, ModelError> {
        self.predict_with(&mut rand::thread_rng(), image_data)
    }

    pub fn predict_with<R: Rng>(
        &self,
        rng: &mut R,
        _image_data: &[u8],
    ) -> Result<Prediction, ModelError> {
        let row = self.table.choose(rng).ok_or(ModelError::EmptyTable)?;

        let (start, end) = (*row.confidence.start(), *row.confidence.end());
        if !(start.is_finite() && end.is_finite()) || start > end {
            return Err(ModelError::InvalidRange {
                disease: row.disease.clone(),
                start,
                end,
            });
        }

        let sampled = rng.gen_range(start..=end);

        Ok(Prediction {
            disease: row.disease.clone(),
            confidence: round_confidence(sampled).clamp(start, end),
            treatment: row.treatment.clone(),
        })
    }
}

/// Rounds to two decimal places.
pub fn round_confidence(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn is_two_decimals(value: f64) -> bool {
        ((value * 100.0).round() - value * 100.0).abs() < 1e-6
    }

    #[test]
    fn builtin_table_has_four_labels() {
        let model = Model::new();
        let labels: Vec<&str> = model.labels().collect();
        assert_eq!(
            labels,
            vec!["Leaf Spot Disease", "Powdery Mildew", "Leaf Rust", "Healthy"]
        );
    }

    #[test]
    fn predictions_stay_within_label_ranges() {
        let model = Model::new();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..500 {
            let prediction = model.predict_with(&mut rng, b"ignored").unwrap();
            let row = model
                .table()
                .iter()
                .find(|row| row.disease == prediction.disease)
                .expect("label comes from the table");

            assert!(row.confidence.contains(&prediction.confidence));
            assert!(is_two_decimals(prediction.confidence));
            assert_eq!(prediction.treatment, row.treatment);
        }
    }

    #[test]
    fn healthy_confidence_is_at_least_98() {
        let model = Model::new();
        let mut rng = StdRng::seed_from_u64(11);

        let healthy: Vec<f64> = (0..400)
            .map(|_| model.predict_with(&mut rng, &[]).unwrap())
            .filter(|p| p.disease == "Healthy")
            .map(|p| p.confidence)
            .collect();

        assert!(!healthy.is_empty());
        assert!(healthy.iter().all(|c| (98.0..=99.9).contains(c)));
    }

    #[test]
    fn every_label_is_reachable() {
        let model = Model::new();
        let mut rng = StdRng::seed_from_u64(42);

        let seen: HashSet<String> = (0..200)
            .map(|_| model.predict_with(&mut rng, &[]).unwrap().disease)
            .collect();

        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn image_bytes_do_not_affect_the_draw() {
        let model = Model::new();
        let a = model
            .predict_with(&mut StdRng::seed_from_u64(3), b"\x89PNG")
            .unwrap();
        let b = model
            .predict_with(&mut StdRng::seed_from_u64(3), b"\xff\xd8\xff")
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_table_is_an_error() {
        let model = Model::with_table(Vec::new());
        assert_eq!(model.predict(&[]), Err(ModelError::EmptyTable));
    }

    #[test]
    fn inverted_range_is_an_error() {
        #[allow(clippy::reversed_empty_ranges)]
        let model = Model::with_table(vec![Diagnosis::new("Broken", 99.0..=90.0, "")]);
        let err = model.predict(&[]).unwrap_err();
        assert!(matches!(err, ModelError::InvalidRange { .. }));
        assert_eq!(
            err.to_string(),
            "invalid confidence range 99..=90 for Broken"
        );
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert_eq!(round_confidence(93.456), 93.46);
        assert_eq!(round_confidence(99.894), 99.89);
        assert_eq!(round_confidence(90.0), 90.0);
    }
}
