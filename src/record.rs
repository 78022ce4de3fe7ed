//! Clinical measurements, the fixed column order the model consumes, and the
//! soft plausibility ranges surfaced as warnings by the form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of numeric features fed to the model.
pub const N_FEATURES: usize = 8;

/// One of the eight numeric clinical measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Pregnancies,
    Glucose,
    BloodPressure,
    SkinThickness,
    Insulin,
    Bmi,
    Pedigree,
    Age,
}

impl Feature {
    /// Every feature, in model column order.
    pub const ALL: [Feature; N_FEATURES] = [
        Feature::Pregnancies,
        Feature::Glucose,
        Feature::BloodPressure,
        Feature::SkinThickness,
        Feature::Insulin,
        Feature::Bmi,
        Feature::Pedigree,
        Feature::Age,
    ];

    /// Physiologically bounded columns where a raw `0` means "not measured".
    pub const ZERO_AS_MISSING: [Feature; 5] = [
        Feature::Glucose,
        Feature::BloodPressure,
        Feature::SkinThickness,
        Feature::Insulin,
        Feature::Bmi,
    ];

    /// Column index in the feature matrix.
    pub fn index(self) -> usize {
        self as usize
    }

    /// CSV header name.
    pub fn column(self) -> &'static str {
        match self {
            Feature::Pregnancies => "Pregnancies",
            Feature::Glucose => "Glucose",
            Feature::BloodPressure => "BloodPressure",
            Feature::SkinThickness => "SkinThickness",
            Feature::Insulin => "Insulin",
            Feature::Bmi => "BMI",
            Feature::Pedigree => "DiabetesPedigreeFunction",
            Feature::Age => "Age",
        }
    }

    /// Human readable label used by the form and the statistics panel.
    pub fn label(self) -> &'static str {
        match self {
            Feature::Pregnancies => "Pregnancies",
            Feature::Glucose => "Glucose",
            Feature::BloodPressure => "Blood pressure",
            Feature::SkinThickness => "Skin thickness",
            Feature::Insulin => "Insulin level",
            Feature::Bmi => "BMI",
            Feature::Pedigree => "Family history",
            Feature::Age => "Age",
        }
    }

    /// Whether the form accepts only whole numbers for this field.
    pub fn is_integer(self) -> bool {
        !matches!(self, Feature::Bmi | Feature::Pedigree)
    }

    /// Soft range outside of which the form shows a warning.
    pub fn soft_range(self) -> Option<SoftRange> {
        let range = |min, max, message| SoftRange { min, max, message };
        match self {
            Feature::Pregnancies => None,
            Feature::Glucose => Some(range(
                Some(50.0),
                Some(300.0),
                "Glucose outside the common clinical range (50-300 mg/dL)",
            )),
            Feature::BloodPressure => Some(range(
                Some(40.0),
                Some(200.0),
                "Blood pressure outside the common clinical range (40-200 mmHg)",
            )),
            Feature::SkinThickness => Some(range(None, Some(100.0), "Unusual skin thickness (> 100 mm)")),
            Feature::Insulin => Some(range(
                None,
                Some(900.0),
                "Insulin level outside the common range (0-900 µU/mL)",
            )),
            Feature::Bmi => Some(range(
                Some(10.0),
                Some(60.0),
                "BMI outside the common clinical range (10.0-60.0)",
            )),
            Feature::Pedigree => Some(range(None, Some(2.5), "High family history score (> 2.5)")),
            Feature::Age => Some(range(
                Some(10.0),
                Some(100.0),
                "Age outside the common range (10-100 years)",
            )),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Plausibility bounds for a field. Values outside are flagged, never rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub message: &'static str,
}

impl SoftRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|min| value >= min) && self.max.is_none_or(|max| value <= max)
    }
}

/// A soft-range violation on a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub feature: Feature,
    pub value: f64,
    pub message: &'static str,
}

/// Checks a single value against its field's soft range.
pub fn check_soft_range(feature: Feature, value: f64) -> Option<Warning> {
    let range = feature.soft_range()?;
    (!range.contains(value)).then_some(Warning {
        feature,
        value,
        message: range.message,
    })
}

/// Sex selector shown above the form. Serialized with the values stored remotely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    #[serde(rename = "Mulher")]
    Female,
    #[serde(rename = "Homem")]
    Male,
}

impl Sex {
    /// Value written to prediction logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Sex::Female => "Mulher",
            Sex::Male => "Homem",
        }
    }

    /// Pregnancies can only be entered for women.
    pub fn allows_pregnancies(self) -> bool {
        self == Sex::Female
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Sex::Female => "Female",
            Sex::Male => "Male",
        })
    }
}

/// Predicted class. Label `1` is the positive ("diabetes present") class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "Sem Diabetes")]
    NoDiabetes,
    #[serde(rename = "Com Diabetes")]
    Diabetes,
}

impl Outcome {
    pub fn from_label(label: usize) -> Self {
        if label == 1 {
            Outcome::Diabetes
        } else {
            Outcome::NoDiabetes
        }
    }

    pub fn label(self) -> usize {
        match self {
            Outcome::NoDiabetes => 0,
            Outcome::Diabetes => 1,
        }
    }

    pub fn is_positive(self) -> bool {
        self == Outcome::Diabetes
    }

    /// Value written to prediction logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::NoDiabetes => "Sem Diabetes",
            Outcome::Diabetes => "Com Diabetes",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::NoDiabetes => "No diabetes",
            Outcome::Diabetes => "Diabetes",
        })
    }
}

/// The eight inputs of a single prediction, without a label.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClinicalInput {
    pub pregnancies: f64,
    pub glucose: f64,
    pub blood_pressure: f64,
    pub skin_thickness: f64,
    pub insulin: f64,
    pub bmi: f64,
    pub pedigree: f64,
    pub age: f64,
}

impl Default for ClinicalInput {
    /// Form defaults.
    fn default() -> Self {
        Self {
            pregnancies: 1.0,
            glucose: 120.0,
            blood_pressure: 70.0,
            skin_thickness: 20.0,
            insulin: 85.0,
            bmi: 28.0,
            pedigree: 0.4,
            age: 30.0,
        }
    }
}

impl ClinicalInput {
    pub fn from_features(values: [f64; N_FEATURES]) -> Self {
        let [pregnancies, glucose, blood_pressure, skin_thickness, insulin, bmi, pedigree, age] =
            values;
        Self {
            pregnancies,
            glucose,
            blood_pressure,
            skin_thickness,
            insulin,
            bmi,
            pedigree,
            age,
        }
    }

    /// Values in model column order.
    pub fn features(&self) -> [f64; N_FEATURES] {
        Feature::ALL.map(|f| self.get(f))
    }

    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Pregnancies => self.pregnancies,
            Feature::Glucose => self.glucose,
            Feature::BloodPressure => self.blood_pressure,
            Feature::SkinThickness => self.skin_thickness,
            Feature::Insulin => self.insulin,
            Feature::Bmi => self.bmi,
            Feature::Pedigree => self.pedigree,
            Feature::Age => self.age,
        }
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        let slot = match feature {
            Feature::Pregnancies => &mut self.pregnancies,
            Feature::Glucose => &mut self.glucose,
            Feature::BloodPressure => &mut self.blood_pressure,
            Feature::SkinThickness => &mut self.skin_thickness,
            Feature::Insulin => &mut self.insulin,
            Feature::Bmi => &mut self.bmi,
            Feature::Pedigree => &mut self.pedigree,
            Feature::Age => &mut self.age,
        };
        *slot = value;
    }
}

/// A single row of the training CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClinicalRecord {
    pub pregnancies: f64,
    pub glucose: f64,
    pub blood_pressure: f64,
    pub skin_thickness: f64,
    pub insulin: f64,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    #[serde(rename = "DiabetesPedigreeFunction")]
    pub pedigree: f64,
    pub age: f64,
    pub outcome: u8,
}

impl ClinicalRecord {
    pub fn new(input: ClinicalInput, outcome: u8) -> Self {
        Self {
            pregnancies: input.pregnancies,
            glucose: input.glucose,
            blood_pressure: input.blood_pressure,
            skin_thickness: input.skin_thickness,
            insulin: input.insulin,
            bmi: input.bmi,
            pedigree: input.pedigree,
            age: input.age,
            outcome,
        }
    }

    pub fn input(&self) -> ClinicalInput {
        ClinicalInput {
            pregnancies: self.pregnancies,
            glucose: self.glucose,
            blood_pressure: self.blood_pressure,
            skin_thickness: self.skin_thickness,
            insulin: self.insulin,
            bmi: self.bmi,
            pedigree: self.pedigree,
            age: self.age,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_order_is_fixed() {
        let names: Vec<_> = Feature::ALL.iter().map(|f| f.column()).collect();
        assert_eq!(
            names,
            [
                "Pregnancies",
                "Glucose",
                "BloodPressure",
                "SkinThickness",
                "Insulin",
                "BMI",
                "DiabetesPedigreeFunction",
                "Age"
            ]
        );
        for (i, f) in Feature::ALL.iter().enumerate() {
            assert_eq!(f.index(), i);
        }
    }

    #[test]
    fn features_follow_column_order() {
        let input = ClinicalInput::from_features([1.0, 120.0, 70.0, 20.0, 85.0, 28.0, 0.4, 30.0]);
        assert_eq!(input.glucose, 120.0);
        assert_eq!(input.pedigree, 0.4);
        assert_eq!(input.features(), [1.0, 120.0, 70.0, 20.0, 85.0, 28.0, 0.4, 30.0]);
    }

    #[test]
    fn defaults_raise_no_warnings() {
        let input = ClinicalInput::default();
        for feature in Feature::ALL {
            assert!(check_soft_range(feature, input.get(feature)).is_none(), "{feature}");
        }
    }

    #[test]
    fn high_glucose_is_flagged_but_kept() {
        let mut input = ClinicalInput::default();
        input.set(Feature::Glucose, 400.0);
        let warning = check_soft_range(Feature::Glucose, input.glucose).unwrap();
        assert_eq!(warning.feature, Feature::Glucose);
        assert_eq!(warning.value, 400.0);
        assert_eq!(input.glucose, 400.0);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(check_soft_range(Feature::Glucose, 50.0).is_none());
        assert!(check_soft_range(Feature::Glucose, 300.0).is_none());
        assert!(check_soft_range(Feature::Glucose, 49.0).is_some());
        assert!(check_soft_range(Feature::Insulin, 0.0).is_none());
        assert!(check_soft_range(Feature::Insulin, 901.0).is_some());
        assert!(check_soft_range(Feature::Pregnancies, 17.0).is_none());
    }

    #[test]
    fn log_values_keep_their_wire_spelling() {
        assert_eq!(Sex::Female.as_str(), "Mulher");
        assert_eq!(Outcome::Diabetes.as_str(), "Com Diabetes");
        assert_eq!(serde_json::to_string(&Outcome::NoDiabetes).unwrap(), "\"Sem Diabetes\"");
        assert_eq!(serde_json::to_string(&Sex::Male).unwrap(), "\"Homem\"");
    }

    #[test]
    fn csv_header_maps_onto_record() {
        let data = "Pregnancies,Glucose,BloodPressure,SkinThickness,Insulin,BMI,DiabetesPedigreeFunction,Age,Outcome\n\
                    6,148,72,35,0,33.6,0.627,50,1\n";
        let mut rdr = csv::Reader::from_reader(data.as_bytes());
        let record: ClinicalRecord = rdr.deserialize().next().unwrap().unwrap();
        assert_eq!(record.glucose, 148.0);
        assert_eq!(record.insulin, 0.0);
        assert_eq!(record.pedigree, 0.627);
        assert_eq!(record.outcome, 1);
    }
}
