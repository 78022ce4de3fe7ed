//! One interactive session: its state and the append-only prediction history
//! with the aggregate statistics shown after every prediction.
//!
//! A [`Session`] is owned by the caller and lives as long as one user's
//! interaction; nothing is kept across sessions.

use anyhow::Result;
use serde::Serialize;

use crate::predictor::{Prediction, Predictor};
use crate::record::{ClinicalInput, Feature, N_FEATURES, Outcome, Sex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingInput,
    ResultShown,
}

/// A prediction together with everything that was entered to obtain it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub sex: Sex,
    pub input: ClinicalInput,
    pub probability: f64,
    pub outcome: Outcome,
}

impl HistoryEntry {
    pub fn new(sex: Sex, input: ClinicalInput, prediction: Prediction) -> Self {
        Self {
            sex,
            input,
            probability: prediction.probability,
            outcome: prediction.outcome,
        }
    }

    pub fn prediction(&self) -> Prediction {
        Prediction {
            outcome: self.outcome,
            probability: self.probability,
        }
    }
}

/// Aggregates over every entry of a history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryStats {
    pub total: usize,
    pub positive: usize,
    /// Mean of each numeric input, in [`Feature::ALL`] order.
    pub means: [f64; N_FEATURES],
}

impl HistoryStats {
    pub fn negative(&self) -> usize {
        self.total - self.positive
    }

    pub fn positive_pct(&self) -> f64 {
        self.positive as f64 / self.total as f64 * 100.0
    }

    pub fn negative_pct(&self) -> f64 {
        100.0 - self.positive_pct()
    }

    pub fn mean(&self, feature: Feature) -> f64 {
        self.means[feature.index()]
    }
}

/// Unbounded, append-only list of predictions made in one session.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recomputed from scratch; `None` while the history is empty.
    pub fn stats(&self) -> Option<HistoryStats> {
        if self.entries.is_empty() {
            return None;
        }
        let total = self.entries.len();
        let positive = self
            .entries
            .iter()
            .filter(|e| e.outcome.is_positive())
            .count();
        let mut means = [0.0; N_FEATURES];
        for entry in &self.entries {
            for (sum, value) in means.iter_mut().zip(entry.input.features()) {
                *sum += value;
            }
        }
        means.iter_mut().for_each(|m| *m /= total as f64);
        Some(HistoryStats {
            total,
            positive,
            means,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    history: History,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::AwaitingInput,
            history: History::default(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Runs a prediction and appends it to the history.
    ///
    /// On error the session is left untouched.
    pub fn submit(
        &mut self,
        predictor: &Predictor,
        sex: Sex,
        input: ClinicalInput,
    ) -> Result<HistoryEntry> {
        let prediction = predictor.predict(&input)?;
        Ok(self.record(HistoryEntry::new(sex, input, prediction)))
    }

    /// Appends an already computed prediction and moves to [`SessionState::ResultShown`].
    pub fn record(&mut self, entry: HistoryEntry) -> HistoryEntry {
        self.history.push(entry.clone());
        self.state = SessionState::ResultShown;
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(outcome: Outcome, glucose: f64) -> HistoryEntry {
        let input = ClinicalInput {
            glucose,
            ..ClinicalInput::default()
        };
        HistoryEntry::new(
            Sex::Female,
            input,
            Prediction {
                outcome,
                probability: if outcome.is_positive() { 0.8 } else { 0.2 },
            },
        )
    }

    #[test]
    fn new_session_awaits_input() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::AwaitingInput);
        assert!(session.history().is_empty());
        assert!(session.history().stats().is_none());
    }

    #[test]
    fn three_predictions_aggregate() {
        let mut session = Session::new();
        session.record(entry(Outcome::Diabetes, 180.0));
        assert_eq!(session.state(), SessionState::ResultShown);
        session.record(entry(Outcome::NoDiabetes, 90.0));
        session.record(entry(Outcome::Diabetes, 150.0));
        assert_eq!(session.state(), SessionState::ResultShown);

        let stats = session.history().stats().unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.positive, 2);
        assert_eq!(stats.negative(), 1);
        assert_eq!(format!("{:.2}", stats.positive_pct()), "66.67");
        assert_eq!(format!("{:.2}", stats.negative_pct()), "33.33");
        assert_eq!(stats.mean(Feature::Glucose), 140.0);
        assert_eq!(stats.mean(Feature::Age), 30.0);
    }

    #[test]
    fn history_keeps_insertion_order() {
        let mut history = History::default();
        for g in [100.0, 110.0, 120.0] {
            history.push(entry(Outcome::NoDiabetes, g));
        }
        let glucose: Vec<_> = history.entries().iter().map(|e| e.input.glucose).collect();
        assert_eq!(glucose, vec![100.0, 110.0, 120.0]);
        assert_eq!(history.len(), 3);
    }
}
