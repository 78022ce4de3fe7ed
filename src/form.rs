//! Terminal rendition of the prediction form: prompts with defaults, soft
//! range warnings, the trigger, and the result/chart/statistics output.
//!
//! Generic over the reader and writer so a session can be scripted.

use anyhow::Result;
use std::io::{BufRead, Write};

use crate::predictor::Prediction;
use crate::record::{ClinicalInput, Feature, Outcome, Sex, check_soft_range};
use crate::session::{HistoryEntry, HistoryStats};

/// Width of a full (probability 1.0) bar in the chart.
pub const BAR_WIDTH: usize = 40;

const EXIT: &str = "exit";

pub struct Form<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Form<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    /// Reads a trimmed line; `None` on end of input or `exit`.
    fn read_line(&mut self) -> Result<Option<String>> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim();
        if line.eq_ignore_ascii_case(EXIT) {
            return Ok(None);
        }
        Ok(Some(line.to_string()))
    }

    pub fn ask_sex(&mut self, default: Sex) -> Result<Option<Sex>> {
        loop {
            let hint = match default {
                Sex::Female => "F/m",
                Sex::Male => "f/M",
            };
            write!(self.output, "Sex [{hint}]: ")?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            match line.to_ascii_lowercase().as_str() {
                "" => return Ok(Some(default)),
                "f" | "female" | "mulher" => return Ok(Some(Sex::Female)),
                "m" | "male" | "homem" => return Ok(Some(Sex::Male)),
                _ => writeln!(self.output, "Please answer f or m.")?,
            }
        }
    }

    /// Prompts for one field until a non-negative number is entered.
    /// Out-of-range values are accepted with a warning.
    pub fn ask_number(&mut self, feature: Feature, default: f64) -> Result<Option<f64>> {
        loop {
            write!(self.output, "{:<16} [{}]: ", feature.label(), format_value(feature, default))?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            let value = if line.is_empty() {
                default
            } else {
                match line.replace(',', ".").parse::<f64>() {
                    Ok(v) if !v.is_finite() || v < 0.0 => {
                        writeln!(self.output, "Value must be a number of at least 0.")?;
                        continue;
                    }
                    Ok(v) if feature.is_integer() && v.fract() != 0.0 => {
                        writeln!(self.output, "{} must be a whole number.", feature.label())?;
                        continue;
                    }
                    Ok(v) => v,
                    Err(_) => {
                        writeln!(self.output, "Not a number: {line:?}")?;
                        continue;
                    }
                }
            };
            if let Some(warning) = check_soft_range(feature, value) {
                writeln!(self.output, "⚠️  {} (entered {})", warning.message, warning.value)?;
            }
            return Ok(Some(value));
        }
    }

    /// Collects the sex selector and the eight fields.
    ///
    /// Pregnancies is disabled (fixed at 0) for men.
    pub fn fill(
        &mut self,
        sex_default: Sex,
        defaults: &ClinicalInput,
    ) -> Result<Option<(Sex, ClinicalInput)>> {
        let Some(sex) = self.ask_sex(sex_default)? else {
            return Ok(None);
        };
        let mut input = *defaults;
        for feature in Feature::ALL {
            if feature == Feature::Pregnancies {
                if !sex.allows_pregnancies() {
                    input.pregnancies = 0.0;
                    writeln!(self.output, "{:<16} [0] (disabled)", feature.label())?;
                    continue;
                }
                if sex != sex_default && input.pregnancies == 0.0 {
                    input.pregnancies = 1.0;
                }
            }
            let Some(value) = self.ask_number(feature, input.get(feature))? else {
                return Ok(None);
            };
            input.set(feature, value);
        }
        Ok(Some((sex, input)))
    }

    /// The trigger: Enter predicts, `exit` or end of input stops.
    pub fn confirm(&mut self) -> Result<bool> {
        write!(self.output, "🔍 Press Enter to predict (or type 'exit'): ")?;
        Ok(self.read_line()?.is_some())
    }
}

fn format_value(feature: Feature, value: f64) -> String {
    if feature.is_integer() {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

/// Pass/fail styled verdict with the positive-class probability.
pub fn render_result(out: &mut impl Write, entry: &HistoryEntry) -> Result<()> {
    let pct = entry.probability * 100.0;
    match entry.outcome {
        Outcome::Diabetes => {
            writeln!(out, "🩺 Result: high risk of diabetes ({pct:.2}% chance)")?
        }
        Outcome::NoDiabetes => {
            writeln!(out, "✅ Result: low risk of diabetes ({pct:.2}% chance)")?
        }
    }
    writeln!(out, "🔁 Change the values and predict again for a new result.")?;
    Ok(())
}

/// Horizontal bar chart of both class probabilities on a 0..1 axis.
pub fn render_chart(out: &mut impl Write, prediction: &Prediction) -> Result<()> {
    writeln!(out, "📊 Model probabilities")?;
    let labels = [Outcome::NoDiabetes.as_str(), Outcome::Diabetes.as_str()];
    for (label, p) in labels.iter().zip(prediction.class_probabilities()) {
        writeln!(out, "{label:>14} │{}│ {:>6.2}%", bar(p), p * 100.0)?;
    }
    writeln!(out, "{:>14}  0{:>width$}", "", "1", width = BAR_WIDTH)?;
    Ok(())
}

fn bar(p: f64) -> String {
    let filled = ((p.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize).min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

/// Running statistics over the session history.
pub fn render_stats(out: &mut impl Write, stats: Option<&HistoryStats>) -> Result<()> {
    writeln!(out, "📊 History statistics")?;
    let Some(stats) = stats else {
        writeln!(out, "No predictions yet.")?;
        return Ok(());
    };
    writeln!(out, "- Total predictions: {}", stats.total)?;
    writeln!(
        out,
        "- With diabetes: {} ({:.2}%)",
        stats.positive,
        stats.positive_pct()
    )?;
    writeln!(
        out,
        "- Without diabetes: {} ({:.2}%)",
        stats.negative(),
        stats.negative_pct()
    )?;
    writeln!(out, "📈 Mean of entered values:")?;
    for feature in Feature::ALL {
        writeln!(out, "  {:<16} {:>10.2}", feature.label(), stats.mean(feature))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::History;
    use std::io::Cursor;

    fn form(script: &str) -> Form<Cursor<Vec<u8>>, Vec<u8>> {
        Form::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
    }

    fn printed(form: Form<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(form.output).unwrap()
    }

    #[test]
    fn empty_answers_take_defaults() {
        let mut f = form("\n\n\n\n\n\n\n\n\n");
        let (sex, input) = f.fill(Sex::Female, &ClinicalInput::default()).unwrap().unwrap();
        assert_eq!(sex, Sex::Female);
        assert_eq!(input, ClinicalInput::default());
        assert!(!printed(f).contains("⚠️"));
    }

    #[test]
    fn implausible_values_warn_but_pass_through() {
        let mut f = form("f\n\n400\n\n\n\n\n\n\n");
        let (_, input) = f.fill(Sex::Female, &ClinicalInput::default()).unwrap().unwrap();
        assert_eq!(input.glucose, 400.0);
        assert!(printed(f).contains("Glucose outside the common clinical range"));
    }

    #[test]
    fn invalid_entries_are_asked_again() {
        let mut f = form("abc\n-3\n2.5\n7\n");
        let value = f.ask_number(Feature::Pregnancies, 1.0).unwrap();
        assert_eq!(value, Some(7.0));
        let text = printed(f);
        assert!(text.contains("Not a number"));
        assert!(text.contains("at least 0"));
        assert!(text.contains("whole number"));
    }

    #[test]
    fn men_skip_pregnancies() {
        let mut f = form("m\n\n\n\n\n\n\n\n");
        let (sex, input) = f.fill(Sex::Female, &ClinicalInput::default()).unwrap().unwrap();
        assert_eq!(sex, Sex::Male);
        assert_eq!(input.pregnancies, 0.0);
        assert!(printed(f).contains("(disabled)"));
    }

    #[test]
    fn exit_ends_the_form() {
        let mut f = form("f\nexit\n");
        assert!(f.fill(Sex::Female, &ClinicalInput::default()).unwrap().is_none());
        let mut f = form("");
        assert!(!f.confirm().unwrap());
    }

    #[test]
    fn chart_bars_scale_with_probability() {
        let mut out = Vec::new();
        let prediction = Prediction {
            outcome: Outcome::NoDiabetes,
            probability: 0.25,
        };
        render_chart(&mut out, &prediction).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[1].matches('█').count(), 30);
        assert_eq!(lines[2].matches('█').count(), 10);
        assert!(lines[2].ends_with("25.00%"));
    }

    #[test]
    fn stats_panel_reports_percentages() {
        let mut history = History::default();
        for (outcome, p) in [(Outcome::Diabetes, 0.9), (Outcome::NoDiabetes, 0.1), (Outcome::Diabetes, 0.7)] {
            history.push(HistoryEntry::new(
                Sex::Female,
                ClinicalInput::default(),
                Prediction { outcome, probability: p },
            ));
        }
        let mut out = Vec::new();
        render_stats(&mut out, history.stats().as_ref()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Total predictions: 3"));
        assert!(text.contains("With diabetes: 2 (66.67%)"));
        assert!(text.contains("Without diabetes: 1 (33.33%)"));
    }

    #[test]
    fn verdict_styles_differ() {
        let entry = |outcome, probability| {
            HistoryEntry::new(Sex::Female, ClinicalInput::default(), Prediction { outcome, probability })
        };
        let mut out = Vec::new();
        render_result(&mut out, &entry(Outcome::Diabetes, 0.8123)).unwrap();
        render_result(&mut out, &entry(Outcome::NoDiabetes, 0.1)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("🩺 Result: high risk of diabetes (81.23% chance)"));
        assert!(text.contains("✅ Result: low risk of diabetes (10.00% chance)"));
    }
}
