//! Score bands and their presentation colors

use crate::types::Loose;
use std::fmt;

/// Upper bound of the analysis scale
pub const MAX_SCORE: f64 = 10.0;

/// An RGB color with 0-255 channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const SUCCESS: Rgb = Rgb(46, 204, 113);
    pub const WARNING: Rgb = Rgb(241, 196, 15);
    pub const ORANGE: Rgb = Rgb(230, 126, 34);
    pub const DANGER: Rgb = Rgb(231, 76, 60);
    /// Fill used where a score color would go but there is no score
    pub const NEUTRAL: Rgb = Rgb(149, 165, 166);

    /// Channels scaled to 0.0-1.0
    pub fn unit(self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ScoreBand {
    Poor,
    Average,
    Good,
    Excellent,
}

impl ScoreBand {
    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::Good => "Good",
            ScoreBand::Average => "Average",
            ScoreBand::Poor => "Poor",
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            ScoreBand::Excellent => Rgb::SUCCESS,
            ScoreBand::Good => Rgb::WARNING,
            ScoreBand::Average => Rgb::ORANGE,
            ScoreBand::Poor => Rgb::DANGER,
        }
    }

    /// Caption printed under the overall score badge
    pub fn performance_caption(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent Performance",
            ScoreBand::Good => "Good Performance",
            ScoreBand::Average => "Average Performance",
            ScoreBand::Poor => "Needs Improvement",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of classifying one score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    /// The score when it is present and on the 0-10 scale
    pub score: Option<f64>,
    pub band: ScoreBand,
    /// `None` for unrated scores
    pub color: Option<Rgb>,
}

impl Classification {
    pub fn is_rated(&self) -> bool {
        self.score.is_some()
    }

    /// Fill color, falling back to neutral gray for unrated scores
    pub fn fill(&self) -> Rgb {
        self.color.unwrap_or(Rgb::NEUTRAL)
    }

    /// `"8.5"` / `"9"` or `"N/A"`
    pub fn display(&self) -> String {
        self.score.map_or_else(|| "N/A".to_string(), format_score)
    }

    /// `"8.5/10"` or `"N/A"`
    pub fn display_out_of_ten(&self) -> String {
        match self.score {
            Some(score) => format!("{}/10", format_score(score)),
            None => "N/A".to_string(),
        }
    }

    /// Urgency of acting on this category
    pub fn priority(&self) -> &'static str {
        match self.score {
            Some(score) if score < 5.0 => "High",
            Some(score) if score < 7.0 => "Medium",
            Some(_) => "Low",
            None => "N/A",
        }
    }
}

/// Band for a score already known to be on the scale
pub fn band_for(score: f64) -> ScoreBand {
    if score >= 8.0 {
        ScoreBand::Excellent
    } else if score >= 6.0 {
        ScoreBand::Good
    } else if score >= 4.0 {
        ScoreBand::Average
    } else {
        ScoreBand::Poor
    }
}

/// Classify a raw number. Values off the 0-10 scale are unrated.
pub fn classify_value(score: Option<f64>) -> Classification {
    match score.filter(|s| s.is_finite() && (0.0..=MAX_SCORE).contains(s)) {
        Some(score) => {
            let band = band_for(score);
            Classification {
                score: Some(score),
                band,
                color: Some(band.color()),
            }
        }
        None => {
            if let Some(raw) = score {
                tracing::debug!(score = raw, "score outside 0-10 treated as unrated");
            }
            Classification {
                score: None,
                band: ScoreBand::Poor,
                color: None,
            }
        }
    }
}

/// Classify a score as it appears in the payload
pub fn classify(score: Option<&Loose>) -> Classification {
    classify_value(score.and_then(Loose::as_f64))
}

/// Classify a `"7/10"` style table cell; `None` when the cell is not a score
pub fn classify_cell(text: &str) -> Option<Classification> {
    let (numerator, denominator) = text.trim().split_once('/')?;
    if denominator.trim() != "10" {
        return None;
    }
    let value = numerator.trim().parse::<f64>().ok()?;
    Some(classify_value(Some(value)))
}

/// Trim a trailing `.0` so whole scores print as integers
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        let text = format!("{score:.2}");
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn thresholds_match_bands() {
        assert_eq!(band_for(10.0), ScoreBand::Excellent);
        assert_eq!(band_for(8.0), ScoreBand::Excellent);
        assert_eq!(band_for(7.99), ScoreBand::Good);
        assert_eq!(band_for(6.0), ScoreBand::Good);
        assert_eq!(band_for(4.0), ScoreBand::Average);
        assert_eq!(band_for(3.9), ScoreBand::Poor);
        assert_eq!(band_for(0.0), ScoreBand::Poor);
    }

    #[test]
    fn nine_is_excellent_success() {
        let c = classify(Some(&Loose(json!(9))));
        assert_eq!(c.band, ScoreBand::Excellent);
        assert_eq!(c.color, Some(Rgb::SUCCESS));
        assert_eq!(c.display_out_of_ten(), "9/10");
    }

    #[test]
    fn missing_score_is_unrated_poor() {
        let c = classify(None);
        assert_eq!(c.band.label(), "Poor");
        assert_eq!(c.color, None);
        assert_eq!(c.fill(), Rgb::NEUTRAL);
        assert_eq!(c.display_out_of_ten(), "N/A");
        assert_eq!(c.priority(), "N/A");
    }

    #[test]
    fn unparseable_and_out_of_range_are_unrated() {
        for raw in [json!("excellent"), json!(-1), json!(11), json!([9])] {
            let c = classify(Some(&Loose(raw)));
            assert!(!c.is_rated());
            assert_eq!(c.band, ScoreBand::Poor);
        }
    }

    #[test]
    fn score_cells_are_detected() {
        assert_eq!(classify_cell("8/10").map(|c| c.band), Some(ScoreBand::Excellent));
        assert_eq!(classify_cell(" 4.5 / 10").map(|c| c.band), Some(ScoreBand::Average));
        assert!(classify_cell("Good").is_none());
        assert!(classify_cell("3/5").is_none());
        assert!(classify_cell("N/A").is_none());
    }

    #[test]
    fn priority_follows_score() {
        assert_eq!(classify_value(Some(4.9)).priority(), "High");
        assert_eq!(classify_value(Some(6.5)).priority(), "Medium");
        assert_eq!(classify_value(Some(7.0)).priority(), "Low");
    }

    #[test]
    fn formats_scores_compactly() {
        assert_eq!(format_score(9.0), "9");
        assert_eq!(format_score(7.5), "7.5");
        assert_eq!(format_score(6.25), "6.25");
    }

    proptest! {
        #[test]
        fn numeric_string_classifies_like_number(score in -5.0f64..15.0) {
            let as_number = classify(Some(&Loose(json!(score))));
            let as_string = classify(Some(&Loose(json!(score.to_string()))));
            prop_assert_eq!(as_number.band, as_string.band);
            prop_assert_eq!(as_number.color, as_string.color);
        }
    }
}
