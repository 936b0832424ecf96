//! Biometric and self-reported measurement models.
//!
//! Every field is optional: an absent value means "not measured" and is never
//! coerced to zero.

use serde::{Deserialize, Serialize};

/// Whether a measurement or self report was taken before or after the treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Before,
    After,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "before" => Some(Self::Before),
            "after" => Some(Self::After),
            _ => None,
        }
    }
}

/// HRV reading: RMSSD and SDNN in milliseconds, heart rate in beats per minute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rmssd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdnn: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heart_rate: Option<f64>,
}

impl Measurement {
    /// True when none of the three metrics was measured.
    pub fn is_empty(&self) -> bool {
        self.rmssd.is_none() && self.sdnn.is_none() && self.heart_rate.is_none()
    }

    /// `Some(self)` unless every metric is absent.
    pub fn non_empty(self) -> Option<Self> {
        (!self.is_empty()).then_some(self)
    }
}

/// Self-reported wellbeing.
///
/// Scores are integers in `0..=10`. Higher `sleep_quality` is better; lower
/// `stress` and `body_heaviness` are better.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_quality: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_heaviness: Option<u8>,
    /// Time of day the client went to bed, e.g. `23:30:00`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alcohol: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caffeine: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise: Option<bool>,
}

impl SelfReport {
    /// True when at least one of the three scores was supplied.
    pub fn has_scores(&self) -> bool {
        self.sleep_quality.is_some() || self.stress.is_some() || self.body_heaviness.is_some()
    }

    /// True when nothing at all was supplied.
    pub fn is_empty(&self) -> bool {
        !self.has_scores()
            && self.bedtime.is_none()
            && self.alcohol.is_none()
            && self.caffeine.is_none()
            && self.exercise.is_none()
    }

    /// Only the three scores, as captured after the treatment.
    pub fn scores_only(&self) -> Self {
        Self {
            sleep_quality: self.sleep_quality,
            stress: self.stress,
            body_heaviness: self.body_heaviness,
            ..Self::default()
        }
    }
}
