//! AQI classification.
//!
//! Maps an AQI value onto one of six ordered severity tiers and the display
//! colour used for every indicator, card and badge showing that tier.
//!
//! # Boundaries
//!
//! Upper bounds are inclusive:
//!
//! | AQI       | Category     |
//! |-----------|--------------|
//! | 0..=50    | Good         |
//! | 51..=100  | Satisfactory |
//! | 101..=200 | Moderate     |
//! | 201..=300 | Poor         |
//! | 301..=400 | Very Poor    |
//! | 401..     | Severe       |

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Severity tier of an AQI value, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SeverityCategory {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    #[serde(rename = "Very Poor")]
    VeryPoor,
    Severe,
}

impl SeverityCategory {
    /// All tiers in ascending order of severity.
    pub const ALL: [SeverityCategory; 6] = [
        SeverityCategory::Good,
        SeverityCategory::Satisfactory,
        SeverityCategory::Moderate,
        SeverityCategory::Poor,
        SeverityCategory::VeryPoor,
        SeverityCategory::Severe,
    ];

    /// Determine the tier for an integer AQI. Total over `u32`.
    pub fn from_aqi(aqi: u32) -> Self {
        match aqi {
            0..=50 => SeverityCategory::Good,
            51..=100 => SeverityCategory::Satisfactory,
            101..=200 => SeverityCategory::Moderate,
            201..=300 => SeverityCategory::Poor,
            301..=400 => SeverityCategory::VeryPoor,
            _ => SeverityCategory::Severe,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            SeverityCategory::Good => "Good",
            SeverityCategory::Satisfactory => "Satisfactory",
            SeverityCategory::Moderate => "Moderate",
            SeverityCategory::Poor => "Poor",
            SeverityCategory::VeryPoor => "Very Poor",
            SeverityCategory::Severe => "Severe",
        }
    }

    /// Display colour bound to this tier.
    pub fn color(&self) -> ColorToken {
        let hex = match self {
            SeverityCategory::Good => "#4ade80",
            SeverityCategory::Satisfactory => "#a3e635",
            SeverityCategory::Moderate => "#facc15",
            SeverityCategory::Poor => "#fb923c",
            SeverityCategory::VeryPoor => "#f87171",
            SeverityCategory::Severe => "#c084fc",
        };
        ColorToken(hex)
    }
}

impl std::fmt::Display for SeverityCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A hex colour token, e.g. `#f87171`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ColorToken(&'static str);

impl ColorToken {
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

/// An AQI value together with its tier and colour.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub aqi: f64,
    pub category: SeverityCategory,
    pub color: ColorToken,
}

impl Classification {
    /// Classify a reading's integer AQI. Cannot fail.
    pub fn of(aqi: u32) -> Self {
        let category = SeverityCategory::from_aqi(aqi);
        Self {
            aqi: f64::from(aqi),
            category,
            color: category.color(),
        }
    }
}

/// Classify an arbitrary numeric AQI.
///
/// Fractional values use the same inclusive bounds, so `50.0` is Good and
/// `50.5` is Satisfactory.
///
/// # Errors
///
/// Returns [`ValidationError::AqiOutOfRange`] for negative, NaN or infinite input.
pub fn classify(aqi: f64) -> Result<Classification, ValidationError> {
    if !aqi.is_finite() || aqi < 0.0 {
        return Err(ValidationError::AqiOutOfRange { value: aqi });
    }

    let category = if aqi <= 50.0 {
        SeverityCategory::Good
    } else if aqi <= 100.0 {
        SeverityCategory::Satisfactory
    } else if aqi <= 200.0 {
        SeverityCategory::Moderate
    } else if aqi <= 300.0 {
        SeverityCategory::Poor
    } else if aqi <= 400.0 {
        SeverityCategory::VeryPoor
    } else {
        SeverityCategory::Severe
    };

    Ok(Classification {
        aqi,
        category,
        color: category.color(),
    })
}
