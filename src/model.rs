//! Data models for Airwatch.
//!
//! Every type here is an immutable snapshot handed across the data-provider
//! boundary. Nothing is mutated by the client core once received.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An authenticated user's identity and profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend-assigned identifier, e.g. "USR1001".
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub city: String,
    pub state: String,
}

/// Result of `authenticate` / `register` on the data provider.
///
/// A rejected attempt is not a transport failure: it comes back with
/// `success == false` and an optional error message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub error: Option<String>,
}

impl AuthResponse {
    /// A successful response carrying `user`.
    pub fn accepted(user: User) -> Self {
        Self {
            success: true,
            user: Some(user),
            error: None,
        }
    }

    /// A rejected response carrying a human-readable reason.
    pub fn rejected(message: &str) -> Self {
        Self {
            success: false,
            user: None,
            error: Some(message.to_string()),
        }
    }
}

/// Pollutant concentrations and the overall AQI at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityReading {
    /// Overall index. Conventionally at most 500, but not capped.
    pub aqi: u32,
    /// PM2.5 in µg/m³.
    pub pm25: f64,
    /// PM10 in µg/m³.
    pub pm10: f64,
    /// Ozone in ppb.
    pub o3: f64,
    /// Nitrogen dioxide in ppb.
    pub no2: f64,
    /// Sulphur dioxide in ppb.
    pub so2: f64,
    /// Carbon monoxide in mg/m³.
    pub co: f64,
    /// Name of the pollutant driving the index, e.g. "PM2.5".
    pub dominant_pollutant: String,
}

/// Weather conditions bundled with a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Weather {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity in percent.
    pub humidity: f64,
    /// Metres per second.
    pub wind_speed: f64,
    /// Kilometres.
    pub visibility: f64,
}

/// Share of pollution attributed to each source, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceBreakdown {
    pub stubble: f64,
    pub traffic: f64,
    pub industry: f64,
}

/// One point of the AQI forecast, e.g. `("+12h", 370)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub label: String,
    pub aqi: u32,
}

/// A single point-in-time bundle returned by `fetch_snapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub reading: AirQualityReading,
    pub weather: Weather,
    pub source_breakdown: SourceBreakdown,
    /// Ordered from "Now" forward.
    pub forecast: Vec<ForecastPoint>,
}

/// Lifecycle status of a complaint. Only the backend moves it forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComplaintStatus {
    Submitted,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Under Investigation")]
    UnderInvestigation,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    /// Display label, identical to the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            ComplaintStatus::Submitted => "Submitted",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::UnderInvestigation => "Under Investigation",
            ComplaintStatus::Resolved => "Resolved",
            ComplaintStatus::Rejected => "Rejected",
        }
    }

    /// Parse a stored label back into a status.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Submitted" => Some(ComplaintStatus::Submitted),
            "In Progress" => Some(ComplaintStatus::InProgress),
            "Under Investigation" => Some(ComplaintStatus::UnderInvestigation),
            "Resolved" => Some(ComplaintStatus::Resolved),
            "Rejected" => Some(ComplaintStatus::Rejected),
            _ => None,
        }
    }
}

/// Complaint priority.
///
/// This is the only severity attribute a complaint has; the "severity" picked
/// on the report form is submitted as the priority.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Low" => Some(Priority::Low),
            "Medium" => Some(Priority::Medium),
            "High" => Some(Priority::High),
            "Critical" => Some(Priority::Critical),
            _ => None,
        }
    }
}

/// A complaint as tracked by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complaint {
    /// Backend-assigned identifier, e.g. "CMP2001".
    pub complaint_id: String,
    /// Category label, e.g. "Waste Burning".
    pub category: String,
    pub description: String,
    pub status: ComplaintStatus,
    pub priority: Priority,
    pub submitted_at: DateTime<Utc>,
    /// Officer label, "Unassigned" when nobody has picked it up yet.
    pub officer_assigned: String,
}

/// The fields a client sends to `submit_complaint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComplaint {
    /// Owner of the complaint.
    pub user_id: String,
    pub category: String,
    pub description: String,
    pub priority: Priority,
}

/// Acknowledgement returned by `submit_complaint`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub complaint_id: String,
    pub assigned_officer: String,
}

/// Query parameters carrying a single AQI value (`/classify`, `/guidance`).
#[derive(Debug, Deserialize)]
pub struct AqiQuery {
    pub aqi: f64,
}

/// Request body for POST /auth/login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}
