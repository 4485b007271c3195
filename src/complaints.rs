//! Complaint submission and tracking.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::auth::require;
use crate::error::{FetchError, ValidationError};
use crate::model::{Complaint, NewComplaint, Priority, SubmissionReceipt};
use crate::provider::DataProvider;

/// Maximum number of evidence photos per complaint.
pub const MAX_PHOTOS: usize = 5;

/// Categories offered on the report form.
pub const COMPLAINT_CATEGORIES: [&str; 5] = [
    "Illegal Construction",
    "Stubble Burning",
    "Industrial Pollution",
    "Vehicle Emission",
    "Waste Burning",
];

/// User-facing message when a submission fails.
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to submit complaint. Please try again.";

/// User-facing message when the complaint list cannot be loaded.
pub const TRACK_FAILED_MESSAGE: &str = "Failed to fetch complaints.";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComplaintError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// The report form as filled in by the user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComplaintForm {
    pub user_id: String,
    pub category: String,
    pub description: String,
    /// Free text or "Lat: .., Lon: ..". Required but not sent to the backend.
    pub location: String,
    /// Chosen on the form as "severity"; submitted as the priority.
    #[serde(default)]
    pub priority: Priority,
    /// Already-encoded photo references (data URLs or upload ids).
    #[serde(default)]
    pub photos: Vec<String>,
}

impl ComplaintForm {
    /// Check required fields and the photo limit.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("user_id", &self.user_id)?;
        require("category", &self.category)?;
        require("description", &self.description)?;
        require("location", &self.location)?;
        if self.photos.len() > MAX_PHOTOS {
            return Err(ValidationError::TooManyPhotos { max: MAX_PHOTOS });
        }
        Ok(())
    }
}

/// Files complaints and lists them back.
#[derive(Clone)]
pub struct ComplaintDesk {
    provider: Arc<dyn DataProvider>,
}

impl ComplaintDesk {
    pub fn new(provider: Arc<dyn DataProvider>) -> Self {
        Self { provider }
    }

    /// Validate and submit a complaint.
    ///
    /// # Errors
    ///
    /// [`ComplaintError::Validation`] if the form is incomplete (the provider
    /// is not called), [`ComplaintError::Fetch`] if submission failed.
    #[instrument(skip(self, form), fields(category = %form.category, priority = ?form.priority))]
    pub async fn submit(&self, form: &ComplaintForm) -> Result<SubmissionReceipt, ComplaintError> {
        form.validate()?;

        let complaint = NewComplaint {
            user_id: form.user_id.clone(),
            category: form.category.trim().to_string(),
            description: form.description.trim().to_string(),
            priority: form.priority,
        };

        match self.provider.submit_complaint(&complaint).await {
            Ok(receipt) => {
                info!(
                    complaint_id = %receipt.complaint_id,
                    photos = form.photos.len(),
                    "Complaint submitted"
                );
                Ok(receipt)
            }
            Err(e) => {
                warn!(error = %e, "Failed to submit complaint");
                Err(e.into())
            }
        }
    }

    /// List a user's complaints, newest first.
    ///
    /// # Errors
    ///
    /// [`ComplaintError::Validation`] for an empty user id,
    /// [`ComplaintError::Fetch`] if the provider failed.
    #[instrument(skip(self))]
    pub async fn track(&self, user_id: &str) -> Result<Vec<Complaint>, ComplaintError> {
        require("user_id", user_id)?;

        match self.provider.fetch_complaints(user_id).await {
            Ok(complaints) => {
                info!(count = complaints.len(), "Complaints fetched");
                Ok(complaints)
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch complaints");
                Err(e.into())
            }
        }
    }
}
