//! The data-provider boundary.
//!
//! Everything the client core knows about the backend goes through
//! [`DataProvider`]. The composition root owns the instance and hands it to
//! the services as an `Arc<dyn DataProvider>`, so a real backend or a test
//! double can replace [`crate::mock::MockProvider`] without touching the
//! orchestration code.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::model::{AuthResponse, Complaint, NewComplaint, Snapshot, SubmissionReceipt};

/// Backend operations consumed by the core. Every call may suspend.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Check credentials. Rejection is reported in the response, not as an error.
    async fn authenticate(&self, username: &str, password: &str)
    -> Result<AuthResponse, FetchError>;

    /// Create an account.
    async fn register(
        &self,
        full_name: &str,
        username: &str,
        email: &str,
    ) -> Result<AuthResponse, FetchError>;

    /// Fetch the current air-quality snapshot.
    async fn fetch_snapshot(&self) -> Result<Snapshot, FetchError>;

    /// File a complaint.
    async fn submit_complaint(
        &self,
        complaint: &NewComplaint,
    ) -> Result<SubmissionReceipt, FetchError>;

    /// List a user's complaints, newest first, in a stable order.
    async fn fetch_complaints(&self, user_id: &str) -> Result<Vec<Complaint>, FetchError>;
}
