//! Mock backend.
//!
//! Serves a fixed Delhi-NCR snapshot and a demo account, with artificial
//! latency so the asynchronous paths behave as they would against a real
//! server. Complaints go to [`Storage`], so a submitted complaint shows up in
//! the submitter's next listing.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use rand::Rng;
use tracing::{debug, info, instrument};

use crate::error::FetchError;
use crate::model::{
    AirQualityReading, AuthResponse, Complaint, ComplaintStatus, ForecastPoint, NewComplaint,
    Priority, Snapshot, SourceBreakdown, SubmissionReceipt, User, Weather,
};
use crate::provider::DataProvider;
use crate::storage::Storage;

/// Demo account credentials.
pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "demo123";

/// Officer assigned to every newly submitted complaint.
const DEFAULT_OFFICER: &str = "Officer Priya Singh";

const LOGIN_DELAY_MS: u64 = 500;
const REGISTER_DELAY_MS: u64 = 1000;
const SNAPSHOT_DELAY_MS: u64 = 800;
const SUBMIT_DELAY_MS: u64 = 1200;
const LIST_DELAY_MS: u64 = 700;

/// Random complaint ids tried before a submission is refused.
const MAX_ID_ATTEMPTS: usize = 32;

/// In-process stand-in for the backend.
#[derive(Clone)]
pub struct MockProvider {
    storage: Storage,
    latency: bool,
}

impl MockProvider {
    /// Create a mock backend writing complaints to `storage`.
    ///
    /// With `latency` off every call resolves without sleeping.
    pub fn new(storage: Storage, latency: bool) -> Self {
        Self { storage, latency }
    }

    async fn simulate_delay(&self, millis: u64) {
        if self.latency {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }

    /// Insert the demo complaints for `user_id` the first time it is listed.
    async fn seed_demo_complaints(&self, user_id: &str) -> anyhow::Result<()> {
        if self.storage.seed_complaints(user_id, &demo_complaints()).await? {
            debug!(user_id, "Seeded demo complaints");
        }
        Ok(())
    }

    /// Store `complaint` under the first id from `candidates` the user does
    /// not already own.
    async fn record_complaint(
        &self,
        complaint: &NewComplaint,
        candidates: impl IntoIterator<Item = String>,
    ) -> Result<Complaint, FetchError> {
        for complaint_id in candidates {
            let record = Complaint {
                complaint_id,
                category: complaint.category.clone(),
                description: complaint.description.clone(),
                status: ComplaintStatus::Submitted,
                priority: complaint.priority,
                submitted_at: Utc::now(),
                officer_assigned: DEFAULT_OFFICER.to_string(),
            };

            let inserted = self
                .storage
                .insert_complaint(&complaint.user_id, &record)
                .await
                .map_err(|e| FetchError::Unavailable(e.to_string()))?;

            if inserted {
                return Ok(record);
            }
            debug!(complaint_id = %record.complaint_id, "Complaint id taken, retrying");
        }

        Err(FetchError::Unavailable(
            "no free complaint id for this user".to_string(),
        ))
    }
}

fn random_complaint_ids() -> impl Iterator<Item = String> {
    (0..MAX_ID_ATTEMPTS).map(|_| format!("CMP{}", rand::thread_rng().gen_range(1000..=9999)))
}

#[async_trait]
impl DataProvider for MockProvider {
    #[instrument(skip(self, password))]
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthResponse, FetchError> {
        self.simulate_delay(LOGIN_DELAY_MS).await;

        if username == DEMO_USERNAME && password == DEMO_PASSWORD {
            return Ok(AuthResponse::accepted(demo_user()));
        }
        Ok(AuthResponse::rejected("Invalid username or password"))
    }

    #[instrument(skip(self, email))]
    async fn register(
        &self,
        full_name: &str,
        username: &str,
        email: &str,
    ) -> Result<AuthResponse, FetchError> {
        self.simulate_delay(REGISTER_DELAY_MS).await;

        let user_id = format!("USR{}", rand::thread_rng().gen_range(0..1000));
        info!(user_id = %user_id, "Registered mock user");

        Ok(AuthResponse::accepted(User {
            user_id,
            username: username.to_string(),
            full_name: full_name.to_string(),
            email: email.to_string(),
            mobile: "9999999999".to_string(),
            city: "Delhi".to_string(),
            state: "Delhi".to_string(),
        }))
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, FetchError> {
        self.simulate_delay(SNAPSHOT_DELAY_MS).await;
        Ok(demo_snapshot())
    }

    #[instrument(skip(self, complaint), fields(user_id = %complaint.user_id, category = %complaint.category))]
    async fn submit_complaint(
        &self,
        complaint: &NewComplaint,
    ) -> Result<SubmissionReceipt, FetchError> {
        self.simulate_delay(SUBMIT_DELAY_MS).await;

        let record = self
            .record_complaint(complaint, random_complaint_ids())
            .await?;
        let complaint_id = record.complaint_id;

        info!(complaint_id = %complaint_id, "Complaint recorded");

        Ok(SubmissionReceipt {
            complaint_id,
            assigned_officer: DEFAULT_OFFICER.to_string(),
        })
    }

    async fn fetch_complaints(&self, user_id: &str) -> Result<Vec<Complaint>, FetchError> {
        self.simulate_delay(LIST_DELAY_MS).await;

        self.seed_demo_complaints(user_id)
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        self.storage
            .list_complaints(user_id)
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))
    }
}

/// The demo account's profile.
pub fn demo_user() -> User {
    User {
        user_id: "USR1001".to_string(),
        username: DEMO_USERNAME.to_string(),
        full_name: "Demo User".to_string(),
        email: "demo@example.com".to_string(),
        mobile: "9876543210".to_string(),
        city: "Delhi".to_string(),
        state: "Delhi".to_string(),
    }
}

/// The fixed snapshot served by the mock backend.
pub fn demo_snapshot() -> Snapshot {
    let forecast = [
        ("Now", 388),
        ("+12h", 370),
        ("+24h", 410),
        ("+36h", 395),
        ("+48h", 380),
        ("+60h", 360),
        ("+72h", 350),
    ]
    .into_iter()
    .map(|(label, aqi)| ForecastPoint {
        label: label.to_string(),
        aqi,
    })
    .collect();

    Snapshot {
        reading: AirQualityReading {
            aqi: 388,
            pm25: 210.0,
            pm10: 390.0,
            o3: 50.0,
            no2: 75.0,
            so2: 9.0,
            co: 1.8,
            dominant_pollutant: "PM2.5".to_string(),
        },
        weather: Weather {
            temperature: 28.0,
            humidity: 45.0,
            wind_speed: 2.1,
            visibility: 1.5,
        },
        source_breakdown: SourceBreakdown {
            stubble: 40.0,
            traffic: 40.0,
            industry: 20.0,
        },
        forecast,
    }
}

fn demo_complaints() -> Vec<Complaint> {
    let now = Utc::now();
    vec![
        Complaint {
            complaint_id: "CMP2001".to_string(),
            category: "Waste Burning".to_string(),
            description: "Large pile of garbage being burned at night in Chandni Chowk."
                .to_string(),
            status: ComplaintStatus::InProgress,
            priority: Priority::High,
            submitted_at: now - ChronoDuration::days(3),
            officer_assigned: "Officer Sharma".to_string(),
        },
        Complaint {
            complaint_id: "CMP2002".to_string(),
            category: "Construction Dust".to_string(),
            description: "Construction site in Cyber City not using water sprinklers, causing massive dust clouds.".to_string(),
            status: ComplaintStatus::Submitted,
            priority: Priority::Medium,
            submitted_at: now - ChronoDuration::days(1),
            officer_assigned: "Unassigned".to_string(),
        },
        Complaint {
            complaint_id: "CMP2003".to_string(),
            category: "Stubble Burning".to_string(),
            description: "Visible smoke from stubble burning near GT Karnal Road.".to_string(),
            status: ComplaintStatus::Resolved,
            priority: Priority::Critical,
            submitted_at: now - ChronoDuration::days(10),
            officer_assigned: "Officer Singh".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::SeverityCategory;
    use tokio_test::assert_ok;

    async fn provider() -> MockProvider {
        let storage = Storage::new("sqlite::memory:").await.unwrap();
        MockProvider::new(storage, false)
    }

    #[tokio::test]
    async fn test_demo_login() {
        let provider = provider().await;

        let ok = provider.authenticate("demo", "demo123").await.unwrap();
        assert!(ok.success);
        assert_eq!(ok.user.unwrap().user_id, "USR1001");

        let bad = provider.authenticate("demo", "wrong").await.unwrap();
        assert!(!bad.success);
        assert_eq!(bad.error.as_deref(), Some("Invalid username or password"));
    }

    #[tokio::test]
    async fn test_register_assigns_id() {
        let provider = provider().await;

        let response = provider
            .register("Asha Verma", "asha", "asha@example.com")
            .await
            .unwrap();
        let user = response.user.unwrap();

        assert!(user.user_id.starts_with("USR"));
        assert_eq!(user.username, "asha");
        assert_eq!(user.city, "Delhi");
    }

    #[tokio::test]
    async fn test_snapshot_is_very_poor() {
        let snapshot = provider().await.fetch_snapshot().await.unwrap();

        assert_eq!(snapshot.reading.aqi, 388);
        assert_eq!(
            SeverityCategory::from_aqi(snapshot.reading.aqi),
            SeverityCategory::VeryPoor
        );
        assert_eq!(snapshot.forecast.len(), 7);
        assert_eq!(snapshot.forecast[0].label, "Now");
        assert_eq!(snapshot.forecast[2].aqi, 410);
    }

    #[tokio::test]
    async fn test_demo_complaints_seeded_once() {
        let provider = provider().await;

        let first = provider.fetch_complaints("USR1001").await.unwrap();
        let second = provider.fetch_complaints("USR1001").await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        // Newest first: 1, 3 and 10 days old
        let ids: Vec<_> = first.iter().map(|c| c.complaint_id.as_str()).collect();
        assert_eq!(ids, vec!["CMP2002", "CMP2001", "CMP2003"]);
    }

    #[tokio::test]
    async fn test_submitted_complaint_is_listed() {
        let provider = provider().await;

        let receipt = provider
            .submit_complaint(&NewComplaint {
                user_id: "USR1001".to_string(),
                category: "Vehicle Emission".to_string(),
                description: "Bus emitting black smoke".to_string(),
                priority: Priority::Low,
            })
            .await
            .unwrap();

        assert!(receipt.complaint_id.starts_with("CMP"));
        assert_eq!(receipt.complaint_id.len(), 7);
        assert_eq!(receipt.assigned_officer, "Officer Priya Singh");

        let listed = provider.fetch_complaints("USR1001").await.unwrap();
        assert_eq!(listed.len(), 4);
        assert_eq!(listed[0].complaint_id, receipt.complaint_id);
        assert_eq!(listed[0].status, ComplaintStatus::Submitted);
        assert_eq!(listed[0].priority, Priority::Low);
    }

    #[tokio::test]
    async fn test_concurrent_first_listings_see_full_seed() {
        let provider = provider().await;

        let (a, b) = tokio::join!(
            provider.fetch_complaints("USR1001"),
            provider.fetch_complaints("USR1001"),
        );

        let (a, b) = (assert_ok!(a), assert_ok!(b));
        assert_eq!(a.len(), 3);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_taken_ids_are_skipped_then_refused() {
        let provider = provider().await;
        let complaint = NewComplaint {
            user_id: "USR7".to_string(),
            category: "Waste Burning".to_string(),
            description: "Smoke".to_string(),
            priority: Priority::Medium,
        };

        let first = assert_ok!(
            provider
                .record_complaint(&complaint, ["CMP1000".to_string()])
                .await
        );
        assert_eq!(first.complaint_id, "CMP1000");

        let second = assert_ok!(
            provider
                .record_complaint(&complaint, ["CMP1000".to_string(), "CMP1001".to_string()])
                .await
        );
        assert_eq!(second.complaint_id, "CMP1001");

        let refused = provider
            .record_complaint(&complaint, ["CMP1000".to_string(), "CMP1001".to_string()])
            .await;
        assert!(matches!(refused, Err(FetchError::Unavailable(_))));
        assert_eq!(provider.storage.count_complaints("USR7").await.unwrap(), 2);
    }
}
