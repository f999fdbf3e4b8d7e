use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_HOURLY_RATE: u32 = 500;
pub const DEFAULT_ADVANCE_PAYMENT: u32 = 200;
pub const DEFAULT_AVAILABLE_TIMES: &str = "9 AM - 6 PM";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub user_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Service-provider profile. Shares its id with the owning account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub service_types: Vec<String>,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub total_ratings: u32,
    pub hourly_rate: u32,
    pub advance_payment: u32,
    pub available_times: String,
    #[serde(default)]
    pub previous_works: Vec<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub created_at: DateTime<Utc>,
}

/// Optional worker fields supplied at signup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerDetails {
    #[serde(alias = "serviceType")]
    pub service_types: Vec<String>,
    pub hourly_rate: Option<u32>,
    pub advance_payment: Option<u32>,
    pub available_times: Option<String>,
    pub bio: Option<String>,
    pub experience: Option<String>,
    pub location: Option<String>,
    /// Account address; older clients send it alongside the worker fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Fields a worker may edit on their own profile. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkerUpdate {
    pub phone: Option<String>,
    pub service_types: Option<Vec<String>>,
    pub hourly_rate: Option<u32>,
    pub advance_payment: Option<u32>,
    pub available_times: Option<String>,
    pub previous_works: Option<Vec<String>>,
    pub bio: Option<String>,
    pub experience: Option<String>,
    pub location: Option<String>,
}

impl WorkerProfile {
    pub fn new(user_id: Uuid, name: String, email: String, phone: String, details: WorkerDetails) -> Self {
        Self {
            id: user_id,
            user_id,
            name,
            email,
            phone,
            service_types: details.service_types,
            rating: 0.0,
            total_ratings: 0,
            hourly_rate: details.hourly_rate.unwrap_or(DEFAULT_HOURLY_RATE),
            advance_payment: details.advance_payment.unwrap_or(DEFAULT_ADVANCE_PAYMENT),
            available_times: details
                .available_times
                .unwrap_or_else(|| DEFAULT_AVAILABLE_TIMES.to_string()),
            previous_works: Vec::new(),
            bio: details.bio.unwrap_or_default(),
            experience: details.experience.unwrap_or_default(),
            location: details.location.unwrap_or_default(),
            verified: false,
            reviews: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn offers(&self, service_id: &str) -> bool {
        self.service_types.iter().any(|s| s == service_id)
    }

    /// Fold a new rating into the running average and keep the review.
    pub fn add_rating(&mut self, user_id: Uuid, rating: u8, review: Option<String>) {
        let previous_total = self.rating * f64::from(self.total_ratings);
        self.total_ratings += 1;
        self.rating = (previous_total + f64::from(rating)) / f64::from(self.total_ratings);
        self.reviews.push(Review {
            user_id,
            rating,
            review,
            created_at: Utc::now(),
        });
    }

    pub fn apply(&mut self, update: WorkerUpdate) {
        if let Some(v) = update.phone {
            self.phone = v;
        }
        if let Some(v) = update.service_types {
            self.service_types = v;
        }
        if let Some(v) = update.hourly_rate {
            self.hourly_rate = v;
        }
        if let Some(v) = update.advance_payment {
            self.advance_payment = v;
        }
        if let Some(v) = update.available_times {
            self.available_times = v;
        }
        if let Some(v) = update.previous_works {
            self.previous_works = v;
        }
        if let Some(v) = update.bio {
            self.bio = v;
        }
        if let Some(v) = update.experience {
            self.experience = v;
        }
        if let Some(v) = update.location {
            self.location = v;
        }
    }
}
