use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Booking lifecycle: pending -> accepted | rejected, accepted -> completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

impl RequestStatus {
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Accepted)
                | (RequestStatus::Pending, RequestStatus::Rejected)
                | (RequestStatus::Accepted, RequestStatus::Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    AdvancePaid,
    Paid,
}

impl PaymentStatus {
    fn rank(self) -> u8 {
        match self {
            PaymentStatus::Pending => 0,
            PaymentStatus::AdvancePaid => 1,
            PaymentStatus::Paid => 2,
        }
    }

    /// Payment only moves forward.
    pub fn can_transition_to(self, next: PaymentStatus) -> bool {
        next.rank() > self.rank()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::AdvancePaid => "advance_paid",
            PaymentStatus::Paid => "paid",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Upi,
    Card,
    Online,
}

/// A booking of one worker by one customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    #[serde(default)]
    pub user_phone: String,
    pub user_email: String,
    pub worker_id: Uuid,
    pub worker_name: String,
    pub service_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub scheduled_time: String,
    pub status: RequestStatus,
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    pub advance_amount: u32,
    pub total_amount: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ServiceRequest {
    /// Move to `next`, stamping lifecycle timestamps. Returns false on an illegal transition.
    pub fn transition(&mut self, next: RequestStatus, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = Some(now);
        match next {
            RequestStatus::Accepted => self.accepted_at = Some(now),
            RequestStatus::Completed => self.completed_at = Some(now),
            RequestStatus::Pending | RequestStatus::Rejected => {}
        }
        true
    }

    pub fn record_payment(&mut self, next: PaymentStatus, now: DateTime<Utc>) -> bool {
        if self.status == RequestStatus::Rejected || !self.payment_status.can_transition_to(next) {
            return false;
        }
        self.payment_status = next;
        self.updated_at = Some(now);
        true
    }
}
