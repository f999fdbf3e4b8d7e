pub mod request;
pub mod service;
pub mod user;
pub mod worker;

pub use request::{PaymentMethod, PaymentStatus, RequestStatus, ServiceRequest};
pub use service::{default_categories, ServiceCategory};
pub use user::{normalize_email, Role, StoredUser, UserProfile};
pub use worker::{Review, WorkerDetails, WorkerProfile, WorkerUpdate};
