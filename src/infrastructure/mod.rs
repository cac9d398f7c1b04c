pub mod cookie_store;
pub mod http_client;

pub use cookie_store::{CookieStore, CookieWriter, PendingWrite};
pub use http_client::{AssessmentApi, AssessmentClient, CSRF_HEADER};
