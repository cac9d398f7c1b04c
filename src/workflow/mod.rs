pub mod assessment_session;
pub mod exam_ctx;
pub mod page_actions;

pub use assessment_session::AssessmentSession;
pub use exam_ctx::ExamCtx;
pub use page_actions::{register_page_actions, register_registration_action};
