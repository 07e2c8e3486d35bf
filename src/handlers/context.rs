use uuid::Uuid;

use crate::models::{Form, Submission};

pub struct HandlerContext {
    pub submission: Submission,
    pub form: Form,
    pub request: RequestInfo,
}

/// What handlers may know about the request that carried the submission.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    /// Sent with `X-Requested-With: XMLHttpRequest`.
    pub is_ajax: bool,
    /// Authenticated submitter, if any.
    pub user: Option<Uuid>,
}
