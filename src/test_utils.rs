use crate::models::domain::{AdminUser, Question, Survey};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// Question with a fixed id, text `Question <id>`
    pub fn question_with_id(id: &str) -> Question {
        let mut question = Question::new(&format!("Question {}", id), None);
        question.id = id.to_string();
        question
    }

    /// Survey with a fixed id, name `Survey <id>`
    pub fn survey_with_id(id: &str) -> Survey {
        let mut survey = Survey::new(&format!("Survey {}", id));
        survey.id = id.to_string();
        survey
    }

    /// Admin record matched by object id `oid-<id>` or email `<id>@example.com`
    pub fn admin_user(id: &str, is_admin: bool, active: bool) -> AdminUser {
        AdminUser {
            id: id.to_string(),
            azure_id: Some(format!("oid-{}", id)),
            email: Some(format!("{}@example.com", id)),
            is_admin,
            active,
        }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}
