use serde::{Deserialize, Serialize};

/// An operator allowed into the admin surface. Rows are seeded out of band and
/// only ever read by the API.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct AdminUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub azure_id: Option<String>, // directory object id (`oid`) of the operator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub is_admin: bool,
    pub active: bool,
}

impl AdminUser {
    pub fn can_administer(&self) -> bool {
        self.is_admin && self.active
    }
}
