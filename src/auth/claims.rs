use serde_json::{Map, Value};

/// Claims checked, in priority order, for the caller's email.
pub const EMAIL_CLAIMS: [&str; 3] = ["preferred_username", "email", "upn"];
/// Claims checked, in priority order, for the caller's directory object id.
pub const OBJECT_ID_CLAIMS: [&str; 2] = ["oid", "sub"];

const SCOPE_CLAIM: &str = "scp";
const ROLES_CLAIM: &str = "roles";

/// Who a verified bearer token says the caller is.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub email: Option<String>,
    pub object_id: Option<String>,
    pub claims: Map<String, Value>,
}

fn first_string_claim(claims: &Map<String, Value>, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| {
            claims
                .get(*name)
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
        })
        .map(str::to_string)
}

impl Identity {
    /// `None` when the payload names neither an email nor an object id.
    pub fn from_claims(claims: Map<String, Value>) -> Option<Self> {
        let email = first_string_claim(&claims, &EMAIL_CLAIMS);
        let object_id = first_string_claim(&claims, &OBJECT_ID_CLAIMS);

        if email.is_none() && object_id.is_none() {
            return None;
        }

        Some(Self {
            email,
            object_id,
            claims,
        })
    }

    /// Delegated tokens carry space-separated scopes in `scp`; application
    /// tokens carry a `roles` array. Either may satisfy the requirement.
    pub fn has_scope_or_role(&self, required: &str) -> bool {
        let in_scopes = self
            .claims
            .get(SCOPE_CLAIM)
            .and_then(Value::as_str)
            .map(|scp| scp.split(' ').any(|s| s == required))
            .unwrap_or(false);

        let in_roles = self
            .claims
            .get(ROLES_CLAIM)
            .and_then(Value::as_array)
            .map(|roles| roles.iter().any(|r| r.as_str() == Some(required)))
            .unwrap_or(false);

        in_scopes || in_roles
    }
}
