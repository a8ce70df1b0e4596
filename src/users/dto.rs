use serde::{Deserialize, Serialize};

use crate::users::entity::{NewUser, UserPatch};

/// Request body for user registration. Missing fields come through as empty
/// strings and are caught by validation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl From<RegisterRequest> for NewUser {
    fn from(r: RegisterRequest) -> Self {
        Self {
            username: r.username,
            email: r.email,
            password: r.password,
        }
    }
}

/// Request body for a partial update. Absent and empty fields both mean
/// "leave unchanged".
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.filter(|s| !s.is_empty())
}

impl From<UpdateRequest> for UserPatch {
    fn from(r: UpdateRequest) -> Self {
        Self {
            username: non_empty(r.username),
            email: non_empty(r.email),
            password: non_empty(r.password),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

/// `{"status":"success","data":...}`
#[derive(Debug, Serialize)]
pub struct DataEnvelope<T> {
    pub status: Status,
    pub data: T,
}

impl<T> DataEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: Status::Success,
            data,
        }
    }
}

/// `{"status":"success"|"error","message":...}`
#[derive(Debug, Serialize)]
pub struct MessageEnvelope {
    pub status: Status,
    pub message: String,
}

impl MessageEnvelope {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_tolerates_missing_fields() {
        let req: RegisterRequest = serde_json::from_str(r#"{"username":"ann"}"#).unwrap();
        assert_eq!(req.username, "ann");
        assert!(req.email.is_empty());
        assert!(req.password.is_empty());
    }

    #[test]
    fn empty_update_fields_become_none() {
        let req: UpdateRequest =
            serde_json::from_str(r#"{"username":"","email":"a@b.co","password":""}"#).unwrap();
        let patch = UserPatch::from(req);
        assert_eq!(patch.username, None);
        assert_eq!(patch.email.as_deref(), Some("a@b.co"));
        assert_eq!(patch.password, None);
    }

    #[test]
    fn envelopes_have_expected_shape() {
        let ok = serde_json::to_value(DataEnvelope::success(vec![1, 2])).unwrap();
        assert_eq!(ok, serde_json::json!({"status": "success", "data": [1, 2]}));

        let err = serde_json::to_value(MessageEnvelope::error("user not found")).unwrap();
        assert_eq!(
            err,
            serde_json::json!({"status": "error", "message": "user not found"})
        );
    }
}
