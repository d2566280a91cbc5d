//! Wire types for the task API endpoints.
//!
//! Deserialization is deliberately lenient (aliases, defaults): the server
//! has shipped more than one field spelling for tokens and messages, and the
//! client should keep working across them.

use serde::{Deserialize, Serialize};

/// Response of `GET /v1/users/exists/`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailExistsResponse {
    #[serde(alias = "is_exists", alias = "success")]
    pub exists: bool,
}

/// Generic response carrying an optional message (OTP send, password reset).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MessageResponse {
    #[serde(alias = "detail")]
    pub message: Option<String>,
}

/// Request body for `POST /v1/users/otp/send/`.
#[derive(Debug, Clone, Serialize)]
pub struct OtpSendRequest<'a> {
    pub email: &'a str,
}

/// Request body for `POST /v1/users/otp/validate/`.
#[derive(Debug, Clone, Serialize)]
pub struct OtpValidateRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
}

/// Response of `POST /v1/users/otp/validate/`.
///
/// Two success shapes exist in the wild: a structured `success` flag and a
/// prose `"OTP Verified"` message. Both are accepted; the flag wins when
/// both are present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OtpValidateResponse {
    pub success: Option<bool>,
    #[serde(alias = "detail")]
    pub message: Option<String>,
    /// Server-issued proof token, when the API returns one.
    pub token: Option<String>,
}

impl OtpValidateResponse {
    /// Returns whether the server accepted the OTP as valid.
    pub fn is_verified(&self) -> bool {
        if let Some(success) = self.success {
            return success;
        }
        self.message
            .as_deref()
            .is_some_and(|m| m.trim().eq_ignore_ascii_case("otp verified"))
    }
}

/// Request body for `POST /v1/users/login/`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email_or_username: &'a str,
    pub password: &'a str,
}

/// Token pair returned by login, registration and password reset.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthTokens {
    #[serde(alias = "access_token")]
    pub access: String,
    #[serde(alias = "refresh_token", default)]
    pub refresh: String,
}

/// Request body for `POST /v1/users/register/`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub otp: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password: &'a str,
}

/// Request body for `POST /v1/users/forgot-password/`.
#[derive(Debug, Clone, Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub new_password: &'a str,
    pub confirm_password: &'a str,
    pub otp: &'a str,
    pub email: &'a str,
}

/// Request body for `POST /v1/tasks/`.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRequest<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub priority: &'a str,
    pub status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'a str>,
}

/// Request body for `POST /v1/tasks/prompts/`.
#[derive(Debug, Clone, Serialize)]
pub struct PromptRequest<'a> {
    pub prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_prompt: Option<&'a str>,
}

/// A task as returned by the create endpoints. Lenient: only the fields the
/// client renders, everything optional but the title.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CreatedTask {
    pub id: Option<serde_json::Value>,
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub due_date: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Structured success flag is authoritative.
    #[test]
    fn test_otp_verified_by_flag() {
        let resp: OtpValidateResponse =
            serde_json::from_str(r#"{"success": true, "message": "anything"}"#).unwrap();
        assert!(resp.is_verified());

        let resp: OtpValidateResponse =
            serde_json::from_str(r#"{"success": false, "message": "OTP Verified"}"#).unwrap();
        assert!(!resp.is_verified());
    }

    /// Prose success message is accepted case-insensitively when no flag.
    #[test]
    fn test_otp_verified_by_message() {
        for body in [
            r#"{"message": "OTP Verified"}"#,
            r#"{"message": "otp verified"}"#,
            r#"{"detail": "OTP VERIFIED"}"#,
        ] {
            let resp: OtpValidateResponse = serde_json::from_str(body).unwrap();
            assert!(resp.is_verified(), "body: {body}");
        }

        let resp: OtpValidateResponse =
            serde_json::from_str(r#"{"message": "Invalid OTP"}"#).unwrap();
        assert!(!resp.is_verified());
    }

    /// Token pair accepts both field spellings.
    #[test]
    fn test_auth_tokens_aliases() {
        let tokens: AuthTokens =
            serde_json::from_str(r#"{"access": "a", "refresh": "r"}"#).unwrap();
        assert_eq!((tokens.access.as_str(), tokens.refresh.as_str()), ("a", "r"));

        let tokens: AuthTokens =
            serde_json::from_str(r#"{"access_token": "a", "refresh_token": "r"}"#).unwrap();
        assert_eq!((tokens.access.as_str(), tokens.refresh.as_str()), ("a", "r"));
    }

    /// Task request serializes the wire field names, omitting absent options.
    #[test]
    fn test_task_request_wire_shape() {
        let req = TaskRequest {
            title: "Buy milk",
            description: "",
            priority: "high",
            status: "pending",
            due_date: None,
            kind: Some("errand"),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["type"], "errand");
        assert!(json.get("due_date").is_none());
    }
}
