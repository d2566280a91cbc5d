//! Authentication flows: login, registration, password reset, logout.
//!
//! Every flow that establishes a session clears the stored tokens first so a
//! stale session can never outlive a failed attempt, and persists the new
//! pair only on success.

pub mod otp;

pub use otp::{OtpChallenge, OtpFlow, OtpProof, OtpValidation};
use serde::Deserialize;

use crate::api::types::{AuthTokens, ForgotPasswordRequest, LoginRequest, RegisterRequest};
use crate::api::{ApiClient, FlowError};
use crate::session::mask_token;

/// Profile fields collected after OTP verification, consumed exactly once
/// by the register call. The email comes from the verified proof.
#[derive(Debug, Clone)]
pub struct RegistrationDraft {
    otp: OtpProof,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegistrationDraft {
    pub fn new(
        otp: OtpProof,
        username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            otp,
            username: username.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            password: password.into(),
        }
    }

    pub fn email(&self) -> &str {
        self.otp.email()
    }

    fn validate(&self) -> Result<(), FlowError> {
        if self.username.trim().is_empty() {
            return Err(FlowError::validation("Username is required."));
        }
        if self.password.is_empty() {
            return Err(FlowError::validation("Password is required."));
        }
        Ok(())
    }
}

/// Orchestrates session-establishing operations.
pub struct AuthFlow<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthFlow<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Logs in with an email-or-username identifier.
    ///
    /// Clears any existing session before the request and persists the
    /// returned token pair on success. On failure the server's message is
    /// surfaced verbatim and nothing is written to the store.
    ///
    /// # Errors
    /// Returns a validation error for empty fields, or the API error.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<(), FlowError> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(FlowError::validation("Email or username is required."));
        }
        if password.is_empty() {
            return Err(FlowError::validation("Password is required."));
        }

        self.client.store().clear();
        let tokens: AuthTokens = self
            .client
            .post_json(
                "/v1/users/login/",
                &LoginRequest {
                    email_or_username: identifier,
                    password,
                },
            )
            .await?;

        self.persist(&tokens);
        Ok(())
    }

    /// Registers a new account using the OTP proof carried by the draft.
    ///
    /// A duplicate email surfaces as [`crate::api::ApiErrorKind::Duplicate`]
    /// so the caller can steer the user to login instead of retrying.
    ///
    /// # Errors
    /// Returns a validation error for empty fields, or the API error.
    pub async fn register(&self, draft: RegistrationDraft) -> Result<(), FlowError> {
        draft.validate()?;

        self.client.store().clear();
        let tokens: AuthTokens = self
            .client
            .post_json(
                "/v1/users/register/",
                &RegisterRequest {
                    email: draft.otp.email(),
                    otp: draft.otp.secret(),
                    username: draft.username.trim(),
                    first_name: draft.first_name.trim(),
                    last_name: draft.last_name.trim(),
                    password: &draft.password,
                },
            )
            .await?;

        self.persist(&tokens);
        Ok(())
    }

    /// Resets the password for the proof's email, consuming the proof.
    ///
    /// When the server returns a token pair a session is established
    /// immediately; otherwise the user logs in with the new password.
    ///
    /// # Errors
    /// Returns a validation error for an empty password, or the API error.
    pub async fn reset_password(
        &self,
        proof: OtpProof,
        new_password: &str,
    ) -> Result<(), FlowError> {
        if new_password.is_empty() {
            return Err(FlowError::validation("New password is required."));
        }

        let response: serde_json::Value = self
            .client
            .post_json(
                "/v1/users/forgot-password/",
                &ForgotPasswordRequest {
                    new_password,
                    confirm_password: new_password,
                    otp: proof.secret(),
                    email: proof.email(),
                },
            )
            .await?;

        if let Ok(tokens) = AuthTokens::deserialize(&response) {
            self.client.store().clear();
            self.persist(&tokens);
        }
        Ok(())
    }

    /// Clears the stored session. Returns whether one existed.
    pub fn logout(&self) -> bool {
        self.client.store().clear()
    }

    fn persist(&self, tokens: &AuthTokens) {
        self.client.store().save(&tokens.access, &tokens.refresh);
        tracing::debug!("Session established ({})", mask_token(&tokens.access));
    }
}
