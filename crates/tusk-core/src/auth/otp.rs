//! OTP verification flow: email-existence check, code entry, validation,
//! resend with cooldown.
//!
//! The challenge is an explicit state machine. The resend cooldown is a
//! single deadline (`resend_available_at`); remaining seconds are derived by
//! subtraction, so there is no timer task to cancel on teardown.

use std::sync::LazyLock;
use std::time::{Duration, Instant};

use regex::Regex;

use crate::api::types::{
    EmailExistsResponse, MessageResponse, OtpSendRequest, OtpValidateRequest, OtpValidateResponse,
};
use crate::api::{ApiClient, ApiErrorKind, FlowError};

/// Number of digit boxes in an OTP code.
pub const OTP_LEN: usize = 4;

/// Window during which resend stays disabled after each send.
pub const RESEND_COOLDOWN: Duration = Duration::from_secs(30);

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Returns whether the string is an RFC-plausible email address.
pub fn is_plausible_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}

/// State of the current validation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpAttempt {
    /// User is editing digits.
    Editing,
    /// A validation request is in flight; further submits are ignored.
    Submitting,
    /// Server accepted the code; the challenge is consumed.
    Verified,
    /// Server rejected the code; user may retry on the same challenge.
    Invalid(String),
}

/// A pending OTP challenge for one email address.
#[derive(Debug, Clone)]
pub struct OtpChallenge {
    email: String,
    digits: [Option<char>; OTP_LEN],
    focus: usize,
    resend_available_at: Instant,
    attempt: OtpAttempt,
}

impl OtpChallenge {
    /// Creates a fresh challenge with the resend cooldown armed.
    pub fn new(email: impl Into<String>, now: Instant) -> Self {
        Self {
            email: email.into(),
            digits: [None; OTP_LEN],
            focus: 0,
            resend_available_at: now + RESEND_COOLDOWN,
            attempt: OtpAttempt::Editing,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn attempt(&self) -> &OtpAttempt {
        &self.attempt
    }

    /// Index of the digit box that receives the next entry.
    pub fn focus(&self) -> usize {
        self.focus
    }

    /// Returns true once all boxes are filled.
    pub fn is_complete(&self) -> bool {
        self.digits.iter().all(Option::is_some)
    }

    /// The concatenated code, in entry order, once complete.
    pub fn code(&self) -> Option<String> {
        self.digits.iter().copied().collect()
    }

    /// Writes a digit into the focused box and advances focus.
    ///
    /// Only single ASCII digits are accepted; anything else is rejected with
    /// a validation error and mutates nothing. Entering a digit after a
    /// rejection returns the attempt to `Editing`.
    ///
    /// # Errors
    /// Returns a validation error for non-digit input.
    pub fn enter_digit(&mut self, c: char) -> Result<(), FlowError> {
        if !c.is_ascii_digit() {
            return Err(FlowError::validation("Only digits 0-9 are allowed."));
        }
        if self.attempt == OtpAttempt::Submitting {
            return Ok(());
        }
        if matches!(self.attempt, OtpAttempt::Invalid(_)) {
            self.attempt = OtpAttempt::Editing;
        }

        self.digits[self.focus] = Some(c);
        if self.focus < OTP_LEN - 1 {
            self.focus += 1;
        }
        Ok(())
    }

    /// Clears the focused box, or moves back and clears the previous one
    /// when the focused box is already empty.
    pub fn backspace(&mut self) {
        if self.attempt == OtpAttempt::Submitting {
            return;
        }
        if self.digits[self.focus].is_none() && self.focus > 0 {
            self.focus -= 1;
        }
        self.digits[self.focus] = None;
    }

    /// Empties all boxes and resets focus (after a resend or for re-entry).
    pub fn clear_digits(&mut self) {
        self.digits = [None; OTP_LEN];
        self.focus = 0;
        if !matches!(self.attempt, OtpAttempt::Verified) {
            self.attempt = OtpAttempt::Editing;
        }
    }

    /// Seconds until resend becomes available, zero once it is.
    pub fn remaining_cooldown(&self, now: Instant) -> Duration {
        self.resend_available_at.saturating_duration_since(now)
    }

    /// Whether the cooldown deadline has passed.
    pub fn can_resend(&self, now: Instant) -> bool {
        now >= self.resend_available_at
    }

    fn rearm(&mut self, now: Instant) {
        self.clear_digits();
        self.resend_available_at = now + RESEND_COOLDOWN;
    }
}

/// Server-issued proof that an OTP was verified for an email.
///
/// Consumed by value exactly once (registration or password reset).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpProof {
    email: String,
    proof: String,
}

impl OtpProof {
    pub(crate) fn new(email: impl Into<String>, proof: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            proof: proof.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub(crate) fn secret(&self) -> &str {
        &self.proof
    }
}

/// Outcome of a validation submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpValidation {
    /// Server accepted the code.
    Verified(OtpProof),
    /// Server rejected the code; the challenge stays open for retry.
    Rejected(String),
    /// A submit was already in flight; this one was ignored.
    InFlight,
}

/// Orchestrates the email → OTP → verification sequence.
pub struct OtpFlow<'a> {
    client: &'a ApiClient,
}

impl<'a> OtpFlow<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Checks whether an account exists for `email`.
    ///
    /// The email format is validated locally first; a malformed address
    /// never reaches the network. A transport failure is surfaced as an
    /// error, never conflated with "email found" or "email free".
    ///
    /// # Errors
    /// Returns a validation error for a malformed address, or the API error.
    pub async fn check_email_exists(&self, email: &str) -> Result<bool, FlowError> {
        let email = email.trim();
        if !is_plausible_email(email) {
            return Err(FlowError::validation("Enter a valid email address."));
        }

        let resp: EmailExistsResponse = self
            .client
            .get_json("/v1/users/exists/", &[("email", email)])
            .await?;
        Ok(resp.exists)
    }

    /// Sends an OTP to `email` and returns the armed challenge.
    ///
    /// # Errors
    /// Returns a validation error for a malformed address, or the API error
    /// (the caller stays on the email step).
    pub async fn send_otp(&self, email: &str, now: Instant) -> Result<OtpChallenge, FlowError> {
        let email = email.trim();
        if !is_plausible_email(email) {
            return Err(FlowError::validation("Enter a valid email address."));
        }

        let _: MessageResponse = self
            .client
            .post_json("/v1/users/otp/send/", &OtpSendRequest { email })
            .await?;
        tracing::debug!("OTP sent to {email}");
        Ok(OtpChallenge::new(email, now))
    }

    /// Submits the entered code for validation.
    ///
    /// Incomplete entries are rejected locally with no network call. A
    /// submit while one is in flight is ignored. A server-side rejection
    /// leaves the challenge open for retry; only transport-level failures
    /// propagate as errors.
    ///
    /// # Errors
    /// Returns a validation error for an incomplete code, or the API error
    /// for transport/parse failures.
    pub async fn validate(
        &self,
        challenge: &mut OtpChallenge,
    ) -> Result<OtpValidation, FlowError> {
        if challenge.attempt == OtpAttempt::Submitting {
            return Ok(OtpValidation::InFlight);
        }
        let Some(code) = challenge.code() else {
            return Err(FlowError::validation("Enter all 4 digits."));
        };

        challenge.attempt = OtpAttempt::Submitting;
        let result: Result<OtpValidateResponse, _> = self
            .client
            .post_json(
                "/v1/users/otp/validate/",
                &OtpValidateRequest {
                    email: &challenge.email,
                    otp: &code,
                },
            )
            .await;

        match result {
            Ok(resp) if resp.is_verified() => {
                challenge.attempt = OtpAttempt::Verified;
                let proof = resp.token.unwrap_or(code);
                Ok(OtpValidation::Verified(OtpProof::new(
                    challenge.email.clone(),
                    proof,
                )))
            }
            Ok(resp) => {
                let message = resp
                    .message
                    .unwrap_or_else(|| "Invalid code. Try again.".to_string());
                challenge.attempt = OtpAttempt::Invalid(message.clone());
                Ok(OtpValidation::Rejected(message))
            }
            // A 4xx rejection keeps the challenge open; only transport-level
            // failures propagate.
            Err(e) if matches!(e.kind, ApiErrorKind::Api | ApiErrorKind::Duplicate) => {
                challenge.attempt = OtpAttempt::Invalid(e.message.clone());
                Ok(OtpValidation::Rejected(e.message))
            }
            Err(e) => {
                challenge.attempt = OtpAttempt::Editing;
                Err(e.into())
            }
        }
    }

    /// Re-sends the OTP once the cooldown has elapsed, clearing the digits
    /// and re-arming the 30-second deadline.
    ///
    /// # Errors
    /// Returns a validation error while the cooldown is active, or the API
    /// error (the cooldown is only re-armed on success).
    pub async fn resend(
        &self,
        challenge: &mut OtpChallenge,
        now: Instant,
    ) -> Result<(), FlowError> {
        if !challenge.can_resend(now) {
            let remaining = challenge.remaining_cooldown(now).as_secs().max(1);
            return Err(FlowError::validation(format!(
                "Please wait {remaining}s before resending."
            )));
        }

        let _: MessageResponse = self
            .client
            .post_json(
                "/v1/users/otp/send/",
                &OtpSendRequest {
                    email: &challenge.email,
                },
            )
            .await?;
        challenge.rearm(now);
        tracing::debug!("OTP re-sent to {}", challenge.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge() -> OtpChallenge {
        OtpChallenge::new("a@b.com", Instant::now())
    }

    /// Digits fill in entry order and focus auto-advances.
    #[test]
    fn test_digit_entry_advances_focus() {
        let mut c = challenge();
        assert_eq!(c.focus(), 0);

        c.enter_digit('1').unwrap();
        c.enter_digit('2').unwrap();
        assert_eq!(c.focus(), 2);
        assert!(!c.is_complete());
        assert_eq!(c.code(), None);

        c.enter_digit('3').unwrap();
        c.enter_digit('4').unwrap();
        assert!(c.is_complete());
        assert_eq!(c.code().as_deref(), Some("1234"));
    }

    /// Non-numeric input is rejected and mutates nothing.
    #[test]
    fn test_non_numeric_input_rejected() {
        let mut c = challenge();
        c.enter_digit('7').unwrap();

        for bad in ['a', ' ', '-', 'é'] {
            assert!(c.enter_digit(bad).is_err(), "input: {bad:?}");
        }
        assert_eq!(c.focus(), 1);
        assert!(!c.is_complete());
    }

    /// Backspace clears the focused box, or moves back when it is empty.
    #[test]
    fn test_backspace_moves_to_previous_box() {
        let mut c = challenge();
        c.enter_digit('1').unwrap();
        c.enter_digit('2').unwrap();

        // Focused box (2) is empty: move back and clear box 1.
        c.backspace();
        assert_eq!(c.focus(), 1);
        c.backspace();
        assert_eq!(c.focus(), 0);
        c.backspace();
        assert_eq!(c.focus(), 0);
        assert_eq!(c.code(), None);
    }

    /// The last box overwrites in place so a typo can be corrected.
    #[test]
    fn test_last_box_overwrites() {
        let mut c = challenge();
        for d in ['1', '2', '3', '4'] {
            c.enter_digit(d).unwrap();
        }
        c.enter_digit('9').unwrap();
        assert_eq!(c.code().as_deref(), Some("1239"));
    }

    /// Resend is disabled for exactly the cooldown window, then enabled.
    #[test]
    fn test_cooldown_deadline() {
        let start = Instant::now();
        let c = OtpChallenge::new("a@b.com", start);

        assert!(!c.can_resend(start));
        assert_eq!(c.remaining_cooldown(start), RESEND_COOLDOWN);

        let almost = start + RESEND_COOLDOWN - Duration::from_millis(1);
        assert!(!c.can_resend(almost));

        let elapsed = start + RESEND_COOLDOWN;
        assert!(c.can_resend(elapsed));
        assert_eq!(c.remaining_cooldown(elapsed), Duration::ZERO);
    }

    /// Rearm resets digits, focus and the deadline.
    #[test]
    fn test_rearm_resets_state() {
        let start = Instant::now();
        let mut c = OtpChallenge::new("a@b.com", start);
        c.enter_digit('1').unwrap();
        c.attempt = OtpAttempt::Invalid("Invalid code".to_string());

        let later = start + RESEND_COOLDOWN;
        c.rearm(later);

        assert_eq!(c.code(), None);
        assert_eq!(c.focus(), 0);
        assert_eq!(*c.attempt(), OtpAttempt::Editing);
        assert_eq!(c.remaining_cooldown(later), RESEND_COOLDOWN);
    }

    /// Entering a digit after a rejection returns to Editing.
    #[test]
    fn test_digit_entry_clears_invalid_state() {
        let mut c = challenge();
        c.attempt = OtpAttempt::Invalid("Invalid code".to_string());

        c.enter_digit('5').unwrap();
        assert_eq!(*c.attempt(), OtpAttempt::Editing);
    }

    /// A submit while one is already in flight is ignored: no request is
    /// issued and the attempt state is untouched.
    #[tokio::test]
    async fn test_validate_while_submitting_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        // Nothing listens here; any request would surface as a transport
        // error instead of InFlight.
        let client = crate::api::ApiClient::with_base_url(
            "http://127.0.0.1:1",
            crate::session::SessionStore::at(dir.path().join("session.json")),
        );
        let flow = OtpFlow::new(&client);

        let mut c = challenge();
        for d in ['1', '2', '3', '4'] {
            c.enter_digit(d).unwrap();
        }
        c.attempt = OtpAttempt::Submitting;

        let outcome = flow.validate(&mut c).await.unwrap();
        assert_eq!(outcome, OtpValidation::InFlight);
        assert_eq!(*c.attempt(), OtpAttempt::Submitting);
    }

    /// While a submit is in flight, edits are ignored.
    #[test]
    fn test_edits_ignored_while_submitting() {
        let mut c = challenge();
        c.enter_digit('1').unwrap();
        c.attempt = OtpAttempt::Submitting;

        c.enter_digit('2').unwrap();
        c.backspace();
        assert_eq!(c.focus(), 1);
        assert_eq!(c.digits[0], Some('1'));
        assert_eq!(c.digits[1], None);
    }

    /// Email plausibility check.
    #[test]
    fn test_email_plausibility() {
        assert!(is_plausible_email("a@b.com"));
        assert!(is_plausible_email("first.last+tag@sub.domain.co"));
        assert!(!is_plausible_email(""));
        assert!(!is_plausible_email("no-at-sign.com"));
        assert!(!is_plausible_email("user@"));
        assert!(!is_plausible_email("user@domain"));
        assert!(!is_plausible_email("user@domain."));
    }
}
