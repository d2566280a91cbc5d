//! Login, logout, registration and password-reset commands.

use std::time::Instant;

use anyhow::Result;
use tusk_core::api::ApiClient;
use tusk_core::auth::otp::OTP_LEN;
use tusk_core::auth::{AuthFlow, OtpFlow, OtpProof, OtpValidation, RegistrationDraft};
use tusk_core::session::SessionStore;

use super::{api_client, flag_or_prompt, prompt_line, render_flow_error};

pub async fn login(identifier: &str, password: Option<String>) -> Result<()> {
    let client = api_client()?;
    let password = flag_or_prompt(password, "Password: ")?;

    AuthFlow::new(&client)
        .login(identifier, &password)
        .await
        .map_err(render_flow_error)?;

    println!("Logged in as {identifier}.");
    Ok(())
}

pub fn logout() -> Result<()> {
    if SessionStore::new().clear() {
        println!("Logged out.");
    } else {
        println!("No active session.");
    }
    Ok(())
}

pub async fn register(
    email: &str,
    username: &str,
    first_name: &str,
    last_name: &str,
    password: Option<String>,
) -> Result<()> {
    let client = api_client()?;

    let exists = OtpFlow::new(&client)
        .check_email_exists(email)
        .await
        .map_err(render_flow_error)?;
    if exists {
        anyhow::bail!("An account already exists for {email}. Try `tusk login` instead.");
    }

    let proof = verify_otp(&client, email).await?;
    let password = flag_or_prompt(password, "Password: ")?;
    let draft = RegistrationDraft::new(proof, username, first_name, last_name, password);

    AuthFlow::new(&client)
        .register(draft)
        .await
        .map_err(render_flow_error)?;

    println!("Welcome, {username}! You are signed in.");
    Ok(())
}

pub async fn reset_password(email: &str, new_password: Option<String>) -> Result<()> {
    let client = api_client()?;

    let exists = OtpFlow::new(&client)
        .check_email_exists(email)
        .await
        .map_err(render_flow_error)?;
    if !exists {
        anyhow::bail!("No account found for {email}.");
    }

    let proof = verify_otp(&client, email).await?;
    let new_password = flag_or_prompt(new_password, "New password: ")?;

    AuthFlow::new(&client)
        .reset_password(proof, &new_password)
        .await
        .map_err(render_flow_error)?;

    println!("Password updated.");
    Ok(())
}

/// Sends an OTP and drives the entry/resend loop until the server accepts
/// a code.
async fn verify_otp(client: &ApiClient, email: &str) -> Result<OtpProof> {
    let flow = OtpFlow::new(client);
    let mut challenge = flow
        .send_otp(email, Instant::now())
        .await
        .map_err(render_flow_error)?;
    println!("We sent a 4-digit code to {email}.");

    loop {
        let input = prompt_line("Code (blank to resend): ")?;

        if input.is_empty() {
            let now = Instant::now();
            if challenge.can_resend(now) {
                flow.resend(&mut challenge, now)
                    .await
                    .map_err(render_flow_error)?;
                println!("Code re-sent to {email}.");
            } else {
                let wait = challenge.remaining_cooldown(now).as_secs().max(1);
                println!("You can resend in {wait}s.");
            }
            continue;
        }

        if input.chars().count() != OTP_LEN {
            eprintln!("Enter the {OTP_LEN}-digit code.");
            continue;
        }

        challenge.clear_digits();
        if let Some(err) = input
            .chars()
            .find_map(|c| challenge.enter_digit(c).err())
        {
            eprintln!("{err}");
            challenge.clear_digits();
            continue;
        }

        match flow
            .validate(&mut challenge)
            .await
            .map_err(render_flow_error)?
        {
            OtpValidation::Verified(proof) => return Ok(proof),
            OtpValidation::Rejected(message) => {
                eprintln!("{message}");
                challenge.clear_digits();
            }
            OtpValidation::InFlight => {}
        }
    }
}
