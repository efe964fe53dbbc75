//! Auth command handlers.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use jobdeck_core::session::user::{Entitlement, Role, has_entitlement};
use jobdeck_core::session::{SessionStatus, mask_token};

use super::Controller;

pub async fn login(controller: &Controller, email: &str, password: Option<String>) -> Result<()> {
    if controller.session().status() == SessionStatus::Authenticated {
        anyhow::bail!("Already logged in. Run `jobdeck logout` first.");
    }

    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };

    let user = controller
        .login(email, &password)
        .await
        .map_err(auth_failure)?;

    let token = controller.session().access_token().unwrap_or_default();
    println!("✓ Logged in as {} <{}> (token: {})", user.name, user.email, mask_token(&token));
    Ok(())
}

pub async fn register(
    controller: &Controller,
    name: &str,
    email: &str,
    password: Option<String>,
    role: &str,
) -> Result<()> {
    if controller.session().status() == SessionStatus::Authenticated {
        anyhow::bail!("Already logged in. Run `jobdeck logout` first.");
    }

    let role = match role {
        "employer" => Role::Employer,
        "candidate" => Role::Candidate,
        other => anyhow::bail!("Unknown role '{other}'. Use employer or candidate."),
    };

    let password = match password {
        Some(password) => password,
        None => prompt_password()?,
    };

    let request = jobdeck_core::api::types::RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        password,
        role,
    };
    let user = controller.register(&request).await.map_err(auth_failure)?;

    println!("✓ Registered and logged in as {} <{}>", user.name, user.email);
    Ok(())
}

pub async fn logout(controller: &Controller) -> Result<()> {
    if controller.session().status() != SessionStatus::Authenticated {
        println!("Not logged in (no cached session).");
        return Ok(());
    }

    controller.logout().await;
    println!("✓ Logged out");
    Ok(())
}

pub fn whoami(controller: &Controller) -> Result<()> {
    let session = controller.session().snapshot();
    let Some(user) = session.user else {
        anyhow::bail!("Not logged in. Run `jobdeck login` first.");
    };

    println!("{} <{}>", user.name, user.email);
    println!("  role:       {}", user.role.display_name());
    if let Some(headline) = user.headline.as_deref() {
        println!("  headline:   {headline}");
    }
    println!(
        "  auto-apply: {}",
        if has_entitlement(&user, Entitlement::AutoApply) {
            "enabled"
        } else {
            "not included in plan"
        }
    );
    if let Some(token) = session.access_token.as_deref() {
        println!("  token:      {}", mask_token(token));
    }
    Ok(())
}

pub async fn refresh(controller: &Controller) -> Result<()> {
    if controller.session().status() != SessionStatus::Authenticated {
        anyhow::bail!("Not logged in. Run `jobdeck login` first.");
    }

    controller.refresh_token().await?;
    let token = controller.session().access_token().unwrap_or_default();
    println!("✓ Access token refreshed (token: {})", mask_token(&token));
    Ok(())
}

/// Reads a password from stdin.
fn prompt_password() -> Result<String> {
    print!("Password: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    let password = input.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty");
    }
    Ok(password)
}

/// Keeps the invalid-credentials case distinguishable in the output.
fn auth_failure(err: jobdeck_core::api::ApiError) -> anyhow::Error {
    match err.kind {
        jobdeck_core::api::ApiErrorKind::Auth => {
            anyhow::anyhow!("Login failed: {}", err.message)
        }
        jobdeck_core::api::ApiErrorKind::Network => {
            anyhow::anyhow!("Could not reach the server: {}", err.message)
        }
        _ => err.into(),
    }
}
