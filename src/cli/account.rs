// src/cli/account.rs — login / register / logout / whoami / verify / premium

use chrono::{DateTime, Utc};

use super::app::App;
use super::PremiumAction;
use crate::infra::errors::NekotaError;
use crate::routes::Route;
use crate::session::user::UserRecord;

pub async fn run_login(
    app: &App,
    device: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> anyhow::Result<()> {
    let result = match (device, email) {
        (Some(device), _) => app.flow.login_with_device(&device).await,
        (None, Some(email)) => {
            let password = match password {
                Some(p) => p,
                None => prompt_password()?,
            };
            app.flow.login_with_credentials(&email, &password).await
        }
        (None, None) => {
            return Err(anyhow::anyhow!(
                "Pass --device <number> or --email <address>"
            ))
        }
    };

    match result {
        Ok(user) => {
            println!("Logged in as {}", display_name(&user));
            Ok(())
        }
        Err(e) => Err(explain(e)),
    }
}

fn prompt_password() -> anyhow::Result<String> {
    match inquire::Password::new("Password:")
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt_skippable()
    {
        Ok(Some(p)) if !p.is_empty() => Ok(p),
        Ok(_) => Err(anyhow::anyhow!("Login cancelled")),
        Err(e) => Err(anyhow::anyhow!("Could not read password: {e}")),
    }
}

pub async fn run_register(app: &App, device: &str, name: Option<&str>) -> anyhow::Result<()> {
    let user = app
        .flow
        .register_device(device, name)
        .await
        .map_err(explain)?;
    println!("Registered device {device} as {}", display_name(&user));
    Ok(())
}

pub async fn run_logout(app: &App) -> anyhow::Result<()> {
    let was_logged_in = app.session.is_logged_in();
    app.session.logout().await;
    if was_logged_in {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub fn run_whoami(app: &App) -> anyhow::Result<()> {
    let user = app.require(Route::Profile).map_err(explain)?;
    println!("  Id:       {}", user.id);
    if let Some(name) = &user.name {
        println!("  Name:     {name}");
    }
    if let Some(intro) = &user.introduction {
        println!("  Intro:    {intro}");
    }
    if let Some(sub) = &user.subscription {
        println!(
            "  Plan:     {} ({})",
            sub.plan.as_deref().unwrap_or("-"),
            sub.model.as_deref().unwrap_or("-")
        );
    }
    println!("  Premium:  {}", premium_line(&user));
    if app.session.is_admin() {
        println!("  Role:     admin");
    }
    Ok(())
}

pub async fn run_verify(app: &App) -> anyhow::Result<()> {
    app.require(Route::Profile).map_err(explain)?;
    let user = app.flow.verify_session().await.map_err(explain)?;
    println!("Session is valid for {}", display_name(&user));
    Ok(())
}

pub async fn run_premium(app: &App, action: Option<PremiumAction>) -> anyhow::Result<()> {
    app.require(Route::PaymentComplete).map_err(explain)?;
    match action.unwrap_or(PremiumAction::Show) {
        PremiumAction::Show => {}
        PremiumAction::Refresh => {
            app.flow.refresh_premium_status().await.map_err(explain)?;
        }
        PremiumAction::Activate { until } => {
            let until = until.as_deref().map(parse_until).transpose()?;
            app.session.update_premium_status(true, until).await?;
        }
        PremiumAction::Deactivate => {
            app.session.update_premium_status(false, None).await?;
        }
    }
    if let Some(user) = app.session.current_user() {
        println!("Premium: {}", premium_line(&user));
    }
    Ok(())
}

fn parse_until(s: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| anyhow::anyhow!("Invalid --until '{s}': {e}"))
}

fn display_name(user: &UserRecord) -> String {
    match &user.name {
        Some(name) => format!("{name} ({})", user.id),
        None => user.id.clone(),
    }
}

fn premium_line(user: &UserRecord) -> String {
    let state = match user.premium_until {
        Some(until) if user.is_premium() => format!("active until {}", until.format("%Y-%m-%d")),
        Some(until) => format!("expired on {}", until.format("%Y-%m-%d")),
        None => "free tier".to_string(),
    };
    if user.has_local_premium_override() {
        format!("{state} (local, not yet confirmed)")
    } else {
        state
    }
}

/// Attach the user-facing sentence to the error for display.
pub(crate) fn explain(e: NekotaError) -> anyhow::Error {
    let message = if e.is_auth_failure() {
        format!("{} Run `nekota login`.", e.user_message())
    } else {
        e.user_message()
    };
    anyhow::Error::new(e).context(message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_premium_line_states() {
        assert_eq!(premium_line(&UserRecord::new("u1")), "free tier");

        let past = UserRecord::new("u1").with_premium_until(Utc::now() - Duration::days(3));
        assert!(premium_line(&past).starts_with("expired on"));

        let mut local = UserRecord::new("u1");
        local.apply_premium_override(true, None, 30, Utc::now());
        let line = premium_line(&local);
        assert!(line.starts_with("active until"));
        assert!(line.ends_with("(local, not yet confirmed)"));
    }

    #[test]
    fn test_parse_until() {
        let d = parse_until("2027-01-31T00:00:00+09:00").unwrap();
        assert_eq!(d.to_rfc3339(), "2027-01-30T15:00:00+00:00");
        assert!(parse_until("next week").is_err());
    }

    #[test]
    fn test_explain_points_auth_failures_to_login() {
        let err = explain(NekotaError::Unauthorized);
        assert_eq!(
            err.to_string(),
            "Your session has expired. Please log in again. Run `nekota login`."
        );

        let err = explain(NekotaError::ServerError {
            detail: "boom".into(),
        });
        assert!(!err.to_string().contains("nekota login"));
        assert!(err.root_cause().to_string().contains("boom"));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(&UserRecord::new("u1")), "u1");
        assert_eq!(
            display_name(&UserRecord::new("u1").with_name("Mika")),
            "Mika (u1)"
        );
    }
}
