// src/cli/status.rs — Config and session state display

use super::app::App;
use crate::infra::paths;
use crate::session::SessionStatus;
use crate::util::mask_secret;

pub fn show_status(app: &App, ephemeral: bool) -> anyhow::Result<()> {
    println!("nekota v{}", env!("CARGO_PKG_VERSION"));
    println!();

    let config_path = paths::config_file_path();
    if config_path.exists() {
        println!("  Config:     {} (loaded)", config_path.display());
    } else {
        println!("  Config:     (using defaults)");
    }
    println!("  Backend:    {}", app.gateway().base_url());

    if ephemeral {
        println!("  Storage:    (in memory)");
    } else {
        println!("  Storage:    {}", app.config.session.storage_path().display());
    }

    let status = match app.session.status() {
        SessionStatus::Uninitialized => "not restored",
        SessionStatus::Restoring => "restoring",
        SessionStatus::Ready => "ready",
    };
    println!("  Session:    {status}");

    match app.session.current() {
        Some(session) => {
            println!("  User:       {}", session.user.id);
            println!("  Token:      {}", mask_secret(&session.token));
        }
        None => println!("  User:       (not logged in)"),
    }
    Ok(())
}
