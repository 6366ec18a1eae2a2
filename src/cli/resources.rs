// src/cli/resources.rs — dashboard, listings, voice upload, admin views

use std::path::Path;

use super::account::explain;
use super::app::App;
use super::{AdminAction, ResourceKind};
use crate::api::types::UploadFile;
use crate::dashboard;
use crate::routes::Route;
use crate::util::truncate_str;

pub async fn run_dashboard(app: &App, json: bool) -> anyhow::Result<()> {
    let user = app.require(Route::Dashboard).map_err(explain)?;
    let summary = dashboard::load_summary(app.gateway(), &user.id).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    let profile = summary.profile.as_ref().unwrap_or(&user);
    println!("  User:        {}", profile.name.as_deref().unwrap_or(&profile.id));
    println!("  Memories:    {}", summary.memory_count());
    println!("  Friends:     {}", summary.friend_count());
    println!(
        "  Voice model: {}",
        summary.voice_model.model.as_deref().unwrap_or("(none)")
    );
    if summary.is_partial() {
        println!();
        println!("  Some data could not be loaded: {}", summary.failed.join(", "));
    }
    Ok(())
}

pub async fn run_list(app: &App, kind: ResourceKind) -> anyhow::Result<()> {
    let route = match kind {
        ResourceKind::Memories => Route::Memories,
        ResourceKind::Friends => Route::Friends,
        ResourceKind::Voices => Route::Voices,
        ResourceKind::Alarms => Route::Alarms,
        ResourceKind::Payments => Route::Payments,
    };
    let user = app.require(route).map_err(explain)?;
    let gw = app.gateway();

    match kind {
        ResourceKind::Memories => {
            for m in gw.memory().list(&user.id).await.map_err(explain)? {
                let title = m.title.as_deref().unwrap_or("(untitled)");
                println!("  {:<10} {:<24} {}", m.id, title, truncate_str(&m.content, 60));
            }
        }
        ResourceKind::Friends => {
            for f in gw.friend().list(&user.id).await.map_err(explain)? {
                println!(
                    "  {:<10} {:<24} {}",
                    f.id,
                    f.name.as_deref().unwrap_or("-"),
                    f.status.as_deref().unwrap_or("")
                );
            }
        }
        ResourceKind::Voices => {
            for v in gw.voice().list(&user.id).await.map_err(explain)? {
                let when = v
                    .created_at
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default();
                println!(
                    "  {:<10} from {:<10} {}",
                    v.id,
                    v.sender_id.as_deref().unwrap_or("-"),
                    when
                );
            }
        }
        ResourceKind::Alarms => {
            for a in gw.alarm().list(&user.id).await.map_err(explain)? {
                let state = if a.enabled { "on" } else { "off" };
                println!(
                    "  {:<10} {:<6} {:<4} {}",
                    a.id,
                    a.time,
                    state,
                    a.label.as_deref().unwrap_or("")
                );
            }
        }
        ResourceKind::Payments => {
            for p in gw.payment().history(&user.id).await.map_err(explain)? {
                println!(
                    "  {:<10} {:>8} {:<4} {}",
                    p.id,
                    p.amount,
                    p.currency.as_deref().unwrap_or(""),
                    p.status.as_deref().unwrap_or("")
                );
            }
        }
    }
    Ok(())
}

pub async fn run_send_voice(app: &App, to: &str, file: &str) -> anyhow::Result<()> {
    let user = app.require(Route::Voices).map_err(explain)?;
    let upload = UploadFile::from_path(Path::new(file)).await?;
    let size = upload.bytes.len();
    let voice = app
        .gateway()
        .voice()
        .upload(&user.id, to, upload)
        .await
        .map_err(explain)?;
    println!("Sent voice message {} ({} bytes) to {to}", voice.id, size);
    Ok(())
}

pub async fn run_admin(app: &App, action: AdminAction) -> anyhow::Result<()> {
    app.require(Route::Admin).map_err(explain)?;
    let admin = app.gateway().admin();
    match action {
        AdminAction::Stats => {
            let tile = admin.stats_or_default().await;
            let stats = tile.value;
            println!("  Users:     {} ({} premium)", stats.total_users, stats.premium_users);
            println!("  Memories:  {}", stats.total_memories);
            println!("  Voices:    {}", stats.total_voices);
            if tile.failed {
                println!();
                println!("  Stats could not be loaded; showing zeros.");
            }
        }
        AdminAction::Users => {
            for u in admin.users().await.map_err(explain)? {
                let premium = if u.is_premium() { "premium" } else { "free" };
                println!(
                    "  {:<12} {:<24} {}",
                    u.id,
                    u.name.as_deref().unwrap_or("-"),
                    premium
                );
            }
        }
    }
    Ok(())
}
