// src/main.rs — Nekota client entry point

use clap::Parser;

use nekota::cli::app::{load_config, App};
use nekota::cli::{account, resources, status, Cli, Commands};
use nekota::infra::logger;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging level may come from config, so load it first
    let config = load_config(cli.config.as_deref(), cli.api_url.as_deref())?;
    logger::init_logging(&config.logging.level);

    let app = App::start(config, cli.ephemeral).await?;

    match cli.command {
        Commands::Login {
            device,
            email,
            password,
        } => account::run_login(&app, device, email, password).await,
        Commands::Register { device, name } => {
            account::run_register(&app, &device, name.as_deref()).await
        }
        Commands::Logout => account::run_logout(&app).await,
        Commands::Whoami => account::run_whoami(&app),
        Commands::Verify => account::run_verify(&app).await,
        Commands::Premium { action } => account::run_premium(&app, action).await,
        Commands::Dashboard { json } => resources::run_dashboard(&app, json).await,
        Commands::List { resource } => resources::run_list(&app, resource).await,
        Commands::SendVoice { to, file } => resources::run_send_voice(&app, &to, &file).await,
        Commands::Admin { action } => resources::run_admin(&app, action).await,
        Commands::Status => status::show_status(&app, cli.ephemeral),
    }
}
