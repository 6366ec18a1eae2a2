// src/cli/mod.rs — CLI definition (clap derive)

pub mod account;
pub mod app;
pub mod resources;
pub mod status;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "nekota", about = "Nekota account and data client", version)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Backend base URL (overrides config and NEKOTA_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Keep the session in memory only; nothing is read from or written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with a device number or email/password
    Login {
        /// Device number printed on the Nekota device
        #[arg(long, conflicts_with = "email")]
        device: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Prompted for when omitted
        #[arg(long, requires = "email")]
        password: Option<String>,
    },
    /// Register this device and log in
    Register {
        #[arg(long)]
        device: String,
        #[arg(long)]
        name: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Check the stored token against the backend and refresh the profile
    Verify,
    /// Premium status: show, refresh from the backend, or apply locally
    Premium {
        #[command(subcommand)]
        action: Option<PremiumAction>,
    },
    /// Summary of profile, memories, friends and voice model
    Dashboard {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List one kind of resource for the logged-in user
    List {
        #[arg(value_enum)]
        resource: ResourceKind,
    },
    /// Upload a recorded voice message
    SendVoice {
        /// Receiving user id
        #[arg(long)]
        to: String,
        /// Audio file (wav, mp3, m4a, ogg, webm)
        file: String,
    },
    /// Admin-only views
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Show config and session state
    Status,
}

#[derive(Subcommand, Clone)]
pub enum PremiumAction {
    /// Show the current premium status (default)
    Show,
    /// Ask the backend and reconcile the local copy
    Refresh,
    /// Mark premium locally right after a completed payment
    Activate {
        /// End of the premium period (RFC 3339); defaults to the configured window
        #[arg(long)]
        until: Option<String>,
    },
    /// Clear premium locally
    Deactivate,
}

#[derive(Subcommand, Clone)]
pub enum AdminAction {
    /// Platform totals
    Stats,
    /// All users
    Users,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ResourceKind {
    Memories,
    Friends,
    Voices,
    Alarms,
    Payments,
}
