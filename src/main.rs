// i3-statusline - status line generator for i3bar
//
// Writes the i3bar protocol on stdout and reads click events from stdin.
// Logs go to stderr.

use std::collections::HashSet;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::OsRng;
use tracing_subscriber::EnvFilter;

use i3_statusline::{
    bar::Bar,
    config::Config,
    github::GithubCredentials,
    input, net,
    secret::{self, KeyringStore, TokenStore},
    widget::{BuildContext, GithubAccess, WidgetRegistry},
};

/// Name of the encrypted token file in the data directory
const GITHUB_TOKEN_FILE: &str = "github-token";

#[derive(Parser, Debug)]
#[command(name = "i3-statusline", version, about = "Status line for i3bar")]
struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/i3-statusline/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a GitHub OAuth token from stdin and store it encrypted
    StoreGithubToken,
}

fn main() -> Result<()> {
    // stdout carries the bar protocol
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let user = secret::current_username();
    let key = secret::bootstrap_key(&KeyringStore, &user, &mut OsRng)
        .context("Could not setup oauth token encryption")?;
    let tokens = TokenStore::new(TokenStore::default_path(GITHUB_TOKEN_FILE)?, &key)
        .context("Could not setup oauth token encryption")?;

    if let Some(Command::StoreGithubToken) = cli.command {
        return store_github_token(&tokens);
    }

    tracing::info!("Starting i3-statusline");

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let registry = WidgetRegistry::with_builtins();
    config
        .validate(&registry)
        .context("Invalid widget configuration")?;

    let mut ctx = BuildContext::new(config.palette.clone());
    ctx.interface = net::pick_interface(config.network.interface.as_deref(), &ctx.sys_class_net);
    ctx.github = github_access(&tokens);
    tracing::info!(interface = ?ctx.interface, github = ctx.github.is_some(), "Environment detected");

    let mut seen = HashSet::new();
    let mut widgets = Vec::new();
    for instance in config.enabled_widgets() {
        let id = instance.instance_id();
        if !seen.insert(id.clone()) {
            bail!("Duplicate widget id '{}', set a distinct 'id' for each instance", id);
        }
        let widget = registry
            .create(&instance.widget_type, &instance.config, &ctx)
            .with_context(|| format!("Failed to create widget '{}'", id))?;
        widgets.push((id, widget));
    }

    let (sender, clicks) = calloop::channel::channel();
    input::spawn_stdin_reader(sender)?;

    Bar::new(widgets, std::io::stdout())
        .run(clicks)
        .context("Status bar stopped")?;

    tracing::info!("Exiting");
    Ok(())
}

/// Credentials from the environment plus the stored token, if both exist
fn github_access(tokens: &TokenStore) -> Option<GithubAccess> {
    let Some(credentials) = GithubCredentials::from_env() else {
        tracing::warn!("GITHUB_CLIENT_ID or GITHUB_CLIENT_SECRET not set");
        return None;
    };

    match tokens.load() {
        Ok(Some(token)) => Some(GithubAccess { credentials, token }),
        Ok(None) => {
            tracing::warn!(
                path = %tokens.path().display(),
                "No GitHub token stored, run `i3-statusline store-github-token`"
            );
            None
        }
        Err(e) => {
            tracing::warn!(error = %e, path = %tokens.path().display(), "Failed to read GitHub token");
            None
        }
    }
}

fn store_github_token(tokens: &TokenStore) -> Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read token from stdin")?;

    let token = input.trim();
    if token.is_empty() {
        bail!("No token given on stdin");
    }

    tokens.save(token).context("Failed to store GitHub token")?;
    tracing::info!(path = %tokens.path().display(), "GitHub token stored");
    Ok(())
}
