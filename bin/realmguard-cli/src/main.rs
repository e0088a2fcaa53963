//! Realmguard CLI - Admin Command Line Interface
//!
//! Inspects an authentication config, checks credentials against it and
//! produces stored password forms for config files.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use realmguard_auth::{
    AuthConfig, Authentication, MemorySession, PasswordCredential, PasswordType, RequestContext,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "realmguard-cli")]
#[command(about = "Realmguard Admin CLI")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/realmguard/auth.toml")]
    config: String,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List configured realms in registration order
    Realms,
    /// Authenticate a user against a realm
    Check {
        /// Username to authenticate
        username: String,
        /// Password to check
        #[arg(short, long, env = "REALMGUARD_PASSWORD")]
        password: String,
        /// Realm name (default realm if omitted)
        #[arg(short, long)]
        realm: Option<String>,
    },
    /// Print the stored form of a password
    HashPassword {
        /// Password to hash
        password: String,
        /// Password type: clear, hashed, argon2
        #[arg(short = 't', long = "type", default_value = "argon2")]
        password_type: String,
        /// Salt prepended before hashing (hashed only)
        #[arg(long, default_value = "")]
        pre_salt: String,
        /// Salt appended before hashing (hashed only)
        #[arg(long, default_value = "")]
        post_salt: String,
    },
}

fn load_auth(path: &str) -> Result<Authentication> {
    let config =
        AuthConfig::load(path).with_context(|| format!("Failed to load config from {path}"))?;
    config.build().context("Invalid authentication config")
}

fn parse_password_type(name: &str) -> Result<PasswordType> {
    serde_json::from_value(serde_json::Value::String(name.to_lowercase()))
        .with_context(|| format!("Unknown password type: {name}"))
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match args.command {
        Commands::Realms => {
            let auth = load_auth(&args.config)?;
            println!("Realms");
            println!("======");
            for name in auth.realm_names() {
                let marker = if auth.default_realm() == Some(name) {
                    " (default)"
                } else {
                    ""
                };
                if let Some(realm) = auth.realm(Some(name)) {
                    println!(
                        "{}{}  store={} credential={}",
                        name,
                        marker,
                        realm.store().name(),
                        realm.credential().name()
                    );
                }
            }
            if auth.is_empty() {
                println!("(none)");
            }
            println!("Sessions: {}", if auth.use_session() { "on" } else { "off" });
        }
        Commands::Check {
            username,
            password,
            realm,
        } => {
            let auth = load_auth(&args.config)?;
            let sessions = Arc::new(MemorySession::new());
            let mut ctx = RequestContext::new()
                .with_session(sessions.clone())
                .with_session_id("realmguard-cli");

            let Some(user) =
                auth.authenticate_with_password(&mut ctx, &username, &password, realm.as_deref())?
            else {
                bail!("Authentication failed for {username}");
            };

            let current = auth.user(&mut ctx).unwrap_or(user);
            println!("Authenticated: {}", current.id());
            println!("Realm: {}", current.auth_realm().unwrap_or("-"));

            // Confirm the identity survives into a fresh request
            let mut next = RequestContext::new()
                .with_session(sessions)
                .with_session_id("realmguard-cli");
            match auth.user(&mut next) {
                Some(restored) => println!("Restorable: yes ({})", restored.id()),
                None => println!("Restorable: no"),
            }
        }
        Commands::HashPassword {
            password,
            password_type,
            pre_salt,
            post_salt,
        } => {
            let credential = PasswordCredential::new(parse_password_type(&password_type)?)
                .with_salts(pre_salt, post_salt);
            println!("{}", credential.hash_password(&password)?);
        }
    }

    Ok(())
}
