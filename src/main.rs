use anyhow::{Context, Result};
use dialoguer::Password;
use serde::Serialize;
use std::sync::Arc;

use audit_client::config::{Command, Config, KeysCommand};
use audit_client::error::ClientError;
use audit_client::http_client::ApiClient;
use audit_client::session::{SessionState, SessionStore, SqliteSessionStorage};

#[tokio::main]
async fn main() -> Result<()> {
    let (config, command) = Config::load()?;
    config.validate()?;

    // Logs go to stderr so stdout carries only command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    tracing::debug!(session_db = %config.session_db.display(), "Configuration loaded");

    let client = Arc::new(ApiClient::new(&config.api_url, &config.http_options())?);
    let storage = Arc::new(SqliteSessionStorage::open(&config.session_db)?);
    let session = SessionStore::new(client.clone(), storage);

    let state = session.initialize();
    tracing::debug!(
        authenticated = matches!(state, SessionState::Authenticated { .. }),
        "Session resolved"
    );

    let outcome = run(&command, &client, &session).await;

    if let Some(err) = outcome.as_ref().err().and_then(client_error) {
        if session.handle_auth_failure(err) {
            eprintln!("Session expired, please log in again.");
        }
    }

    outcome
}

/// API error behind a command failure, if there is one
fn client_error(err: &anyhow::Error) -> Option<&ClientError> {
    err.downcast_ref::<ClientError>()
}

/// Dispatch a single command
async fn run(
    command: &Command,
    client: &ApiClient,
    session: &SessionStore,
) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            let password = resolve_password(password.as_deref())?;
            let user = session.login(email, &password).await?;
            println!("Logged in as {}", user.email);
        }
        Command::Signup {
            email,
            name,
            password,
        } => {
            let password = resolve_password(password.as_deref())?;
            let user = session.signup(email, &password, name.as_deref()).await?;
            println!("Account created for {}", user.email);
        }
        Command::Logout => {
            session.logout()?;
            println!("Logged out");
        }
        Command::Whoami => match session.user() {
            Some(user) => print_json(&user)?,
            None => println!("Not logged in"),
        },
        Command::Events {
            limit,
            offset,
            user_id,
        } => {
            let query = audit_client::models::EventQuery {
                user_id: user_id.clone(),
                limit: *limit,
                offset: *offset,
            };
            print_json(&client.list_events(&query).await?)?;
        }
        Command::Metrics => print_json(&client.get_metrics().await?)?,
        Command::Keys { action } => match action {
            KeysCommand::List => print_json(&client.get_api_keys().await?)?,
            KeysCommand::Create { name } => {
                let key = client.create_api_key(name).await?;
                print_json(&key)?;
                eprintln!("Store the key now, it cannot be shown again.");
            }
            KeysCommand::Delete { id } => {
                client.delete_api_key(id).await?;
                println!("Deleted API key {}", id);
            }
        },
        Command::Plans => print_json(&client.get_pricing_plans().await?)?,
        Command::Subscription => print_json(&client.get_subscription().await?)?,
        Command::Health => print_json(&client.health().await?)?,
    }

    Ok(())
}

/// Use the given password or prompt for one
fn resolve_password(given: Option<&str>) -> Result<String> {
    if let Some(password) = given {
        return Ok(password.to_string());
    }

    Password::new()
        .with_prompt("Password")
        .interact()
        .context("Failed to read password")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("Failed to render output")?;
    println!("{}", rendered);
    Ok(())
}
