use clap::Parser;
use mymails::app::run_app_loop;
use mymails::cli::{handle_token_clear, Cli};
use mymails::config::{MailConfig, LOG_FILE};
use mymails::gmail_api::{CredentialStore, GmailClient, Mailer};
use mymails::logging::init_logging;
use mymails::state::AppState;
use mymails::terminal::{cleanup_terminal, install_panic_hook, setup_terminal};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = MailConfig::default().with_inbox_limit(cli.limit);

    if cli.clear_token {
        handle_token_clear(&config)?;
        return Ok(());
    }

    if let Err(e) = init_logging(Path::new(LOG_FILE)) {
        eprintln!("Logging disabled: {}", e);
    }

    let http = reqwest::Client::new();
    let (prompt_tx, mut prompt_rx) = mpsc::unbounded_channel();
    let credentials = CredentialStore::from_config(&config, http.clone(), prompt_tx);

    // First-run authorization happens on the plain console; once the UI is
    // up, consent URLs are shown as notices instead.
    eprintln!("Authenticating with Gmail...");
    let authenticated = {
        let auth = credentials.ensure_credential();
        tokio::pin!(auth);
        loop {
            tokio::select! {
                result = &mut auth => break result,
                Some(url) = prompt_rx.recv() => {
                    eprintln!("Please visit this URL to authorize My Mails:\n\n{url}\n");
                }
            }
        }
    };
    if let Err(e) = authenticated {
        error!(error = %e, "Authentication failed");
        eprintln!("Authentication failed: {}", e);
        eprintln!(
            "Make sure {} holds your OAuth client secret, or run with --clear-token to start over.",
            config.credentials_path.display()
        );
        std::process::exit(1);
    }

    let mailer = Arc::new(Mailer::new(
        credentials,
        GmailClient::new(http, config.api_base.clone()),
    ));
    let state_arc = Arc::new(RwLock::new(AppState::new(config.inbox_limit)));

    install_panic_hook();
    let mut terminal = setup_terminal()?;
    let result = run_app_loop(&mut terminal, state_arc, mailer, prompt_rx).await;
    cleanup_terminal(&mut terminal)?;

    if let Err(e) = &result {
        error!(error = %e, "Application error");
    }
    result
}
