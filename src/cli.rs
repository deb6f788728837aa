use crate::config::{MailConfig, DEFAULT_INBOX_LIMIT};
use crate::gmail_api::{FileTokenStore, TokenStore};
use clap::Parser;

#[derive(Parser, Debug)]
#[clap(author, version, about = "A small Gmail client for the terminal", long_about = None)]
pub struct Cli {
    /// Delete the saved OAuth token (Tokens/token.json) and exit.
    #[clap(long)]
    pub clear_token: bool,

    /// How many inbox messages to fetch.
    #[clap(long, default_value_t = DEFAULT_INBOX_LIMIT, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: u32,
}

pub fn handle_token_clear(config: &MailConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = FileTokenStore::new(&config.token_path);

    // Pre-UI exit, so plain stdout/stderr is fine here.
    match store.clear() {
        Ok(()) => println!("Removed {}. Exiting.", store.path().display()),
        Err(e) => eprintln!("Failed to delete saved token: {}", e),
    }
    Ok(())
}
