//! setka-bot — entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at configured level
//!   4. Build probe/aggregator, record store, session map
//!   5. Run the Telegram dispatcher until shutdown

use std::sync::Arc;

use teloxide::Bot;
use tracing::info;

use setka_bot::bot::{self, AppState};
use setka_bot::{config, error::AppError, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::parse_level(&config.log_level)?;
    logger::init(&config.log_level)?;

    info!(
        bot_name = %config.bot_name,
        work_dir = %config.work_dir.display(),
        log_level = %config.log_level,
        "config loaded"
    );

    let token = std::env::var("TELEGRAM_BOT_TOKEN")
        .map_err(|_| AppError::Config("TELEGRAM_BOT_TOKEN is not set".into()))?;

    let state = Arc::new(AppState::new(&config));
    bot::run(Bot::new(token), state).await
}
