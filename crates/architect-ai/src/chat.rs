use architect_core::{AiSettings, Role, Storage};

use crate::engine;
use crate::mode;
use crate::prompts;

const CHAT_TEMPERATURE: f32 = 0.4;

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub mode: String,
    pub reply: String,
}

/// Resolve the mode, assemble the system prompt (mode template + style block
/// + recent project history), make one model call and record the exchange.
///
/// The conversation is appended only after a successful reply, so a failed
/// upstream call leaves the project untouched. Explicit modes are passed
/// through unvalidated; unrecognized ones get the general template but are
/// echoed back as given.
pub async fn compose_and_send(
    storage: &Storage,
    settings: &AiSettings,
    message: &str,
    requested_mode: &str,
    project_name: Option<&str>,
) -> Result<ChatReply, String> {
    let profile = storage.load_profile();

    let mode = if requested_mode == "auto" {
        mode::decide_mode(settings, message).await.to_string()
    } else {
        requested_mode.to_string()
    };

    let mode_prompt = prompts::base_prompt_for_mode(&mode);
    let style_text = prompts::style_instruction(&profile);
    let history_text = project_name
        .and_then(|name| storage.load_project(name))
        .map(|project| prompts::history_block(&project.conversation))
        .unwrap_or_default();

    let system = prompts::compose_system(&[mode_prompt, &style_text, &history_text]);

    let reply = engine::generate(
        settings,
        &settings.chat_model,
        CHAT_TEMPERATURE,
        &system,
        message,
    )
    .await?;

    if let Some(name) = project_name {
        storage.append_turn(name, Role::User, message)?;
        storage.append_turn(name, Role::Assistant, &reply)?;
    }

    Ok(ChatReply { mode, reply })
}
