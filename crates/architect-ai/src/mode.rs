use serde::Deserialize;

use architect_core::AiSettings;

use crate::engine;
use crate::prompts;

const ALLOWED_MODES: [&str; 3] = ["create", "pro", "general"];

// Keyword fallback sets. "create " keeps its trailing space so the mod name
// matches as a word, not as a substring of e.g. "creates".
const CREATE_KEYWORDS: [&str; 3] = ["create ", "factory", "kinetic"];
const PRO_KEYWORDS: [&str; 3] = ["forge", "fabric", "gradle"];

#[derive(Deserialize)]
struct ModeVerdict {
    mode: String,
}

/// Deterministic keyword scan over the lower-cased message. Create keywords
/// win first, then pro keywords, else general.
pub fn keyword_mode(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    if CREATE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return "create";
    }
    if PRO_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return "pro";
    }
    "general"
}

/// Decide which mode fits a message. The model-assisted classifier is the
/// primary; any failure (transport, non-JSON output, disallowed value) is
/// logged and swallowed, and the keyword fallback answers instead. The
/// caller always gets some mode.
pub async fn decide_mode(settings: &AiSettings, message: &str) -> &'static str {
    match classify(settings, message).await {
        Ok(mode) => mode,
        Err(e) => {
            tracing::warn!("mode router failed; falling back to keywords: {e}");
            keyword_mode(message)
        }
    }
}

async fn classify(settings: &AiSettings, message: &str) -> Result<&'static str, String> {
    let raw = engine::generate(
        settings,
        &settings.chat_model,
        0.0,
        prompts::AUTO_ROUTER_PROMPT,
        message,
    )
    .await?;

    let verdict: ModeVerdict = serde_json::from_str(raw.trim())
        .map_err(|e| format!("router returned non-JSON ({e}): {raw}"))?;

    ALLOWED_MODES
        .iter()
        .find(|m| **m == verdict.mode)
        .copied()
        .ok_or_else(|| format!("router returned disallowed mode: {:?}", verdict.mode))
}
