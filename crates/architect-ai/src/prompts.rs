use architect_core::{ChatTurn, StyleProfile};

pub const CREATE_MODE_PROMPT: &str = "\
You are CreateArchitect AI — an expert Minecraft Create Mod engineer.

You help the user design:
- contraptions
- factories
- processing chains
- kinetic networks
- efficient survival bases
- redstone + Create hybrids

Rules:
1. Everything must be buildable in survival.
2. Prefer compact, tileable designs.
3. Include materials list & approximate footprint when useful.
4. If the user asks for a schematic or blueprint, structure your answer clearly
   so it can be converted into JSON (steps, layers, I/O).";

pub const PRO_MODE_PROMPT: &str = "\
You are CreateArchitect AI — a senior Minecraft modding and automation engineer.

You help with:
- Forge/Fabric mods
- Java code
- Gradle & build scripts
- mixins / events / registries
- config & data generation
- crash log analysis

Rules:
1. Give complete, compilable code when asked.
2. Include file paths and where to put each file.
3. Explain errors briefly and how to fix them.";

pub const GENERAL_MODE_PROMPT: &str = "\
You are CreateArchitect AI — a helpful, honest, concise assistant.

You can answer any general question the user has.
When you don't know something exactly, say so and reason carefully.
Keep answers clear and avoid unnecessary fluff.";

pub const AUTO_ROUTER_PROMPT: &str = "\
You are a mode router. Decide which mode best fits the user's message.

Modes:
- \"create\": Create mod, factories, contraptions, survival base design, automation.
- \"pro\": Modding, Java, code, Gradle, configs, crash logs, datapacks.
- \"general\": Everything else.

Return ONLY JSON:
{\"mode\":\"create\"}
or {\"mode\":\"pro\"}
or {\"mode\":\"general\"}
with no extra text.";

/// Select the base system prompt for a mode. Unrecognized values fall back
/// to the general template (explicit modes are deliberately not validated).
pub fn base_prompt_for_mode(mode: &str) -> &'static str {
    match mode {
        "create" => CREATE_MODE_PROMPT,
        "pro" => PRO_MODE_PROMPT,
        _ => GENERAL_MODE_PROMPT,
    }
}

/// Render the style profile as an instruction block for the system prompt.
pub fn style_instruction(profile: &StyleProfile) -> String {
    format!(
        "User style settings:\n\
- tone: {}\n\
- detail: {}\n\
- emojis: {}\n\
- formatting: {}\n\
\n\
Respect these settings while answering.\n\
If detail=low, be short. If high, be very detailed.\n\
If emojis=none, do not use emojis. If some, use a few. If max, use more but keep it readable.\n\
If formatting=markdown, use headings and lists when useful.",
        profile.tone, profile.detail, profile.emojis, profile.formatting
    )
}

const HISTORY_TURNS: usize = 4;
const HISTORY_TRUNCATE: usize = 200;

/// Render the last few conversation turns as a short context block.
/// Empty when there is no history.
pub fn history_block(conversation: &[ChatTurn]) -> String {
    if conversation.is_empty() {
        return String::new();
    }
    let start = conversation.len().saturating_sub(HISTORY_TURNS);
    let lines: Vec<String> = conversation[start..]
        .iter()
        .map(|turn| {
            let content: String = turn.content.chars().take(HISTORY_TRUNCATE).collect();
            format!("[{}] {}", turn.role.as_str(), content)
        })
        .collect();
    format!("Recent project messages:\n{}", lines.join("\n"))
}

/// Join the non-empty prompt pieces into one system instruction.
pub fn compose_system(parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Fixed-schema prompt asking the model for strict schematic JSON.
pub fn schematic_prompt(instructions: &str) -> String {
    format!(
        "User wants a Create/Minecraft contraption. Convert into STRICT JSON:\n\
\n\
{{\n\
  \"name\": \"short_name\",\n\
  \"description\": \"what it does\",\n\
  \"materials\": [\"key blocks/items\"],\n\
  \"size\": \"WxHxL in blocks\",\n\
  \"steps\": [\n\
    \"Step 1 ...\",\n\
    \"Step 2 ...\"\n\
  ],\n\
  \"stress\": {{\n\
    \"machines\": 4,\n\
    \"baseStress\": 256\n\
  }}\n\
}}\n\
\n\
No markdown, ONLY JSON.\n\
\n\
User instructions: {instructions}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use architect_core::Role;

    fn turn(role: Role, content: &str) -> ChatTurn {
        ChatTurn {
            role,
            content: content.to_string(),
            timestamp: 0,
        }
    }

    #[test]
    fn unknown_mode_falls_back_to_general_template() {
        assert_eq!(base_prompt_for_mode("create"), CREATE_MODE_PROMPT);
        assert_eq!(base_prompt_for_mode("pro"), PRO_MODE_PROMPT);
        assert_eq!(base_prompt_for_mode("general"), GENERAL_MODE_PROMPT);
        assert_eq!(base_prompt_for_mode("wizard"), GENERAL_MODE_PROMPT);
    }

    #[test]
    fn style_instruction_lists_all_settings() {
        let profile = StyleProfile {
            tone: "formal".to_string(),
            ..Default::default()
        };
        let text = style_instruction(&profile);
        assert!(text.contains("- tone: formal"));
        assert!(text.contains("- detail: medium"));
        assert!(text.contains("If emojis=none, do not use emojis."));
    }

    #[test]
    fn history_keeps_last_four_turns() {
        let conversation: Vec<ChatTurn> = (0..6)
            .map(|i| turn(Role::User, &format!("message {i}")))
            .collect();
        let block = history_block(&conversation);
        assert!(block.starts_with("Recent project messages:"));
        assert!(!block.contains("message 1"));
        assert!(block.contains("message 2"));
        assert!(block.contains("message 5"));
    }

    #[test]
    fn history_truncates_long_turns() {
        let long = "x".repeat(500);
        let block = history_block(&[turn(Role::Assistant, &long)]);
        assert!(block.contains(&"x".repeat(200)));
        assert!(!block.contains(&"x".repeat(201)));
    }

    #[test]
    fn empty_history_renders_nothing() {
        assert_eq!(history_block(&[]), "");
    }

    #[test]
    fn compose_system_omits_empty_pieces() {
        assert_eq!(compose_system(&["a", "", "b"]), "a\n\nb");
        assert_eq!(compose_system(&["only"]), "only");
    }

    #[test]
    fn schematic_prompt_embeds_instructions_and_schema() {
        let prompt = schematic_prompt("a cobblestone farm");
        assert!(prompt.contains("User instructions: a cobblestone farm"));
        assert!(prompt.contains("\"baseStress\": 256"));
        assert!(prompt.contains("No markdown, ONLY JSON."));
    }
}
