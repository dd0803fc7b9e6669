use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

// --- Types ---

pub const DEFAULT_BASE_STRESS: i64 = 256;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One entry in a project's conversation log. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub conversation: Vec<ChatTurn>,
    #[serde(default)]
    pub schematics: Vec<SchematicRecord>,
}

impl Project {
    pub fn new(name: &str) -> Self {
        Project {
            name: name.to_string(),
            conversation: Vec::new(),
            schematics: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StressTier {
    Low,
    Medium,
    High,
}

/// Derived power-demand summary for a contraption. Recomputed, never stored
/// independently of its schematic record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StressEstimate {
    pub machines: i64,
    pub base_stress: i64,
    pub total: i64,
    pub tier: StressTier,
    pub advice: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StressSpec {
    #[serde(default)]
    pub machines: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_stress: Option<i64>,
}

/// A parsed contraption blueprint. Every field defaults so a partial model
/// response is still accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchematicPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress: Option<StressSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stress_estimate: Option<StressEstimate>,
}

/// A schematic is either a parsed blueprint or the raw text the model sent
/// when it failed to produce valid JSON. The unparsed form is a legitimate
/// value, not an error path.
///
/// `Unparsed` must come first: blueprint fields all default, so any JSON
/// object would otherwise match `Blueprint`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Schematic {
    Unparsed {
        #[serde(rename = "parseError")]
        parse_error: String,
        raw: String,
    },
    Blueprint(SchematicPayload),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SchematicRecord {
    #[serde(flatten)]
    pub schematic: Schematic,
    pub timestamp: u64,
}

/// User-chosen reply style, applied to every chat answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StyleProfile {
    #[serde(default = "default_tone")]
    pub tone: String, // friendly | formal | technical | casual | serious
    #[serde(default = "default_detail")]
    pub detail: String, // low | medium | high
    #[serde(default = "default_emojis")]
    pub emojis: String, // none | some | max
    #[serde(default = "default_formatting")]
    pub formatting: String, // plain | markdown | bullet | tutorial
}

fn default_tone() -> String {
    "friendly".to_string()
}

fn default_detail() -> String {
    "medium".to_string()
}

fn default_emojis() -> String {
    "some".to_string()
}

fn default_formatting() -> String {
    "markdown".to_string()
}

impl Default for StyleProfile {
    fn default() -> Self {
        StyleProfile {
            tone: default_tone(),
            detail: default_detail(),
            emojis: default_emojis(),
            formatting: default_formatting(),
        }
    }
}

/// Partial style update. Unset fields revert to the defaults on save.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StyleUpdate {
    pub tone: Option<String>,
    pub detail: Option<String>,
    pub emojis: Option<String>,
    pub formatting: Option<String>,
}

impl StyleProfile {
    pub fn merged(update: &StyleUpdate) -> StyleProfile {
        let defaults = StyleProfile::default();
        StyleProfile {
            tone: update.tone.clone().unwrap_or(defaults.tone),
            detail: update.detail.clone().unwrap_or(defaults.detail),
            emojis: update.emojis.clone().unwrap_or(defaults.emojis),
            formatting: update.formatting.clone().unwrap_or(defaults.formatting),
        }
    }
}

// --- AI settings ---

#[derive(Debug, Clone, Default)]
pub struct AiSettings {
    pub provider: String,
    pub api_key: String,
    pub chat_model: String,
    pub schematic_model: String,
}

impl AiSettings {
    /// Build settings from the environment, once, at process start.
    pub fn from_env() -> Self {
        let provider =
            std::env::var("ARCHITECT_PROVIDER").unwrap_or_else(|_| "openai".to_string());
        let api_key = std::env::var("ARCHITECT_API_KEY").unwrap_or_default();
        let chat_model =
            std::env::var("ARCHITECT_CHAT_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        let schematic_model =
            std::env::var("ARCHITECT_SCHEMATIC_MODEL").unwrap_or_else(|_| chat_model.clone());
        AiSettings {
            provider,
            api_key,
            chat_model,
            schematic_model,
        }
    }

    pub fn configured(&self) -> bool {
        !self.provider.is_empty()
            && !self.chat_model.is_empty()
            && (self.provider == "ollama" || !self.api_key.is_empty())
    }
}

// --- Helpers ---

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// A project name is its storage key, so it must stay inside the projects
/// directory: no separators, no parent components, not empty.
pub fn valid_project_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && name != "."
        && name != ".."
}

/// Sanitize a project name for use in a schematic file name.
/// Anything outside [a-zA-Z0-9_-] becomes '_'.
pub fn sanitize_file_stem(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        "global".to_string()
    } else {
        safe
    }
}

/// True for file stems produced by `write_schematic_file`:
/// `<stem>_schematic_<epoch-millis>`. The timestamp must be all digits so a
/// project that merely contains "_schematic_" in its name still lists.
fn is_schematic_dump(stem: &str) -> bool {
    match stem.rsplit_once("_schematic_") {
        Some((_, ts)) => !ts.is_empty() && ts.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

// --- Storage ---

/// File-backed storage: one JSON file per project, one for the style profile,
/// one per generated schematic. Whole-record read/rewrite; a per-project lock
/// serializes read-modify-write cycles so concurrent appends can't drop each
/// other's writes.
pub struct Storage {
    data_dir: PathBuf,
    projects_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Storage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, String> {
        let data_dir = data_dir.into();
        let projects_dir = data_dir.join("projects");
        fs::create_dir_all(&projects_dir).map_err(|e| e.to_string())?;
        Ok(Storage {
            data_dir,
            projects_dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn projects_dir(&self) -> &Path {
        &self.projects_dir
    }

    fn project_path(&self, name: &str) -> PathBuf {
        self.projects_dir.join(format!("{}.json", name))
    }

    fn profile_path(&self) -> PathBuf {
        self.data_dir.join("userStyle.json")
    }

    fn project_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap();
        locks.entry(name.to_string()).or_default().clone()
    }

    /// List all project ids, sorted. Standalone schematic dumps share the
    /// projects directory and are skipped.
    pub fn list_projects(&self) -> Result<Vec<String>, String> {
        if !self.projects_dir.exists() {
            return Ok(vec![]);
        }
        let mut names: Vec<String> = fs::read_dir(&self.projects_dir)
            .map_err(|e| e.to_string())?
            .filter_map(|entry| {
                let entry = entry.ok()?;
                let name = entry.file_name().to_string_lossy().to_string();
                name.strip_suffix(".json")
                    .filter(|n| !is_schematic_dump(n))
                    .map(|n| n.to_string())
            })
            .collect();
        names.sort();
        Ok(names)
    }

    /// Load a project by name. Missing and unreadable files both come back
    /// as `None`; a corrupt file is logged and treated as absent.
    pub fn load_project(&self, name: &str) -> Option<Project> {
        if !valid_project_name(name) {
            return None;
        }
        let path = self.project_path(name);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(project) => Some(project),
            Err(e) => {
                tracing::warn!("failed reading project {name}: {e}");
                None
            }
        }
    }

    /// Write a project record. Atomic (temp file + rename) so a concurrent
    /// reader never sees a half-written file.
    pub fn save_project(&self, project: &Project) -> Result<(), String> {
        if !valid_project_name(&project.name) {
            return Err(format!("invalid project name: {:?}", project.name));
        }
        fs::create_dir_all(&self.projects_dir).map_err(|e| e.to_string())?;
        let json = serde_json::to_string_pretty(project).map_err(|e| e.to_string())?;
        let tmp = self.projects_dir.join(format!(".{}.json.tmp", project.name));
        let path = self.project_path(&project.name);
        fs::write(&tmp, json).map_err(|e| e.to_string())?;
        fs::rename(&tmp, &path).map_err(|e| e.to_string())
    }

    /// Idempotent create: returns the existing record unchanged, or writes
    /// and returns an empty one.
    pub fn create_or_get(&self, name: &str) -> Result<Project, String> {
        let lock = self.project_lock(name);
        let _guard = lock.lock().unwrap();
        let project = self
            .load_project(name)
            .unwrap_or_else(|| Project::new(name));
        self.save_project(&project)?;
        Ok(project)
    }

    /// Append one conversation turn, creating the project if needed.
    pub fn append_turn(&self, name: &str, role: Role, content: &str) -> Result<Project, String> {
        let lock = self.project_lock(name);
        let _guard = lock.lock().unwrap();
        let mut project = self
            .load_project(name)
            .unwrap_or_else(|| Project::new(name));
        project.conversation.push(ChatTurn {
            role,
            content: content.to_string(),
            timestamp: now_millis(),
        });
        self.save_project(&project)?;
        Ok(project)
    }

    /// Append a schematic record, creating the project if needed.
    pub fn append_schematic(&self, name: &str, schematic: Schematic) -> Result<Project, String> {
        let lock = self.project_lock(name);
        let _guard = lock.lock().unwrap();
        let mut project = self
            .load_project(name)
            .unwrap_or_else(|| Project::new(name));
        project.schematics.push(SchematicRecord {
            schematic,
            timestamp: now_millis(),
        });
        self.save_project(&project)?;
        Ok(project)
    }

    /// Write a schematic as a standalone timestamped file for out-of-band
    /// retrieval. Returns the file name.
    pub fn write_schematic_file(
        &self,
        project: Option<&str>,
        schematic: &Schematic,
    ) -> Result<String, String> {
        let stem = match project {
            Some(name) => sanitize_file_stem(name),
            None => "global".to_string(),
        };
        let file_name = format!("{}_schematic_{}.json", stem, now_millis());
        fs::create_dir_all(&self.projects_dir).map_err(|e| e.to_string())?;
        let json = serde_json::to_string_pretty(schematic).map_err(|e| e.to_string())?;
        fs::write(self.projects_dir.join(&file_name), json).map_err(|e| e.to_string())?;
        Ok(file_name)
    }

    /// Load the style profile, creating the file with defaults on first read.
    pub fn load_profile(&self) -> StyleProfile {
        let path = self.profile_path();
        if !path.exists() {
            let defaults = StyleProfile::default();
            if let Err(e) = self.write_profile(&defaults) {
                tracing::warn!("failed writing default style profile: {e}");
            }
            return defaults;
        }
        match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!("failed reading style profile: {e}");
                StyleProfile::default()
            }),
            Err(e) => {
                tracing::warn!("failed reading style profile: {e}");
                StyleProfile::default()
            }
        }
    }

    /// Merge an update over the defaults and persist the result wholesale.
    pub fn save_profile(&self, update: &StyleUpdate) -> Result<StyleProfile, String> {
        let merged = StyleProfile::merged(update);
        self.write_profile(&merged)?;
        Ok(merged)
    }

    fn write_profile(&self, profile: &StyleProfile) -> Result<(), String> {
        fs::create_dir_all(&self.data_dir).map_err(|e| e.to_string())?;
        let json = serde_json::to_string_pretty(profile).map_err(|e| e.to_string())?;
        fs::write(self.profile_path(), json).map_err(|e| e.to_string())
    }
}
