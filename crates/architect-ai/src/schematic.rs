use architect_core::{AiSettings, Schematic, SchematicPayload, Storage, DEFAULT_BASE_STRESS};

use crate::engine;
use crate::prompts;
use crate::stress;

const SCHEMATIC_TEMPERATURE: f32 = 0.1;

/// Ask the model for a strict-JSON contraption blueprint, parse it, attach a
/// stress estimate, and persist the result when a project is named.
///
/// A response that isn't valid JSON becomes the `Unparsed` variant carrying
/// the raw text — still persisted, still returned as a success. Only the
/// model call itself can fail here.
pub async fn compose_schematic(
    storage: &Storage,
    settings: &AiSettings,
    instructions: &str,
    project_name: Option<&str>,
) -> Result<Schematic, String> {
    let prompt = prompts::schematic_prompt(instructions);

    let raw = engine::generate(
        settings,
        &settings.schematic_model,
        SCHEMATIC_TEMPERATURE,
        prompts::CREATE_MODE_PROMPT,
        &prompt,
    )
    .await?;

    finish_schematic(storage, &raw, project_name)
}

/// Everything after the model call: parse the raw reply, attach the stress
/// estimate, persist when a project is named. Split out so reply handling
/// works without a live provider.
pub fn finish_schematic(
    storage: &Storage,
    raw: &str,
    project_name: Option<&str>,
) -> Result<Schematic, String> {
    let mut schematic = parse_schematic(raw);
    augment_stress(&mut schematic);

    if let Some(name) = project_name {
        storage.append_schematic(name, schematic.clone())?;
        storage.write_schematic_file(Some(name), &schematic)?;
    }

    Ok(schematic)
}

/// Attach a stress estimate to a blueprint that reports a positive machine
/// count, defaulting base stress to 256. Anything else is left untouched.
pub fn augment_stress(schematic: &mut Schematic) {
    if let Schematic::Blueprint(payload) = schematic {
        if let Some(spec) = &payload.stress {
            if spec.machines > 0 {
                payload.stress_estimate = Some(stress::estimate(
                    spec.machines,
                    spec.base_stress.unwrap_or(DEFAULT_BASE_STRESS),
                ));
            }
        }
    }
}

/// Parse raw model output into a blueprint. Tries the whole text first, then
/// the outermost `{...}` substring (models occasionally wrap the JSON in
/// prose or fences). Anything else becomes the parse-failure variant.
pub fn parse_schematic(raw: &str) -> Schematic {
    match serde_json::from_str::<SchematicPayload>(raw.trim()) {
        Ok(payload) => Schematic::Blueprint(payload),
        Err(err) => {
            if let Some(inner) = extract_json_object(raw) {
                if let Ok(payload) = serde_json::from_str::<SchematicPayload>(&inner) {
                    return Schematic::Blueprint(payload);
                }
            }
            Schematic::Unparsed {
                parse_error: err.to_string(),
                raw: raw.to_string(),
            }
        }
    }
}

fn extract_json_object(raw: &str) -> Option<String> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(raw[start..=end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use architect_core::{StressSpec, StressTier};

    #[test]
    fn non_json_becomes_parse_failure_variant() {
        let schematic = parse_schematic("not json");
        match schematic {
            Schematic::Unparsed { raw, parse_error } => {
                assert_eq!(raw, "not json");
                assert!(!parse_error.is_empty());
            }
            Schematic::Blueprint(_) => panic!("expected parse failure"),
        }
    }

    #[test]
    fn strict_json_parses_with_stress_spec() {
        let raw = r#"{
            "name": "item_farm",
            "description": "automated farm",
            "materials": ["mechanical belt", "funnel"],
            "size": "5x3x7",
            "steps": ["Place belts", "Attach funnels"],
            "stress": {"machines": 4, "baseStress": 256}
        }"#;
        match parse_schematic(raw) {
            Schematic::Blueprint(payload) => {
                assert_eq!(payload.name, "item_farm");
                assert_eq!(payload.steps.len(), 2);
                assert_eq!(
                    payload.stress,
                    Some(StressSpec {
                        machines: 4,
                        base_stress: Some(256),
                    })
                );
            }
            Schematic::Unparsed { parse_error, .. } => panic!("parse failed: {parse_error}"),
        }
    }

    #[test]
    fn fenced_json_is_extracted() {
        let raw = "```json\n{\"name\": \"press\"}\n```";
        match parse_schematic(raw) {
            Schematic::Blueprint(payload) => assert_eq!(payload.name, "press"),
            Schematic::Unparsed { parse_error, .. } => panic!("parse failed: {parse_error}"),
        }
    }

    #[test]
    fn augment_attaches_estimate_for_positive_machine_count() {
        let mut schematic = Schematic::Blueprint(SchematicPayload {
            stress: Some(StressSpec {
                machines: 17,
                base_stress: None,
            }),
            ..Default::default()
        });
        augment_stress(&mut schematic);
        let Schematic::Blueprint(payload) = schematic else {
            panic!("expected blueprint");
        };
        let est = payload.stress_estimate.unwrap();
        assert_eq!(est.base_stress, 256);
        assert_eq!(est.total, 4352);
        assert_eq!(est.tier, StressTier::Medium);
    }

    #[test]
    fn augment_skips_zero_machines_and_parse_failures() {
        let mut zero = Schematic::Blueprint(SchematicPayload {
            stress: Some(StressSpec {
                machines: 0,
                base_stress: Some(256),
            }),
            ..Default::default()
        });
        augment_stress(&mut zero);
        let Schematic::Blueprint(payload) = zero else {
            panic!("expected blueprint");
        };
        assert!(payload.stress_estimate.is_none());

        let mut unparsed = Schematic::Unparsed {
            parse_error: "e".to_string(),
            raw: "not json".to_string(),
        };
        augment_stress(&mut unparsed);
        assert!(matches!(unparsed, Schematic::Unparsed { .. }));
    }

    #[test]
    fn finished_blueprint_carries_estimate_and_is_persisted_twice() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        let raw = r#"{"name": "drill", "stress": {"machines": 4}}"#;

        let schematic = finish_schematic(&storage, raw, Some("p1")).unwrap();
        let Schematic::Blueprint(payload) = &schematic else {
            panic!("expected blueprint");
        };
        assert_eq!(payload.stress_estimate.as_ref().unwrap().total, 1024);

        let project = storage.load_project("p1").unwrap();
        assert_eq!(project.schematics.len(), 1);
        assert_eq!(project.schematics[0].schematic, schematic);
        let dumps: Vec<_> = std::fs::read_dir(storage.projects_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("_schematic_"))
            .collect();
        assert_eq!(dumps.len(), 1);
    }

    #[test]
    fn unparseable_reply_still_succeeds_and_persists_both_writes() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();

        let schematic = finish_schematic(&storage, "not json", Some("p1")).unwrap();
        match &schematic {
            Schematic::Unparsed { raw, .. } => assert_eq!(raw, "not json"),
            Schematic::Blueprint(_) => panic!("expected parse failure"),
        }

        // Both the project record and the standalone dump are written even
        // for the parse-failure variant.
        let project = storage.load_project("p1").unwrap();
        assert_eq!(project.schematics[0].schematic, schematic);
        let dump_count = std::fs::read_dir(storage.projects_dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("_schematic_"))
            .count();
        assert_eq!(dump_count, 1);
    }

    #[tokio::test]
    async fn upstream_failure_skips_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::new(dir.path()).unwrap();
        let settings = AiSettings {
            provider: "nowhere".to_string(),
            schematic_model: "m".to_string(),
            ..Default::default()
        };
        let result =
            compose_schematic(&storage, &settings, "a drill rig", Some("p1")).await;
        assert!(result.is_err());
        assert!(storage.load_project("p1").is_none());
    }
}
