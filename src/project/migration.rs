// Track file migration
// Older track files are upgraded in place on their JSON form before typed parsing

use crate::project::serialization::TrackIoError;
use crate::project::types::TRACK_FORMAT_VERSION;
use crate::sequencer::timeline::DEFAULT_QPM;
use serde_json::{Map, Value};

/// Migration result
#[derive(Debug, Clone)]
pub struct MigrationResult {
    /// Track file JSON at the current version
    pub value: Value,
    /// Whether migration was performed
    pub migrated: bool,
    /// Migration messages
    pub messages: Vec<String>,
}

/// Compatibility information for a track file version
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibilityInfo {
    pub can_load: bool,
    pub needs_migration: bool,
    pub warning: Option<String>,
}

pub struct TrackMigrator;

impl TrackMigrator {
    pub fn check_compatibility(version: u32) -> CompatibilityInfo {
        if version > TRACK_FORMAT_VERSION {
            return CompatibilityInfo {
                can_load: false,
                needs_migration: false,
                warning: Some(format!(
                    "Track file version {} is newer than supported version {}",
                    version, TRACK_FORMAT_VERSION
                )),
            };
        }

        if version == TRACK_FORMAT_VERSION {
            return CompatibilityInfo {
                can_load: true,
                needs_migration: false,
                warning: None,
            };
        }

        CompatibilityInfo {
            can_load: true,
            needs_migration: true,
            warning: Some(format!(
                "Track file version {} will be migrated to version {}",
                version, TRACK_FORMAT_VERSION
            )),
        }
    }

    /// Bring a track file's JSON up to the current version.
    ///
    /// The caller has already checked the `type` tag and the `ns` field.
    pub fn migrate_to_current(
        mut value: Value,
        version: u32,
    ) -> Result<MigrationResult, TrackIoError> {
        let compatibility = Self::check_compatibility(version);
        if !compatibility.can_load {
            return Err(TrackIoError::UnsupportedVersion {
                found: version,
                supported: TRACK_FORMAT_VERSION,
            });
        }
        if !compatibility.needs_migration {
            return Ok(MigrationResult {
                value,
                migrated: false,
                messages: Vec::new(),
            });
        }

        let mut messages = Vec::new();
        if version < 2 {
            messages.push("Migrating track file from v1 to v2".to_string());
            Self::migrate_v1_to_v2(&mut value);
        }

        if let Some(object) = value.as_object_mut() {
            object.insert("version".into(), Value::from(TRACK_FORMAT_VERSION));
        }

        Ok(MigrationResult {
            value,
            migrated: true,
            messages,
        })
    }

    /// v1 had no `isActive`, and its `meta` could be partial or missing
    fn migrate_v1_to_v2(value: &mut Value) {
        let Some(object) = value.as_object_mut() else {
            return;
        };

        let ns = object.get("ns").cloned().unwrap_or(Value::Null);
        let qpm = ns
            .pointer("/tempos/0/qpm")
            .and_then(Value::as_f64)
            .filter(|q| q.is_finite() && *q > 0.0)
            .unwrap_or(DEFAULT_QPM);
        let spq = ns
            .pointer("/quantizationInfo/stepsPerQuarter")
            .and_then(Value::as_u64)
            .filter(|s| *s > 0)
            .map_or(Value::Null, Value::from);

        let meta = object
            .entry("meta")
            .or_insert_with(|| Value::Object(Map::new()));
        if !meta.is_object() {
            *meta = Value::Object(Map::new());
        }
        if let Some(meta) = meta.as_object_mut() {
            meta.entry("name").or_insert_with(|| Value::from("Track"));
            meta.entry("isActive").or_insert(Value::Bool(true));
            let qpm_missing = meta.get("qpm").and_then(Value::as_f64).is_none();
            if qpm_missing {
                meta.insert("qpm".into(), Value::from(qpm));
            }
            let spq_missing = meta.get("spq").is_none_or(Value::is_null);
            if spq_missing {
                meta.insert("spq".into(), spq);
            }
        }
    }
}
