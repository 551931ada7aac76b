//! Role profile store.
//!
//! Profiles are loaded once at startup from a YAML document and held
//! read-only. Block weights are normalized on load so downstream
//! aggregation can assume they sum to 1.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use hf_domain::error::{Error, Result};
use hf_domain::profile::{RoleProfile, Thresholds};

/// On-disk profile document: `profiles: { <id>: {...} }`.
#[derive(Debug, Deserialize)]
struct ProfileDocument {
    #[serde(default)]
    profiles: HashMap<String, ProfileEntry>,
}

#[derive(Debug, Deserialize)]
struct ProfileEntry {
    #[serde(default)]
    block_weights: std::collections::BTreeMap<String, f64>,
    #[serde(default)]
    drill_threshold: Option<f64>,
    #[serde(default)]
    pass_threshold: Option<f64>,
    #[serde(default)]
    equivalent_threshold: Option<f64>,
    #[serde(default)]
    critical_fail_threshold: Option<f64>,
    #[serde(default)]
    scenario_id: Option<String>,
    #[serde(default)]
    critical_blocks: Vec<String>,
}

/// Read-only registry of role profiles.
pub struct RoleProfileStore {
    profiles: HashMap<String, Arc<RoleProfile>>,
    fallback: Arc<RoleProfile>,
}

impl RoleProfileStore {
    /// A store holding only the built-in default profile.
    pub fn empty() -> Self {
        Self {
            profiles: HashMap::new(),
            fallback: Arc::new(RoleProfile::fallback()),
        }
    }

    /// Load profiles from a YAML document.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("reading {}: {e}", path.display())))?;
        let doc: ProfileDocument = serde_yaml::from_str(&raw)
            .map_err(|e| Error::Config(format!("parsing {}: {e}", path.display())))?;

        let mut profiles = HashMap::new();
        for (id, entry) in doc.profiles {
            let defaults = Thresholds::default();
            let mut profile = RoleProfile {
                id: id.clone(),
                block_weights: entry.block_weights,
                thresholds: Thresholds {
                    pass: entry.pass_threshold.unwrap_or(defaults.pass),
                    drill: entry.drill_threshold,
                    equivalent: entry.equivalent_threshold.unwrap_or(defaults.equivalent),
                    critical_fail: entry
                        .critical_fail_threshold
                        .unwrap_or(defaults.critical_fail),
                },
                scenario_id: entry.scenario_id,
                critical_blocks: entry.critical_blocks.into_iter().collect(),
            };
            profile.normalize_weights();
            if !profile.block_weights.is_empty() && !profile.weights_normalized() {
                return Err(Error::Config(format!(
                    "profile \"{id}\": block weights do not normalize"
                )));
            }
            profiles.insert(id, Arc::new(profile));
        }

        tracing::info!(profiles = profiles.len(), path = %path.display(), "role profiles loaded");

        Ok(Self {
            profiles,
            fallback: Arc::new(RoleProfile::fallback()),
        })
    }

    /// Look up a profile; unknown ids get the built-in default.
    pub fn get(&self, role_id: &str) -> Arc<RoleProfile> {
        self.profiles
            .get(role_id)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn default_profile(&self) -> Arc<RoleProfile> {
        self.fallback.clone()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
profiles:
  it_dc_ops:
    block_weights:
      hardware: 2.0
      sysadmin: 1.0
      network: 1.0
    drill_threshold: 0.7
    equivalent_threshold: 0.6
    critical_blocks: [network]
    scenario_id: dc_ops_v1
  python_backend:
    block_weights:
      python_backend: 1.0
"#;

    fn store() -> RoleProfileStore {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), DOC).unwrap();
        RoleProfileStore::load(file.path()).unwrap()
    }

    #[test]
    fn weights_normalized_on_load() {
        let store = store();
        let profile = store.get("it_dc_ops");
        assert!(profile.weights_normalized());
        assert!((profile.block_weights["hardware"] - 0.5).abs() < 1e-9);
        assert!(profile.is_critical("network"));
        assert_eq!(profile.scenario_id.as_deref(), Some("dc_ops_v1"));
    }

    #[test]
    fn thresholds_fall_back_to_defaults() {
        let store = store();
        let profile = store.get("python_backend");
        assert_eq!(profile.thresholds.drill, None);
        assert_eq!(profile.thresholds.equivalent, 0.6);
        assert_eq!(profile.thresholds.critical_fail, 0.3);
    }

    #[test]
    fn unknown_role_gets_default_profile() {
        let store = store();
        let profile = store.get("ghost");
        assert_eq!(profile.id, "default");
        assert!(profile.block_weights.contains_key("general"));
    }

    #[test]
    fn empty_store_serves_default() {
        let store = RoleProfileStore::empty();
        assert!(store.is_empty());
        assert_eq!(store.get("anything").id, "default");
    }
}
