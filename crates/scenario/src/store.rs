//! Scenario store.
//!
//! Keeps one JSON blob per scenario under the configured directory and a
//! keyed snapshot map in memory. Reads clone an `Arc` without blocking;
//! writes validate, persist atomically (temp file + rename), then swap
//! the snapshot entry.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use hf_domain::error::{Error, Result};
use hf_domain::scenario::{Node, Scenario};

use crate::fallback;
use crate::validate;

/// Process-wide scenario registry backed by a directory of JSON blobs.
pub struct ScenarioStore {
    dir: PathBuf,
    scenarios: RwLock<HashMap<String, Arc<Scenario>>>,
}

impl ScenarioStore {
    /// Open the store at `dir`, creating the directory and loading every
    /// `*.json` blob in it. A blob that fails to parse or validate is
    /// logged and skipped; an unreadable directory is fatal.
    pub fn open(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .map_err(|e| Error::Fatal(format!("creating scenario dir {}: {e}", dir.display())))?;

        let mut scenarios = HashMap::new();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| Error::Fatal(format!("reading scenario dir {}: {e}", dir.display())))?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match Self::load_blob(&path) {
                Ok(scenario) => {
                    tracing::info!(id = %scenario.id, path = %path.display(), "scenario loaded");
                    scenarios.insert(scenario.id.clone(), Arc::new(scenario));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping bad scenario blob");
                }
            }
        }

        tracing::info!(
            scenarios = scenarios.len(),
            dir = %dir.display(),
            "scenario store loaded"
        );

        Ok(Self {
            dir: dir.to_owned(),
            scenarios: RwLock::new(scenarios),
        })
    }

    fn load_blob(path: &Path) -> Result<Scenario> {
        let raw = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_json::from_str(&raw)?;
        let reasons = validate::validate(&scenario);
        if !reasons.is_empty() {
            return Err(Error::InvalidInput(reasons.join("; ")));
        }
        Ok(scenario)
    }

    /// Validate and store a scenario, replacing any previous version
    /// atomically. Rejections come back as `InvalidInput` with the
    /// joined reasons; a failed blob write is `Fatal`.
    pub fn load(&self, scenario: Scenario) -> Result<()> {
        let reasons = validate::validate(&scenario);
        if !reasons.is_empty() {
            return Err(Error::InvalidInput(reasons.join("; ")));
        }

        self.persist(&scenario)?;

        let id = scenario.id.clone();
        self.scenarios.write().insert(id.clone(), Arc::new(scenario));
        tracing::info!(id = %id, "scenario stored");
        Ok(())
    }

    /// Write the blob via a temp file in the same directory, then rename
    /// over the target so readers never observe a partial write.
    fn persist(&self, scenario: &Scenario) -> Result<()> {
        let target = self.blob_path(&scenario.id);
        let json = serde_json::to_string_pretty(scenario)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)
            .map_err(|e| Error::Fatal(format!("creating temp blob: {e}")))?;
        tmp.write_all(json.as_bytes())
            .map_err(|e| Error::Fatal(format!("writing temp blob: {e}")))?;
        tmp.persist(&target)
            .map_err(|e| Error::Fatal(format!("renaming blob to {}: {e}", target.display())))?;
        Ok(())
    }

    fn blob_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Look up a scenario snapshot. No fallback — see
    /// [`Self::get_or_fallback`].
    pub fn get(&self, id: &str) -> Option<Arc<Scenario>> {
        self.scenarios.read().get(id).cloned()
    }

    /// Look up a scenario, synthesizing and registering a three-node
    /// demo chain when the id is unknown.
    pub fn get_or_fallback(&self, id: &str) -> Arc<Scenario> {
        if let Some(s) = self.get(id) {
            return s;
        }
        tracing::warn!(id, "scenario missing, synthesizing fallback chain");
        let generated = Arc::new(fallback::generate(id));
        self.scenarios
            .write()
            .entry(id.to_owned())
            .or_insert_with(|| generated.clone())
            .clone()
    }

    /// Look up one node.
    pub fn node(&self, id: &str, node_id: &str) -> Option<(Arc<Scenario>, Node)> {
        let scenario = self.get(id)?;
        let node = scenario.node(node_id)?.clone();
        Some((scenario, node))
    }

    /// Sorted scenario ids.
    pub fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.scenarios.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.scenarios.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.read().is_empty()
    }

    /// Remove a scenario and its blob.
    pub fn delete(&self, id: &str) -> Result<()> {
        let removed = self.scenarios.write().remove(id);
        if removed.is_none() {
            return Err(Error::NotFound(format!("scenario \"{id}\"")));
        }
        let path = self.blob_path(id);
        if path.exists() {
            std::fs::remove_file(&path)
                .map_err(|e| Error::Fatal(format!("deleting {}: {e}", path.display())))?;
        }
        tracing::info!(id, "scenario deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: &str) -> Scenario {
        fallback::generate(id)
    }

    #[test]
    fn load_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScenarioStore::open(dir.path()).unwrap();

        store.load(sample("python_backend")).unwrap();
        let loaded = store.get("python_backend").expect("scenario present");
        assert_eq!(loaded.id, "python_backend");
        assert_eq!(loaded.nodes.len(), 3);
        assert!(dir.path().join("python_backend.json").exists());
    }

    #[test]
    fn reopen_reads_persisted_blobs() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = ScenarioStore::open(dir.path()).unwrap();
            store.load(sample("sql")).unwrap();
        }
        let store = ScenarioStore::open(dir.path()).unwrap();
        assert_eq!(store.list(), vec!["sql".to_string()]);
    }

    #[test]
    fn invalid_scenario_rejected_with_reasons() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScenarioStore::open(dir.path()).unwrap();

        let mut bad = sample("bad");
        bad.start_id = "ghost".into();
        let err = store.load(bad).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(store.get("bad").is_none());
        assert!(!dir.path().join("bad.json").exists());
    }

    #[test]
    fn reload_replaces_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScenarioStore::open(dir.path()).unwrap();

        store.load(sample("rust")).unwrap();
        let first = store.get("rust").unwrap();

        let mut updated = sample("rust");
        updated.nodes[0].question = "Updated question".into();
        store.load(updated).unwrap();

        let second = store.get("rust").unwrap();
        assert_eq!(second.nodes[0].question, "Updated question");
        // The old snapshot is still usable by holders of the Arc.
        assert_ne!(first.nodes[0].question, second.nodes[0].question);
    }

    #[test]
    fn fallback_synthesizes_and_registers() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScenarioStore::open(dir.path()).unwrap();

        assert!(store.get("golang").is_none());
        let generated = store.get_or_fallback("golang");
        assert_eq!(generated.start_id, "golang_l1_intro");
        // Registered so repeated lookups see the same chain.
        assert!(store.get("golang").is_some());
    }

    #[test]
    fn delete_removes_entry_and_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScenarioStore::open(dir.path()).unwrap();
        store.load(sample("tmp")).unwrap();

        store.delete("tmp").unwrap();
        assert!(store.get("tmp").is_none());
        assert!(!dir.path().join("tmp.json").exists());
        assert!(matches!(store.delete("tmp"), Err(Error::NotFound(_))));
    }

    #[test]
    fn bad_blob_skipped_on_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("garbage.json"), "not json").unwrap();
        let store = ScenarioStore::open(dir.path()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn node_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScenarioStore::open(dir.path()).unwrap();
        store.load(sample("py")).unwrap();

        let (_, node) = store.node("py", "py_l2_basics").expect("node present");
        assert_eq!(node.order, 2);
        assert!(store.node("py", "ghost").is_none());
        assert!(store.node("ghost", "py_l2_basics").is_none());
    }
}
