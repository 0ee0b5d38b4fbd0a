//! File-backed session store (auth token, expiry, cached form config).

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use engine_logging::{engine_error, engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use sip_core::SessionStore;
use sip_engine::AtomicFileWriter;

const STATE_FILENAME: &str = ".sip_session.ron";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedSession {
    entries: BTreeMap<String, String>,
}

/// Session store persisted as RON in the output directory; every change is written through.
pub(crate) struct FileSessionStore {
    dir: PathBuf,
    session: PersistedSession,
}

impl FileSessionStore {
    pub(crate) fn load(dir: &Path) -> Self {
        let path = dir.join(STATE_FILENAME);
        let session = match fs::read_to_string(&path) {
            Ok(text) => match ron::from_str::<PersistedSession>(&text) {
                Ok(session) => {
                    engine_info!("Loaded session state from {:?}", path);
                    session
                }
                Err(err) => {
                    engine_warn!("Failed to parse session state from {:?}: {}", path, err);
                    PersistedSession::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => PersistedSession::default(),
            Err(err) => {
                engine_warn!("Failed to read session state from {:?}: {}", path, err);
                PersistedSession::default()
            }
        };
        Self {
            dir: dir.to_path_buf(),
            session,
        }
    }

    fn save(&self) {
        let pretty = ron::ser::PrettyConfig::new();
        let content = match ron::ser::to_string_pretty(&self.session, pretty) {
            Ok(text) => text,
            Err(err) => {
                engine_error!("Failed to serialize session state: {}", err);
                return;
            }
        };

        let writer = AtomicFileWriter::new(self.dir.clone());
        if let Err(err) = writer.write(STATE_FILENAME, &content) {
            engine_error!("Failed to write session state to {:?}: {}", self.dir, err);
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.session.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.session.entries.insert(key.to_string(), value);
        self.save();
    }

    fn remove(&mut self, key: &str) {
        if self.session.entries.remove(key).is_some() {
            self.save();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sip_core::{AuthGate, AUTH_TOKEN_KEY};
    use tempfile::TempDir;

    #[test]
    fn entries_survive_reload() {
        let temp = TempDir::new().unwrap();
        let mut store = FileSessionStore::load(temp.path());
        store.set("sip_form_config", "{}".to_string());

        let reloaded = FileSessionStore::load(temp.path());
        assert_eq!(reloaded.get("sip_form_config").as_deref(), Some("{}"));
    }

    #[test]
    fn login_and_logout_are_persisted() {
        let temp = TempDir::new().unwrap();
        let gate = AuthGate::with_demo_users();
        let mut store = FileSessionStore::load(temp.path());
        gate.login(&mut store, "demo", "demo123", 1_000).unwrap();

        let mut reloaded = FileSessionStore::load(temp.path());
        assert!(gate.is_authed(&reloaded, 1_001));

        gate.logout(&mut reloaded);
        let after = FileSessionStore::load(temp.path());
        assert!(after.get(AUTH_TOKEN_KEY).is_none());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(STATE_FILENAME), "not ron (").unwrap();

        let store = FileSessionStore::load(temp.path());
        assert!(store.get(AUTH_TOKEN_KEY).is_none());
    }
}
