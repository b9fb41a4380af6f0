//! JSON persistence for per-guild permission rules.
//!
//! The file holds one object keyed by guild id:
//!
//! ```json
//! {
//!   "100": {
//!     "rules": [
//!       { "pathExpression": "help", "guildId": 100, "subject": { "role": 100 }, "allow": true }
//!     ],
//!     "defaultAllow": true
//!   }
//! }
//! ```
//!
//! Rules keep their array order, which is their evaluation order.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use herald_core::GuildId;
use herald_framework::{GuildConfiguration, RuleStore};
use tracing::{debug, info};

use crate::error::{RuntimeError, RuntimeResult};

/// Configurations of every guild, ordered by guild id.
pub type RuleSnapshot = BTreeMap<GuildId, GuildConfiguration>;

/// A rule file on disk.
#[derive(Debug, Clone)]
pub struct RulesFile {
    path: PathBuf,
}

impl RulesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file, `None` if it does not exist.
    pub fn read(&self) -> RuntimeResult<Option<RuleSnapshot>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RuntimeError::rules_io(&self.path, e)),
        };
        if text.trim().is_empty() {
            return Ok(Some(RuleSnapshot::new()));
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| RuntimeError::rules_format(&self.path, e))
    }

    /// Writes `snapshot`, replacing the file atomically.
    pub fn write(&self, snapshot: &RuleSnapshot) -> RuntimeResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| RuntimeError::rules_io(parent, e))?;
        }

        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| RuntimeError::rules_format(&self.path, e))?;

        let mut staging = self.path.clone().into_os_string();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        fs::write(&staging, json).map_err(|e| RuntimeError::rules_io(&staging, e))?;
        fs::rename(&staging, &self.path).map_err(|e| RuntimeError::rules_io(&self.path, e))?;

        debug!(path = %self.path.display(), guilds = snapshot.len(), "Rule file written");
        Ok(())
    }

    /// Loads the file into `store`, creating an empty file if none exists.
    ///
    /// Returns the number of guilds loaded.
    pub fn load_into(&self, store: &RuleStore) -> RuntimeResult<usize> {
        match self.read()? {
            Some(snapshot) => {
                let guilds = snapshot.len();
                store.restore(snapshot);
                info!(path = %self.path.display(), guilds, "Loaded permission rules");
                Ok(guilds)
            }
            None => {
                info!(path = %self.path.display(), "No rule file found, creating an empty one");
                self.write(&RuleSnapshot::new())?;
                Ok(0)
            }
        }
    }

    /// Writes the current contents of `store`.
    pub fn save(&self, store: &RuleStore) -> RuntimeResult<()> {
        self.write(&store.snapshot())
    }
}

#[cfg(test)]
mod tests {
    use herald_core::{Member, RoleId, Route, UserId};

    use super::*;

    const GUILD: GuildId = GuildId::new(100);
    const EVERYONE: RoleId = RoleId::new(100);

    #[test]
    fn test_missing_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let file = RulesFile::new(dir.path().join("nested/permissions.json"));
        let store = RuleStore::new();

        assert_eq!(file.load_into(&store).unwrap(), 0);
        assert_eq!(fs::read_to_string(file.path()).unwrap(), "{}");
    }

    #[test]
    fn test_round_trip_keeps_rule_order() {
        let dir = tempfile::tempdir().unwrap();
        let file = RulesFile::new(dir.path().join("permissions.json"));

        let store = RuleStore::new();
        store.add_public_activity(Route::parse("help").unwrap());
        store.add_restricted_activity(Route::parse("permissions add").unwrap());
        store.initialize_for_guild(GUILD, EVERYONE);
        store.set_default_allow(GUILD, false).unwrap();
        file.save(&store).unwrap();

        let restored = RuleStore::new();
        assert_eq!(file.load_into(&restored).unwrap(), 1);
        assert_eq!(restored.rules(GUILD), store.rules(GUILD));
        assert!(!restored.default_allow(GUILD));

        let member = Member::new(UserId::new(3)).with_role(EVERYONE);
        assert!(restored.check_accessibility(&Route::parse("help").unwrap(), &member, Some(GUILD)));
        assert!(!restored.check_accessibility(
            &Route::parse("permissions add").unwrap(),
            &member,
            Some(GUILD)
        ));
    }

    #[test]
    fn test_reads_documented_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permissions.json");
        fs::write(
            &path,
            r#"{"100": {"rules": [{"pathExpression": "permissions **", "guildId": 100,
                "subject": {"role": 50}, "allow": true}], "defaultAllow": false}}"#,
        )
        .unwrap();

        let snapshot = RulesFile::new(&path).read().unwrap().unwrap();
        let config = &snapshot[&GUILD];
        assert!(!config.default_allow);
        assert_eq!(config.rules.len(), 1);
        assert_eq!(config.rules[0].path_expression().to_string(), "permissions **");
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("permissions.json");
        fs::write(&path, "[1, 2").unwrap();

        let err = RulesFile::new(&path).load_into(&RuleStore::new()).unwrap_err();
        assert!(matches!(err, RuntimeError::RulesFormat { .. }));
    }
}
