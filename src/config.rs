//! Credentials and runtime settings.
//!
//! Credentials live in a JSON key file under the configuration directory:
//!
//! ```json
//! {"keys": [{"alias": "prod", "db": "acme", "username": "ops@acme.test",
//!            "password": "...", "host": "https://acme.odoo.com"}]}
//! ```
//!
//! `ODOO_ACCESS_KEY` names that file and `ODOO_ACCESS_KEY_INDEX` selects the entry.
//! Both are usually set in `conf/.env`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

pub const ENV_ACCESS_KEY: &str = "ODOO_ACCESS_KEY";
pub const ENV_ACCESS_KEY_INDEX: &str = "ODOO_ACCESS_KEY_INDEX";
pub const DEFAULT_CONF_DIR: &str = "conf";
pub const DEFAULT_ENV_FILE: &str = "conf/.env";
pub const DEFAULT_OUTPUT_DIR: &str = "temp";
pub const DEFAULT_RELOCATE_DELAY_MS: u64 = 1000;
pub const DEFAULT_PRICELIST_DELAY_MS: u64 = 200;

#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiKey {
    pub alias: String,
    pub db: String,
    pub username: String,
    pub password: String,
    pub host: String,
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKey")
            .field("alias", &self.alias)
            .field("db", &self.db)
            .field("username", &self.username)
            .field("password", &"***")
            .field("host", &self.host)
            .finish()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct KeyRing {
    pub keys: Vec<ApiKey>,
}

impl KeyRing {
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading key file");
        let raw = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read key file {}: {}", path.display(), e))
        })?;
        let ring: KeyRing = serde_json::from_str(&raw)?;
        if ring.keys.is_empty() {
            return Err(Error::Config(format!(
                "key file {} holds no keys",
                path.display()
            )));
        }
        Ok(ring)
    }

    pub fn get(&self, index: usize) -> Result<&ApiKey> {
        self.keys.get(index).ok_or_else(|| {
            Error::Config(format!(
                "key index {} out of range ({} keys)",
                index,
                self.keys.len()
            ))
        })
    }

    pub fn by_alias(&self, alias: &str) -> Result<&ApiKey> {
        self.keys
            .iter()
            .find(|k| k.alias == alias)
            .ok_or_else(|| Error::Config(format!("no key with alias '{}'", alias)))
    }
}

/// Loads `.env` if present. A missing file is not an error.
pub fn load_env(path: &Path) {
    match dotenv::from_path(path) {
        Ok(()) => debug!(path = %path.display(), "loaded environment file"),
        Err(e) => debug!(path = %path.display(), error = %e, "no environment file loaded"),
    }
}

/// Where to find the key and which entry to use.
#[derive(Debug, Clone)]
pub struct KeySource {
    pub conf_dir: PathBuf,
    pub file: String,
    pub index: usize,
    pub alias: Option<String>,
}

impl KeySource {
    pub fn path(&self) -> PathBuf {
        self.conf_dir.join(&self.file)
    }

    pub fn resolve(&self) -> Result<ApiKey> {
        let ring = KeyRing::load(&self.path())?;
        let key = match &self.alias {
            Some(alias) => ring.by_alias(alias)?,
            None => ring.get(self.index)?,
        };
        info!(alias = %key.alias, host = %key.host, db = %key.db, "using odoo key");
        Ok(key.clone())
    }
}

/// Settings shared by the reporting and maintenance operations.
#[derive(Debug, Clone)]
pub struct OpsConfig {
    /// Directory receiving exported tables.
    pub output_dir: PathBuf,
    /// Pause after each quant relocation.
    pub relocate_delay: Duration,
    /// Pause after each pricelist item write.
    pub pricelist_delay: Duration,
    /// Log intended writes without sending them.
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_ring(dir: &Path) -> PathBuf {
        let path = dir.join("odoo-api-test.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"keys": [
                {{"alias": "test", "db": "acme-test", "username": "bot", "password": "t", "host": "https://test.acme"}},
                {{"alias": "prod", "db": "acme", "username": "bot", "password": "p", "host": "https://acme"}}
            ]}}"#
        )
        .unwrap();
        path
    }

    #[test]
    fn resolves_by_index_and_alias() {
        let dir = tempfile::tempdir().unwrap();
        write_ring(dir.path());
        let mut source = KeySource {
            conf_dir: dir.path().to_path_buf(),
            file: "odoo-api-test.json".to_string(),
            index: 1,
            alias: None,
        };
        assert_eq!(source.resolve().unwrap().alias, "prod");

        source.alias = Some("test".to_string());
        assert_eq!(source.resolve().unwrap().db, "acme-test");
    }

    #[test]
    fn out_of_range_index_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_ring(dir.path());
        let ring = KeyRing::load(&path).unwrap();
        assert!(matches!(ring.get(5), Err(Error::Config(_))));
    }

    #[test]
    fn empty_ring_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        std::fs::write(&path, r#"{"keys": []}"#).unwrap();
        assert!(KeyRing::load(&path).is_err());
    }

    #[test]
    fn debug_hides_password() {
        let key = ApiKey {
            alias: "a".into(),
            db: "d".into(),
            username: "u".into(),
            password: "secret".into(),
            host: "h".into(),
        };
        assert!(!format!("{:?}", key).contains("secret"));
    }
}
