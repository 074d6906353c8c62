// Local JSON cache for list endpoints that rarely change (plans, regions,
// operating systems, applications).
//
// Each resource type has a fixed file name under one directory. There is no
// expiry: the cache is only replaced when the operator asks for a refresh.

use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{CliError, Result};

pub const PLANS: &str = "vultr_plans.json";
pub const REGIONS: &str = "vultr_regions.json";
pub const OPERATING_SYSTEMS: &str = "vultr_os.json";
pub const APPLICATIONS: &str = "vultr_applications.json";

/// Directory holding one pretty-printed JSON document per resource type.
#[derive(Debug, Clone)]
pub struct DataCache {
    dir: PathBuf,
}

impl DataCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// Write `data` under `name`, creating the directory if needed and
    /// replacing any previous content.
    pub fn save(&self, name: &str, data: &Value) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| CliError::cache("create directory", &self.dir, e))?;
        let path = self.path_for(name);
        let formatted = serde_json::to_string_pretty(data)
            .map_err(|e| CliError::cache("serialize", &path, e))?;
        fs::write(&path, formatted).map_err(|e| CliError::cache("write", &path, e))?;
        debug!(path = %path.display(), "cache saved");
        Ok(())
    }

    /// Load the document stored under `name`; `Ok(None)` when it was never
    /// written.
    pub fn load(&self, name: &str) -> Result<Option<Value>> {
        let path = self.path_for(name);
        if !path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| CliError::cache("read", &path, e))?;
        let data = serde_json::from_str(&text).map_err(|e| CliError::cache("parse", &path, e))?;
        debug!(path = %path.display(), "cache hit");
        Ok(Some(data))
    }

    /// Load `name`, or call `fetch` and store its result on a miss.
    ///
    /// `fetch` returns `Ok(None)` when the provider rejected the request, in
    /// which case nothing is written.
    pub fn load_or_fetch<F>(&self, name: &str, label: &str, fetch: F) -> Result<Option<Value>>
    where
        F: FnOnce() -> Result<Option<Value>>,
    {
        if let Some(data) = self.load(name)? {
            return Ok(Some(data));
        }
        println!("No cached {} found, retrieving from API.", label);
        match fetch()? {
            Some(data) => {
                println!("Saving {} data", label);
                self.save(name, &data)?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }
}
