use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct LogConfig {
    /// Directory for the log file; logs go to stdout when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

impl LogConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(dir) = &self.log_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::InvalidConfig("log.log_dir cannot be empty".into()));
            }
        }
        Ok(())
    }
}
