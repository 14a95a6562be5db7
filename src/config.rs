use std::path::PathBuf;

use crate::error::{Error, Result};

/// Runtime settings, read from the environment (a .env file is honored).
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory holding the office's .docx templates.
    pub templates_dir: PathBuf,
    pub db_path: PathBuf,
    /// Where generated documents land.
    pub output_dir: PathBuf,
}

fn load_env() {
    let _ = dotenvy::dotenv();
}

impl Settings {
    /// DEMAND_TEMPLATES_DIR is required; DEMAND_DB_PATH and
    /// DEMAND_OUTPUT_DIR have sensible fallbacks.
    pub fn from_env() -> Result<Self> {
        load_env();
        let templates_dir = std::env::var("DEMAND_TEMPLATES_DIR")
            .map_err(|_| Error::Config("DEMAND_TEMPLATES_DIR not set in .env".to_string()))?
            .into();
        let db_path = match std::env::var("DEMAND_DB_PATH") {
            Ok(p) => PathBuf::from(p),
            Err(_) => default_db_path()?,
        };
        let output_dir = match std::env::var("DEMAND_OUTPUT_DIR") {
            Ok(p) => PathBuf::from(p),
            Err(_) => dirs::download_dir()
                .or_else(dirs::desktop_dir)
                .ok_or_else(|| {
                    Error::Config("Could not find Downloads or Desktop folder.".to_string())
                })?,
        };
        Ok(Settings {
            templates_dir,
            db_path,
            output_dir,
        })
    }
}

fn default_db_path() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .ok_or_else(|| Error::Config("Could not find app data folder.".to_string()))?;
    Ok(dir.join("demand-builder").join("demand_builder.db"))
}
