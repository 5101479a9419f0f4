use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the exe-icon CLI and [`process_path`](crate::pipeline::process_path).
///
/// The parsing core takes no configuration; these settings only control where
/// and how extracted icons are written.
///
/// # Loading
///
/// ```rust,no_run
/// use exe_icon::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("config.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.output.out_dir = Some("icons".into());
/// config.output.overwrite = true;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output behavior (destination, overwrite, dry run).
    pub output: OutputConfig,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for extracted `.png` files. `None` writes next to each executable.
    pub out_dir: Option<String>,
    /// If `true`, replace icons that already exist at the destination.
    pub overwrite: bool,
    /// If `true`, extract and report without writing any files.
    pub dry_run: bool,
    /// If `true`, include a `data:image/png;base64,...` URL in JSON results.
    pub embed_data_url: bool,
}

impl Config {
    /// Resolve the config file path: `config.json` next to the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join("config.json"))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            log::warn!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<()> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Destination of the icon extracted from `exe_path`: `<out_dir or exe dir>/<exe stem>.png`.
    pub fn icon_output_path(&self, exe_path: &Path) -> PathBuf {
        let stem = exe_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "icon".to_string());
        let dir = match &self.output.out_dir {
            Some(dir) => PathBuf::from(dir),
            None => exe_path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default(),
        };
        dir.join(format!("{stem}.png"))
    }
}
