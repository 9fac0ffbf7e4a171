use crate::prelude::*;
use std::fs;
use std::path::Path;

mod interfaces;
pub mod merger;

pub use interfaces::*;

/// Config file names in priority order
const CONFIG_FILENAMES: &[&str] = &["ptree.yaml", "ptree.yml", ".ptree.yaml", ".ptree.yml"];

/// Parse a command-line length limit: a non-negative integer, empty meaning no limit
pub fn parse_truncate_arg(value: &str) -> std::result::Result<usize, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(0);
    }
    value
        .parse::<usize>()
        .map_err(|_| format!("expected a non-negative integer, got {value:?}"))
}

pub fn parse_truncate(setting: &TruncateSetting) -> std::result::Result<usize, String> {
    match setting {
        TruncateSetting::Count(count) => Ok(*count),
        TruncateSetting::Text(text) => parse_truncate_arg(text),
    }
}

impl PtreeConfig {
    /// Discover and load the configuration file
    ///
    /// An explicit `config_path_override` must exist. Otherwise the known file names are tried
    /// in `current_dir`, and a missing file is not an error.
    pub fn discover_and_load(
        config_path_override: Option<&Path>,
        current_dir: &Path,
    ) -> Result<Option<PtreeConfig>> {
        if let Some(config_path) = config_path_override {
            let config = Self::load_from_path(config_path)
                .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
            return Ok(Some(config));
        }

        for filename in CONFIG_FILENAMES {
            let candidate_path = current_dir.join(filename);
            if candidate_path.exists() {
                debug!("Found config file at {}", candidate_path.display());
                return Self::load_from_path(&candidate_path).map(Some);
            }
        }

        Ok(None)
    }

    /// Load and parse config from a specific path
    fn load_from_path(path: &Path) -> Result<Self> {
        let config_content = fs::read(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        // An empty file is a valid, empty configuration
        if config_content.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_slice(&config_content)
            .with_context(|| format!("Failed to parse ptree config at {}", path.display()))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if let Some(setting) = self
            .options
            .as_ref()
            .and_then(|options| options.truncate_cmd.as_ref())
        {
            parse_truncate(setting).map_err(|e| anyhow!("Invalid truncate-cmd in config: {e}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;
    use proctree::{LineLayout, RenderMode};
    use tempfile::TempDir;

    #[test]
    fn test_deserialize_full_config() {
        let yaml = r#"
fields:
  pid-field: ProcessId
  ppid-field: ParentProcessId
  time-field: CreateTime
  time-format: "%m/%d/%Y %H:%M:%S"
options:
  mode: table
  truncate-cmd: 80
  layout: columns
  suppress-unknown-ancestors: true
  start-from-root: false
  output: json
"#;
        let config: PtreeConfig = serde_yaml::from_str(yaml).unwrap();
        let fields = config.fields.unwrap();
        assert_eq!(fields.pid_field.as_deref(), Some("ProcessId"));
        assert_eq!(fields.time_format.as_deref(), Some("%m/%d/%Y %H:%M:%S"));
        assert_eq!(fields.cmd_field, None);

        let options = config.options.unwrap();
        assert_eq!(options.mode, Some(RenderMode::Table));
        assert_eq!(options.truncate_cmd, Some(TruncateSetting::Count(80)));
        assert_eq!(options.layout, Some(LineLayout::Columns));
        assert_eq!(options.suppress_unknown_ancestors, Some(true));
        assert_eq!(options.start_from_root, Some(false));
        assert_eq!(options.output, Some(OutputFormat::Json));
    }

    #[test]
    fn test_deserialize_rejects_unknown_mode() {
        let yaml = "options:\n  mode: graph\n";
        assert!(serde_yaml::from_str::<PtreeConfig>(yaml).is_err());
    }

    #[test]
    fn test_parse_truncate_values() {
        assert_eq!(parse_truncate_arg(""), Ok(0));
        assert_eq!(parse_truncate_arg(" 12 "), Ok(12));
        assert!(parse_truncate_arg("-3").is_err());
        assert!(parse_truncate_arg("abc").is_err());
        assert_eq!(parse_truncate(&TruncateSetting::Text(String::new())), Ok(0));
    }

    #[test]
    fn test_discover_config_in_current_dir() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(".ptree.yml"),
            "options:\n  truncate-cmd: \"20\"\n",
        )
        .unwrap();

        let config = PtreeConfig::discover_and_load(None, temp_dir.path())
            .unwrap()
            .unwrap();
        assert_eq!(
            config.options.unwrap().truncate_cmd,
            Some(TruncateSetting::Text("20".to_string()))
        );
    }

    #[test]
    fn test_discover_prefers_first_filename() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("ptree.yml"), "options:\n  mode: tree\n").unwrap();
        std::fs::write(temp_dir.path().join("ptree.yaml"), "options:\n  mode: table\n").unwrap();

        let config = PtreeConfig::discover_and_load(None, temp_dir.path())
            .unwrap()
            .unwrap();
        assert_eq!(config.options.unwrap().mode, Some(RenderMode::Table));
    }

    #[test]
    fn test_discover_without_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = PtreeConfig::discover_and_load(None, temp_dir.path()).unwrap();
        assert!(config.is_none());
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.yaml");
        let error = PtreeConfig::discover_and_load(Some(&missing), temp_dir.path()).unwrap_err();
        assert!(error.to_string().contains("Failed to load config from"));
    }

    #[test]
    fn test_invalid_truncate_is_rejected_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yaml");
        std::fs::write(&path, "options:\n  truncate-cmd: lots\n").unwrap();

        let error = PtreeConfig::discover_and_load(Some(&path), temp_dir.path()).unwrap_err();
        assert!(format!("{error:#}").contains("Invalid truncate-cmd in config"));
    }

    #[test]
    fn test_empty_file_is_empty_config() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("ptree.yaml"), "\n").unwrap();
        let config = PtreeConfig::discover_and_load(None, temp_dir.path())
            .unwrap()
            .unwrap();
        assert_eq!(config, PtreeConfig::default());
    }
}
