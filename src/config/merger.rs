use crate::app::{FieldArgs, RenderArgs};
use crate::fields::FieldMapping;
use crate::output::OutputFormat;
use crate::prelude::*;
use proctree::TreeOptions;

use super::{FieldsConfig, OptionsConfig, parse_truncate};

/// Handles merging of CLI arguments with the configuration file
///
/// Implements the precedence rule: CLI > config > default
pub struct ConfigMerger;

impl ConfigMerger {
    pub fn merge_fields(cli: &FieldArgs, config: Option<&FieldsConfig>) -> FieldMapping {
        let defaults = FieldMapping::default();
        let pick = |cli_value: &Option<String>, config_value: Option<&Option<String>>| {
            Self::merge_option(cli_value, config_value.and_then(Option::as_ref))
        };

        FieldMapping {
            pid_field: pick(&cli.pid_field, config.map(|c| &c.pid_field))
                .unwrap_or(defaults.pid_field),
            ppid_field: pick(&cli.ppid_field, config.map(|c| &c.ppid_field))
                .unwrap_or(defaults.ppid_field),
            path_field: pick(&cli.path_field, config.map(|c| &c.path_field))
                .unwrap_or(defaults.path_field),
            cmd_field: pick(&cli.cmd_field, config.map(|c| &c.cmd_field))
                .unwrap_or(defaults.cmd_field),
            time_field: pick(&cli.time_field, config.map(|c| &c.time_field)),
            time_format: pick(&cli.time_format, config.map(|c| &c.time_format)),
            ppath_field: pick(&cli.ppath_field, config.map(|c| &c.ppath_field)),
        }
    }

    /// Merge the rendering options, validating the values coming from the config file
    pub fn merge_options(
        cli: &RenderArgs,
        root_pid: Option<&str>,
        root_path: Option<&str>,
        config: Option<&OptionsConfig>,
    ) -> Result<(TreeOptions, OutputFormat)> {
        let defaults = TreeOptions::default();

        let config_truncate = match config.and_then(|c| c.truncate_cmd.as_ref()) {
            Some(setting) => Some(
                parse_truncate(setting)
                    .map_err(|e| anyhow!("Invalid truncate-cmd in config: {e}"))?,
            ),
            None => None,
        };

        let options = TreeOptions {
            root_pid: root_pid
                .filter(|pid| !pid.trim().is_empty())
                .map(ToString::to_string),
            root_path: root_path
                .filter(|path| !path.trim().is_empty())
                .map(ToString::to_string),
            mode: cli
                .mode
                .or(config.and_then(|c| c.mode))
                .unwrap_or(defaults.mode),
            truncate_cmd: cli
                .truncate_cmd
                .or(config_truncate)
                .unwrap_or(defaults.truncate_cmd),
            layout: cli
                .layout
                .or(config.and_then(|c| c.layout))
                .unwrap_or(defaults.layout),
            suppress_unknown_ancestors: cli
                .suppress_unknown_ancestors
                .or(config.and_then(|c| c.suppress_unknown_ancestors))
                .unwrap_or(defaults.suppress_unknown_ancestors),
            start_from_root: cli
                .start_from_root
                .or(config.and_then(|c| c.start_from_root))
                .unwrap_or(defaults.start_from_root),
        };
        let output = cli
            .output
            .or(config.and_then(|c| c.output))
            .unwrap_or_default();

        Ok((options, output))
    }

    /// Helper to merge Option values with precedence: CLI > config > None
    fn merge_option<T: Clone>(cli_value: &Option<T>, config_value: Option<&T>) -> Option<T> {
        cli_value.clone().or_else(|| config_value.cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TruncateSetting;
    use proctree::{LineLayout, RenderMode};

    #[test]
    fn test_fields_default_without_cli_or_config() {
        let merged = ConfigMerger::merge_fields(&FieldArgs::default(), None);
        assert_eq!(merged, FieldMapping::default());
    }

    #[test]
    fn test_fields_cli_over_config() {
        let cli = FieldArgs {
            pid_field: Some("ProcessId".to_string()),
            ..Default::default()
        };
        let config = FieldsConfig {
            pid_field: Some("child".to_string()),
            ppid_field: Some("parent".to_string()),
            time_field: Some("CreateTime".to_string()),
            ..Default::default()
        };

        let merged = ConfigMerger::merge_fields(&cli, Some(&config));
        assert_eq!(merged.pid_field, "ProcessId");
        assert_eq!(merged.ppid_field, "parent");
        assert_eq!(merged.path_field, "path");
        assert_eq!(merged.time_field.as_deref(), Some("CreateTime"));
        assert_eq!(merged.time_format, None);
    }

    #[test]
    fn test_options_defaults() {
        let (options, output) =
            ConfigMerger::merge_options(&RenderArgs::default(), None, None, None).unwrap();
        assert_eq!(options, TreeOptions::default());
        assert_eq!(output, OutputFormat::Text);
    }

    #[test]
    fn test_options_cli_over_config() {
        let cli = RenderArgs {
            mode: Some(RenderMode::Tree),
            start_from_root: Some(true),
            ..Default::default()
        };
        let config = OptionsConfig {
            mode: Some(RenderMode::Table),
            truncate_cmd: Some(TruncateSetting::Text("40".to_string())),
            layout: Some(LineLayout::Columns),
            suppress_unknown_ancestors: Some(true),
            start_from_root: Some(false),
            output: Some(OutputFormat::Json),
        };

        let (options, output) =
            ConfigMerger::merge_options(&cli, Some("42"), Some(" "), Some(&config)).unwrap();
        assert_eq!(options.root_pid.as_deref(), Some("42"));
        assert_eq!(options.root_path, None);
        assert_eq!(options.mode, RenderMode::Tree);
        assert_eq!(options.truncate_cmd, 40);
        assert_eq!(options.layout, LineLayout::Columns);
        assert!(options.suppress_unknown_ancestors);
        assert!(options.start_from_root);
        assert_eq!(output, OutputFormat::Json);
    }

    #[test]
    fn test_empty_root_pid_means_forest() {
        let (options, _) =
            ConfigMerger::merge_options(&RenderArgs::default(), Some(""), None, None).unwrap();
        assert!(options.is_forest());
    }

    #[test]
    fn test_invalid_config_truncate() {
        let config = OptionsConfig {
            truncate_cmd: Some(TruncateSetting::Text("ten".to_string())),
            ..Default::default()
        };
        let error = ConfigMerger::merge_options(&RenderArgs::default(), None, None, Some(&config))
            .unwrap_err();
        assert!(error.to_string().contains("Invalid truncate-cmd in config"));
    }
}
