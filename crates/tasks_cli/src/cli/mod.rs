use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tasks_core::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task
    ///
    /// Example: tasks add "Buy milk"
    Add { text: Option<String> },
    /// Mark a task as completed, or reopen a completed one
    ///
    /// Example: tasks toggle 1700000000000
    Toggle {
        #[arg(allow_negative_numbers = true)]
        id: String,
    },
    /// Delete a task
    ///
    /// Example: tasks delete 1700000000000
    Delete {
        #[arg(allow_negative_numbers = true)]
        id: String,
    },
    /// List all tasks with their counters
    ///
    /// Example: tasks list
    List,
    /// Apply a raw action
    ///
    /// Example: tasks apply '{"type":"ADD_TODO","payload":"Buy milk"}'
    Apply { action: String },
    /// Validate the stored task state
    ///
    /// Example: tasks check
    Check,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    StorePath,
    Log,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let key =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match key.as_str() {
        "store_path" | "store" => ConfigOverrideTarget::StorePath,
        "log" | "log_filter" => ConfigOverrideTarget::Log,
        other => return Err(format!("unknown config field '{other}'")),
    };

    if value.is_empty() {
        return Err(format!("override '{key}' requires a value"));
    }

    Ok(ParsedConfigOverride { target, value })
}

/// Folds parsed overrides into [`ConfigOverrides`]; later values win.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();
    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::StorePath => {
                overrides.store_path = Some(PathBuf::from(parsed.value));
            }
            ConfigOverrideTarget::Log => overrides.log = Some(parsed.value),
        }
    }
    Ok(overrides)
}

/// `Store-Path`, `store.path` and `store path` all name `store_path`.
fn canonicalize_flag_name(name: &str) -> Option<String> {
    let key = name
        .trim()
        .to_ascii_lowercase()
        .replace(['-', ' ', '.'], "_");
    (!key.is_empty()).then_some(key)
}

#[cfg(test)]
mod tests {
    use super::{ConfigOverrideTarget, collect_config_overrides, parse_config_override};
    use std::path::PathBuf;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" Store-Path = /tmp/s.json ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::StorePath);
        assert_eq!(parsed.value, "/tmp/s.json");
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("theme=noir").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("logdebug").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn parse_config_override_rejects_empty_value() {
        let err = parse_config_override("log=  ").unwrap_err();
        assert!(err.contains("requires a value"));
    }

    #[test]
    fn parse_config_override_accepts_dotted_keys() {
        let parsed = parse_config_override("store.path=/tmp/s.json").unwrap();
        assert_eq!(parsed.target, ConfigOverrideTarget::StorePath);
    }

    #[test]
    fn collect_config_overrides_keeps_last_value() {
        let overrides = collect_config_overrides(&[
            "log=info".to_string(),
            "store_path=/a.json".to_string(),
            "LOG=debug".to_string(),
        ])
        .unwrap();

        assert_eq!(overrides.log.as_deref(), Some("debug"));
        assert_eq!(overrides.store_path, Some(PathBuf::from("/a.json")));
    }
}
