//! Enum types shared between the config file and the core crate.

use serde::{Deserialize, Serialize};

/// Ordering applied to a window's items by the view projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Creation time, earliest first
    #[default]
    Oldest,
    /// Creation time, latest first
    Newest,
    /// Title, natural order ("2" before "10")
    Alpha,
    /// Title, natural order reversed
    AlphaDesc,
}

impl SortMode {
    /// Parse the wire/CLI spelling (`oldest`, `newest`, `alpha`, `alpha-desc`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oldest" => Some(SortMode::Oldest),
            "newest" => Some(SortMode::Newest),
            "alpha" => Some(SortMode::Alpha),
            "alpha-desc" | "alpha_desc" => Some(SortMode::AlphaDesc),
            _ => None,
        }
    }
}

/// Log level for debug logging to file.
///
/// Environment variable `RUST_LOG` and the `--log-level` CLI flag take precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No logging
    Off,
    /// Errors only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    #[default]
    Info,
    /// Debug messages
    Debug,
    /// Most verbose
    Trace,
}

impl LogLevel {
    /// Convert to `log::LevelFilter`
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_mode_parse() {
        assert_eq!(SortMode::parse("oldest"), Some(SortMode::Oldest));
        assert_eq!(SortMode::parse(" Newest "), Some(SortMode::Newest));
        assert_eq!(SortMode::parse("alpha-desc"), Some(SortMode::AlphaDesc));
        assert_eq!(SortMode::parse("random"), None);
    }

    #[test]
    fn test_sort_mode_yaml_spelling() {
        let yaml = serde_yaml_ng::to_string(&SortMode::AlphaDesc).unwrap();
        assert_eq!(yaml.trim(), "alpha-desc");
        let parsed: SortMode = serde_yaml_ng::from_str("newest").unwrap();
        assert_eq!(parsed, SortMode::Newest);
    }

    #[test]
    fn test_log_level_to_filter() {
        assert_eq!(LogLevel::default().to_level_filter(), log::LevelFilter::Info);
        assert_eq!(LogLevel::Off.to_level_filter(), log::LevelFilter::Off);
    }
}
