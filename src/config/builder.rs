//! Default configuration file creation.
//!
//! The generated file lists every setting with its default value and an
//! aligned explanatory comment, so users can edit it in place.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::common::constants::*;

/// Write a commented default config to `path`, creating parent directories.
pub fn create_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let content = ConfigBuilder::new()
        .add_section("Time")
        .add_setting(
            "timezone",
            &format!("\"{DEFAULT_TIMEZONE}\""),
            "IANA zone for all time-of-day comparisons",
        )
        .add_section("Store")
        .add_setting(
            "store",
            &format!("\"{DEFAULT_STORE}\""),
            "Shared record backend: \"file\", \"sqlite\" or \"memory\"",
        )
        .add_commented_setting(
            "store_path",
            "\"~/shared/beacon.json\"",
            "Defaults to XDG_STATE_HOME/timebeacon/",
        )
        .add_section("Refresh")
        .add_setting(
            "refresh_interval",
            &DEFAULT_REFRESH_INTERVAL.to_string(),
            &format!(
                "Milliseconds between refresh cycles ({MINIMUM_REFRESH_INTERVAL}-{MAXIMUM_REFRESH_INTERVAL})"
            ),
        )
        .build();

    fs::write(path, content + "\n")
        .with_context(|| format!("Failed to write default config to {}", path.display()))
}

struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

enum ConfigEntry {
    Section(String),
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry::Section(format!("#[{title}]")));
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("{key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    /// A setting that is documented but left disabled.
    fn add_commented_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        self.entries.push(ConfigEntry::Setting {
            line: format!("# {key} = {value}"),
            comment: format!("# {comment}"),
        });
        self
    }

    fn build(self) -> String {
        // Align all comments one space past the longest setting line.
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match entry {
                ConfigEntry::Setting { line, .. } => Some(line.len()),
                ConfigEntry::Section(_) => None,
            })
            .max()
            .unwrap_or(0)
            + 1;

        let mut result = Vec::new();
        let mut first_section = true;

        for entry in self.entries {
            match entry {
                ConfigEntry::Section(title) => {
                    if !first_section {
                        result.push(String::new());
                    }
                    result.push(title);
                    first_section = false;
                }
                ConfigEntry::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.join("\n")
    }
}
