//! Get command: print the current beacon state once.
//!
//! Human-readable output goes through the logger. With `--json` logging is
//! switched off and a single JSON object is printed, for scripts.

use anyhow::Result;
use serde_json::{Value, json};

use crate::common::logger::Log;
use crate::core::BeaconView;

/// Handle the get command.
pub fn handle_get_command(config_dir: Option<&str>, json: bool, debug_enabled: bool) -> Result<()> {
    if json {
        // Keep stdout clean for the JSON document.
        Log::set_enabled(false);
    } else {
        log_version!();
    }

    let config = super::load_config(config_dir)?;
    let mut beacon = super::connect_real(&config, debug_enabled)?;
    let report = beacon.tick();

    if json {
        let mut value = view_to_json(&report.view);
        if let Some(error) = &report.error {
            value["error"] = json!(error.to_string());
        }
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if let Some(error) = &report.error {
        log_pipe!();
        log_warning!("{error}");
        log_indented!("Showing the last known state");
    }

    let view = &report.view;
    let record = &view.record;
    log_block_start!("Shared beacon ({})", beacon.store().backend_name());
    log_indented!("Now:      {} {}", view.date_text(), view.clock_text());
    log_indented!("Target:   {}", record.target_time());
    log_indented!("Mode:     {}", record.mode().display_name());
    log_indented!(
        "Reached:  {}{}",
        if view.reached { "yes" } else { "no" },
        if record.forced_override() { " (pinned)" } else { "" }
    );
    if let Some(countdown) = view.countdown {
        log_indented!("{:<10}{}", format!("{}:", capitalize(countdown.label.as_str())), countdown.hms_text());
    }
    log_indented!("Marker:   {}", record.update_marker);
    log_end!();
    Ok(())
}

/// JSON document for `get --json`.
pub(crate) fn view_to_json(view: &BeaconView) -> Value {
    let record = &view.record;
    let countdown = view.countdown.map(|c| {
        json!({
            "label": c.label.as_str(),
            "seconds": c.duration.num_seconds().max(0),
            "text": c.hms_text(),
        })
    });
    json!({
        "now": view.now.to_rfc3339(),
        "target_time": record.target_time().to_string(),
        "mode": record.mode().as_str(),
        "reached": view.reached,
        "forced_override": record.forced_override(),
        "update_marker": record.update_marker.value(),
        "countdown": countdown,
    })
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Display detailed help for the get command.
pub fn display_help() {
    log_version!();
    log_block_start!("get - Print the current state once");
    log_block_start!("Usage: timebeacon get [--json]");
    log_block_start!("Options:");
    log_indented!("-j, --json   Print a JSON object instead of formatted text");
    log_block_start!("Examples:");
    log_indented!("timebeacon get");
    log_indented!("timebeacon get --json | jq .countdown.seconds");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::evaluator::{Countdown, DurationLabel};
    use crate::record::{RecordFields, SharedRecord, UpdateMarker};
    use crate::time::source::parse_datetime_in_tz;
    use chrono::TimeDelta;

    #[test]
    fn test_view_to_json() {
        let view = BeaconView {
            now: parse_datetime_in_tz("2025-01-10 23:58:59", chrono_tz::Asia::Tokyo).unwrap(),
            record: SharedRecord::new(RecordFields::default(), UpdateMarker(7)),
            reached: false,
            countdown: Some(Countdown {
                duration: TimeDelta::seconds(1),
                label: DurationLabel::Remaining,
            }),
            editing: false,
        };

        let value = view_to_json(&view);
        assert_eq!(value["target_time"], "23:59");
        assert_eq!(value["mode"], "count_up_from");
        assert_eq!(value["reached"], false);
        assert_eq!(value["update_marker"], 7);
        assert_eq!(value["countdown"]["label"], "remaining");
        assert_eq!(value["countdown"]["seconds"], 1);
        assert_eq!(value["countdown"]["text"], "00:00:01");
        assert_eq!(value["now"], "2025-01-10T23:58:59+09:00");
    }

    #[test]
    fn test_view_to_json_without_countdown() {
        let view = BeaconView {
            now: parse_datetime_in_tz("2025-01-10 08:00:00", chrono_tz::Asia::Tokyo).unwrap(),
            record: SharedRecord::new(
                RecordFields::default().with_reached(true, true),
                UpdateMarker(2),
            ),
            reached: true,
            countdown: None,
            editing: false,
        };
        let value = view_to_json(&view);
        assert!(value["countdown"].is_null());
        assert_eq!(value["forced_override"], true);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("elapsed"), "Elapsed");
        assert_eq!(capitalize(""), "");
    }
}
