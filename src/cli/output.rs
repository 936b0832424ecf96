//! Output formatting utilities for the CLI.

use serde::Serialize;

pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate to at most `max_chars` characters, appending "..." if truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Optional number for display, `-` when absent.
pub fn or_dash(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), crate::services::numeric::format_number)
}
