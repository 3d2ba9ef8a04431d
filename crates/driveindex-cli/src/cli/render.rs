//! # Rendering
//!
//! Turns a `CmdResult` into terminal text or JSON. Layout math (column widths,
//! truncation) is done here with `unicode-width` so names in any script line up.

use super::styles::styles;
use driveindex::commands::{CmdMessage, CmdResult, MessageLevel, SearchHit, Stats, SyncSummary};
use driveindex::config::IndexConfig;
use serde_json::{json, Value};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const LINE_WIDTH: usize = 100;
const ELLIPSIS: char = '…';

/// Render everything a command produced, in a fixed order.
pub fn render_text(result: &CmdResult, verbose: bool) -> String {
    let mut out = String::new();
    if !result.hits.is_empty() {
        out.push_str(&render_hits(&result.hits));
    }
    if let Some(stats) = &result.stats {
        out.push_str(&render_stats(stats));
    }
    if let Some(config) = &result.config {
        out.push_str(&render_config(config));
    }
    out.push_str(&render_messages(&result.messages));
    if verbose {
        if let Some(summary) = &result.summary {
            out.push_str(&render_summary(summary));
        }
    }
    out
}

pub fn render_json(result: &CmdResult) -> serde_json::Result<String> {
    let value = json!({
        "messages": result.messages,
        "summary": result.summary,
        "hits": result.hits,
        "stats": result.stats,
        "doctor": result.doctor,
        "config": result.config,
    });
    serde_json::to_string_pretty(&value)
}

pub fn render_messages(messages: &[CmdMessage]) -> String {
    let s = styles();
    messages
        .iter()
        .map(|m| {
            let style = match m.level {
                MessageLevel::Success => &s.success,
                MessageLevel::Info => &s.info,
                MessageLevel::Warning => &s.warning,
                MessageLevel::Error => &s.error,
            };
            format!("{}\n", style.apply_to(&m.content))
        })
        .collect()
}

pub fn render_summary(summary: &SyncSummary) -> String {
    styles()
        .muted
        .apply_to(format!(
            "root {}: walked {}, skipped {}, {} write call(s)",
            summary.root_id, summary.walked, summary.skipped, summary.write_calls
        ))
        .to_string()
        + "\n"
}

/// One line per hit: Index row, type, full path, tag.
pub fn render_hits(hits: &[SearchHit]) -> String {
    let s = styles();
    let row_width = hits
        .iter()
        .map(|h| h.row.to_string().len())
        .max()
        .unwrap_or(1);
    let type_width = hits
        .iter()
        .map(|h| h.entry.friendly_type.width())
        .max()
        .unwrap_or(0)
        .min(16);

    let mut out = String::new();
    for hit in hits {
        let tag_width = if hit.entry.tag.is_empty() {
            0
        } else {
            hit.entry.tag.width() + 1
        };
        let path_room = LINE_WIDTH.saturating_sub(row_width + type_width + 4 + tag_width);
        let kind = pad_to(&truncate(&hit.entry.friendly_type, type_width), type_width);
        let mut line = format!(
            "{:>rw$}  {}  {}",
            s.row.apply_to(hit.row),
            s.kind.apply_to(kind),
            s.path.apply_to(truncate(&hit.entry.full_path, path_room)),
            rw = row_width
        );
        if !hit.entry.tag.is_empty() {
            line.push(' ');
            line.push_str(&s.tag.apply_to(&hit.entry.tag).to_string());
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub fn render_stats(stats: &Stats) -> String {
    let s = styles();
    let mut lines = vec![
        ("Cache rows", stats.cache_rows.to_string()),
        ("Index rows", stats.index_rows.to_string()),
        ("Folders", stats.folders.to_string()),
        ("Files", stats.files.to_string()),
        ("Tagged", stats.tagged.to_string()),
    ];
    if let Some(at) = &stats.last_cached_at {
        lines.push(("Last change", at.clone()));
    }
    let mut out = String::new();
    for (label, value) in lines {
        out.push_str(&format!(
            "{} {}\n",
            s.label.apply_to(pad_to(label, 12)),
            value
        ));
    }
    if !stats.by_type.is_empty() {
        out.push_str(&format!("{}\n", s.label.apply_to("By type")));
        for (kind, count) in &stats.by_type {
            out.push_str(&format!("  {} {}\n", pad_to(kind, 20), count));
        }
    }
    out
}

/// `key = value` for every setting, unset ones marked.
pub fn render_config(config: &IndexConfig) -> String {
    let s = styles();
    let Ok(Value::Object(map)) = serde_json::to_value(config) else {
        return String::new();
    };
    let mut out = String::new();
    for (key, value) in map {
        let shown = match value {
            Value::Null => s.muted.apply_to("(unset)".to_string()).to_string(),
            Value::String(v) => v,
            Value::Array(items) => items
                .iter()
                .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                .collect::<Vec<_>>()
                .join(", "),
            Value::Object(entries) => {
                let mut pairs: Vec<String> = entries
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v.as_str().unwrap_or_default()))
                    .collect();
                pairs.sort();
                pairs.join(", ")
            }
            other => other.to_string(),
        };
        out.push_str(&format!("{} = {}\n", key, shown));
    }
    out
}

/// Cut `text` to at most `max` display columns, marking the cut with an ellipsis.
pub fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push(ELLIPSIS);
    out
}

fn pad_to(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}
