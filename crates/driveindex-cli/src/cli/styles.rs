//! Terminal styles, by meaning rather than by color.
//!
//! Render code asks for `styles().path`, never for "cyan". `console` drops the
//! escape codes by itself when stdout is not a terminal.

use console::Style;
use once_cell::sync::Lazy;

pub struct Styles {
    pub success: Style,
    pub info: Style,
    pub warning: Style,
    pub error: Style,
    pub row: Style,
    pub kind: Style,
    pub path: Style,
    pub tag: Style,
    pub label: Style,
    pub muted: Style,
}

static STYLES: Lazy<Styles> = Lazy::new(|| Styles {
    success: Style::new().green(),
    info: Style::new(),
    warning: Style::new().yellow(),
    error: Style::new().red().bold(),
    row: Style::new().yellow(),
    kind: Style::new().dim(),
    path: Style::new().bold(),
    tag: Style::new().black().on_yellow(),
    label: Style::new().dim(),
    muted: Style::new().dim().italic(),
});

pub fn styles() -> &'static Styles {
    &STYLES
}
