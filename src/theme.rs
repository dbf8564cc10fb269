use anstyle::{AnsiColor, Color, Style};

pub const HEADER_CLEAN: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue)));
pub const HEADER_CHANGED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
pub const HEADER_FAILED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));

pub const SUCCESS: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
pub const FAILURE: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red)));
pub const SKIPPED: Style = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
pub const BOLD: Style = Style::new().bold();
pub const DIM: Style = Style::new().dimmed();

/// Wrap `text` in `style` when `enabled`, otherwise return it untouched.
#[must_use]
pub fn paint(style: Style, text: &str, enabled: bool) -> String {
    if enabled {
        format!("{style}{text}{style:#}")
    } else {
        text.to_string()
    }
}
