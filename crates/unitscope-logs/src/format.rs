use std::borrow::Cow;

use chrono::Local;
use ratatui::style::Color;

use unitscope_types::{JournalRecord, Priority};

/// Severity → color mapping used when rendering journal records
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogPalette {
    pub timestamp: Color,
    pub service: Color,
    pub message: Color,
    pub error: Color,
    pub warning: Color,
    pub notice: Color,
}

impl LogPalette {
    /// Plain terminal colors
    pub fn terminal() -> Self {
        Self {
            timestamp: Color::Blue,
            service: Color::Green,
            message: Color::Reset,
            error: Color::Red,
            warning: Color::Yellow,
            notice: Color::Cyan,
        }
    }

    /// Cold blues for dark terminals
    pub fn ice() -> Self {
        Self {
            timestamp: Color::Rgb(0x5f, 0x87, 0xaf),
            service: Color::Rgb(0x87, 0xd7, 0xff),
            message: Color::Rgb(0xd0, 0xe8, 0xf2),
            error: Color::Rgb(0xff, 0x5f, 0x87),
            warning: Color::Rgb(0xff, 0xd7, 0x87),
            notice: Color::Rgb(0xaf, 0xff, 0xff),
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "terminal" => Some(Self::terminal()),
            "ice" => Some(Self::ice()),
            _ => None,
        }
    }

    /// Message color for a record's priority
    pub fn color_for(&self, priority: Option<Priority>) -> Color {
        match priority {
            Some(p) if p <= Priority::Error => self.error,
            Some(Priority::Warning) => self.warning,
            Some(Priority::Notice) => self.notice,
            _ => self.message,
        }
    }
}

impl Default for LogPalette {
    fn default() -> Self {
        Self::terminal()
    }
}

/// Render one journal record as colored, newline-terminated text:
/// `<timestamp> <identifier> <message>`.
///
/// Every line of a multi-line message opens and resets its own color, so
/// each line stays correctly colored once split apart.
pub fn format_record(record: &JournalRecord, palette: &LogPalette) -> String {
    let timestamp = record
        .timestamp()
        .map(|t| t.with_timezone(&Local).format("%b %d %H:%M:%S").to_string())
        .unwrap_or_default();

    let color = sgr(palette.color_for(record.priority()));
    let message = record
        .message()
        .split('\n')
        .map(|line| format!("\x1b[{}m{}\x1b[0m", color, line))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "\x1b[{}m{} \x1b[{}m{} {}\n",
        sgr(palette.timestamp),
        timestamp,
        sgr(palette.service),
        record.identifier(),
        message,
    )
}

/// SGR foreground parameters for a color
pub fn sgr(color: Color) -> String {
    let code = match color {
        Color::Reset => 39,
        Color::Black => 30,
        Color::Red => 31,
        Color::Green => 32,
        Color::Yellow => 33,
        Color::Blue => 34,
        Color::Magenta => 35,
        Color::Cyan => 36,
        Color::Gray => 37,
        Color::DarkGray => 90,
        Color::LightRed => 91,
        Color::LightGreen => 92,
        Color::LightYellow => 93,
        Color::LightBlue => 94,
        Color::LightMagenta => 95,
        Color::LightCyan => 96,
        Color::White => 97,
        Color::Indexed(i) => return format!("38;5;{}", i),
        Color::Rgb(r, g, b) => return format!("38;2;{};{};{}", r, g, b),
    };
    code.to_string()
}

/// Strip ANSI escape sequences, leaving the visible text.
///
/// Borrows when the input holds no ESC byte.
pub fn strip_ansi(input: &[u8]) -> Cow<'_, [u8]> {
    if !input.contains(&0x1b) {
        return Cow::Borrowed(input);
    }

    let mut output = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] != 0x1b {
            output.push(input[i]);
            i += 1;
            continue;
        }

        match input.get(i + 1) {
            // CSI: ESC [ params final-byte
            Some(b'[') => {
                i += 2;
                while i < input.len() {
                    let b = input[i];
                    i += 1;
                    if (0x40..=0x7e).contains(&b) {
                        break;
                    }
                }
            }
            // OSC: ESC ] ... BEL | ESC \
            Some(b']') => {
                i += 2;
                while i < input.len() {
                    if input[i] == 0x07 {
                        i += 1;
                        break;
                    }
                    if input[i] == 0x1b && input.get(i + 1) == Some(&b'\\') {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            Some(_) => i += 2,
            None => i += 1,
        }
    }

    Cow::Owned(output)
}
