use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Convert a line carrying SGR color escapes into styled spans.
///
/// Only SGR (`ESC [ ... m`) is interpreted; other escape sequences are
/// dropped.
pub fn ansi_line(input: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut style = Style::default();
    let mut text = String::new();
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            text.push(c);
            continue;
        }
        if chars.peek() != Some(&'[') {
            chars.next();
            continue;
        }
        chars.next();

        let mut params = String::new();
        let mut terminator = None;
        for c in chars.by_ref() {
            if ('\x40'..='\x7e').contains(&c) {
                terminator = Some(c);
                break;
            }
            params.push(c);
        }

        if terminator == Some('m') {
            if !text.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut text), style));
            }
            style = apply_sgr(style, &params);
        }
    }

    if !text.is_empty() {
        spans.push(Span::styled(text, style));
    }
    Line::from(spans)
}

fn apply_sgr(mut style: Style, params: &str) -> Style {
    let codes: Vec<u16> = params
        .split(';')
        .map(|p| p.parse().unwrap_or(0))
        .collect();

    let mut i = 0;
    while i < codes.len() {
        match codes[i] {
            0 => style = Style::default(),
            1 => style = style.add_modifier(Modifier::BOLD),
            2 => style = style.add_modifier(Modifier::DIM),
            3 => style = style.add_modifier(Modifier::ITALIC),
            4 => style = style.add_modifier(Modifier::UNDERLINED),
            22 => style = style.remove_modifier(Modifier::BOLD | Modifier::DIM),
            23 => style = style.remove_modifier(Modifier::ITALIC),
            24 => style = style.remove_modifier(Modifier::UNDERLINED),
            n @ 30..=37 => style = style.fg(basic_color(n - 30)),
            39 => style = style.fg(Color::Reset),
            n @ 40..=47 => style = style.bg(basic_color(n - 40)),
            49 => style = style.bg(Color::Reset),
            n @ 90..=97 => style = style.fg(bright_color(n - 90)),
            n @ 100..=107 => style = style.bg(bright_color(n - 100)),
            n @ (38 | 48) => {
                let (color, used) = extended_color(&codes[i + 1..]);
                if let Some(color) = color {
                    style = if n == 38 { style.fg(color) } else { style.bg(color) };
                }
                i += used;
            }
            _ => {}
        }
        i += 1;
    }
    style
}

/// Parse the tail of a `38;...`/`48;...` sequence; returns the color and
/// how many parameters it consumed
fn extended_color(rest: &[u16]) -> (Option<Color>, usize) {
    match rest {
        [5, n, ..] => (Some(Color::Indexed(*n as u8)), 2),
        [2, r, g, b, ..] => (Some(Color::Rgb(*r as u8, *g as u8, *b as u8)), 4),
        _ => (None, rest.len()),
    }
}

fn basic_color(n: u16) -> Color {
    match n {
        0 => Color::Black,
        1 => Color::Red,
        2 => Color::Green,
        3 => Color::Yellow,
        4 => Color::Blue,
        5 => Color::Magenta,
        6 => Color::Cyan,
        _ => Color::Gray,
    }
}

fn bright_color(n: u16) -> Color {
    match n {
        0 => Color::DarkGray,
        1 => Color::LightRed,
        2 => Color::LightGreen,
        3 => Color::LightYellow,
        4 => Color::LightBlue,
        5 => Color::LightMagenta,
        6 => Color::LightCyan,
        _ => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unitscope_logs::{LogPalette, format_record, sgr};
    use unitscope_types::JournalRecord;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_plain_text() {
        let line = ansi_line("no colors here");
        assert_eq!(line.spans.len(), 1);
        assert_eq!(line.spans[0].style, Style::default());
    }

    #[test]
    fn test_basic_colors_and_reset() {
        let line = ansi_line("\x1b[31mred\x1b[0m plain \x1b[1;92mbold");
        assert_eq!(plain(&line), "red plain bold");
        assert_eq!(line.spans[0].style.fg, Some(Color::Red));
        assert_eq!(line.spans[1].style, Style::default());
        assert_eq!(line.spans[2].style.fg, Some(Color::LightGreen));
        assert!(line.spans[2].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_extended_colors() {
        let line = ansi_line("\x1b[38;5;208mi\x1b[38;2;1;2;3mr\x1b[48;5;1mb");
        assert_eq!(line.spans[0].style.fg, Some(Color::Indexed(208)));
        assert_eq!(line.spans[1].style.fg, Some(Color::Rgb(1, 2, 3)));
        assert_eq!(line.spans[2].style.bg, Some(Color::Indexed(1)));
    }

    #[test]
    fn test_non_sgr_sequences_dropped() {
        let line = ansi_line("a\x1b[2Kb\x1b(c");
        assert_eq!(plain(&line), "abc");
    }

    #[test]
    fn test_formatted_record_round_trip_colors() {
        let palette = LogPalette::ice();
        let record = JournalRecord::new(1_700_000_000_000_000)
            .with_field("PRIORITY", "3")
            .with_field("SYSLOG_IDENTIFIER", "nginx")
            .with_field("MESSAGE", "upstream timed out");
        let rendered = format_record(&record, &palette);
        let line = ansi_line(rendered.trim_end_matches('\n'));

        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "nginx ");
        assert_eq!(line.spans[1].style.fg, Some(palette.service));
        assert_eq!(line.spans[2].content, "upstream timed out");
        assert_eq!(line.spans[2].style.fg, Some(palette.error));
        assert!(sgr(palette.error).starts_with("38;2;"));
    }
}
