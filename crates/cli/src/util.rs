use std::io::{self, Write};

use serde::Serialize;
use unicode_width::UnicodeWidthStr;

use crate::CliError;

/// Widest a listing column may grow before values are cut.
const MAX_COLUMN_WIDTH: usize = 40;

/// Cut `s` to at most `width` display columns, ending in ".." when cut.
pub(crate) fn truncate_display(s: &str, width: usize) -> String {
    if UnicodeWidthStr::width(s) <= width {
        return s.to_string();
    }
    let budget = width.saturating_sub(2);
    let mut used = 0;
    let mut out = String::new();
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + cw > budget {
            break;
        }
        used += cw;
        out.push(ch);
    }
    if width >= 2 {
        out.push_str("..");
    }
    out
}

/// Right-pad to exactly `width` display columns, cutting if longer.
pub(crate) fn pad_right(s: &str, width: usize) -> String {
    let cut = truncate_display(s, width);
    let w = UnicodeWidthStr::width(cut.as_str());
    format!("{}{}", cut, " ".repeat(width.saturating_sub(w)))
}

/// Render rows as an aligned plain-text table.
pub(crate) fn render_table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| UnicodeWidthStr::width(*h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(UnicodeWidthStr::width(cell.as_str()));
        }
    }
    for w in widths.iter_mut() {
        *w = (*w).min(MAX_COLUMN_WIDTH);
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| pad_right(c, *w))
            .collect();
        padded.join("  ").trim_end().to_string()
    };

    let mut out = String::new();
    out.push_str(&line(header.to_vec()));
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

pub(crate) fn number_cell(n: Option<f64>) -> String {
    n.map(rosterdesk_recon::schema::format_number).unwrap_or_default()
}

/// Write one JSON document to stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::error(format!("cannot serialize output: {e}")))?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", text).map_err(|e| CliError::io(e.to_string()))
}

/// Write plain text to stdout.
pub(crate) fn print_text(text: &str) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .map_err(|e| CliError::io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_fits() {
        assert_eq!(truncate_display("abc", 3), "abc");
        assert_eq!(truncate_display("", 0), "");
    }

    #[test]
    fn truncate_cuts() {
        assert_eq!(truncate_display("abcdef", 5), "abc..");
    }

    #[test]
    fn truncate_cjk_boundary() {
        // 8 display columns
        let s = "\u{4e16}\u{754c}\u{4f60}\u{597d}";
        assert_eq!(truncate_display(s, 6), "\u{4e16}\u{754c}..");
    }

    #[test]
    fn pad_right_widths() {
        assert_eq!(pad_right("ab", 5), "ab   ");
        assert_eq!(pad_right("abcdef", 5), "abc..");
    }

    #[test]
    fn table_is_aligned() {
        let out = render_table(
            &["ID", "Status"],
            &[
                vec!["jane".into(), "Rejected".into()],
                vec!["al".into(), "".into()],
            ],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "ID    Status");
        assert_eq!(lines[1], "jane  Rejected");
        assert_eq!(lines[2], "al");
    }

    #[test]
    fn numbers() {
        assert_eq!(number_cell(Some(1200.0)), "1200");
        assert_eq!(number_cell(None), "");
    }
}
