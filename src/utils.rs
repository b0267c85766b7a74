use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Shortens `s` to at most `max_width` terminal columns, ending in `...` when
/// anything was cut. Wide characters are never split.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    if max_width <= 3 {
        return ".".repeat(max_width);
    }

    let budget = max_width - 3;
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str("...");
    out
}

/// Column of a cursor placed before the `cursor`-th character of a one-line
/// text, counted in terminal cells.
pub fn cursor_column(text: &str, cursor: usize) -> usize {
    text.chars()
        .take(cursor)
        .map(|ch| ch.width().unwrap_or(0))
        .sum()
}

/// Horizontal scroll that keeps the cursor visible inside a box of `width`
/// cells.
pub fn scroll_offset(cursor_col: usize, width: usize) -> usize {
    if width == 0 {
        return cursor_col;
    }
    (cursor_col + 1).saturating_sub(width)
}

/// `m:ss` readout for the countdown.
pub fn format_clock(secs: u32) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
