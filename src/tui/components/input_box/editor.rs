//! Text buffer with a byte-offset cursor, plus the wrapping geometry the
//! composer needs to place the terminal cursor and scroll long drafts.

use ratatui::layout::Rect;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Border (2) + padding (2) consumed horizontally by the composer block.
pub(super) const HORIZONTAL_OVERHEAD: u16 = 4;
/// Top + bottom borders.
pub(super) const VERTICAL_OVERHEAD: u16 = 2;
/// Content lines shown before the draft scrolls internally.
pub(super) const MAX_VISIBLE_LINES: u16 = 5;
/// Offset from the area edge to the first content cell (border + padding).
const CONTENT_OFFSET_X: u16 = 2;
const CONTENT_OFFSET_Y: u16 = 1;

pub(super) fn inner_width(area_width: u16) -> usize {
    area_width.saturating_sub(HORIZONTAL_OVERHEAD) as usize
}

/// Visual rows for `text` at `width`: each logical line (split on `\n`)
/// broken into chunks of at most `width` display columns. Every row carries
/// the byte offset where it starts so the cursor can be mapped onto it.
pub(super) fn visual_rows(text: &str, width: usize) -> Vec<(usize, &str)> {
    let width = width.max(1);
    let mut rows = Vec::new();
    let mut line_start = 0;
    for line in text.split('\n') {
        if line.is_empty() {
            rows.push((line_start, line));
        } else {
            let mut chunk_start = 0;
            let mut columns = 0;
            for (i, c) in line.char_indices() {
                let w = c.width().unwrap_or(0);
                if columns > 0 && columns + w > width {
                    rows.push((line_start + chunk_start, &line[chunk_start..i]));
                    chunk_start = i;
                    columns = 0;
                }
                columns += w;
            }
            rows.push((line_start + chunk_start, &line[chunk_start..]));
        }
        line_start += line.len() + 1;
    }
    rows
}

/// Editable draft.
#[derive(Debug, Default, Clone)]
pub(super) struct Editor {
    pub text: String,
    /// Byte offset, always on a char boundary.
    pub cursor: usize,
    /// First visible row when the draft is taller than the viewport.
    pub scroll: u16,
}

impl Editor {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Take the draft out, leaving the editor empty.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        self.scroll = 0;
        std::mem::take(&mut self.text)
    }

    /// Replace the draft, cursor at the end.
    pub fn set(&mut self, text: String) {
        self.cursor = text.len();
        self.text = text;
        self.scroll = 0;
    }

    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor].char_indices().next_back().map(|(i, _)| i)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
    }

    pub fn backspace(&mut self) -> bool {
        match self.prev_boundary() {
            Some(prev) => {
                self.text.replace_range(prev..self.cursor, "");
                self.cursor = prev;
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self) -> bool {
        match self.next_boundary() {
            Some(next) => {
                self.text.replace_range(self.cursor..next, "");
                true
            }
            None => false,
        }
    }

    pub fn left(&mut self) -> bool {
        self.prev_boundary().map(|p| self.cursor = p).is_some()
    }

    pub fn right(&mut self) -> bool {
        self.next_boundary().map(|n| self.cursor = n).is_some()
    }

    pub fn home(&mut self) -> bool {
        let start = self.text[..self.cursor].rfind('\n').map_or(0, |i| i + 1);
        let moved = start != self.cursor;
        self.cursor = start;
        moved
    }

    pub fn end(&mut self) -> bool {
        let end = self.text[self.cursor..]
            .find('\n')
            .map_or(self.text.len(), |i| self.cursor + i);
        let moved = end != self.cursor;
        self.cursor = end;
        moved
    }

    /// (row, display column) of the cursor among the visual rows.
    pub fn cursor_row_col(&self, width: usize) -> (usize, usize) {
        let rows = visual_rows(&self.text, width);
        // Last row starting at or before the cursor. A cursor sitting exactly
        // on a wrap point belongs to the following row.
        let row = rows
            .iter()
            .rposition(|(start, _)| *start <= self.cursor)
            .unwrap_or(0);
        let (start, _) = rows[row];
        let col = self.text[start..self.cursor].width();
        (row, col)
    }

    /// Move one visual row up (`-1`) or down (`1`), keeping the column.
    pub fn vertical(&mut self, delta: isize, width: usize) -> bool {
        let rows = visual_rows(&self.text, width);
        let (row, col) = self.cursor_row_col(width);
        let target = row as isize + delta;
        if target < 0 || target as usize >= rows.len() {
            return false;
        }
        let (start, content) = rows[target as usize];
        let mut columns = 0;
        let offset = content
            .char_indices()
            .find(|(_, c)| {
                let reached = columns >= col;
                columns += c.width().unwrap_or(0);
                reached
            })
            .map_or(content.len(), |(i, _)| i);
        self.cursor = start + offset;
        true
    }

    pub fn row_count(&self, width: usize) -> u16 {
        visual_rows(&self.text, width).len().max(1) as u16
    }

    /// Keep the cursor row inside the visible window.
    pub fn follow_cursor(&mut self, width: usize) {
        let total = self.row_count(width);
        if total <= MAX_VISIBLE_LINES {
            self.scroll = 0;
            return;
        }
        let (row, _) = self.cursor_row_col(width);
        let row = row as u16;
        if row < self.scroll {
            self.scroll = row;
        } else if row >= self.scroll + MAX_VISIBLE_LINES {
            self.scroll = row + 1 - MAX_VISIBLE_LINES;
        }
        self.scroll = self.scroll.min(total - MAX_VISIBLE_LINES);
    }

    /// Rows currently in view, joined for display.
    pub fn visible_text(&self, width: usize) -> String {
        visual_rows(&self.text, width)
            .into_iter()
            .skip(self.scroll as usize)
            .take(MAX_VISIBLE_LINES as usize)
            .map(|(_, row)| row)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Terminal position of the cursor inside a composer drawn at `area`.
    pub fn screen_position(&self, area: Rect) -> (u16, u16) {
        let (row, col) = self.cursor_row_col(inner_width(area.width));
        let visible_row = (row as u16).saturating_sub(self.scroll);
        (
            area.x + CONTENT_OFFSET_X + col as u16,
            area.y + CONTENT_OFFSET_Y + visible_row,
        )
    }
}
