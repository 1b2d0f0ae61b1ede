use crate::model::{Location, Span};

/// Newline table over one source text.
///
/// Offsets are byte offsets; columns count characters, so a line holding
/// multi-byte text still reports the column a reader would see.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    newlines: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(text: &'a str) -> Self {
        let newlines = text
            .bytes()
            .enumerate()
            .filter(|(_, byte)| *byte == b'\n')
            .map(|(idx, _)| idx)
            .collect();
        Self { text, newlines }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn locate(&self, offset: usize) -> Location {
        let offset = floor_char_boundary(self.text, offset.min(self.text.len()));
        let preceding = self.newlines.partition_point(|&nl| nl < offset);
        let line_start = if preceding == 0 {
            0
        } else {
            self.newlines[preceding - 1] + 1
        };
        let column = self.text[line_start..offset].chars().count() + 1;
        Location {
            line: preceding + 1,
            column,
        }
    }

    pub fn span(&self, start: usize, end: usize) -> Span {
        let start = self.locate(start);
        let end = self.locate(end);
        let line_count = (end.line as i64 - start.line as i64 + 1).max(1) as usize;
        Span {
            start,
            end,
            line_count,
        }
    }
}

/// Line and column of `offset` in `text`. One-based on both axes.
pub fn resolve(text: &str, offset: usize) -> Location {
    LineIndex::new(text).locate(offset)
}

pub fn resolve_span(text: &str, start: usize, end: usize) -> Span {
    LineIndex::new(text).span(start, end)
}

fn floor_char_boundary(text: &str, mut offset: usize) -> usize {
    while offset > 0 && !text.is_char_boundary(offset) {
        offset -= 1;
    }
    offset
}
