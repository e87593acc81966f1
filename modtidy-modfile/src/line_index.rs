use modtidy_types::Position;

/// Maps byte offsets in a text to editor positions and back.
///
/// Columns count UTF-16 code units. A line ends just before its `\n`; the
/// position right after a trailing newline is the start of an empty last line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    text: String,
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            text: text.to_string(),
            line_starts,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Position of a byte offset. `None` past the end or inside a character.
    pub fn position(&self, offset: usize) -> Option<Position> {
        if offset > self.text.len() || !self.text.is_char_boundary(offset) {
            return None;
        }
        let line = self.line_starts.partition_point(|&start| start <= offset) - 1;
        let start = self.line_starts[line];
        let character = self.text[start..offset].encode_utf16().count();
        Some(Position::new(
            u32::try_from(line).ok()?,
            u32::try_from(character).ok()?,
        ))
    }

    /// Byte offset of a position. `None` when the line does not exist, the
    /// column is past the end of the line, or it splits a surrogate pair.
    pub fn offset(&self, position: Position) -> Option<usize> {
        let line = usize::try_from(position.line).ok()?;
        let start = *self.line_starts.get(line)?;
        let end = match self.line_starts.get(line + 1) {
            Some(next) => next - 1,
            None => self.text.len(),
        };

        let wanted = usize::try_from(position.character).ok()?;
        let mut units = 0;
        for (i, c) in self.text[start..end].char_indices() {
            if units == wanted {
                return Some(start + i);
            }
            units += c.len_utf16();
            if units > wanted {
                return None;
            }
        }
        (units == wanted).then_some(end)
    }
}
