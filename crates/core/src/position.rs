/// Translates between 1-based `(line, column)` pairs and byte offsets.
#[derive(Debug, Clone)]
pub struct LineMap {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Length of the document in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of `line:column`. Positions outside the document are
    /// clamped: lines past the end map to the document length, and columns
    /// past the end of a line map to that line's terminator.
    pub fn position(&self, line: u32, column: u32) -> usize {
        let index = (line as usize).saturating_sub(1);
        let Some(&start) = self.line_starts.get(index) else {
            return self.len;
        };
        let line_end = self
            .line_starts
            .get(index + 1)
            .map_or(self.len, |next| next - 1);
        let column = (column as usize).saturating_sub(1);
        (start + column).min(line_end)
    }

    /// Inverse of [`LineMap::position`] for offsets inside the document.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let offset = offset.min(self.len);
        let index = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let column = offset - self.line_starts[index];
        (index as u32 + 1, column as u32 + 1)
    }
}
