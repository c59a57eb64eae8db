use xi_rope::Rope;

/// Byte offset to 0-based line lookups over the source text.
#[derive(Debug, Clone)]
pub struct LineIndex {
    rope: Rope,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from(text),
        }
    }

    pub fn line_of(&self, offset: usize) -> usize {
        self.rope.line_of_offset(offset.min(self.rope.len()))
    }
}
