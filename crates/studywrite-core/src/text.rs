/// Plain-text document body wrapping `ropey::Rope`.
use std::fmt;

use anyhow::Result;
use ropey::Rope;

/// The authoritative document body: a markup-free sequence of Unicode
/// scalar values. All positions are char indices; rendering and
/// annotation offsets are derived from this single source of truth.
#[derive(Debug, Clone)]
pub struct PlainText {
    rope: Rope,
}

impl Default for PlainText {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for PlainText {
    fn from(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }
}

impl fmt::Display for PlainText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rope)
    }
}

impl PartialEq for PlainText {
    fn eq(&self, other: &Self) -> bool {
        self.rope == other.rope
    }
}

impl PlainText {
    /// Creates an empty body.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Returns the total number of characters.
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the number of lines.
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns true if the body holds no text.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the character at a given char index.
    ///
    /// # Errors
    ///
    /// Returns an error if the char index is out of bounds.
    pub fn char_at(&self, char_idx: usize) -> Result<char> {
        if char_idx >= self.rope.len_chars() {
            anyhow::bail!(
                "char index {} out of bounds (text has {} chars)",
                char_idx,
                self.rope.len_chars()
            );
        }
        Ok(self.rope.char(char_idx))
    }

    /// Returns the text of the char range [start..end) as an owned string.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is out of bounds.
    pub fn slice(&self, start: usize, end: usize) -> Result<String> {
        if start > end {
            anyhow::bail!("invalid range: start ({}) > end ({})", start, end);
        }
        if end > self.rope.len_chars() {
            anyhow::bail!(
                "range end {} out of bounds (text has {} chars)",
                end,
                self.rope.len_chars()
            );
        }
        Ok(self.rope.slice(start..end).to_string())
    }

    /// Inserts text at the given char index.
    ///
    /// # Errors
    ///
    /// Returns an error if the char index is out of bounds.
    pub fn insert(&mut self, char_idx: usize, text: &str) -> Result<()> {
        if char_idx > self.rope.len_chars() {
            anyhow::bail!(
                "insert position {} out of bounds (text has {} chars)",
                char_idx,
                self.rope.len_chars()
            );
        }
        self.rope.insert(char_idx, text);
        Ok(())
    }

    /// Removes the char range [start..end).
    ///
    /// # Errors
    ///
    /// Returns an error if the range is out of bounds.
    pub fn remove(&mut self, start: usize, end: usize) -> Result<()> {
        if start > end {
            anyhow::bail!("invalid range: start ({}) > end ({})", start, end);
        }
        if end > self.rope.len_chars() {
            anyhow::bail!(
                "range end {} out of bounds (text has {} chars)",
                end,
                self.rope.len_chars()
            );
        }
        self.rope.remove(start..end);
        Ok(())
    }

    /// Replaces the char range [start..end) with new text.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is out of bounds.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> Result<()> {
        self.remove(start, end)?;
        self.insert(start, text)?;
        Ok(())
    }

    /// Finds the first literal occurrence of `needle`, returning its char
    /// offset. An empty needle never matches.
    pub fn find(&self, needle: &str) -> Option<usize> {
        self.find_from(needle, 0)
    }

    /// Finds the first literal occurrence of `needle` at or after the char
    /// offset `from`, returning its char offset.
    ///
    /// Byte offsets from the string search are converted back to char
    /// offsets through the rope, so multi-byte text is handled correctly.
    pub fn find_from(&self, needle: &str, from: usize) -> Option<usize> {
        if needle.is_empty() || from > self.rope.len_chars() {
            return None;
        }
        let haystack = self.rope.to_string();
        let from_byte = self.rope.char_to_byte(from);
        haystack[from_byte..]
            .find(needle)
            .map(|b| self.rope.byte_to_char(from_byte + b))
    }
}
