//! A single mutable text buffer under edit.
//!
//! All offsets are character (Unicode scalar value) offsets, converted to
//! byte indices internally. A splice either fully applies or leaves the
//! buffer untouched.

use std::fmt;

/// One text buffer. The engine owns one per article field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    text: String,
}

/// Error returned when a splice range falls outside the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("range {start}+{len} is out of bounds for a {text_len}-character buffer")]
pub struct OutOfBounds {
    pub start: usize,
    pub len: usize,
    pub text_len: usize,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters, not bytes.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Returns `true` if `[start, start + len)` lies within the buffer.
    #[must_use]
    pub fn in_bounds(&self, start: usize, len: usize) -> bool {
        start
            .checked_add(len)
            .is_some_and(|end| end <= self.char_len())
    }

    /// Replace `[start, start + len)` (character offsets) with `replacement`.
    ///
    /// Returns the change in character length, so callers can rebase other
    /// anchors. On error the buffer is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfBounds`] if the range does not lie within the buffer.
    pub fn splice(&mut self, start: usize, len: usize, replacement: &str) -> Result<isize, OutOfBounds> {
        let out_of_bounds = || OutOfBounds {
            start,
            len,
            text_len: self.char_len(),
        };

        let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
        let byte_start = self.byte_index(start).ok_or_else(out_of_bounds)?;
        let byte_end = self.byte_index(end).ok_or_else(out_of_bounds)?;

        self.text.replace_range(byte_start..byte_end, replacement);

        let inserted =
            isize::try_from(replacement.chars().count()).unwrap_or(isize::MAX);
        let removed = isize::try_from(len).unwrap_or(isize::MAX);
        Ok(inserted - removed)
    }

    /// Replace the first occurrence of `needle` with `replacement`.
    ///
    /// Returns `true` if a match was found and replaced.
    pub fn replace_first(&mut self, needle: &str, replacement: &str) -> bool {
        match self.text.find(needle) {
            Some(byte_start) => {
                self.text
                    .replace_range(byte_start..byte_start + needle.len(), replacement);
                true
            }
            None => false,
        }
    }

    /// Replace the entire buffer content.
    pub fn replace_all(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Map a character offset to a byte offset. `char_idx == char_len` maps
    /// to the end of the buffer.
    fn byte_index(&self, char_idx: usize) -> Option<usize> {
        if char_idx == 0 {
            return Some(0);
        }
        let mut count = 0;
        for (byte_idx, _) in self.text.char_indices() {
            if count == char_idx {
                return Some(byte_idx);
            }
            count += 1;
        }
        if char_idx == count {
            Some(self.text.len())
        } else {
            None
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splice_replaces_range() {
        let mut doc = Document::new("The quick brown fox");
        let delta = doc.splice(4, 5, "slow").unwrap();
        assert_eq!(doc.as_str(), "The slow brown fox");
        assert_eq!(delta, -1);
    }

    #[test]
    fn splice_at_start_and_end() {
        let mut doc = Document::new("abc");
        assert_eq!(doc.splice(0, 0, ">>").unwrap(), 2);
        assert_eq!(doc.as_str(), ">>abc");
        assert_eq!(doc.splice(5, 0, "<<").unwrap(), 2);
        assert_eq!(doc.as_str(), ">>abc<<");
    }

    #[test]
    fn splice_rejects_out_of_bounds() {
        let mut doc = Document::new("abc");
        let err = doc.splice(2, 5, "x").unwrap_err();
        assert_eq!(
            err,
            OutOfBounds {
                start: 2,
                len: 5,
                text_len: 3
            }
        );
        // Never a partial splice.
        assert_eq!(doc.as_str(), "abc");
    }

    #[test]
    fn splice_counts_characters_not_bytes() {
        let mut doc = Document::new("naïve café");
        // "café" starts at character 6.
        let delta = doc.splice(6, 4, "tea").unwrap();
        assert_eq!(doc.as_str(), "naïve tea");
        assert_eq!(delta, -1);
    }

    #[test]
    fn replace_first_only_touches_first_match() {
        let mut doc = Document::new("very very good");
        assert!(doc.replace_first("very", "quite"));
        assert_eq!(doc.as_str(), "quite very good");
    }

    #[test]
    fn replace_first_misses() {
        let mut doc = Document::new("plain text");
        assert!(!doc.replace_first("absent", "x"));
        assert_eq!(doc.as_str(), "plain text");
    }

    #[test]
    fn in_bounds_edges() {
        let doc = Document::new("abcd");
        assert!(doc.in_bounds(0, 4));
        assert!(doc.in_bounds(4, 0));
        assert!(!doc.in_bounds(4, 1));
        assert!(!doc.in_bounds(usize::MAX, 2));
    }
}
