use serde::Serialize;

/// A highlight range counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn end(&self) -> usize {
        self.offset + self.len
    }

    pub fn is_prefix(&self) -> bool {
        self.offset == 0
    }
}

/// Finds the first occurrence of `needle` in `haystack`. Both sides are
/// expected to be lowercased already. Offsets are character positions so
/// they can be applied to the original-case name.
pub fn find(haystack: &str, needle: &str) -> Option<Span> {
    if needle.is_empty() {
        return None;
    }
    let byte_offset = haystack.find(needle)?;
    Some(Span {
        offset: haystack[..byte_offset].chars().count(),
        len: needle.chars().count(),
    })
}

/// Lowercase transform used for every normalized name. Characters whose
/// lowercase form expands to several code points keep their first one, so
/// the normalized string always has the same character count as the input.
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| c.to_lowercase().next().unwrap_or(c))
        .collect()
}
