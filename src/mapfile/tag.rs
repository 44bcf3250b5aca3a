use super::attrs::{scan_pairs, AttrMap};

/// Byte range of one recognized element tag, `<` through `>` inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan {
    pub start: usize,
    pub end: usize,
    interior_start: usize,
}

impl TagSpan {
    /// The full tag text, delimiters included.
    #[must_use]
    pub fn text<'t>(&self, source: &'t str) -> &'t str {
        &source[self.start..self.end]
    }

    /// Everything between the element name and the closing `>`: leading
    /// whitespace, the attribute pairs, and a trailing `/` if self-closing.
    #[must_use]
    pub fn interior<'t>(&self, source: &'t str) -> &'t str {
        &source[self.interior_start..self.end - 1]
    }
}

/// Find every recognized element tag in `text`, in order, non-overlapping.
///
/// A tag is `<` + an element name (ASCII case-insensitive) + at least one
/// whitespace character + anything up to the next `>`. A `<` that doesn't
/// open a recognized element is skipped; a recognized opening with no `>`
/// before the end of the text matches nothing.
pub fn scan_tags(text: &str, elements: &[String]) -> Vec<TagSpan> {
    let bytes = text.as_bytes();
    let mut tags = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if bytes[pos] != b'<' {
            pos += 1;
            continue;
        }
        let Some(name_end) = element_name_end(bytes, pos + 1, elements) else {
            pos += 1;
            continue;
        };
        let mut close = name_end;
        while close < bytes.len() && bytes[close] != b'>' {
            close += 1;
        }
        if close >= bytes.len() {
            // No closing delimiter anywhere after this opening, so nothing
            // later can complete a tag either.
            break;
        }
        tags.push(TagSpan {
            start: pos,
            end: close + 1,
            interior_start: name_end,
        });
        pos = close + 1;
    }
    tags
}

/// If one of `elements` sits at `at` followed by whitespace, return the
/// offset just past the name. The whitespace requirement doubles as the name
/// boundary: `<PMUX` never matches element `PMU`.
fn element_name_end(bytes: &[u8], at: usize, elements: &[String]) -> Option<usize> {
    for name in elements {
        let end = at + name.len();
        let Some(candidate) = bytes.get(at..end) else {
            continue;
        };
        if candidate.eq_ignore_ascii_case(name.as_bytes())
            && bytes.get(end).is_some_and(u8::is_ascii_whitespace)
        {
            return Some(end);
        }
    }
    None
}

/// Rewrite one tag so it carries the desired attribute values, touching
/// nothing else.
///
/// Keys are applied in map order. A key already present in the tag (matched
/// case-sensitively, by the same pair grammar tokenization uses) has its
/// first occurrence's value replaced in place; a key the tag lacks is
/// appended as ` key="value"` immediately before the closing `/>` or `>`.
/// Quoting style, spacing, attribute order, and unrelated attributes are
/// preserved byte for byte. A tag with no closing delimiter still gets its
/// in-place replacements, but nothing is appended.
pub fn apply_attributes(tag: &str, desired: &AttrMap) -> String {
    let mut out = tag.to_string();
    for (key, value) in desired {
        if let Some((start, end)) = value_range(&out, key) {
            out.replace_range(start..end, value);
        } else if let Some(at) = append_point(&out) {
            out.insert_str(at, &format!(" {key}=\"{value}\""));
        }
    }
    out
}

/// Value byte range of the first pair named `key`, if any.
fn value_range(tag: &str, key: &str) -> Option<(usize, usize)> {
    scan_pairs(tag)
        .into_iter()
        .find(|pair| &tag[pair.name_start..pair.name_end] == key)
        .map(|pair| (pair.value_start, pair.value_end))
}

/// Insertion offset just before the closing delimiter, or None if the tag
/// doesn't end in `>`.
fn append_point(tag: &str) -> Option<usize> {
    let bytes = tag.as_bytes();
    if bytes.last() != Some(&b'>') {
        return None;
    }
    if bytes.len() >= 2 && bytes[bytes.len() - 2] == b'/' {
        Some(tag.len() - 2)
    } else {
        Some(tag.len() - 1)
    }
}
