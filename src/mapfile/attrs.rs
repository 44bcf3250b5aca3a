use indexmap::IndexMap;

/// Ordered attribute map. Inserting an existing key overwrites the value but
/// keeps the key's first-seen position, so a duplicated attribute resolves to
/// the later value at the earlier position.
pub type AttrMap = IndexMap<String, String>;

/// Byte offsets of one `name="value"` pair within the scanned text.
/// `value_start..value_end` covers the value only, quotes excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawAttr {
    pub name_start: usize,
    pub name_end: usize,
    pub value_start: usize,
    pub value_end: usize,
}

/// Extract every `name="value"` pair from a tag's interior text.
///
/// `name` is one or more ASCII alphanumeric/underscore characters; `value` is
/// any run of characters up to the next double quote (possibly empty).
/// Matching is global and left-to-right. Anything that doesn't fit the shape
/// (unquoted values, single quotes, stray text) is skipped without error;
/// an interior with no pairs yields an empty map.
pub fn parse_attributes(interior: &str) -> AttrMap {
    let mut attrs = AttrMap::new();
    for pair in scan_pairs(interior) {
        attrs.insert(
            interior[pair.name_start..pair.name_end].to_string(),
            interior[pair.value_start..pair.value_end].to_string(),
        );
    }
    attrs
}

/// Locate every pair in text order, without building strings. This is the
/// single grammar both tokenization and in-place rewriting go through, so the
/// two can never disagree about where an attribute sits.
pub(crate) fn scan_pairs(text: &str) -> Vec<RawAttr> {
    let bytes = text.as_bytes();
    let mut pairs = Vec::new();
    let mut pos = 0;
    while pos < bytes.len() {
        if is_name_byte(bytes[pos]) {
            let name_start = pos;
            while pos < bytes.len() && is_name_byte(bytes[pos]) {
                pos += 1;
            }
            let name_end = pos;
            if bytes.get(pos) == Some(&b'=') && bytes.get(pos + 1) == Some(&b'"') {
                pos += 2;
                let value_start = pos;
                while pos < bytes.len() && bytes[pos] != b'"' {
                    pos += 1;
                }
                if pos < bytes.len() {
                    pairs.push(RawAttr {
                        name_start,
                        name_end,
                        value_start,
                        value_end: pos,
                    });
                    pos += 1; // past the closing quote
                }
                // No closing quote: the pair is incomplete, nothing recorded.
            }
            // A name not followed by `="` is plain text; keep scanning from
            // the character after it.
        } else {
            pos += 1;
        }
    }
    pairs
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
