//! Anchor resolution: locating an operation's context snippet inside a
//! document body.
//!
//! Matching runs in two passes: an exact substring search, then a
//! whitespace-normalized search that tolerates re-indentation and line-wrap
//! drift introduced by upstream formatting. Both passes pick the first
//! occurrence in document order. All intelligence lives here, in span
//! acquisition; application stays a dumb splice.

/// Half-open byte range into a document body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// Non-empty intersection of two half-open ranges.
    pub fn intersects(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Locate `anchor` inside `body`, returning the byte span of the first
/// occurrence, or `None` if neither the exact nor the whitespace-normalized
/// pass finds it.
pub fn locate(body: &str, anchor: &str) -> Option<Span> {
    if anchor.is_empty() {
        return None;
    }
    if let Some(start) = body.find(anchor) {
        return Some(Span {
            start,
            end: start + anchor.len(),
        });
    }
    locate_normalized(body, anchor)
}

/// One character of normalized text, carrying the original byte range it was
/// produced from. A collapsed whitespace run maps back to the whole run.
struct NormChar {
    norm_offset: usize,
    orig_start: usize,
    orig_end: usize,
}

struct Normalized {
    text: String,
    chars: Vec<NormChar>,
}

/// Collapse runs of whitespace to a single space, dropping leading and
/// trailing runs entirely, while recording the normalized-to-original offset
/// mapping.
fn normalize(input: &str) -> Normalized {
    let mut text = String::with_capacity(input.len());
    let mut chars = Vec::new();
    let mut pending_ws: Option<(usize, usize)> = None;

    for (offset, ch) in input.char_indices() {
        if ch.is_whitespace() {
            match &mut pending_ws {
                Some((_, end)) => *end = offset + ch.len_utf8(),
                None => pending_ws = Some((offset, offset + ch.len_utf8())),
            }
        } else {
            if let Some((ws_start, ws_end)) = pending_ws.take() {
                // Leading whitespace is dropped, interior runs collapse to one space
                if !text.is_empty() {
                    chars.push(NormChar {
                        norm_offset: text.len(),
                        orig_start: ws_start,
                        orig_end: ws_end,
                    });
                    text.push(' ');
                }
            }
            chars.push(NormChar {
                norm_offset: text.len(),
                orig_start: offset,
                orig_end: offset + ch.len_utf8(),
            });
            text.push(ch);
        }
    }

    Normalized { text, chars }
}

fn locate_normalized(body: &str, anchor: &str) -> Option<Span> {
    let hay = normalize(body);
    let needle = normalize(anchor);
    if needle.text.is_empty() {
        return None;
    }

    let match_start = hay.text.find(&needle.text)?;
    let match_end = match_start + needle.text.len();

    // The needle is trimmed, so the match starts and ends on non-whitespace
    // characters; both lookups land on real entries.
    let first = hay
        .chars
        .binary_search_by(|c| c.norm_offset.cmp(&match_start))
        .ok()?;
    let last = match hay
        .chars
        .binary_search_by(|c| c.norm_offset.cmp(&match_end))
    {
        Ok(i) | Err(i) => i.checked_sub(1)?,
    };

    Some(Span {
        start: hay.chars[first].orig_start,
        end: hay.chars[last].orig_end,
    })
}
