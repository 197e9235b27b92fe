//! Normalization of template and candidate text.
//!
//! Templates and candidate paths go through the same single pass before they
//! are compiled or matched, so the two sides always agree byte-for-byte on
//! what a separator-delimited element looks like.

use crate::MatchOptions;
use std::borrow::Cow;

/// Normalized text plus the byte offsets of every separator in it.
///
/// `separator_positions` additionally holds a sentinel entry equal to the
/// normalized length, so `separator_positions[n]` is the end boundary of the
/// element that follows the `n`-th separator even for the last element.
pub(crate) struct PreparedPath<'p> {
    pub(crate) text: Cow<'p, str>,
    pub(crate) separator_positions: Vec<usize>,
    pub(crate) separator_count: usize,
}

pub(crate) fn prepare<'p>(input: &'p str, options: &MatchOptions) -> PreparedPath<'p> {
    let sep = options.separator;
    let mut positions = Vec::new();

    let text: Cow<'p, str> = if options.trim_tokens {
        let mut out = String::with_capacity(input.len());
        let mut after_separator = false;
        for ch in input.chars() {
            if ch == sep {
                while out.ends_with(' ') {
                    out.pop();
                }
                positions.push(out.len());
                out.push(sep);
                after_separator = true;
            } else if ch == ' ' && (after_separator || out.is_empty()) {
                // spaces at the start or right after a separator are dropped
            } else {
                after_separator = false;
                push_folded(&mut out, ch, options);
            }
        }
        while out.ends_with(' ') {
            out.pop();
        }
        Cow::Owned(out)
    } else if !options.case_sensitive {
        let mut out = String::with_capacity(input.len());
        for ch in input.chars() {
            if ch == sep {
                positions.push(out.len());
                out.push(ch);
            } else {
                out.extend(ch.to_lowercase());
            }
        }
        Cow::Owned(out)
    } else {
        for (i, ch) in input.char_indices() {
            if ch == sep {
                positions.push(i);
            }
        }
        Cow::Borrowed(input)
    };

    let separator_count = positions.len();
    positions.push(text.len()); // sentinel
    PreparedPath {
        text,
        separator_positions: positions,
        separator_count,
    }
}

fn push_folded(out: &mut String, ch: char, options: &MatchOptions) {
    if options.case_sensitive {
        out.push(ch);
    } else {
        out.extend(ch.to_lowercase());
    }
}
