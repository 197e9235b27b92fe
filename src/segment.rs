//! The segment model. A compiled template is a chain of segments, each of
//! which consumes some part of a candidate path; registration merges chains
//! into a shared tree (see [`tree`](crate::tree)).

use crate::tree::TemplateId;
use regex::Regex;

/// One node of the pattern tree.
///
/// `pos` is the byte offset of the segment in the normalized template text it
/// came from. It takes part in structural equality: two segments only merge
/// when they express the same rule *at the same place* in their templates,
/// which keeps merged chains aligned on separator counts.
#[derive(Debug)]
pub(crate) struct Segment {
    pub(crate) pos: usize,
    pub(crate) kind: SegmentKind,
    pub(crate) next: Vec<SegmentId>,
    pub(crate) previous: Option<SegmentId>,
}

/// Index of a [`Segment`] in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SegmentId(pub(crate) usize);

#[derive(Debug)]
pub(crate) enum SegmentKind {
    /// A single separator character
    Separator,
    /// `/**` — a separator plus zero or more whole elements
    SeparatorStarStar,
    /// An element matched verbatim
    Literal(String),
    /// An element containing `?` but no `*` or `{`
    QuestionMarked(String),
    /// An element containing `*` or a non-full-wrap `{...}`, matched by regex
    Wildcarded(WildcardedText),
    /// A full-wrap `{name}` or `{name:regex}` element
    Capturing(CapturingText),
    /// A trailing `{*name}` element capturing the rest of the path
    CapturingMulti { variable: String },
    /// Terminal marking that a whole template has been consumed
    MatchSuccess(TemplateId),
}

#[derive(Debug)]
pub(crate) struct WildcardedText {
    /// The element as written, used for structural equality
    pub(crate) text: String,
    /// Anchored translation of the element
    pub(crate) regex: Regex,
    /// Capture variable names in group order (group `i + 1` belongs to `variables[i]`)
    pub(crate) variables: Vec<String>,
}

#[derive(Debug)]
pub(crate) struct CapturingText {
    pub(crate) variable: String,
    pub(crate) constraint: Option<ConstraintRegex>,
}

#[derive(Debug)]
pub(crate) struct ConstraintRegex {
    /// The constraint as written, used for structural equality
    pub(crate) pattern: String,
    /// Anchored compiled form
    pub(crate) regex: Regex,
}

impl SegmentKind {
    /// Whether two segments express the same matching rule.
    ///
    /// [`MatchSuccess`](SegmentKind::MatchSuccess) always compares unequal
    /// here: its identity is the registered template, which only the tree can
    /// compare.
    pub(crate) fn same_rule(&self, other: &SegmentKind) -> bool {
        use SegmentKind::*;
        match (self, other) {
            (Separator, Separator) => true,
            (SeparatorStarStar, SeparatorStarStar) => true,
            (Literal(a), Literal(b)) => a == b,
            (QuestionMarked(a), QuestionMarked(b)) => a == b,
            (Wildcarded(a), Wildcarded(b)) => a.text == b.text,
            (Capturing(a), Capturing(b)) => {
                a.variable == b.variable
                    && a.constraint.as_ref().map(|c| c.pattern.as_str())
                        == b.constraint.as_ref().map(|c| c.pattern.as_str())
            }
            (CapturingMulti { variable: a }, CapturingMulti { variable: b }) => a == b,
            _ => false,
        }
    }
}
