//! Error types reported when registering templates. Matching itself cannot
//! fail; a path that fits no template simply produces no results.

use std::error;
use std::fmt::{self, Display};

/// The error returned by [`PathMatcher::add_template`](crate::PathMatcher::add_template).
///
/// A template that fails to compile is not registered; the matcher is left
/// exactly as it was before the call.
#[derive(Debug)]
pub enum PatternError {
    /// The regex constraint of a `{name:regex}` capture did not compile
    ConstraintRegex {
        /// Name of the capture variable the constraint belongs to
        variable: String,
        /// The constraint as written in the template
        pattern: String,
        /// The underlying regex compile error
        source: regex::Error,
    },
    /// The regex built for a wildcarded element (one containing `*`, `?` or an
    /// embedded `{...}`) did not compile
    ///
    /// The built-in translations always compile, so this points at an invalid
    /// regex inside an embedded `{name:regex}` group.
    WildcardRegex {
        /// The offending element as written in the template
        element: String,
        /// The underlying regex compile error
        source: regex::Error,
    },
    /// A `{*name}` capture was followed by further elements
    ///
    /// `{*name}` swallows the remainder of the path, so anything after it
    /// could never match.
    MultiCaptureNotLast {
        /// Name of the `{*name}` capture variable
        variable: String,
    },
}

impl error::Error for PatternError {
    /// Returns the regex compile error for the regex-related variants.
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            PatternError::ConstraintRegex { source, .. } => Some(source),
            PatternError::WildcardRegex { source, .. } => Some(source),
            PatternError::MultiCaptureNotLast { .. } => None,
        }
    }
}

impl Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::ConstraintRegex {
                variable,
                pattern,
                source,
            } => write!(
                f,
                "pathtree: constraint `{}` of capture `{{{}}}` is not a valid regex: {}",
                pattern, variable, source
            ),
            PatternError::WildcardRegex { element, source } => write!(
                f,
                "pathtree: element `{}` produced an invalid regex: {}",
                element, source
            ),
            PatternError::MultiCaptureNotLast { variable } => write!(
                f,
                "pathtree: `{{*{}}}` must be the last element of the template",
                variable
            ),
        }
    }
}
