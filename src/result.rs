use std::fmt;

/// A successful match, reported by the `find_*` methods of
/// [`PathMatcher`](crate::PathMatcher).
///
/// ## Examples
/// ```
/// use pathtree::PathMatcher;
///
/// let mut matcher = PathMatcher::new();
/// matcher.add_template("/customer/{id}")?;
///
/// let result = matcher.find_first_match("/customer/78").unwrap();
/// assert_eq!(*result.template(), "/customer/{id}");
/// assert_eq!(result.path(), "/customer/78");
/// assert_eq!(result.value("id"), Some("78"));
/// assert_eq!(result.value("missing"), None);
/// # Ok::<(), pathtree::PatternError>(())
/// ```
pub struct MatchResult<'m, T> {
    pub(crate) template: &'m T,
    pub(crate) path: String,
    pub(crate) variables: Option<Vec<(String, String)>>,
}

impl<'m, T> MatchResult<'m, T> {
    /// The registered template that matched.
    pub fn template(&self) -> &'m T {
        self.template
    }

    /// The candidate path that matched, as passed to the matcher (not
    /// normalized).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// All captured variables, in the order they were recorded during the
    /// match (innermost segment first). Empty if the template captures
    /// nothing.
    pub fn variables(&self) -> &[(String, String)] {
        self.variables.as_deref().unwrap_or(&[])
    }

    /// The captured value of the variable `key`, or `None` if the template
    /// has no such capture.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.variables()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl<'m, T: fmt::Debug> fmt::Debug for MatchResult<'m, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatchResult")
            .field("template", &self.template)
            .field("path", &self.path)
            .field("variables", &self.variables())
            .finish()
    }
}

impl<'m, T> Clone for MatchResult<'m, T> {
    // manual impl because derive would add a `T: Clone` bound, even though
    // only the reference is cloned
    fn clone(&self) -> Self {
        MatchResult {
            template: self.template,
            path: self.path.clone(),
            variables: self.variables.clone(),
        }
    }
}
