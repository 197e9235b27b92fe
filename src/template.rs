/// A template that can be registered with a [`PathMatcher`](crate::PathMatcher).
///
/// The matcher only needs the textual form of the template; everything else is
/// up to the implementor. A routing table would typically implement this for
/// its route type so that a [`MatchResult`](crate::MatchResult) hands back the
/// route itself, not just its text.
///
/// The `PartialEq` bound on [`PathMatcher`](crate::PathMatcher) is what makes
/// re-registering the same template a no-op, so `==` should agree with
/// `template_text` equality for types used as templates.
///
/// ## Examples
/// ```
/// use pathtree::PathTemplate;
///
/// #[derive(PartialEq)]
/// struct Route(String);
///
/// impl PathTemplate for Route {
///     fn template_text(&self) -> &str {
///         &self.0
///     }
/// }
/// ```
pub trait PathTemplate {
    /// The template text, e.g. `"/customer/{id}"`.
    fn template_text(&self) -> &str;
}

impl PathTemplate for String {
    fn template_text(&self) -> &str {
        self
    }
}

impl PathTemplate for &str {
    fn template_text(&self) -> &str {
        self
    }
}
