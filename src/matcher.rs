//! The matcher API and the recursive match engine.

use crate::compile::compile;
use crate::prepare::{prepare, PreparedPath};
use crate::result::MatchResult;
use crate::segment::{CapturingText, Segment, SegmentId, SegmentKind, WildcardedText};
use crate::template::PathTemplate;
use crate::tree::{PatternTree, TemplateId};
use crate::PatternError;
use tracing::{debug, trace};

/// The default separator character, `/`.
pub const DEFAULT_SEPARATOR: char = '/';

/// Configuration for a [`PathMatcher`].
///
/// ## Examples
/// ```
/// use pathtree::{MatchOptions, PathMatcher};
///
/// let options = MatchOptions {
///     separator: '.',
///     ..MatchOptions::default()
/// };
/// let mut matcher = PathMatcher::with_options(options);
/// matcher.add_template("com.example.{class}")?;
/// assert!(matcher.matches("com.example.Foo"));
/// # Ok::<(), pathtree::PatternError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOptions {
    /// The character separating path elements. Defaults to [`DEFAULT_SEPARATOR`].
    pub separator: char,
    /// If set, ASCII spaces at the start and end of the path and around
    /// separators are ignored, in templates and candidates alike. Defaults to
    /// `false`.
    pub trim_tokens: bool,
    /// If unset, templates and candidates are compared case-insensitively.
    /// Defaults to `true`.
    pub case_sensitive: bool,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            separator: DEFAULT_SEPARATOR,
            trim_tokens: false,
            case_sensitive: true,
        }
    }
}

/// Matches candidate paths against a set of registered path templates.
///
/// Templates are added with [`add_template`](PathMatcher::add_template) and
/// probed with [`matches`](PathMatcher::matches),
/// [`find_first_match`](PathMatcher::find_first_match),
/// [`find_all_matches`](PathMatcher::find_all_matches) or
/// [`find_all_prefix_matches_starting`](PathMatcher::find_all_prefix_matches_starting).
/// Registration takes `&mut self` and matching takes `&self`, so a fully
/// built matcher can be matched against from multiple threads without
/// locking.
///
/// ## Examples
/// ```
/// use pathtree::PathMatcher;
///
/// let mut matcher = PathMatcher::new();
/// matcher.add_template("/customer/{id}")?;
/// matcher.add_template("/customer/{id}/invoice")?;
///
/// assert!(matcher.matches("/customer/78/invoice"));
///
/// let result = matcher.find_first_match("/customer/78").unwrap();
/// assert_eq!(result.value("id"), Some("78"));
/// # Ok::<(), pathtree::PatternError>(())
/// ```
#[derive(Debug)]
pub struct PathMatcher<T> {
    tree: PatternTree<T>,
    options: MatchOptions,
}

impl<T> PathMatcher<T> {
    /// Creates an empty matcher with the default [`MatchOptions`].
    pub fn new() -> Self {
        Self::with_options(MatchOptions::default())
    }

    /// Creates an empty matcher with the given options.
    pub fn with_options(options: MatchOptions) -> Self {
        PathMatcher {
            tree: PatternTree::new(),
            options,
        }
    }

    /// The options this matcher was created with.
    pub fn options(&self) -> MatchOptions {
        self.options
    }

    /// Removes all registered templates.
    pub fn clear(&mut self) {
        self.tree.clear();
    }
}

impl<T> Default for PathMatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PathTemplate + PartialEq> PathMatcher<T> {
    /// Compiles `template` and adds it to the pattern tree.
    ///
    /// Templates sharing a prefix with an already registered template are
    /// merged into its chain. Re-adding a template equal to a registered one
    /// is a no-op. On error, nothing is registered.
    ///
    /// ## Examples
    /// ```
    /// use pathtree::{PathMatcher, PatternError};
    ///
    /// let mut matcher = PathMatcher::new();
    /// matcher.add_template("/files/{*rest}")?;
    ///
    /// // {*name} swallows the rest of the path, nothing may follow it
    /// let err = matcher.add_template("/{*rest}/invalid").unwrap_err();
    /// assert!(matches!(err, PatternError::MultiCaptureNotLast { .. }));
    /// # Ok::<(), PatternError>(())
    /// ```
    pub fn add_template(&mut self, template: T) -> Result<(), PatternError> {
        let prepared = prepare(template.template_text(), &self.options);
        let compiled = compile(&prepared.text, &self.options)?;
        debug!(
            template = %template.template_text(),
            separators = compiled.separator_count,
            variable_length = compiled.variable_length,
            "registered path template"
        );
        self.tree.insert(compiled, template);
        Ok(())
    }

    /// Whether `path` matches at least one registered template.
    pub fn matches(&self, path: &str) -> bool {
        let mut context = MatchingContext::new(path, &self.options, false, false);
        self.run(&mut context, true);
        !context.results.is_empty()
    }

    /// The first match found for `path`, if any.
    ///
    /// Fixed-length templates are consulted before variable-length ones;
    /// within the shared tree, siblings are tried in registration order.
    pub fn find_first_match(&self, path: &str) -> Option<MatchResult<'_, T>> {
        let mut context = MatchingContext::new(path, &self.options, false, false);
        self.run(&mut context, true);
        self.into_results(context).into_iter().next()
    }

    /// All matches for `path`, one per matching template.
    pub fn find_all_matches(&self, path: &str) -> Vec<MatchResult<'_, T>> {
        let mut context = MatchingContext::new(path, &self.options, true, false);
        self.run(&mut context, true);
        self.into_results(context)
    }

    /// All templates that `path` is a prefix of a match for.
    ///
    /// `/customer` is not a full match for `/customer/{id}`, but it starts
    /// one, and this method reports such templates. Results carry no captured
    /// variables.
    ///
    /// ## Examples
    /// ```
    /// use pathtree::PathMatcher;
    ///
    /// let mut matcher = PathMatcher::new();
    /// matcher.add_template("/customer/{id}")?;
    ///
    /// assert!(matcher.find_all_matches("/customer").is_empty());
    /// assert_eq!(matcher.find_all_prefix_matches_starting("/customer").len(), 1);
    /// # Ok::<(), pathtree::PatternError>(())
    /// ```
    pub fn find_all_prefix_matches_starting(&self, path: &str) -> Vec<MatchResult<'_, T>> {
        let mut context = MatchingContext::new(path, &self.options, true, true);
        self.run(&mut context, false);
        self.into_results(context)
    }

    /// All registered template texts: fixed-length templates by separator
    /// count ascending (siblings in registration order, depth first), then
    /// variable-length templates in registration order.
    pub fn patterns(&self) -> Vec<String> {
        self.tree.patterns()
    }

    /// Walks the relevant tree roots for the candidate in `context`.
    ///
    /// `exact` restricts fixed-length templates to the candidate's own
    /// separator-count bucket; prefix matching also tries every bucket with
    /// more separators. Variable-length roots are tried afterwards in both
    /// cases, skipping those needing more separators than the candidate has.
    fn run(&self, context: &mut MatchingContext<'_>, exact: bool) {
        if exact {
            if let Some(roots) = self.tree.buckets.get(&context.separator_count()) {
                for &root in roots {
                    self.segment_matches(root, 0, 0, context);
                    if !context.results.is_empty() && !context.find_all {
                        return;
                    }
                }
            }
        } else {
            for (_, roots) in self.tree.buckets.range(context.separator_count()..) {
                for &root in roots {
                    self.segment_matches(root, 0, 0, context);
                    if !context.results.is_empty() && !context.find_all {
                        return;
                    }
                }
            }
        }
        for vr in &self.tree.variable_roots {
            if vr.min_separators <= context.separator_count() {
                self.segment_matches(vr.root, 0, 0, context);
                if !context.results.is_empty() && !context.find_all {
                    return;
                }
            }
        }
    }

    fn into_results(&self, context: MatchingContext<'_>) -> Vec<MatchResult<'_, T>> {
        let path = context.original;
        context
            .results
            .into_iter()
            .map(|raw| MatchResult {
                template: self.tree.template(raw.template),
                path: path.to_string(),
                variables: raw.variables,
            })
            .collect()
    }

    fn segment_matches(
        &self,
        id: SegmentId,
        ci: usize,
        sn: usize,
        context: &mut MatchingContext<'_>,
    ) -> bool {
        let segment = self.tree.node(id);
        match &segment.kind {
            SegmentKind::Separator => self.match_separator(segment, ci, sn, context),
            SegmentKind::SeparatorStarStar => {
                self.match_separator_star_star(segment, ci, sn, context)
            }
            SegmentKind::Literal(text) => self.match_literal(segment, text, ci, sn, context),
            SegmentKind::QuestionMarked(text) => {
                self.match_question_marked(segment, text, ci, sn, context)
            }
            SegmentKind::Wildcarded(wildcarded) => {
                self.match_wildcarded(segment, wildcarded, ci, sn, context)
            }
            SegmentKind::Capturing(capturing) => {
                self.match_capturing(segment, capturing, ci, sn, context)
            }
            SegmentKind::CapturingMulti { variable } => {
                self.match_capturing_multi(segment, variable, ci, sn, context)
            }
            SegmentKind::MatchSuccess(template) => {
                self.match_success(segment, *template, ci, context)
            }
        }
    }

    /// Tries every child of `segment` at the given position. In all-matches
    /// mode every child is tried even after a success; otherwise the first
    /// success wins.
    fn match_children(
        &self,
        segment: &Segment,
        ci: usize,
        sn: usize,
        context: &mut MatchingContext<'_>,
    ) -> bool {
        let mut matched = false;
        for &next in &segment.next {
            if self.segment_matches(next, ci, sn, context) {
                matched = true;
                if !context.find_all {
                    return true;
                }
            }
        }
        matched
    }

    fn match_separator(
        &self,
        segment: &Segment,
        ci: usize,
        sn: usize,
        context: &mut MatchingContext<'_>,
    ) -> bool {
        if ci < context.len() {
            if context.text()[ci..].starts_with(self.options.separator) {
                self.match_children(segment, ci + self.options.separator.len_utf8(), sn + 1, context)
            } else {
                false
            }
        } else if context.match_start {
            // the candidate ran out exactly at a separator: in prefix mode
            // every template below this point starts with the candidate
            let mut successes = Vec::new();
            self.tree.collect_successes_of(segment, &mut successes);
            for template in successes {
                context.add_result(template);
            }
            true
        } else {
            false
        }
    }

    fn match_literal(
        &self,
        segment: &Segment,
        text: &str,
        ci: usize,
        sn: usize,
        context: &mut MatchingContext<'_>,
    ) -> bool {
        if context.text()[ci..].starts_with(text) {
            self.match_children(segment, ci + text.len(), sn, context)
        } else {
            false
        }
    }

    fn match_question_marked(
        &self,
        segment: &Segment,
        text: &str,
        ci: usize,
        sn: usize,
        context: &mut MatchingContext<'_>,
    ) -> bool {
        let mut end = ci;
        {
            let mut candidate = context.text()[ci..].chars();
            for expected in text.chars() {
                match candidate.next() {
                    Some(ch) if expected == '?' || expected == ch => end += ch.len_utf8(),
                    _ => return false,
                }
            }
        }
        if context.separator_position(sn) > end {
            // more data in this element than the pattern consumed
            return false;
        }
        self.match_children(segment, end, sn, context)
    }

    fn match_wildcarded(
        &self,
        segment: &Segment,
        wildcarded: &WildcardedText,
        ci: usize,
        sn: usize,
        context: &mut MatchingContext<'_>,
    ) -> bool {
        let end = context.separator_position(sn);
        let values: Vec<String> = {
            let element = &context.text()[ci..end];
            let captures = match wildcarded.regex.captures(element) {
                Some(captures) => captures,
                None => return false,
            };
            wildcarded
                .variables
                .iter()
                .enumerate()
                .map(|(i, _)| {
                    captures
                        .get(i + 1)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default()
                })
                .collect()
        };
        let matched = self.match_children(segment, end, sn, context);
        if matched && !context.match_start {
            for (variable, value) in wildcarded.variables.iter().zip(values) {
                context.set(variable, value);
            }
        }
        matched
    }

    fn match_capturing(
        &self,
        segment: &Segment,
        capturing: &CapturingText,
        ci: usize,
        sn: usize,
        context: &mut MatchingContext<'_>,
    ) -> bool {
        let end = context.separator_position(sn);
        if ci == end {
            // {name} requires a non-empty element
            return false;
        }
        if let Some(constraint) = &capturing.constraint {
            if !constraint.regex.is_match(&context.text()[ci..end]) {
                return false;
            }
        }
        let matched = self.match_children(segment, end, sn, context);
        if matched && !context.match_start {
            let value = context.text()[ci..end].to_string();
            context.set(&capturing.variable, value);
        }
        matched
    }

    fn match_capturing_multi(
        &self,
        segment: &Segment,
        variable: &str,
        ci: usize,
        sn: usize,
        context: &mut MatchingContext<'_>,
    ) -> bool {
        let mut matched = false;
        for &next in &segment.next {
            let mut hit = self.segment_matches(next, ci, sn, context);
            if !hit {
                for skip in sn + 1..=context.separator_count() {
                    trace!(boundary = skip, "{{*name}} retrying at next element boundary");
                    if self.segment_matches(next, context.separator_position(skip), skip, context) {
                        hit = true;
                        break;
                    }
                }
            }
            if hit {
                matched = true;
                if !context.match_start {
                    let value = context.text()[ci..].to_string();
                    context.set(variable, value);
                }
                if !context.find_all {
                    return true;
                }
                break;
            }
        }
        matched
    }

    fn match_separator_star_star(
        &self,
        segment: &Segment,
        ci: usize,
        sn: usize,
        context: &mut MatchingContext<'_>,
    ) -> bool {
        let mut matched = false;
        for &next in &segment.next {
            if self.segment_matches(next, ci, sn, context) {
                matched = true;
                if !context.find_all {
                    return true;
                }
            } else {
                for skip in sn + 1..=context.separator_count() {
                    trace!(boundary = skip, "`**` retrying at next element boundary");
                    if self.segment_matches(next, context.separator_position(skip), skip, context) {
                        matched = true;
                        if !context.find_all {
                            return true;
                        }
                    }
                }
            }
        }
        matched
    }

    fn match_success(
        &self,
        segment: &Segment,
        template: TemplateId,
        ci: usize,
        context: &mut MatchingContext<'_>,
    ) -> bool {
        if ci < context.len() {
            // leftover data is only fine if the previous segment swallows
            // trailing elements
            let swallows = segment.previous.map_or(false, |previous| {
                matches!(
                    self.tree.node(previous).kind,
                    SegmentKind::SeparatorStarStar | SegmentKind::CapturingMulti { .. }
                )
            });
            if !swallows {
                return false;
            }
        }
        context.add_result(template);
        true
    }
}

/// State for one match run: the prepared candidate, the traversal mode, and
/// the results accumulated so far.
struct MatchingContext<'p> {
    original: &'p str,
    prepared: PreparedPath<'p>,
    /// Keep walking siblings after a success and report every match
    find_all: bool,
    /// Prefix mode: the candidate only has to be the start of a match, and no
    /// variables are captured
    match_start: bool,
    results: Vec<RawMatch>,
}

struct RawMatch {
    template: TemplateId,
    variables: Option<Vec<(String, String)>>,
}

impl<'p> MatchingContext<'p> {
    fn new(path: &'p str, options: &MatchOptions, find_all: bool, match_start: bool) -> Self {
        MatchingContext {
            original: path,
            prepared: prepare(path, options),
            find_all,
            match_start,
            results: Vec::new(),
        }
    }

    fn text(&self) -> &str {
        &self.prepared.text
    }

    fn len(&self) -> usize {
        self.prepared.text.len()
    }

    fn separator_count(&self) -> usize {
        self.prepared.separator_count
    }

    /// End boundary of the element following the `sn`-th separator; the
    /// sentinel entry makes this the candidate length for the last element.
    fn separator_position(&self, sn: usize) -> usize {
        self.prepared.separator_positions[sn]
    }

    fn add_result(&mut self, template: TemplateId) {
        self.results.push(RawMatch {
            template,
            variables: None,
        });
    }

    /// Records a captured variable on the most recently added result.
    /// Captures are recorded on the way back out of the recursion, so they
    /// arrive innermost segment first.
    fn set(&mut self, key: &str, value: String) {
        let raw = match self.results.last_mut() {
            Some(raw) => raw,
            None => return,
        };
        let variables = raw.variables.get_or_insert_with(Vec::new);
        match variables.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => variables.push((key.to_string(), value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Templates sharing a prefix are merged into one chain; the tree only
    /// branches where they diverge.
    #[test]
    fn shared_prefix_is_stored_once() {
        let mut matcher = PathMatcher::new();
        matcher.add_template("/foo/bar").unwrap();
        matcher.add_template("/foo/boo").unwrap();
        matcher.add_template("/foo/baz").unwrap();

        let roots = &matcher.tree.buckets[&2];
        assert_eq!(roots.len(), 1, "all three templates share one root");

        // root separator -> "foo" -> separator -> three siblings
        let root = matcher.tree.node(roots[0]);
        assert_eq!(root.next.len(), 1);
        let foo = matcher.tree.node(root.next[0]);
        assert!(matches!(foo.kind, SegmentKind::Literal(_)));
        assert_eq!(foo.next.len(), 1);
        let second_separator = matcher.tree.node(foo.next[0]);
        assert_eq!(second_separator.next.len(), 3);
    }

    #[test]
    fn structural_equality_includes_source_position() {
        let mut matcher = PathMatcher::new();
        matcher.add_template("/a/foo").unwrap();
        matcher.add_template("/ab/oo").unwrap();

        // both have two separators, but the second separator sits at a
        // different offset, so only the root is shared
        let roots = &matcher.tree.buckets[&2];
        assert_eq!(roots.len(), 1);
        let root = matcher.tree.node(roots[0]);
        assert_eq!(root.next.len(), 2);
    }

    #[test]
    fn readding_a_template_changes_nothing() {
        let mut matcher = PathMatcher::new();
        matcher.add_template("/foo/bar").unwrap();
        let nodes_before = matcher.tree.buckets[&2].len();
        matcher.add_template("/foo/bar").unwrap();
        assert_eq!(matcher.tree.buckets[&2].len(), nodes_before);
        assert_eq!(matcher.patterns(), vec!["/foo/bar"]);
    }

    #[test]
    fn variable_length_templates_are_kept_aside() {
        let mut matcher = PathMatcher::new();
        matcher.add_template("/files/**").unwrap();
        matcher.add_template("/customer/{*rest}").unwrap();

        assert!(matcher.tree.buckets.is_empty());
        assert_eq!(matcher.tree.variable_roots.len(), 2);
        assert_eq!(matcher.tree.variable_roots[0].min_separators, 1);
        assert_eq!(matcher.tree.variable_roots[1].min_separators, 2);
    }

    #[test]
    fn variable_length_readding_is_idempotent() {
        let mut matcher = PathMatcher::new();
        matcher.add_template("/files/**").unwrap();
        matcher.add_template("/files/**").unwrap();
        assert_eq!(matcher.tree.variable_roots.len(), 1);
    }

    #[test]
    fn clear_resets_everything() {
        let mut matcher = PathMatcher::new();
        matcher.add_template("/foo").unwrap();
        matcher.add_template("/files/**").unwrap();
        matcher.clear();
        assert!(matcher.patterns().is_empty());
        assert!(!matcher.matches("/foo"));
        assert!(!matcher.matches("/files/x"));
    }

    #[test]
    fn failed_registration_leaves_matcher_untouched() {
        let mut matcher = PathMatcher::new();
        matcher.add_template("/ok").unwrap();
        assert!(matcher.add_template("/{id:[unclosed}").is_err());
        assert_eq!(matcher.patterns(), vec!["/ok"]);
    }
}
