//! Compilation of normalized template text into a linear segment chain.
//!
//! The scanner walks the text once, cutting it into separator-delimited
//! elements and classifying each element by the special characters it
//! contains. The chain produced here is linear; turning chains into a shared
//! tree is the job of [`tree`](crate::tree).

use crate::errors::PatternError;
use crate::segment::{CapturingText, ConstraintRegex, SegmentKind, WildcardedText};
use crate::MatchOptions;
use lazy_static::lazy_static;
use regex::Regex;

/// A compiled template, still in linear form.
///
/// The terminal `MatchSuccess` is not part of `segments`; the tree appends it
/// on insertion, once the template gets its identity. `match_success_pos` is
/// the source position it will carry (the normalized template length).
#[derive(Debug)]
pub(crate) struct CompiledTemplate {
    pub(crate) segments: Vec<ChainSegment>,
    pub(crate) match_success_pos: usize,
    /// Number of plain separators (`/**` does not count)
    pub(crate) separator_count: usize,
    /// True if the template contains `/**` or `{*name}` and can therefore
    /// match candidates with more separators than the template has
    pub(crate) variable_length: bool,
}

#[derive(Debug)]
pub(crate) struct ChainSegment {
    pub(crate) pos: usize,
    pub(crate) kind: SegmentKind,
}

pub(crate) fn compile(text: &str, options: &MatchOptions) -> Result<CompiledTemplate, PatternError> {
    let sep = options.separator;
    let sep_len = sep.len_utf8();

    let mut segments: Vec<ChainSegment> = Vec::new();
    let mut separator_count = 0;
    let mut variable_length = false;

    let mut element_start: Option<usize> = None;
    let mut flags = ElementFlags::default();

    let mut i = 0;
    while let Some(ch) = text[i..].chars().next() {
        if ch == sep {
            if let Some(start) = element_start.take() {
                segments.push(classify(&text[start..i], start, flags, options)?);
                flags = ElementFlags::default();
            }
            if text[i + sep_len..].starts_with("**") {
                // `/**` swallows the separator: it is one segment matching a
                // separator plus any number of whole elements
                segments.push(ChainSegment {
                    pos: i,
                    kind: SegmentKind::SeparatorStarStar,
                });
                variable_length = true;
                i += sep_len + 2;
            } else {
                segments.push(ChainSegment {
                    pos: i,
                    kind: SegmentKind::Separator,
                });
                separator_count += 1;
                i += sep_len;
            }
        } else {
            match ch {
                '?' => flags.question_mark = true,
                '*' => flags.star = true,
                '{' => flags.brace = true,
                _ => {}
            }
            element_start.get_or_insert(i);
            i += ch.len_utf8();
        }
    }
    if let Some(start) = element_start {
        segments.push(classify(&text[start..], start, flags, options)?);
    }

    for (idx, segment) in segments.iter().enumerate() {
        if let SegmentKind::CapturingMulti { variable } = &segment.kind {
            if idx + 1 != segments.len() {
                return Err(PatternError::MultiCaptureNotLast {
                    variable: variable.clone(),
                });
            }
            variable_length = true;
        }
    }

    Ok(CompiledTemplate {
        segments,
        match_success_pos: text.len(),
        separator_count,
        variable_length,
    })
}

#[derive(Default, Clone, Copy)]
struct ElementFlags {
    question_mark: bool,
    star: bool,
    brace: bool,
}

fn classify(
    element: &str,
    pos: usize,
    flags: ElementFlags,
    options: &MatchOptions,
) -> Result<ChainSegment, PatternError> {
    let kind = if flags.brace && element.len() >= 2 && element.starts_with('{') && element.ends_with('}')
    {
        let body = &element[1..element.len() - 1];
        if let Some(variable) = body.strip_prefix('*') {
            SegmentKind::CapturingMulti {
                variable: variable.to_string(),
            }
        } else {
            let (variable, constraint) = match body.find(':') {
                Some(colon) => {
                    let variable = &body[..colon];
                    let pattern = &body[colon + 1..];
                    let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| {
                        PatternError::ConstraintRegex {
                            variable: variable.to_string(),
                            pattern: pattern.to_string(),
                            source,
                        }
                    })?;
                    (
                        variable,
                        Some(ConstraintRegex {
                            pattern: pattern.to_string(),
                            regex,
                        }),
                    )
                }
                None => (body, None),
            };
            SegmentKind::Capturing(CapturingText {
                variable: variable.to_string(),
                constraint,
            })
        }
    } else if flags.star || flags.brace {
        let (regex, variables) = build_wildcard_regex(element, options)?;
        SegmentKind::Wildcarded(WildcardedText {
            text: element.to_string(),
            regex,
            variables,
        })
    } else if flags.question_mark {
        SegmentKind::QuestionMarked(element.to_string())
    } else {
        SegmentKind::Literal(element.to_string())
    };
    Ok(ChainSegment { pos, kind })
}

lazy_static! {
    /// Finds the glob tokens of a wildcarded element: `?`, `*`, or a brace
    /// group `{...}` whose body may contain one nested level of braces.
    static ref GLOB_TOKEN: Regex =
        Regex::new(r"\?|\*|\{((?:\{[^/]+?\}|[^/{}]|\\[{}])+?)\}").unwrap();
}

/// Translates a wildcarded element into an anchored regex.
///
/// `?` becomes `.`, `*` becomes `.*`, `{name}` becomes `(.*)` and
/// `{name:regex}` becomes `(regex)`; everything in between is escaped.
/// Returns the regex together with the capture variable names in group order.
fn build_wildcard_regex(
    element: &str,
    options: &MatchOptions,
) -> Result<(Regex, Vec<String>), PatternError> {
    let mut pattern = String::new();
    if !options.case_sensitive {
        pattern.push_str("(?i)");
    }
    pattern.push('^');

    let mut variables = Vec::new();
    let mut last = 0;
    for captures in GLOB_TOKEN.captures_iter(element) {
        let token = captures.get(0).unwrap(); // group 0 is the whole match
        pattern.push_str(&regex::escape(&element[last..token.start()]));
        match token.as_str() {
            "?" => pattern.push('.'),
            "*" => pattern.push_str(".*"),
            _ => {
                let body = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                match body.find(':') {
                    Some(colon) => {
                        variables.push(body[..colon].to_string());
                        pattern.push('(');
                        pattern.push_str(&body[colon + 1..]);
                        pattern.push(')');
                    }
                    None => {
                        variables.push(body.to_string());
                        pattern.push_str("(.*)");
                    }
                }
            }
        }
        last = token.end();
    }
    pattern.push_str(&regex::escape(&element[last..]));
    pattern.push('$');

    let regex = Regex::new(&pattern).map_err(|source| PatternError::WildcardRegex {
        element: element.to_string(),
        source,
    })?;
    Ok((regex, variables))
}
