//! Match criteria for expect operations.
//!
//! A [`Matcher`] is an immutable criterion evaluated against the unread
//! console output and the two end-condition flags. Evaluation is a pure
//! function of that state, so matchers can be shared freely between calls.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use regex::Regex;

use crate::error::Result;

/// Criteria description of [`Matcher::Eof`].
pub const EOF_CRITERIA: &str = "EOF";

/// Criteria description of [`Matcher::TtyClosed`].
pub const TTY_CLOSED_CRITERIA: &str = "PTSClosed";

/// An externally defined text pattern.
///
/// This is the seam through which pattern engines plug into the matcher
/// set. It is implemented for [`regex::Regex`].
pub trait TextPattern: Send + Sync {
    /// Byte range of the first match in `haystack`, if any.
    fn find(&self, haystack: &str) -> Option<Range<usize>>;

    /// Human-readable description used in diagnostics.
    fn describe(&self) -> String;
}

impl TextPattern for Regex {
    fn find(&self, haystack: &str) -> Option<Range<usize>> {
        Self::find(self, haystack).map(|m| m.range())
    }

    fn describe(&self) -> String {
        self.as_str().to_string()
    }
}

/// The state a matcher is evaluated against.
#[derive(Debug, Clone, Copy)]
pub struct MatchState<'a> {
    /// Unread output.
    pub text: &'a str,
    /// The terminal reported end-of-stream.
    pub eof: bool,
    /// The terminal side was closed.
    pub tty_closed: bool,
}

impl<'a> MatchState<'a> {
    /// State with output only and no end condition.
    #[must_use]
    pub const fn text(text: &'a str) -> Self {
        Self {
            text,
            eof: false,
            tty_closed: false,
        }
    }
}

/// A single expect criterion.
#[derive(Clone)]
pub enum Matcher {
    /// Exact text anywhere in the unread output.
    Literal(String),
    /// An injected pattern engine.
    Pattern(Arc<dyn TextPattern>),
    /// Satisfied once the terminal reports end-of-stream.
    Eof,
    /// Satisfied once the terminal side has been closed.
    TtyClosed,
    /// Satisfied when every inner matcher is satisfied by the same state.
    All(Vec<Matcher>),
}

impl Matcher {
    /// Match exact text.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Match with an externally defined pattern.
    pub fn pattern(pattern: impl TextPattern + 'static) -> Self {
        Self::Pattern(Arc::new(pattern))
    }

    /// Compile `source` as a regular expression.
    ///
    /// # Errors
    ///
    /// Returns an error if the expression does not compile.
    pub fn regex(source: &str) -> Result<Self> {
        Ok(Self::pattern(Regex::new(source)?))
    }

    /// Match end-of-stream.
    #[must_use]
    pub const fn eof() -> Self {
        Self::Eof
    }

    /// Match the terminal side being closed.
    #[must_use]
    pub const fn tty_closed() -> Self {
        Self::TtyClosed
    }

    /// Match when all of `matchers` match.
    pub fn all(matchers: impl IntoIterator<Item = impl Into<Self>>) -> Self {
        Self::All(matchers.into_iter().map(Into::into).collect())
    }

    /// Human-readable description of what this matcher waits for.
    #[must_use]
    pub fn criteria(&self) -> String {
        match self {
            Self::Literal(text) => text.clone(),
            Self::Pattern(pattern) => pattern.describe(),
            Self::Eof => EOF_CRITERIA.to_string(),
            Self::TtyClosed => TTY_CLOSED_CRITERIA.to_string(),
            Self::All(inner) => {
                let parts: Vec<String> = inner.iter().map(Self::criteria).collect();
                format!("all({})", parts.join(", "))
            }
        }
    }

    /// Evaluate against `state`, returning the matched span of
    /// `state.text`.
    ///
    /// End-condition matchers report an empty span at the end of the text.
    #[must_use]
    pub fn find(&self, state: &MatchState<'_>) -> Option<Range<usize>> {
        let end = state.text.len();
        match self {
            Self::Literal(text) => state
                .text
                .find(text.as_str())
                .map(|start| start..start + text.len()),
            Self::Pattern(pattern) => pattern.find(state.text),
            Self::Eof => state.eof.then_some(end..end),
            Self::TtyClosed => state.tty_closed.then_some(end..end),
            Self::All(inner) => {
                let mut span: Option<Range<usize>> = None;
                for matcher in inner {
                    let hit = matcher.find(state)?;
                    span = Some(match span {
                        None => hit,
                        Some(s) => s.start.min(hit.start)..s.end.max(hit.end),
                    });
                }
                Some(span.unwrap_or(0..0))
            }
        }
    }

    /// Whether this matcher is satisfied by `state`.
    #[must_use]
    pub fn is_match(&self, state: &MatchState<'_>) -> bool {
        self.find(state).is_some()
    }
}

/// Evaluate `matchers` in argument order; the first satisfied one wins.
#[must_use]
pub fn first_match(
    matchers: &[Matcher],
    state: &MatchState<'_>,
) -> Option<(usize, Range<usize>)> {
    matchers
        .iter()
        .enumerate()
        .find_map(|(index, matcher)| matcher.find(state).map(|span| (index, span)))
}

/// Criteria descriptions of every matcher, in order.
#[must_use]
pub fn criteria_of(matchers: &[Matcher]) -> Vec<String> {
    matchers.iter().map(Matcher::criteria).collect()
}

/// Render matcher criteria as `["a", "b"]`.
#[must_use]
pub fn render_criteria(matchers: &[Matcher]) -> String {
    crate::error::format_criteria(&criteria_of(matchers))
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            Self::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.describe()).finish(),
            Self::Eof => f.write_str("Eof"),
            Self::TtyClosed => f.write_str("TtyClosed"),
            Self::All(inner) => f.debug_tuple("All").field(inner).finish(),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.criteria())
    }
}

impl From<&str> for Matcher {
    fn from(s: &str) -> Self {
        Self::Literal(s.to_string())
    }
}

impl From<String> for Matcher {
    fn from(s: String) -> Self {
        Self::Literal(s)
    }
}

impl From<&String> for Matcher {
    fn from(s: &String) -> Self {
        Self::Literal(s.clone())
    }
}

impl From<Regex> for Matcher {
    fn from(re: Regex) -> Self {
        Self::pattern(re)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    const ENDED: MatchState<'static> = MatchState {
        text: "tail",
        eof: true,
        tty_closed: false,
    };

    #[test]
    fn literal_matches_anywhere() {
        let m = Matcher::literal("1+1");
        assert_eq!(m.find(&MatchState::text("What is 1+1?")), Some(8..11));
        assert!(!m.is_match(&MatchState::text("What is 2+2?")));
    }

    #[test]
    fn empty_literal_matches_immediately() {
        assert_eq!(Matcher::literal("").find(&MatchState::text("")), Some(0..0));
    }

    #[test]
    fn regex_pattern() {
        let m = Matcher::regex(r"\d+ items").unwrap();
        assert_eq!(m.find(&MatchState::text("got 42 items")), Some(4..12));
        assert_eq!(m.criteria(), r"\d+ items");
    }

    #[test]
    fn invalid_regex_is_an_error() {
        assert!(Matcher::regex("(").is_err());
    }

    #[test]
    fn end_conditions_are_distinct() {
        let closed = MatchState {
            text: "x",
            eof: false,
            tty_closed: true,
        };
        assert_eq!(Matcher::eof().find(&ENDED), Some(4..4));
        assert!(!Matcher::tty_closed().is_match(&ENDED));
        assert!(Matcher::tty_closed().is_match(&closed));
        assert!(!Matcher::eof().is_match(&closed));
        assert!(!Matcher::eof().is_match(&MatchState::text("")));
    }

    #[test]
    fn all_requires_every_matcher() {
        let m = Matcher::all(["foo", "bar"]);
        assert_eq!(m.find(&MatchState::text("bar then foo")), Some(0..12));
        assert!(!m.is_match(&MatchState::text("only foo")));

        let with_end = Matcher::All(vec![Matcher::literal("ai"), Matcher::eof()]);
        assert_eq!(with_end.find(&ENDED), Some(1..4));
    }

    #[test]
    fn empty_all_is_vacuously_true() {
        assert_eq!(Matcher::All(Vec::new()).find(&MatchState::text("abc")), Some(0..0));
    }

    #[test]
    fn first_in_argument_order_wins() {
        let matchers = vec![Matcher::literal("world"), Matcher::literal("hello")];
        let state = MatchState::text("hello world");
        assert_eq!(first_match(&matchers, &state), Some((0, 6..11)));
    }

    #[test]
    fn first_match_skips_unsatisfied() {
        let matchers = vec![Matcher::literal("nope"), Matcher::eof()];
        assert_eq!(first_match(&matchers, &ENDED), Some((1, 4..4)));
        assert_eq!(first_match(&matchers, &MatchState::text("tail")), None);
    }

    #[test]
    fn criteria_descriptions() {
        let matchers = vec![
            Matcher::from("Password:"),
            Matcher::from(Regex::new("a+b").unwrap()),
            Matcher::eof(),
            Matcher::tty_closed(),
            Matcher::all(["x", "y"]),
        ];
        assert_eq!(
            criteria_of(&matchers),
            vec!["Password:", "a+b", "EOF", "PTSClosed", "all(x, y)"]
        );
        assert_eq!(
            render_criteria(&matchers[2..4]),
            r#"["EOF", "PTSClosed"]"#
        );
    }

    #[test]
    fn custom_pattern_is_injected() {
        struct Uppercase;

        impl TextPattern for Uppercase {
            fn find(&self, haystack: &str) -> Option<Range<usize>> {
                let start = haystack.find(|c: char| c.is_ascii_uppercase())?;
                let len = haystack[start..]
                    .find(|c: char| !c.is_ascii_uppercase())
                    .unwrap_or(haystack.len() - start);
                Some(start..start + len)
            }

            fn describe(&self) -> String {
                "<uppercase run>".to_string()
            }
        }

        let m = Matcher::pattern(Uppercase);
        assert_eq!(m.find(&MatchState::text("abc DEF ghi")), Some(4..7));
        assert_eq!(format!("{m:?}"), r#"Pattern("<uppercase run>")"#);
        assert_eq!(m.to_string(), "<uppercase run>");
    }

    proptest! {
        #[test]
        fn literal_found_when_embedded(prefix in "[a-z ]{0,20}", needle in "[A-Z]{1,8}", suffix in "[a-z ]{0,20}") {
            let text = format!("{prefix}{needle}{suffix}");
            let span = Matcher::literal(needle.clone()).find(&MatchState::text(&text));
            prop_assert!(span.is_some());
            let span = span.unwrap();
            prop_assert_eq!(&text[span], needle.as_str());
        }

        #[test]
        fn end_matchers_ignore_text(text in ".{0,40}", eof in any::<bool>(), tty_closed in any::<bool>()) {
            let state = MatchState { text: &text, eof, tty_closed };
            prop_assert_eq!(Matcher::eof().is_match(&state), eof);
            prop_assert_eq!(Matcher::tty_closed().is_match(&state), tty_closed);
        }

        #[test]
        fn winner_is_lowest_satisfied_index(needles in proptest::collection::vec("[ab]{1,3}", 1..6), text in "[ab]{0,12}") {
            let matchers: Vec<Matcher> = needles.iter().map(Matcher::from).collect();
            let expected = needles.iter().position(|n| text.contains(n.as_str()));
            let got = first_match(&matchers, &MatchState::text(&text)).map(|(i, _)| i);
            prop_assert_eq!(got, expected);
        }
    }
}
