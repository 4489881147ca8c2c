//! Matchers decide whether a listener fires for a message.
//!
//! A [`Matcher`] is a pure predicate over a [`Message`] that yields a
//! structured [`MatchResult`] on success. Two matchers ship with the core:
//!
//! - [`RegexMatcher`]: unanchored regular-expression search over the text
//! - [`DirectMessageMatcher`]: decorator that only lets through messages
//!   whose first token addresses the robot by name
//!
//! Any `Fn(&Message) -> Option<MatchResult>` closure is a matcher as well,
//! which is what [`Robot::listen`](crate::robot::Robot::listen) is for.
//!
//! # Example
//!
//! ```rust
//! use hark_core::{DirectMessageMatcher, Matcher, Message, RegexMatcher, User};
//!
//! let status = RegexMatcher::new(r"status (\w+)?").unwrap();
//! let addressed = DirectMessageMatcher::new(status, "Pybot");
//!
//! let msg = Message::with_text(User::new("1", "ann"), "shell", "pybot: status db", "m1");
//! let found = addressed.try_match(&msg).unwrap();
//! assert_eq!(found.group(1), Some("db"));
//! ```

use std::collections::HashMap;
use std::ops::Range;
use std::sync::Arc;

use regex::{Captures, Regex};

use crate::error::{CoreError, CoreResult};
use crate::message::Message;

// ============================================================================
// Match Result
// ============================================================================

/// The structured result of a successful match.
///
/// Group 0 is always the whole match. Optional groups that did not
/// participate are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    groups: Vec<Option<String>>,
    named: HashMap<String, String>,
    range: Range<usize>,
}

impl MatchResult {
    /// Creates a result whose whole match is `text`, with no capture groups.
    ///
    /// Intended for hand-written matchers.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let range = 0..text.len();
        Self {
            groups: vec![Some(text)],
            named: HashMap::new(),
            range,
        }
    }

    /// Appends a positional capture group.
    pub fn with_group(mut self, group: Option<String>) -> Self {
        self.groups.push(group);
        self
    }

    /// Adds a named capture group.
    pub fn with_named(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    fn from_captures(regex: &Regex, caps: &Captures<'_>) -> Self {
        let groups = caps
            .iter()
            .map(|group| group.map(|m| m.as_str().to_owned()))
            .collect();
        let named = regex
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name.to_owned(), m.as_str().to_owned())))
            .collect();
        let range = caps.get(0).map_or(0..0, |m| m.range());
        Self {
            groups,
            named,
            range,
        }
    }

    /// Returns the whole matched text.
    pub fn as_str(&self) -> &str {
        self.group(0).unwrap_or_default()
    }

    /// Returns the positional group at `index`, if it participated.
    pub fn group(&self, index: usize) -> Option<&str> {
        self.groups.get(index).and_then(|g| g.as_deref())
    }

    /// Returns a named group, if it participated.
    pub fn named(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    /// Returns the number of positional groups, including group 0.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Returns `true` if the result holds no groups at all.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns the byte range of the whole match within the message text.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }
}

// ============================================================================
// Matcher Trait
// ============================================================================

/// A predicate over an incoming message.
///
/// Implementations must be free of observable side effects: the robot may
/// call `try_match` on every listener for every message.
pub trait Matcher: Send + Sync {
    /// Returns a match result if this matcher accepts the message.
    fn try_match(&self, message: &Message) -> Option<MatchResult>;

    /// Returns `true` if this matcher accepts the message.
    fn is_match(&self, message: &Message) -> bool {
        self.try_match(message).is_some()
    }
}

/// A shared matcher trait object.
pub type BoxedMatcher = Arc<dyn Matcher>;

impl<F> Matcher for F
where
    F: Fn(&Message) -> Option<MatchResult> + Send + Sync,
{
    fn try_match(&self, message: &Message) -> Option<MatchResult> {
        self(message)
    }
}

// ============================================================================
// RegexMatcher
// ============================================================================

/// Matches messages whose text contains the pattern anywhere.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
}

impl RegexMatcher {
    /// Compiles `pattern` once.
    pub fn new(pattern: &str) -> CoreResult<Self> {
        let regex = Regex::new(pattern).map_err(|source| CoreError::InvalidPattern {
            pattern: pattern.to_owned(),
            source,
        })?;
        Ok(Self { regex })
    }

    /// Returns the compiled expression.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl Matcher for RegexMatcher {
    fn try_match(&self, message: &Message) -> Option<MatchResult> {
        // Empty text counts as no text.
        let text = message.text().filter(|t| !t.is_empty())?;
        self.regex
            .captures(text)
            .map(|caps| MatchResult::from_captures(&self.regex, &caps))
    }
}

// ============================================================================
// DirectMessageMatcher
// ============================================================================

/// Characters stripped from the end of the address token.
const ADDRESS_SEPARATORS: [char; 4] = [':', '-', '=', ' '];

/// Requires the message to be addressed to `name` before consulting the
/// wrapped matcher.
///
/// The first whitespace-delimited token, with trailing `:`, `-` and `=`
/// stripped, must equal the name case-insensitively. The wrapped matcher
/// sees the original, unstripped text.
#[derive(Debug, Clone)]
pub struct DirectMessageMatcher<M> {
    wrapped: M,
    name: String,
}

impl<M: Matcher> DirectMessageMatcher<M> {
    /// Wraps `matcher` so it only fires for messages addressed to `name`.
    pub fn new(matcher: M, name: &str) -> Self {
        Self {
            wrapped: matcher,
            name: name.to_lowercase(),
        }
    }

    /// Returns the lower-cased name this matcher listens for.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn is_addressed(&self, text: &str) -> bool {
        text.split_whitespace().next().is_some_and(|token| {
            token.trim_end_matches(ADDRESS_SEPARATORS).to_lowercase() == self.name
        })
    }
}

impl<M: Matcher> Matcher for DirectMessageMatcher<M> {
    fn try_match(&self, message: &Message) -> Option<MatchResult> {
        let text = message.text()?;
        if !self.is_addressed(text) {
            return None;
        }
        self.wrapped.try_match(message)
    }
}
