use crate::context::Params;

use std::fmt;

use smallvec::SmallVec;

const STAR: &str = "*";
const COLON: char = ':';
const SLASH: char = '/';

pub(crate) type PathParts<'a> = SmallVec<[&'a str; 8]>;

pub(crate) fn split_path(path: &str) -> PathParts<'_> {
    path.split(SLASH).filter(|s| !s.is_empty()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(Box<str>),
    Capture(Box<str>),
}

/// Precedence of a pattern over other patterns matching the same path.
///
/// Compared lexicographically: more literal segments first, then an exact
/// pattern over a wildcard one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity {
    pub literals: usize,
    pub exact: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternError {
    Empty,
    MissingSlash,
    MisplacedWildcard,
    EmptyCapture,
}

impl PatternError {
    pub(crate) fn reason(self) -> &'static str {
        match self {
            PatternError::Empty => "pattern is empty",
            PatternError::MissingSlash => "pattern must start with '/'",
            PatternError::MisplacedWildcard => "wildcard pattern can only appear at end",
            PatternError::EmptyCapture => "capture name can not be empty",
        }
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

impl std::error::Error for PatternError {}

/// A parsed route pattern such as `/users/:id/files/*`.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: Box<str>,
    segments: SmallVec<[Segment; 4]>,
    wildcard: bool,
}

impl RoutePattern {
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }
        if !pattern.starts_with(SLASH) {
            return Err(PatternError::MissingSlash);
        }

        let mut parts = split_path(pattern);

        let wildcard = parts.last() == Some(&STAR);
        if wildcard {
            parts.pop();
        }

        let mut segments = SmallVec::with_capacity(parts.len());
        for part in parts {
            if part.contains(STAR) {
                return Err(PatternError::MisplacedWildcard);
            }
            match part.strip_prefix(COLON) {
                Some("") => return Err(PatternError::EmptyCapture),
                Some(name) => segments.push(Segment::Capture(name.into())),
                None => segments.push(Segment::Literal(part.into())),
            }
        }

        Ok(Self {
            source: pattern.into(),
            segments,
            wildcard,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn specificity(&self) -> Specificity {
        let literals = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        Specificity {
            literals,
            exact: !self.wildcard,
        }
    }

    /// Two patterns have the same shape when they accept exactly the same
    /// paths. Capture names do not count.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.wildcard == other.wildcard
            && self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(other.segments.iter())
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Capture(_), Segment::Capture(_)) => true,
                    _ => false,
                })
    }

    /// Matches a request path, returning this pattern's specificity on success.
    pub fn matches(&self, path: &str) -> Option<Specificity> {
        let parts = split_path(path);
        if self.accepts(&parts) {
            Some(self.specificity())
        } else {
            None
        }
    }

    pub(crate) fn accepts(&self, parts: &[&str]) -> bool {
        let n = self.segments.len();
        let len_ok = if self.wildcard {
            parts.len() >= n
        } else {
            parts.len() == n
        };
        len_ok
            && self
                .segments
                .iter()
                .zip(parts.iter())
                .all(|(seg, &part)| match seg {
                    Segment::Literal(lit) => **lit == *part,
                    Segment::Capture(_) => true,
                })
    }

    pub(crate) fn capture(&self, parts: &[&str], params: &mut Params) -> bool {
        if !self.accepts(parts) {
            return false;
        }
        for (seg, &part) in self.segments.iter().zip(parts.iter()) {
            if let Segment::Capture(name) = seg {
                params.push(name, part);
            }
        }
        if self.wildcard {
            params.set_tail(&parts[self.segments.len()..]);
        }
        true
    }

    pub(crate) fn join(prefix: &str, pattern: &str) -> String {
        let prefix = prefix.trim_end_matches(SLASH);
        let mut joined = String::with_capacity(prefix.len() + pattern.len() + 1);
        joined.push_str(prefix);
        if !pattern.starts_with(SLASH) {
            joined.push(SLASH);
        }
        joined.push_str(pattern);
        joined
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for RoutePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
