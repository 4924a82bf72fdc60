use std::fmt::Debug;
use std::iter::FusedIterator;

use http::StatusCode;

/// Ancestor walks stop after this many steps, so a cyclic `parent` declaration
/// still terminates.
pub const MAX_KIND_DEPTH: usize = 32;

/// A finite set of failure kinds with an explicit parent relation.
///
/// Failure routes filter on kinds. A filter entry matches a raised kind when it
/// is that kind or one of its ancestors, found by following [`parent`].
///
/// [`parent`]: FailureKind::parent
pub trait FailureKind: Copy + Eq + Debug + Send + Sync + 'static {
    fn parent(self) -> Option<Self>;

    /// The kind assigned to failures the router raises on its own behalf,
    /// such as a panicking handler.
    fn unhandled() -> Self;

    /// The HTTP status a failure of this kind maps to when it carries no
    /// explicit status hint.
    fn status(self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn lineage(self) -> Lineage<Self> {
        Lineage {
            next: Some(self),
            depth: 0,
        }
    }

    fn is_a(self, ancestor: Self) -> bool {
        self.lineage().any(|k| k == ancestor)
    }
}

pub struct Lineage<K> {
    next: Option<K>,
    depth: usize,
}

impl<K: FailureKind> Iterator for Lineage<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        if self.depth >= MAX_KIND_DEPTH {
            return None;
        }
        let cur = self.next.take()?;
        self.depth += 1;
        self.next = cur.parent();
        Some(cur)
    }
}

impl<K: FailureKind> FusedIterator for Lineage<K> {}

/// Built-in failure kinds.
///
/// ```text
/// Unhandled
/// ├── InvalidArgument
/// ├── InvalidState
/// ├── Unsupported
/// ├── Io
/// │   └── Timeout
/// └── Http
///     ├── NotFound
///     ├── Unauthorized
///     ├── Forbidden
///     └── Conflict
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Unhandled,
    InvalidArgument,
    InvalidState,
    Unsupported,
    Io,
    Timeout,
    Http,
    NotFound,
    Unauthorized,
    Forbidden,
    Conflict,
}

impl FailureKind for Kind {
    fn parent(self) -> Option<Self> {
        use Kind::*;
        match self {
            Unhandled => None,
            InvalidArgument | InvalidState | Unsupported | Io | Http => Some(Unhandled),
            Timeout => Some(Io),
            NotFound | Unauthorized | Forbidden | Conflict => Some(Http),
        }
    }

    fn unhandled() -> Self {
        Kind::Unhandled
    }

    fn status(self) -> StatusCode {
        use Kind::*;
        match self {
            InvalidArgument => StatusCode::BAD_REQUEST,
            Unsupported => StatusCode::NOT_IMPLEMENTED,
            Timeout => StatusCode::GATEWAY_TIMEOUT,
            NotFound => StatusCode::NOT_FOUND,
            Unauthorized => StatusCode::UNAUTHORIZED,
            Forbidden => StatusCode::FORBIDDEN,
            Conflict => StatusCode::CONFLICT,
            Unhandled | InvalidState | Io | Http => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Loop {
        A,
        B,
    }

    impl FailureKind for Loop {
        fn parent(self) -> Option<Self> {
            match self {
                Loop::A => Some(Loop::B),
                Loop::B => Some(Loop::A),
            }
        }

        fn unhandled() -> Self {
            Loop::A
        }
    }

    #[test]
    fn lineage_nearest_first() {
        let chain: Vec<Kind> = Kind::Timeout.lineage().collect();
        assert_eq!(chain, [Kind::Timeout, Kind::Io, Kind::Unhandled]);
        assert!(Kind::NotFound.is_a(Kind::Http));
        assert!(Kind::NotFound.is_a(Kind::Unhandled));
        assert!(!Kind::NotFound.is_a(Kind::Io));
        assert!(!Kind::Unhandled.is_a(Kind::Http));
    }

    #[test]
    fn cyclic_parents_terminate() {
        assert_eq!(Loop::A.lineage().count(), MAX_KIND_DEPTH);
        assert!(Loop::A.is_a(Loop::B));
    }

    #[test]
    fn default_status() {
        assert_eq!(Kind::InvalidArgument.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Kind::Unhandled.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(Loop::B.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
