use std::fmt;

/// Machine-readable error codes for UI and agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    TransportFailure,
    MalformedFrame,
    ServerSignaledError,
    AnnotationNotFound,
    InvalidAnchor,
    WrongAnnotationKind,
    AlreadyResolved,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::TransportFailure => "E1001",
            Self::MalformedFrame => "E1002",
            Self::ServerSignaledError => "E1003",
            Self::AnnotationNotFound => "E2001",
            Self::InvalidAnchor => "E2002",
            Self::WrongAnnotationKind => "E2003",
            Self::AlreadyResolved => "E2004",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::TransportFailure => "Stream read failed",
            Self::MalformedFrame => "Malformed stream frame",
            Self::ServerSignaledError => "Server reported an error",
            Self::AnnotationNotFound => "Annotation not found",
            Self::InvalidAnchor => "Annotation anchor out of bounds",
            Self::WrongAnnotationKind => "Operation does not match annotation kind",
            Self::AlreadyResolved => "Annotation already applied or dismissed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::TransportFailure => {
                Some("Check connectivity and re-run the check or refine request.")
            }
            Self::MalformedFrame => {
                Some("The stream is corrupt past recovery; re-run the request.")
            }
            Self::ServerSignaledError => {
                Some("The feedback service failed mid-stream; partial results are kept.")
            }
            Self::AnnotationNotFound => None,
            Self::InvalidAnchor => {
                Some("The document changed outside the engine; re-run the grammar check.")
            }
            Self::WrongAnnotationKind => {
                Some("Use apply_positioned for issues and apply_search for suggestions.")
            }
            Self::AlreadyResolved => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
