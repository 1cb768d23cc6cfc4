//! Errors reported for invalid positions handed to a container.

/// A cursor or list position could not be used for the requested operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum CursorError {
    /// The position is the past-the-end marker, which has no successor
    /// and no value.
    End,

    /// The position no longer refers to a live element: the node was
    /// erased, or the map was rehashed since the cursor was taken.
    Stale,
}

impl std::fmt::Display for CursorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::End => f.write_str("cursor is at the end position"),
            Self::Stale => f.write_str("cursor refers to an element that no longer exists"),
        }
    }
}

impl std::error::Error for CursorError {}
