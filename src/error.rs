use thiserror::Error;

use crate::grid::Location;

/// Errors surfaced during setup. A search that ends below a full fill is not
/// an error; it is returned as a partial outcome with its reward.
#[derive(Error, Debug)]
pub enum FillError {
    #[error("invalid layout: {0}")]
    InvalidLayout(String),

    #[error("invalid word list: {0}")]
    InvalidWordList(String),

    #[error("fixed letters disagree at {location:?}: {existing} vs {incoming}")]
    InconsistentFixedLetters {
        location: Location,
        existing: char,
        incoming: char,
    },

    #[error("invalid argument {name}: {value}")]
    InvalidArgument { name: String, value: String },

    #[error("internal invariant violated: {0}")]
    Internal(String),

    // Output writing only; loaders map read/parse failures to the
    // layout and word-list kinds above
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
