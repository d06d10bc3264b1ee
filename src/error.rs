// 🚨 Error Taxonomy
// Structural data-integrity violations abort the run; everything else is
// recovered where it happens.
//
// Recovered locally (never an Error value):
// - unresolved voter identity → voter skipped, warn! + diagnostics counter
// - missing daily document   → day skipped, debug! + diagnostics counter

use chrono::NaiveDate;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Period whose end lies before its start
    #[error("Invalid period: end {end} is before start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// More than one EU group claims the same party on one date
    #[error("Party `{party}` is claimed by more than one group on {date}: {groups:?}")]
    AmbiguousMembership {
        party: String,
        date: NaiveDate,
        groups: Vec<String>,
    },

    #[error("Expected exactly one membership of `{member}` to correct, found {found}")]
    MembershipCorrection { member: String, found: usize },

    #[error("No political group named `{0}`")]
    UnknownGroup(String),

    #[error("No national party `{name}` ({country:?})")]
    UnknownParty {
        name: String,
        country: Option<String>,
    },

    #[error("Malformed period `{0}`: expected `dd-mm-yyyy / dd-mm-yyyy` or `dd-mm-yyyy ...`")]
    MalformedPeriod(String),

    #[error("Malformed roster entry `{0}`")]
    MalformedRoster(String),

    #[error("Malformed roll-call document for {date}: {reason}")]
    MalformedDocument { date: NaiveDate, reason: String },

    #[error("I/O error: `{0}`")]
    Io(#[from] std::io::Error),

    #[error("CSV error: `{0}`")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: `{0}`")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: `{0}`")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: `{0}`")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
