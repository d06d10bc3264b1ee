// EP Cohesion - Core Library
// Temporal membership model, roll-call parsing and the cohesion comparison.
// Exposes all modules for use in the CLI and tests.

pub mod config;
pub mod engine;
pub mod entities;
pub mod error;
pub mod logging;
pub mod pairings;
pub mod parser;
pub mod resolution;
pub mod roster;
pub mod source;
pub mod store;
pub mod tally;
pub mod temporal;

// Re-export commonly used types
pub use config::{AnalysisConfig, PartyAffiliation};
pub use engine::{
    compare_voting_cohesion, Agreement, ComparisonReport, Diagnostics, NonCoherentVoting,
};
pub use entities::{
    default_group_definitions, EuPoliticalGroup, GroupDefinition, GroupRegistry, Mep,
    NationalParty, PartyKey, PartyRegistry, NON_ATTACHED,
};
pub use error::{Error, Result};
pub use logging::configure_logging;
pub use pairings::{scan_documents, IdPairings};
pub use parser::{parse_document, GroupBlock, RollCall, RollCallDocument, VoterRecord};
pub use resolution::{
    find_group_ids_of_party, find_group_of_party, RosterSeating, SeatingRecord, VoteSeating,
    VoteTaggedSeating,
};
pub use roster::{parse_party_label, parse_period, Roster};
pub use source::{days, CachedDocumentSource, DocumentSource, InMemorySource};
pub use store::{
    count_runs_with_fingerprint, latest_run, load_pairings, record_run, save_pairings,
    setup_database, StoredRun,
};
pub use tally::{VoteChoice, VoteTally};
pub use temporal::{Membership, MembershipSet, Period};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
