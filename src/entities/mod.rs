// Entity Models
// "Identity persists, memberships change"
//
// Each entity has:
// - Stable identity (roster id, or name + country, or group name)
// - Memberships over time (see temporal.rs)
// - Registry for lookups by name, alias or vote-data id

pub mod group;
pub mod mep;
pub mod party;

pub use group::{default_group_definitions, EuPoliticalGroup, GroupDefinition, GroupRegistry, NON_ATTACHED};
pub use mep::Mep;
pub use party::{NationalParty, PartyKey, PartyRegistry};
