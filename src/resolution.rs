// 🧭 Group / Party Resolution
// "Which EU group was this national party in on date D?"
//
// A party belongs to a group on D when:
// - the group lists the party as a bloc member on D, or
// - any MEP deciding for the party on D is seated in the group on D.
//
// Seating comes from a SeatingRecord. When any party member voted that day
// the roll-call document alone decides the party's group; the roster history
// answers only for days on which no party member voted.

use crate::entities::{EuPoliticalGroup, Mep, NationalParty};
use crate::error::{Error, Result};
use crate::pairings::IdPairings;
use crate::parser::RollCallDocument;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};

// ============================================================================
// SEATING RECORDS
// ============================================================================

/// Answers "was this MEP seated in this group on this date?"
pub trait SeatingRecord {
    fn is_seated_in(&self, mep: &Mep, group: &EuPoliticalGroup, date: NaiveDate) -> bool;

    /// Party members whose seating decides the party's group on `date`
    fn deciding_members<'m>(&self, members: HashSet<&'m Mep>, _date: NaiveDate) -> HashSet<&'m Mep> {
        members
    }
}

/// Seating from the roster history (the group's MEP memberships)
#[derive(Debug, Clone, Copy, Default)]
pub struct RosterSeating;

impl SeatingRecord for RosterSeating {
    fn is_seated_in(&self, mep: &Mep, group: &EuPoliticalGroup, date: NaiveDate) -> bool {
        group.is_mep_a_member(mep, date)
    }
}

/// Seating observed in one day's roll-call document
///
/// Maps persistent MEP id → group id the MEP voted under.
#[derive(Debug, Clone, Default)]
pub struct VoteSeating {
    date: Option<NaiveDate>,
    seats: HashMap<String, String>,
}

impl VoteSeating {
    pub fn from_document(document: &RollCallDocument, pairings: &IdPairings) -> Self {
        let mut seats = HashMap::new();
        for (_, group_id, voter) in document.voters() {
            if let Some(persistent) = pairings.resolve(voter) {
                seats
                    .entry(persistent.to_string())
                    .or_insert_with(|| group_id.to_string());
            }
        }
        VoteSeating {
            date: Some(document.date),
            seats,
        }
    }

    /// Group id the MEP voted under, if they voted
    pub fn group_id_of(&self, mep_id: &str) -> Option<&str> {
        self.seats.get(mep_id).map(String::as_str)
    }

    /// Check if the MEP voted in this document and it is the one for `date`
    pub fn has_voted(&self, mep_id: &str, date: NaiveDate) -> bool {
        self.date.map_or(true, |own| own == date) && self.seats.contains_key(mep_id)
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }
}

impl SeatingRecord for VoteSeating {
    fn is_seated_in(&self, mep: &Mep, group: &EuPoliticalGroup, date: NaiveDate) -> bool {
        self.has_voted(&mep.id, date)
            && self
                .group_id_of(&mep.id)
                .is_some_and(|group_id| group.has_id(group_id))
    }
}

/// Vote seating for parties with a member voting that day, roster otherwise
///
/// Members absent from the day's votes never claim a group through the
/// roster while another party member voted.
#[derive(Debug, Clone, Copy)]
pub struct VoteTaggedSeating<'a> {
    votes: &'a VoteSeating,
}

impl<'a> VoteTaggedSeating<'a> {
    pub fn new(votes: &'a VoteSeating) -> Self {
        VoteTaggedSeating { votes }
    }
}

impl SeatingRecord for VoteTaggedSeating<'_> {
    fn is_seated_in(&self, mep: &Mep, group: &EuPoliticalGroup, date: NaiveDate) -> bool {
        if self.votes.has_voted(&mep.id, date) {
            self.votes.is_seated_in(mep, group, date)
        } else {
            RosterSeating.is_seated_in(mep, group, date)
        }
    }

    fn deciding_members<'m>(&self, members: HashSet<&'m Mep>, date: NaiveDate) -> HashSet<&'m Mep> {
        let voters: HashSet<&Mep> = members
            .iter()
            .copied()
            .filter(|mep| self.votes.has_voted(&mep.id, date))
            .collect();
        if voters.is_empty() {
            members
        } else {
            voters
        }
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// The unique group claiming `party` on `date`
///
/// - no group → Ok(None): data gap, the day is unattributable for the party
/// - two or more groups → AmbiguousMembership, never silently picked
pub fn find_group_of_party<'g, I, S>(
    date: NaiveDate,
    groups: I,
    party: &NationalParty,
    seating: &S,
) -> Result<Option<&'g EuPoliticalGroup>>
where
    I: IntoIterator<Item = &'g EuPoliticalGroup>,
    S: SeatingRecord + ?Sized,
{
    let mut claims: Vec<&EuPoliticalGroup> = groups
        .into_iter()
        .filter(|group| group.is_party_a_member(party, date, seating))
        .collect();

    match claims.len() {
        0 => Ok(None),
        1 => Ok(claims.pop()),
        _ => Err(Error::AmbiguousMembership {
            party: party.to_string(),
            date,
            groups: claims.iter().map(|g| g.name.clone()).collect(),
        }),
    }
}

/// Vote-data id codes of the group claiming `party` on `date`
pub fn find_group_ids_of_party<'g, I, S>(
    date: NaiveDate,
    groups: I,
    party: &NationalParty,
    seating: &S,
) -> Result<Option<Vec<String>>>
where
    I: IntoIterator<Item = &'g EuPoliticalGroup>,
    S: SeatingRecord + ?Sized,
{
    Ok(find_group_of_party(date, groups, party, seating)?.map(|group| group.ids.clone()))
}

// ============================================================================
// TESTS
// ============================================================================
