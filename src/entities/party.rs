// 🏛️ National Party Entity + Registry
//
// Identity: (name, country). Independents carry no country.
// Values:   the MEPs who sat for the party, each with a Period.

use crate::entities::mep::Mep;
use crate::error::{Error, Result};
use crate::temporal::{MembershipSet, Period};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};

// ============================================================================
// PARTY KEY
// ============================================================================

/// PartyKey - The identity part of a NationalParty
///
/// Used wherever a party is referenced without its member roster,
/// e.g. inside an EU group's bloc memberships.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartyKey {
    pub name: String,
    pub country: Option<String>,
}

impl PartyKey {
    pub fn new(name: impl Into<String>, country: Option<&str>) -> Self {
        PartyKey {
            name: name.into(),
            country: country.map(str::to_string),
        }
    }
}

impl fmt::Display for PartyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.country {
            Some(country) => write!(f, "{} ({})", self.name, country),
            None => write!(f, "{}", self.name),
        }
    }
}

// ============================================================================
// NATIONAL PARTY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NationalParty {
    pub name: String,
    pub country: Option<String>,

    /// MEPs who sat for this party over time
    pub members: MembershipSet<Mep>,
}

impl NationalParty {
    pub fn new(name: impl Into<String>, country: Option<&str>) -> Self {
        NationalParty {
            name: name.into(),
            country: country.map(str::to_string),
            members: MembershipSet::new(),
        }
    }

    pub fn key(&self) -> PartyKey {
        PartyKey {
            name: self.name.clone(),
            country: self.country.clone(),
        }
    }

    pub fn is(&self, name: &str, country: Option<&str>) -> bool {
        self.name == name && self.country.as_deref() == country
    }

    pub fn add_member(&mut self, mep: Mep, period: Period) {
        self.members.enroll(mep, period);
    }

    pub fn members_at(&self, date: NaiveDate) -> HashSet<&Mep> {
        self.members.members_at(date)
    }

    /// Persistent ids of everyone sitting for the party on `date`
    pub fn member_ids_at(&self, date: NaiveDate) -> HashSet<&str> {
        self.members
            .active_at(date)
            .map(|m| m.member.id.as_str())
            .collect()
    }
}

impl PartialEq for NationalParty {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.country == other.country
    }
}

impl Eq for NationalParty {}

impl Hash for NationalParty {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.country.hash(state);
    }
}

impl fmt::Display for NationalParty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key().fmt(f)
    }
}

// ============================================================================
// PARTY REGISTRY
// ============================================================================

/// Registry of every national party seen in the roster
#[derive(Debug, Clone, Default)]
pub struct PartyRegistry {
    parties: Vec<NationalParty>,
}

impl PartyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the party with this identity, registering it on first sight
    pub fn get_or_insert(&mut self, name: &str, country: Option<&str>) -> &mut NationalParty {
        let index = match self.parties.iter().position(|p| p.is(name, country)) {
            Some(index) => index,
            None => {
                self.parties.push(NationalParty::new(name, country));
                self.parties.len() - 1
            }
        };
        &mut self.parties[index]
    }

    /// Find the party with this identity
    pub fn find(&self, name: &str, country: Option<&str>) -> Result<&NationalParty> {
        self.parties
            .iter()
            .find(|p| p.is(name, country))
            .ok_or_else(|| Error::UnknownParty {
                name: name.to_string(),
                country: country.map(str::to_string),
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &NationalParty> {
        self.parties.iter()
    }

    pub fn count(&self) -> usize {
        self.parties.len()
    }
}

// ============================================================================
// TESTS
// ============================================================================
