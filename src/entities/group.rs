// 🇪🇺 EU Political Group Entity + Registry
//
// Identity: the group's full name (aliases cover renames)
// Vote-data identity: short id codes ("PPE", "EPP", ...), several per group
// because the roll-call documents changed codes over the years.
//
// Two kinds of roster data hang off a group:
// - meps:    individual MEP seatings from the roster history
// - parties: whole-party bloc memberships (Non-attached, known cutovers)

use crate::entities::mep::Mep;
use crate::entities::party::{NationalParty, PartyKey};
use crate::resolution::SeatingRecord;
use crate::temporal::{MembershipSet, Period};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const NON_ATTACHED: &str = "Non-attached Members";

// ============================================================================
// GROUP DEFINITION (configuration data)
// ============================================================================

/// Static description of a group: name, vote-data ids, former names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub name: String,
    pub ids: Vec<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl GroupDefinition {
    fn new(name: &str, ids: &[&str], aliases: &[&str]) -> Self {
        GroupDefinition {
            name: name.to_string(),
            ids: ids.iter().map(|id| id.to_string()).collect(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Groups of the ninth parliamentary term with every id code seen in votes
pub fn default_group_definitions() -> Vec<GroupDefinition> {
    vec![
        GroupDefinition::new(
            "Group of the European People's Party (Christian Democrats)",
            &["PPE", "EPP"],
            &[],
        ),
        GroupDefinition::new(
            "Group of the Progressive Alliance of Socialists and Democrats in the European Parliament",
            &["S&D", "S&amp;D"],
            &[],
        ),
        GroupDefinition::new("Renew Europe Group", &["Renew"], &[]),
        GroupDefinition::new("European Conservatives and Reformists Group", &["ECR"], &[]),
        GroupDefinition::new(
            "Group of the Greens/European Free Alliance",
            &["Verts/ALE", "Greens/EFA"],
            &[],
        ),
        GroupDefinition::new(
            "The Left group in the European Parliament - GUE/NGL",
            &["The Left", "GUE/NGL"],
            &["Group of the European United Left - Nordic Green Left"],
        ),
        GroupDefinition::new("Identity and Democracy Group", &["ID"], &[]),
        GroupDefinition::new(NON_ATTACHED, &["NI"], &[]),
    ]
}

// ============================================================================
// EU POLITICAL GROUP
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EuPoliticalGroup {
    pub name: String,

    /// Codes used for this group in roll-call documents
    pub ids: Vec<String>,

    /// Former or alternative full names
    pub aliases: Vec<String>,

    /// Individual MEP seatings from the roster
    pub meps: MembershipSet<Mep>,

    /// Whole-party bloc memberships
    pub parties: MembershipSet<PartyKey>,
}

impl EuPoliticalGroup {
    pub fn new(name: impl Into<String>, ids: Vec<String>) -> Self {
        EuPoliticalGroup {
            name: name.into(),
            ids,
            aliases: Vec::new(),
            meps: MembershipSet::new(),
            parties: MembershipSet::new(),
        }
    }

    pub fn from_definition(definition: &GroupDefinition) -> Self {
        let mut group = EuPoliticalGroup::new(definition.name.clone(), definition.ids.clone());
        for alias in &definition.aliases {
            group.add_alias(alias.clone());
        }
        group
    }

    pub fn add_alias(&mut self, alias: String) {
        if !self.aliases.contains(&alias) && alias != self.name {
            self.aliases.push(alias);
        }
    }

    /// Check if `name` is the group's name or one of its aliases
    pub fn has_name(&self, name: &str) -> bool {
        self.name == name || self.aliases.iter().any(|alias| alias == name)
    }

    /// Check if a roll-call group code belongs to this group
    pub fn has_id(&self, id: &str) -> bool {
        self.ids.iter().any(|own| own == id)
    }

    pub fn is_mep_a_member(&self, mep: &Mep, date: NaiveDate) -> bool {
        self.meps.is_member_at(mep, date)
    }

    /// Check if a party belonged to this group on `date`
    ///
    /// True when the party is enrolled as a bloc, or when any MEP deciding for
    /// the party that day is seated in this group according to `seating`.
    pub fn is_party_a_member<S>(&self, party: &NationalParty, date: NaiveDate, seating: &S) -> bool
    where
        S: SeatingRecord + ?Sized,
    {
        if self.parties.is_member_at(&party.key(), date) {
            return true;
        }
        seating
            .deciding_members(party.members_at(date), date)
            .into_iter()
            .any(|mep| seating.is_seated_in(mep, self, date))
    }

    pub fn enroll_mep(&mut self, mep: Mep, period: Period) {
        self.meps.enroll(mep, period);
    }

    pub fn enroll_party(&mut self, party: PartyKey, period: Period) {
        self.parties.enroll(party, period);
    }
}

impl PartialEq for EuPoliticalGroup {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for EuPoliticalGroup {}

// ============================================================================
// GROUP REGISTRY
// ============================================================================

/// Registry of the political groups under analysis
#[derive(Debug, Clone)]
pub struct GroupRegistry {
    groups: Vec<EuPoliticalGroup>,
}

impl GroupRegistry {
    /// Create registry with the default ninth-term groups
    pub fn new() -> Self {
        Self::from_definitions(&default_group_definitions())
    }

    pub fn from_definitions(definitions: &[GroupDefinition]) -> Self {
        GroupRegistry {
            groups: definitions.iter().map(EuPoliticalGroup::from_definition).collect(),
        }
    }

    pub fn empty() -> Self {
        GroupRegistry { groups: Vec::new() }
    }

    /// Register a group, replacing any group of the same name
    pub fn register(&mut self, group: EuPoliticalGroup) {
        self.groups.retain(|g| g.name != group.name);
        self.groups.push(group);
    }

    /// Find group by name or alias
    pub fn find_by_name(&self, name: &str) -> Option<&EuPoliticalGroup> {
        self.groups.iter().find(|g| g.has_name(name))
    }

    pub fn find_by_name_mut(&mut self, name: &str) -> Option<&mut EuPoliticalGroup> {
        self.groups.iter_mut().find(|g| g.has_name(name))
    }

    /// Find group owning a roll-call id code
    pub fn find_by_id(&self, id: &str) -> Option<&EuPoliticalGroup> {
        self.groups.iter().find(|g| g.has_id(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &EuPoliticalGroup> {
        self.groups.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.groups.iter().map(|g| g.name.clone()).collect()
    }

    pub fn count(&self) -> usize {
        self.groups.len()
    }
}

impl Default for GroupRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a GroupRegistry {
    type Item = &'a EuPoliticalGroup;
    type IntoIter = std::slice::Iter<'a, EuPoliticalGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::RosterSeating;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_registry_initialization() {
        let registry = GroupRegistry::new();
        assert_eq!(registry.count(), 8);
        assert!(registry.find_by_name(NON_ATTACHED).is_some());
    }

    #[test]
    fn test_find_by_alias_and_id() {
        let registry = GroupRegistry::new();

        let left = registry
            .find_by_name("Group of the European United Left - Nordic Green Left")
            .expect("Former Left name should resolve");
        assert_eq!(left.name, "The Left group in the European Parliament - GUE/NGL");

        let epp = registry.find_by_id("EPP").unwrap();
        assert!(epp.has_id("PPE"));
        assert!(registry.find_by_id("XYZ").is_none());
    }

    #[test]
    fn test_double_escaped_id_still_matches() {
        let registry = GroupRegistry::new();

        let sd = registry.find_by_id("S&amp;D").unwrap();
        assert!(sd.has_id("S&D"));
        assert!(sd.name.starts_with("Group of the Progressive Alliance"));
    }

    #[test]
    fn test_add_alias_skips_duplicates_and_own_name() {
        let mut group = EuPoliticalGroup::new("Renew Europe Group", vec!["Renew".to_string()]);
        group.add_alias("Renew".to_string());
        group.add_alias("Renew".to_string());
        group.add_alias("Renew Europe Group".to_string());

        assert_eq!(group.aliases, vec!["Renew".to_string()]);
        assert!(group.has_name("Renew"));
    }

    #[test]
    fn test_party_member_through_mep_seating() {
        let mep = Mep::new("1", "Test MEP", "HU");
        let mut group = EuPoliticalGroup::new("test_group", vec!["TEST_ID".to_string()]);
        group.enroll_mep(mep.clone(), Period::open(d(2019, 7, 2)));

        let mut party = NationalParty::new("test", Some("HU"));
        party.add_member(mep, Period::open(d(2019, 7, 2)));

        assert!(group.is_party_a_member(&party, d(2020, 1, 1), &RosterSeating));
        assert!(!group.is_party_a_member(&party, d(2019, 7, 1), &RosterSeating));
    }

    #[test]
    fn test_party_member_through_bloc_enrollment() {
        let mut group = EuPoliticalGroup::new(NON_ATTACHED, vec!["NI".to_string()]);
        let party = NationalParty::new("Fidesz", Some("Hungary"));
        group.enroll_party(party.key(), Period::open(d(2021, 3, 9)));

        assert!(group.is_party_a_member(&party, d(2021, 3, 9), &RosterSeating));
        assert!(!group.is_party_a_member(&party, d(2021, 3, 8), &RosterSeating));
    }
}
