// ⏰ Temporal Membership Model
// "Who belonged to what, and when?"
//
// Three layers:
// 1. Period:        a date interval, inclusive at both ends, optionally open-ended
// 2. Membership:    binds one member to one Period
// 3. MembershipSet: every Membership owned by one container (party or group)
//
// All periods have a known start. Only the end may be open ("ongoing").

use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

// ============================================================================
// PERIOD
// ============================================================================

/// Period - Closed or open-ended date interval
///
/// Both ends are inclusive: a member whose term ends on 2020-01-31 still
/// counts as a member on 2020-01-31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    start: NaiveDate,

    /// None = ongoing
    end: Option<NaiveDate>,
}

impl Period {
    /// Create a period, rejecting `end < start`
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Result<Self> {
        if let Some(end) = end {
            if end < start {
                return Err(Error::InvalidRange { start, end });
            }
        }
        Ok(Period { start, end })
    }

    /// Ongoing period starting at `start`
    pub fn open(start: NaiveDate) -> Self {
        Period { start, end: None }
    }

    /// Closed period `[start, end]`
    pub fn closed(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        Period::new(start, Some(end))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn is_ongoing(&self) -> bool {
        self.end.is_none()
    }

    /// Check if a date falls inside this period
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && self.end.map_or(true, |end| date <= end)
    }

    /// Check if another period lies entirely within this one
    ///
    /// An ongoing container covers any sub-period starting at or after its
    /// own start. A closed container never covers an ongoing sub-period.
    pub fn covers(&self, other: &Period) -> bool {
        if !self.contains(other.start) {
            return false;
        }
        match (self.end, other.end) {
            (None, _) => true,
            (Some(_), Some(other_end)) => self.contains(other_end),
            (Some(_), None) => false,
        }
    }
}

// ============================================================================
// MEMBERSHIP
// ============================================================================

/// Membership - One member attested for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Membership<T> {
    pub member: T,
    pub period: Period,
}

impl<T> Membership<T> {
    pub fn new(member: T, period: Period) -> Self {
        Membership { member, period }
    }

    pub fn is_active_at(&self, date: NaiveDate) -> bool {
        self.period.contains(date)
    }
}

// ============================================================================
// MEMBERSHIP SET
// ============================================================================

/// MembershipSet - Ordered memberships of one container entity
///
/// Append-only apart from `set_period_for`, which exists to patch an
/// "ongoing" record once its real end date is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipSet<T> {
    memberships: Vec<Membership<T>>,
}

impl<T> Default for MembershipSet<T> {
    fn default() -> Self {
        MembershipSet {
            memberships: Vec::new(),
        }
    }
}

impl<T> MembershipSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, membership: Membership<T>) {
        self.memberships.push(membership);
    }

    /// Shorthand for `add(Membership::new(member, period))`
    pub fn enroll(&mut self, member: T, period: Period) {
        self.add(Membership::new(member, period));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Membership<T>> {
        self.memberships.iter()
    }

    pub fn len(&self) -> usize {
        self.memberships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memberships.is_empty()
    }

    /// Memberships active on `date`, in insertion order
    pub fn active_at(&self, date: NaiveDate) -> impl Iterator<Item = &Membership<T>> {
        self.memberships.iter().filter(move |m| m.is_active_at(date))
    }
}

impl<T: Eq + Hash> MembershipSet<T> {
    /// Every distinct member whose period contains `date`
    pub fn members_at(&self, date: NaiveDate) -> HashSet<&T> {
        self.active_at(date).map(|m| &m.member).collect()
    }
}

impl<T: PartialEq + Debug> MembershipSet<T> {
    /// Check if `member` holds an active membership on `date`
    pub fn is_member_at(&self, member: &T, date: NaiveDate) -> bool {
        self.active_at(date).any(|m| &m.member == member)
    }

    /// All memberships recorded for `member`, active or not
    pub fn memberships_of<'a>(&'a self, member: &'a T) -> impl Iterator<Item = &'a Membership<T>> {
        self.memberships.iter().filter(move |m| &m.member == member)
    }

    /// Administrative correction of a membership's period
    ///
    /// Requires exactly one membership of `member`; anything else means the
    /// correction target is ambiguous.
    pub fn set_period_for(&mut self, member: &T, period: Period) -> Result<()> {
        let found = self.memberships_of(member).count();
        if found != 1 {
            return Err(Error::MembershipCorrection {
                member: format!("{:?}", member),
                found,
            });
        }
        if let Some(membership) = self.memberships.iter_mut().find(|m| &m.member == member) {
            membership.period = period;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
