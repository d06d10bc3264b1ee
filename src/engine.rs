// 📊 Cohesion Comparison Engine
// "How often did the party vote with each EU group, and how united was it?"
//
// One pass over the date range, one day at a time:
// 1. fetch the day's document (none → day skipped)
// 2. record identifier pairings seen that day
// 3. resolve the party's group from that day's seating (none → unattributable)
// 4. per roll-call: party tally vs each group's tally, majority against majority
//
// State carried across days: the counters, the pairing table and the
// non-coherent roll-calls. Nothing else survives a day.

use crate::entities::{GroupRegistry, NationalParty};
use crate::error::Result;
use crate::pairings::IdPairings;
use crate::parser::{parse_document, RollCall};
use crate::resolution::{find_group_ids_of_party, VoteSeating, VoteTaggedSeating};
use crate::source::{days, DocumentSource};
use crate::tally::VoteTally;
use crate::temporal::Period;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, info, warn};

// ============================================================================
// REPORT TYPES
// ============================================================================

/// Majority-vs-majority counters for one group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agreement {
    pub same: u32,
    pub different: u32,
}

impl Agreement {
    pub fn total(&self) -> u32 {
        self.same + self.different
    }

    /// same / (same + different) * 100, None without any comparable roll-call
    pub fn percentage(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.same as f64 / total as f64 * 100.0),
        }
    }
}

/// A roll-call where the party did not vote as one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NonCoherentVoting {
    pub date: NaiveDate,
    pub identifier: String,
    pub cohesion: f64,
}

/// Recoverable gaps met during the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub days_examined: u32,
    pub days_without_document: u32,
    pub days_unattributable: u32,
    pub roll_calls: u32,
    pub unresolved_voters: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub party: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// group name → counters
    pub per_group: BTreeMap<String, Agreement>,

    /// group name → agreement percentage
    pub per_group_percentages: BTreeMap<String, Option<f64>>,

    /// Mean of the party's per-roll-call cohesion
    pub overall_average_cohesion: Option<f64>,

    pub non_coherent_votings: Vec<NonCoherentVoting>,

    pub diagnostics: Diagnostics,
}

/// The part of a report that must be identical across reruns
#[derive(Serialize)]
struct Statistics<'a> {
    party: &'a str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    per_group: &'a BTreeMap<String, Agreement>,
    per_group_percentages: &'a BTreeMap<String, Option<f64>>,
    overall_average_cohesion: Option<f64>,
    non_coherent_votings: &'a [NonCoherentVoting],
    diagnostics: &'a Diagnostics,
}

impl ComparisonReport {
    /// SHA-256 of the canonical JSON of the statistics
    pub fn fingerprint(&self) -> Result<String> {
        let statistics = Statistics {
            party: &self.party,
            start_date: self.start_date,
            end_date: self.end_date,
            per_group: &self.per_group,
            per_group_percentages: &self.per_group_percentages,
            overall_average_cohesion: self.overall_average_cohesion,
            non_coherent_votings: &self.non_coherent_votings,
            diagnostics: &self.diagnostics,
        };
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(&statistics)?);
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub fn summary(&self) -> String {
        let mut lines = vec![format!(
            "{} | {} → {}",
            self.party, self.start_date, self.end_date
        )];

        for (group, agreement) in &self.per_group {
            let percentage = self
                .per_group_percentages
                .get(group)
                .copied()
                .flatten()
                .map(|p| format!("{:.1}%", p))
                .unwrap_or_else(|| "n/a".to_string());
            lines.push(format!(
                "  {}: {} same, {} different ({})",
                group, agreement.same, agreement.different, percentage
            ));
        }

        lines.push(match self.overall_average_cohesion {
            Some(cohesion) => format!("Average cohesion: {:.1}%", cohesion),
            None => "Average cohesion: n/a".to_string(),
        });
        lines.push(format!(
            "{} non-coherent roll-calls out of {} | {} days examined, {} without document, {} unattributable, {} unresolved voters",
            self.non_coherent_votings.len(),
            self.diagnostics.roll_calls,
            self.diagnostics.days_examined,
            self.diagnostics.days_without_document,
            self.diagnostics.days_unattributable,
            self.diagnostics.unresolved_voters
        ));
        lines.join("\n")
    }
}

// ============================================================================
// COMPARISON
// ============================================================================

/// Running counters of one comparison pass
struct Accumulator {
    per_group: BTreeMap<String, Agreement>,
    cohesions: Vec<f64>,
    non_coherent_votings: Vec<NonCoherentVoting>,
    diagnostics: Diagnostics,
}

impl Accumulator {
    fn new(groups: &GroupRegistry) -> Self {
        Accumulator {
            per_group: groups
                .iter()
                .map(|group| (group.name.clone(), Agreement::default()))
                .collect(),
            cohesions: Vec::new(),
            non_coherent_votings: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    fn into_report(self, party: &NationalParty, start: NaiveDate, end: NaiveDate) -> ComparisonReport {
        let per_group_percentages = self
            .per_group
            .iter()
            .map(|(group, agreement)| (group.clone(), agreement.percentage()))
            .collect();

        let overall_average_cohesion = if self.cohesions.is_empty() {
            None
        } else {
            Some(self.cohesions.iter().sum::<f64>() / self.cohesions.len() as f64)
        };

        ComparisonReport {
            party: party.to_string(),
            start_date: start,
            end_date: end,
            per_group: self.per_group,
            per_group_percentages,
            overall_average_cohesion,
            non_coherent_votings: self.non_coherent_votings,
            diagnostics: self.diagnostics,
        }
    }
}

/// Compare a party's votes against every group over `[start, end]`
///
/// `pairings` is extended with every identifier pairing observed on the way.
/// Aborts only on structural errors: an inverted range, an unreadable
/// document, or two groups claiming the party on the same day.
pub fn compare_voting_cohesion<S>(
    party: &NationalParty,
    groups: &GroupRegistry,
    pairings: &mut IdPairings,
    source: &mut S,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<ComparisonReport>
where
    S: DocumentSource + ?Sized,
{
    Period::closed(start, end)?;
    info!("comparing {} with {} groups from {} to {}", party, groups.count(), start, end);

    let mut acc = Accumulator::new(groups);

    for date in days(start, end) {
        acc.diagnostics.days_examined += 1;

        let Some(xml) = source.fetch(date)? else {
            acc.diagnostics.days_without_document += 1;
            continue;
        };
        let document = parse_document(date, &xml)?;
        pairings.observe_document(&document);

        let votes = VoteSeating::from_document(&document, pairings);
        let seating = VoteTaggedSeating::new(&votes);
        let Some(party_group_ids) = find_group_ids_of_party(date, groups, party, &seating)? else {
            warn!("no group claims {} on {}, skipping the day", party, date);
            acc.diagnostics.days_unattributable += 1;
            continue;
        };

        let member_ids = party.member_ids_at(date);
        for roll_call in &document.roll_calls {
            acc.diagnostics.roll_calls += 1;
            compare_roll_call(
                date,
                roll_call,
                &party_group_ids,
                &member_ids,
                groups,
                pairings,
                &mut acc,
            );
        }
    }

    let report = acc.into_report(party, start, end);
    info!("{}", report.summary());
    Ok(report)
}

fn compare_roll_call(
    date: NaiveDate,
    roll_call: &RollCall,
    party_group_ids: &[String],
    member_ids: &HashSet<&str>,
    groups: &GroupRegistry,
    pairings: &IdPairings,
    acc: &mut Accumulator,
) {
    debug!("processing {}", roll_call.identifier);

    let party_tally = party_tally(roll_call, party_group_ids, member_ids, pairings, &mut acc.diagnostics);
    let (Some(party_majority), Some(cohesion)) = (party_tally.select_majority(), party_tally.cohesion())
    else {
        return;
    };
    debug!("party: {}", party_tally);

    acc.cohesions.push(cohesion);
    if cohesion < 100.0 {
        acc.non_coherent_votings.push(NonCoherentVoting {
            date,
            identifier: roll_call.identifier.clone(),
            cohesion,
        });
    }

    for group in groups {
        let group_tally = roll_call.group_tally(&group.ids);
        let Some(group_majority) = group_tally.select_majority() else {
            continue;
        };
        let agreement = acc.per_group.entry(group.name.clone()).or_default();
        if group_majority == party_majority {
            debug!("both voted {}", party_majority);
            agreement.same += 1;
        } else {
            debug!("party voted {} while {} with {}", party_majority, group.name, group_majority);
            agreement.different += 1;
        }
    }
}

/// Votes of the party's current members within the party's group blocks
fn party_tally(
    roll_call: &RollCall,
    party_group_ids: &[String],
    member_ids: &HashSet<&str>,
    pairings: &IdPairings,
    diagnostics: &mut Diagnostics,
) -> VoteTally {
    let mut tally = VoteTally::new();
    for (choice, group_id, voter) in roll_call.voters() {
        if !party_group_ids.iter().any(|id| id == group_id) {
            continue;
        }
        match pairings.resolve(voter) {
            Some(id) if member_ids.contains(id) => tally.record(choice),
            Some(_) => {}
            None => {
                warn!(
                    "cannot resolve voter {} ({:?}) in {}, skipping",
                    voter.name, voter.alternate_id, roll_call.identifier
                );
                diagnostics.unresolved_voters += 1;
            }
        }
    }
    tally
}

// ============================================================================
// TESTS
// ============================================================================
