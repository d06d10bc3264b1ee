// 🔗 Voter Identifier Pairings
// Roll-call documents identify voters two ways:
// - PersId: persistent, same scheme as the roster (not always present)
// - MepId:  alternate id (present on every record)
//
// Each time both appear together the pairing is recorded, so that records
// carrying only a MepId can still be matched to a roster MEP.
//
// The table is append-only and passed explicitly through the comparison.

use crate::error::Result;
use crate::parser::{parse_document, RollCallDocument, VoterRecord};
use crate::source::{days, DocumentSource};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdPairings {
    /// alternate id → persistent id
    pairs: BTreeMap<String, String>,
}

impl IdPairings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `alternate` and `persistent` denote the same MEP
    ///
    /// Returns true when the pairing is new.
    pub fn observe(&mut self, alternate: &str, persistent: &str) -> bool {
        match self.pairs.get(alternate) {
            Some(known) if known == persistent => false,
            Some(known) => {
                warn!(
                    "alternate id {} already paired with {}, keeping it over {}",
                    alternate, known, persistent
                );
                false
            }
            None => {
                debug!("pairing added: {} - {}", alternate, persistent);
                self.pairs.insert(alternate.to_string(), persistent.to_string());
                true
            }
        }
    }

    /// Record the pairing carried by one voter record, if any
    pub fn observe_voter(&mut self, voter: &VoterRecord) -> bool {
        match (&voter.alternate_id, &voter.persistent_id) {
            (Some(alternate), Some(persistent)) => self.observe(alternate, persistent),
            _ => false,
        }
    }

    /// Record every pairing present in a document; returns how many were new
    pub fn observe_document(&mut self, document: &RollCallDocument) -> usize {
        let mut added = 0;
        for (_, _, voter) in document.voters() {
            if self.observe_voter(voter) {
                added += 1;
            }
        }
        added
    }

    pub fn lookup(&self, alternate: &str) -> Option<&str> {
        self.pairs.get(alternate).map(String::as_str)
    }

    /// Persistent id of a voter: their own PersId, else the paired one
    pub fn resolve<'a>(&'a self, voter: &'a VoterRecord) -> Option<&'a str> {
        voter
            .persistent_id
            .as_deref()
            .or_else(|| voter.alternate_id.as_deref().and_then(|alt| self.lookup(alt)))
    }

    /// Merge another table in; entries already present win
    pub fn merge(&mut self, other: &IdPairings) {
        for (alternate, persistent) in &other.pairs {
            self.observe(alternate, persistent);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(a, p)| (a.as_str(), p.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl FromIterator<(String, String)> for IdPairings {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut pairings = IdPairings::new();
        for (alternate, persistent) in iter {
            pairings.observe(&alternate, &persistent);
        }
        pairings
    }
}

/// Build a pairing table from every document available in a date range
pub fn scan_documents<S>(source: &mut S, start: NaiveDate, end: NaiveDate) -> Result<IdPairings>
where
    S: DocumentSource + ?Sized,
{
    let mut pairings = IdPairings::new();
    let mut documents = 0;

    for date in days(start, end) {
        if let Some(xml) = source.fetch(date)? {
            let document = parse_document(date, &xml)?;
            pairings.observe_document(&document);
            documents += 1;
        }
    }

    info!(
        "scanned {} documents between {} and {}: {} pairings",
        documents,
        start,
        end,
        pairings.len()
    );
    Ok(pairings)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::InMemorySource;

    fn voter(persistent: Option<&str>, alternate: Option<&str>) -> VoterRecord {
        VoterRecord {
            persistent_id: persistent.map(str::to_string),
            alternate_id: alternate.map(str::to_string),
            name: "TEST".to_string(),
        }
    }

    #[test]
    fn test_resolve_prefers_persistent_id() {
        let pairings = IdPairings::new();
        let record = voter(Some("197490"), Some("6401"));
        assert_eq!(pairings.resolve(&record), Some("197490"));
    }

    #[test]
    fn test_resolve_through_pairing_table() {
        let mut pairings = IdPairings::new();
        assert!(pairings.observe_voter(&voter(Some("197490"), Some("6401"))));
        assert!(!pairings.observe_voter(&voter(Some("197490"), Some("6401"))));

        assert_eq!(pairings.resolve(&voter(None, Some("6401"))), Some("197490"));
        assert_eq!(pairings.resolve(&voter(None, Some("9999"))), None);
        assert_eq!(pairings.resolve(&voter(None, None)), None);
    }

    #[test]
    fn test_conflicting_pairing_keeps_first() {
        let mut pairings = IdPairings::new();
        pairings.observe("6401", "197490");
        pairings.observe("6401", "000000");

        assert_eq!(pairings.lookup("6401"), Some("197490"));
        assert_eq!(pairings.len(), 1);
    }

    #[test]
    fn test_merge_is_order_independent_for_disjoint_tables() {
        let a: IdPairings = vec![("1".to_string(), "100".to_string())].into_iter().collect();
        let b: IdPairings = vec![("2".to_string(), "200".to_string())].into_iter().collect();

        let mut ab = a.clone();
        ab.merge(&b);
        let mut ba = b.clone();
        ba.merge(&a);

        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 2);
    }

    #[test]
    fn test_scan_documents() {
        let day = NaiveDate::from_ymd_opt(2019, 7, 15).unwrap();
        let mut source = InMemorySource::new();
        source.insert(
            day,
            r#"<PV.RollCallVoteResults>
                 <RollCallVote.Result>
                   <Result.For>
                     <Result.PoliticalGroup.List Identifier="PPE">
                       <PoliticalGroup.Member.Name MepId="6401" PersId="197490">A</PoliticalGroup.Member.Name>
                       <PoliticalGroup.Member.Name MepId="6402">B</PoliticalGroup.Member.Name>
                     </Result.PoliticalGroup.List>
                   </Result.For>
                 </RollCallVote.Result>
               </PV.RollCallVoteResults>"#,
        );

        let pairings = scan_documents(&mut source, day.pred_opt().unwrap(), day).unwrap();
        assert_eq!(pairings.len(), 1);
        assert_eq!(pairings.lookup("6401"), Some("197490"));
    }
}
