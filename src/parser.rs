// 🏗️ Roll-Call Document Parser
// One XML document per sitting day, one `RollCallVote.Result` per roll-call.
//
// Document shape:
//   RollCallVote.Result
//   ├── RollCallVote.Description.Text   (plain text, or <a>label</a> + tail)
//   ├── Result.For
//   │   └── Result.PoliticalGroup.List Identifier="PPE"
//   │       └── PoliticalGroup.Member.Name MepId="..." PersId="..."
//   ├── Result.Against
//   └── Result.Abstention

use crate::error::{Error, Result};
use crate::tally::{VoteChoice, VoteTally};
use chrono::NaiveDate;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const ROLL_CALL_TAG: &str = "RollCallVote.Result";
const DESCRIPTION_TAG: &str = "RollCallVote.Description.Text";
const GROUP_TAG: &str = "Result.PoliticalGroup.List";
const MEMBER_TAG: &str = "PoliticalGroup.Member.Name";

// ============================================================================
// CORE TYPES
// ============================================================================

/// One individual vote as printed in the document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoterRecord {
    /// `PersId` - same scheme as the roster id, missing in older documents
    pub persistent_id: Option<String>,

    /// `MepId` - document-specific alternate id
    pub alternate_id: Option<String>,

    pub name: String,
}

/// Voters of one political group id who cast the same choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBlock {
    pub group_id: String,
    pub voters: Vec<VoterRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollCall {
    /// Human-readable label, kept for traceability only
    pub identifier: String,

    pub results: BTreeMap<VoteChoice, Vec<GroupBlock>>,
}

impl RollCall {
    pub fn blocks(&self, choice: VoteChoice) -> &[GroupBlock] {
        self.results.get(&choice).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Every voter with the choice and group id they voted under
    pub fn voters(&self) -> impl Iterator<Item = (VoteChoice, &str, &VoterRecord)> {
        self.results.iter().flat_map(|(choice, blocks)| {
            blocks.iter().flat_map(move |block| {
                block
                    .voters
                    .iter()
                    .map(move |voter| (*choice, block.group_id.as_str(), voter))
            })
        })
    }

    /// Tally of everyone who voted under any of `group_ids`
    pub fn group_tally(&self, group_ids: &[String]) -> VoteTally {
        let mut tally = VoteTally::new();
        for choice in VoteChoice::ALL {
            for block in self.blocks(choice) {
                if group_ids.iter().any(|id| id == &block.group_id) {
                    tally.add(choice, block.voters.len() as u32);
                }
            }
        }
        tally
    }

    /// Tally per group id as printed in the document
    pub fn tallies_by_group_id(&self) -> BTreeMap<String, VoteTally> {
        let mut tallies: BTreeMap<String, VoteTally> = BTreeMap::new();
        for (choice, blocks) in &self.results {
            for block in blocks {
                tallies
                    .entry(block.group_id.clone())
                    .or_default()
                    .add(*choice, block.voters.len() as u32);
            }
        }
        tallies
    }
}

/// All roll-calls of one sitting day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollCallDocument {
    pub date: NaiveDate,
    pub roll_calls: Vec<RollCall>,
}

impl RollCallDocument {
    pub fn voters(&self) -> impl Iterator<Item = (VoteChoice, &str, &VoterRecord)> {
        self.roll_calls.iter().flat_map(|roll_call| roll_call.voters())
    }
}

// ============================================================================
// PARSING
// ============================================================================

/// Parse one day's roll-call document
pub fn parse_document(date: NaiveDate, xml: &str) -> Result<RollCallDocument> {
    let document = Document::parse(xml).map_err(|e| Error::MalformedDocument {
        date,
        reason: e.to_string(),
    })?;

    let roll_calls = document
        .root_element()
        .children()
        .filter(|node| node.has_tag_name(ROLL_CALL_TAG))
        .map(parse_roll_call)
        .collect();

    Ok(RollCallDocument { date, roll_calls })
}

fn parse_roll_call(node: Node) -> RollCall {
    let identifier = extract_identifier(node);

    let mut results = BTreeMap::new();
    for choice in VoteChoice::ALL {
        if let Some(result) = child_element(node, choice.result_tag()) {
            let blocks = result
                .children()
                .filter(|n| n.has_tag_name(GROUP_TAG))
                .map(parse_group_block)
                .collect();
            results.insert(choice, blocks);
        }
    }

    RollCall { identifier, results }
}

fn parse_group_block(node: Node) -> GroupBlock {
    GroupBlock {
        group_id: node.attribute("Identifier").unwrap_or_default().to_string(),
        voters: node
            .children()
            .filter(|n| n.has_tag_name(MEMBER_TAG))
            .map(|n| VoterRecord {
                persistent_id: non_empty(n.attribute("PersId")),
                alternate_id: non_empty(n.attribute("MepId")),
                name: n.text().unwrap_or_default().trim().to_string(),
            })
            .collect(),
    }
}

/// Human-readable roll-call label
///
/// Plain description text when present. Otherwise the description starts
/// with a link, so the label is the link text followed by the text after it.
/// Falls back to the result's `Identifier` attribute.
fn extract_identifier(node: Node) -> String {
    if let Some(description) = child_element(node, DESCRIPTION_TAG) {
        if let Some(text) = non_empty(description.text()) {
            return text;
        }
        if let Some(link) = child_element(description, "a") {
            let label = link.text().unwrap_or_default().trim();
            let tail = link.tail().unwrap_or_default().trim();
            return format!("{} {}", label, tail).trim().to_string();
        }
    }
    node.attribute("Identifier")
        .map(|id| format!("roll-call {}", id))
        .unwrap_or_else(|| "unnamed roll-call".to_string())
}

fn child_element<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(tag))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, 3, 10).unwrap()
    }

    const SAMPLE: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<PV.RollCallVoteResults EP.Reference="P9_PV(2021)03-10" Sitting.Date="2021-03-10">
  <RollCallVote.Result Identifier="128513" Date="2021-03-10 12:31:08">
    <RollCallVote.Description.Text>A9-0017/2021 - Report on media freedom - Am 3</RollCallVote.Description.Text>
    <Result.For Number="3">
      <Result.PoliticalGroup.List Identifier="PPE">
        <PoliticalGroup.Member.Name MepId="6401" PersId="197490">ADAMOWICZ</PoliticalGroup.Member.Name>
        <PoliticalGroup.Member.Name MepId="5565" PersId="124831">McALLISTER</PoliticalGroup.Member.Name>
      </Result.PoliticalGroup.List>
      <Result.PoliticalGroup.List Identifier="NI">
        <PoliticalGroup.Member.Name MepId="7001" PersId="124720">DEUTSCH</PoliticalGroup.Member.Name>
      </Result.PoliticalGroup.List>
    </Result.For>
    <Result.Against Number="1">
      <Result.PoliticalGroup.List Identifier="NI">
        <PoliticalGroup.Member.Name MepId="7002">GYÜRK</PoliticalGroup.Member.Name>
      </Result.PoliticalGroup.List>
    </Result.Against>
  </RollCallVote.Result>
  <RollCallVote.Result Identifier="128514">
    <RollCallVote.Description.Text><a href="#">B9-0164/2021</a> - Resolution - Vote: motion as a whole</RollCallVote.Description.Text>
    <Result.Abstention Number="1">
      <Result.PoliticalGroup.List Identifier="Renew">
        <PoliticalGroup.Member.Name MepId="6800" PersId="197600">DONÁTH</PoliticalGroup.Member.Name>
      </Result.PoliticalGroup.List>
    </Result.Abstention>
  </RollCallVote.Result>
  <RollCallVote.Corrections/>
</PV.RollCallVoteResults>"##;

    #[test]
    fn test_parse_document_roll_calls() {
        let doc = parse_document(date(), SAMPLE).unwrap();

        assert_eq!(doc.roll_calls.len(), 2, "Corrections element is not a roll-call");
        assert_eq!(
            doc.roll_calls[0].identifier,
            "A9-0017/2021 - Report on media freedom - Am 3"
        );
        assert_eq!(doc.voters().count(), 5);
    }

    #[test]
    fn test_identifier_from_link_and_tail() {
        let doc = parse_document(date(), SAMPLE).unwrap();
        assert_eq!(
            doc.roll_calls[1].identifier,
            "B9-0164/2021 - Resolution - Vote: motion as a whole"
        );
    }

    #[test]
    fn test_identifier_falls_back_to_attribute() {
        let xml = r#"<PV.RollCallVoteResults><RollCallVote.Result Identifier="42"/></PV.RollCallVoteResults>"#;
        let doc = parse_document(date(), xml).unwrap();
        assert_eq!(doc.roll_calls[0].identifier, "roll-call 42");
    }

    #[test]
    fn test_voter_identifiers() {
        let doc = parse_document(date(), SAMPLE).unwrap();
        let against = doc.roll_calls[0].blocks(VoteChoice::Against);

        assert_eq!(against.len(), 1);
        assert_eq!(against[0].group_id, "NI");
        assert_eq!(against[0].voters[0].persistent_id, None);
        assert_eq!(against[0].voters[0].alternate_id.as_deref(), Some("7002"));
        assert_eq!(against[0].voters[0].name, "GYÜRK");
    }

    #[test]
    fn test_group_tally() {
        let doc = parse_document(date(), SAMPLE).unwrap();
        let roll_call = &doc.roll_calls[0];

        let ni = roll_call.group_tally(&["NI".to_string()]);
        assert_eq!(ni, VoteTally::from_counts(1, 1, 0));

        let epp = roll_call.group_tally(&["PPE".to_string(), "EPP".to_string()]);
        assert_eq!(epp, VoteTally::from_counts(2, 0, 0));

        let absent = roll_call.group_tally(&["ECR".to_string()]);
        assert!(absent.is_empty());
    }

    #[test]
    fn test_tallies_by_group_id() {
        let doc = parse_document(date(), SAMPLE).unwrap();
        let tallies = doc.roll_calls[0].tallies_by_group_id();

        assert_eq!(tallies.len(), 2);
        assert_eq!(tallies["PPE"].total(), 2);
        assert_eq!(tallies["NI"].select_majority(), Some(VoteChoice::For));
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let result = parse_document(date(), "<PV.RollCallVoteResults>");
        assert!(matches!(result, Err(Error::MalformedDocument { .. })));
    }
}
