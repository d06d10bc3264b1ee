// ⚙️ Analysis Configuration - Rules as Data
// Date range, document cache, political groups and historical cutovers.
//
// Party switches that the roster cannot express (e.g. a whole party leaving
// its group on a given day) are recorded here as bloc memberships, so the
// comparison never carries special-cased dates in its logic.

use crate::entities::{default_group_definitions, GroupDefinition, GroupRegistry, PartyKey};
use crate::error::{Error, Result};
use crate::temporal::Period;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DOCUMENT_URL_TEMPLATE: &str =
    "https://www.europarl.europa.eu/doceo/document/PV-9-{date}-RCV_FR.xml";

/// First sitting day of the ninth parliamentary term
pub fn first_date_of_ninth_term() -> NaiveDate {
    NaiveDate::from_ymd_opt(2019, 7, 2).unwrap_or_default()
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("xml")
}

fn default_fetch_delay_ms() -> u64 {
    1000
}

fn default_document_url_template() -> String {
    DEFAULT_DOCUMENT_URL_TEMPLATE.to_string()
}

// ============================================================================
// PARTY AFFILIATION (bloc membership record)
// ============================================================================

/// A whole national party sitting in one group for a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyAffiliation {
    pub party: String,
    #[serde(default)]
    pub country: Option<String>,

    /// Group name or alias
    pub group: String,
    pub start: NaiveDate,
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl PartyAffiliation {
    pub fn period(&self) -> Result<Period> {
        Period::new(self.start, self.end)
    }

    pub fn party_key(&self) -> PartyKey {
        PartyKey::new(self.party.clone(), self.country.as_deref())
    }
}

// ============================================================================
// ANALYSIS CONFIG
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "first_date_of_ninth_term")]
    pub start_date: NaiveDate,

    #[serde(default = "today")]
    pub end_date: NaiveDate,

    /// Directory holding `<yyyy-mm-dd>.xml` roll-call documents
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Never download, use the cache only
    #[serde(default)]
    pub offline: bool,

    /// Pause after every network fetch
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,

    #[serde(default = "default_document_url_template")]
    pub document_url_template: String,

    #[serde(default = "default_group_definitions")]
    pub political_groups: Vec<GroupDefinition>,

    #[serde(default)]
    pub party_affiliations: Vec<PartyAffiliation>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            start_date: first_date_of_ninth_term(),
            end_date: today(),
            cache_dir: default_cache_dir(),
            offline: false,
            fetch_delay_ms: default_fetch_delay_ms(),
            document_url_template: default_document_url_template(),
            political_groups: default_group_definitions(),
            party_affiliations: Vec::new(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.period()?;
        for affiliation in &self.party_affiliations {
            affiliation.period()?;
        }
        Ok(())
    }

    /// The analysed date range
    pub fn period(&self) -> Result<Period> {
        Period::closed(self.start_date, self.end_date)
    }

    /// Groups from the definitions, with bloc affiliations enrolled
    pub fn group_registry(&self) -> Result<GroupRegistry> {
        let mut groups = GroupRegistry::from_definitions(&self.political_groups);
        for affiliation in &self.party_affiliations {
            let group = groups
                .find_by_name_mut(&affiliation.group)
                .ok_or_else(|| Error::UnknownGroup(affiliation.group.clone()))?;
            group.enroll_party(affiliation.party_key(), affiliation.period()?);
        }
        Ok(groups)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{NationalParty, NON_ATTACHED};
    use crate::resolution::RosterSeating;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_defaults_from_empty_json() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap();

        assert_eq!(config.start_date, d(2019, 7, 2));
        assert_eq!(config.cache_dir, PathBuf::from("xml"));
        assert_eq!(config.fetch_delay_ms, 1000);
        assert!(!config.offline);
        assert_eq!(config.political_groups.len(), 8);
        assert!(config.party_affiliations.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{
                "start_date": "2021-03-10",
                "end_date": "2021-12-31",
                "offline": true,
                "party_affiliations": [
                    {"party": "Fidesz", "country": "Hungary", "group": "Non-attached Members", "start": "2021-03-09"}
                ]
            }"#,
        )
        .unwrap();

        let config = AnalysisConfig::load(&path).unwrap();
        assert!(config.offline);
        assert_eq!(config.end_date, d(2021, 12, 31));
        assert_eq!(config.party_affiliations[0].end, None);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let config = AnalysisConfig {
            start_date: d(2022, 1, 1),
            end_date: d(2021, 1, 1),
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidRange { .. })));
    }

    #[test]
    fn test_group_registry_enrolls_affiliations() {
        let config = AnalysisConfig {
            party_affiliations: vec![PartyAffiliation {
                party: "Fidesz".to_string(),
                country: Some("Hungary".to_string()),
                group: NON_ATTACHED.to_string(),
                start: d(2021, 3, 9),
                end: None,
            }],
            ..AnalysisConfig::default()
        };

        let groups = config.group_registry().unwrap();
        let ni = groups.find_by_name(NON_ATTACHED).unwrap();
        let fidesz = NationalParty::new("Fidesz", Some("Hungary"));

        assert!(ni.is_party_a_member(&fidesz, d(2021, 3, 9), &RosterSeating));
        assert!(!ni.is_party_a_member(&fidesz, d(2021, 3, 8), &RosterSeating));
    }

    #[test]
    fn test_affiliation_with_unknown_group() {
        let config = AnalysisConfig {
            party_affiliations: vec![PartyAffiliation {
                party: "Fidesz".to_string(),
                country: None,
                group: "Nonexistent Group".to_string(),
                start: d(2021, 3, 9),
                end: None,
            }],
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.group_registry(), Err(Error::UnknownGroup(_))));
    }
}
