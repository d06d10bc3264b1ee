// 📋 Roster Loading
// Builds the entity model from a roster export, one affiliation per row:
//
//   kind,mep_id,name,country,affiliation,affiliation_country,period
//   party,197490,Magdalena ADAMOWICZ,Poland,Bezpartyjna,Poland,02-07-2019 ...
//   group,197490,Magdalena ADAMOWICZ,Poland,EPP,,02-07-2019 / 31-01-2020
//
// Periods use the notation of the parliament's MEP history pages:
// "dd-mm-yyyy / dd-mm-yyyy" (closed) or "dd-mm-yyyy ..." (ongoing).

use crate::entities::{GroupRegistry, Mep, NationalParty, PartyRegistry, NON_ATTACHED};
use crate::error::{Error, Result};
use crate::temporal::Period;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::info;

const INDEPENDENT: &str = "Independent";
const ONGOING: &str = "ONGOING";
const DATE_FORMATS: [&str; 2] = ["%d-%m-%Y", "%d/%m/%Y"];

// ============================================================================
// ROW FORMAT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AffiliationKind {
    Party,
    Group,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterRecord {
    pub kind: AffiliationKind,
    pub mep_id: String,
    pub name: String,
    pub country: String,

    /// Party name, or group name / alias / history label
    pub affiliation: String,

    /// Party's country; defaults to the MEP's country
    pub affiliation_country: Option<String>,

    pub period: String,
}

// ============================================================================
// ROSTER
// ============================================================================

/// The entity model of one analysis run
#[derive(Debug, Clone)]
pub struct Roster {
    pub meps: BTreeMap<String, Mep>,
    pub parties: PartyRegistry,
    pub groups: GroupRegistry,
}

impl Roster {
    /// Empty roster over the given groups
    pub fn new(groups: GroupRegistry) -> Self {
        Roster {
            meps: BTreeMap::new(),
            parties: PartyRegistry::new(),
            groups,
        }
    }

    /// Load a roster CSV file, enrolling MEPs into `groups`
    pub fn load(path: &Path, groups: GroupRegistry) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let roster = Self::from_reader(file, groups)?;
        info!(
            "loaded roster {}: {} MEPs, {} national parties",
            path.display(),
            roster.meps.len(),
            roster.parties.count()
        );
        Ok(roster)
    }

    pub fn from_reader<R: Read>(reader: R, groups: GroupRegistry) -> Result<Self> {
        let mut roster = Roster::new(groups);
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        for record in csv_reader.deserialize() {
            let record: RosterRecord = record?;
            roster.add_record(&record)?;
        }
        Ok(roster)
    }

    /// Apply one roster row
    pub fn add_record(&mut self, record: &RosterRecord) -> Result<()> {
        let period = parse_period(&record.period)?;
        let mep = self
            .meps
            .entry(record.mep_id.clone())
            .or_insert_with(|| Mep::new(&record.mep_id, &record.name, &record.country))
            .clone();

        match record.kind {
            AffiliationKind::Party => {
                let (name, country) = match &record.affiliation_country {
                    Some(country) => (record.affiliation.clone(), Some(country.clone())),
                    None if record.affiliation.ends_with(')') => {
                        parse_party_label(&record.affiliation)?
                    }
                    None => (record.affiliation.clone(), Some(mep.country.clone())),
                };
                let country = if name == INDEPENDENT { None } else { country };
                self.parties
                    .get_or_insert(&name, country.as_deref())
                    .add_member(mep, period);
            }
            AffiliationKind::Group => {
                let group_name = if self.groups.find_by_name(&record.affiliation).is_some() {
                    record.affiliation.clone()
                } else {
                    parse_group_label(&record.affiliation)
                };
                self.groups
                    .find_by_name_mut(&group_name)
                    .ok_or_else(|| Error::UnknownGroup(group_name.clone()))?
                    .enroll_mep(mep, period);
            }
        }
        Ok(())
    }

    /// The unique national party with this name and country
    pub fn find_party(&self, name: &str, country: Option<&str>) -> Result<&NationalParty> {
        let country = if name == INDEPENDENT { None } else { country };
        self.parties.find(name, country)
    }
}

// ============================================================================
// HISTORY NOTATION
// ============================================================================

/// Parse "dd-mm-yyyy / dd-mm-yyyy" or "dd-mm-yyyy ..." into a Period
///
/// The end may also read `ONGOING`. Slash-separated dates are accepted too.
pub fn parse_period(text: &str) -> Result<Period> {
    let text = text.trim();
    let malformed = || Error::MalformedPeriod(text.to_string());

    if let Some((start, end)) = text.split_once(" / ") {
        let start = parse_date(start).ok_or_else(malformed)?;
        let end = match end.trim() {
            ONGOING => None,
            end => Some(parse_date(end).ok_or_else(malformed)?),
        };
        Period::new(start, end)
    } else if let Some(start) = text.strip_suffix("...") {
        let start = parse_date(start).ok_or_else(malformed)?;
        Ok(Period::open(start))
    } else {
        Err(malformed())
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Split "Name (Country)" at the last " ("
pub fn parse_party_label(label: &str) -> Result<(String, Option<String>)> {
    let label = label.trim();
    let (name, rest) = label
        .rsplit_once(" (")
        .ok_or_else(|| Error::MalformedRoster(label.to_string()))?;
    let country = rest
        .strip_suffix(')')
        .ok_or_else(|| Error::MalformedRoster(label.to_string()))?;

    if name == INDEPENDENT {
        Ok((name.to_string(), None))
    } else {
        Ok((name.to_string(), Some(country.to_string())))
    }
}

/// Group name from a history label such as "Renew Europe Group - Member"
///
/// The trailing " - role" is dropped. Any label mentioning the Non-attached
/// pseudo-group maps to it, whatever the role text says.
pub fn parse_group_label(label: &str) -> String {
    let label = label.trim();
    if label.contains(NON_ATTACHED) {
        return NON_ATTACHED.to_string();
    }
    match label.rsplit_once(" - ") {
        Some((name, _role)) => name.to_string(),
        None => label.to_string(),
    }
}

/// Split a history entry "period : label" into its two halves
pub fn split_history_entry(entry: &str) -> Result<(Period, &str)> {
    let (period, label) = entry
        .split_once(" : ")
        .ok_or_else(|| Error::MalformedRoster(entry.to_string()))?;
    Ok((parse_period(period)?, label.trim()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const ROSTER: &str = "\
kind,mep_id,name,country,affiliation,affiliation_country,period
party,197490,Magdalena ADAMOWICZ,Poland,Bezpartyjna,Poland,02-07-2019 ...
group,197490,Magdalena ADAMOWICZ,Poland,Group of the European People's Party (Christian Democrats) - Member,,02-07-2019 ...
party,124720,Tamás DEUTSCH,Hungary,Fidesz-Magyar Polgári Szövetség-Kereszténydemokrata Néppárt,,02-07-2019 ...
group,124720,Tamás DEUTSCH,Hungary,Group of the European People's Party (Christian Democrats),,02-07-2019 / 18-03-2021
group,124720,Tamás DEUTSCH,Hungary,Non-attached Members,,19-03-2021 ...
party,124831,David McALLISTER,Germany,Independent,,02-07-2019 / 31-01-2020
";

    #[test]
    fn test_parse_closed_period() {
        let period = parse_period("02-07-2019 / 31-01-2020").unwrap();
        assert_eq!(period.start(), d(2019, 7, 2));
        assert_eq!(period.end(), Some(d(2020, 1, 31)));
    }

    #[test]
    fn test_parse_ongoing_period() {
        let period = parse_period("02-07-2019 ...").unwrap();
        assert_eq!(period.start(), d(2019, 7, 2));
        assert!(period.is_ongoing());

        let explicit = parse_period("02/07/2019 / ONGOING").unwrap();
        assert_eq!(explicit, period);
    }

    #[test]
    fn test_parse_period_rejects_garbage() {
        assert!(matches!(parse_period("2019"), Err(Error::MalformedPeriod(_))));
        assert!(matches!(
            parse_period("31-01-2020 / 02-07-2019"),
            Err(Error::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_parse_party_label() {
        assert_eq!(
            parse_party_label("Bezpartyjna (Poland)").unwrap(),
            ("Bezpartyjna".to_string(), Some("Poland".to_string()))
        );
        assert_eq!(
            parse_party_label("Lista (Italia) (Italy)").unwrap(),
            ("Lista (Italia)".to_string(), Some("Italy".to_string()))
        );
        assert_eq!(
            parse_party_label("Independent (Germany)").unwrap(),
            ("Independent".to_string(), None)
        );
        assert!(parse_party_label("No country").is_err());
    }

    #[test]
    fn test_history_entry() {
        let (period, label) =
            split_history_entry("02-07-2019 / 16-07-2019 : Bezpartyjna (Poland)").unwrap();
        assert_eq!(period, Period::closed(d(2019, 7, 2), d(2019, 7, 16)).unwrap());
        assert_eq!(parse_party_label(label).unwrap().0, "Bezpartyjna");
    }

    #[test]
    fn test_parse_group_label() {
        assert_eq!(parse_group_label("Renew Europe Group - Member"), "Renew Europe Group");
        assert_eq!(
            parse_group_label("The Left group in the European Parliament - GUE/NGL - Vice-Chair"),
            "The Left group in the European Parliament - GUE/NGL"
        );
        assert_eq!(parse_group_label("Non-attached Members"), NON_ATTACHED);
    }

    #[test]
    fn test_load_roster() {
        let roster = Roster::from_reader(ROSTER.as_bytes(), GroupRegistry::new()).unwrap();

        assert_eq!(roster.meps.len(), 3);
        assert_eq!(roster.parties.count(), 3);

        let fidesz = roster
            .find_party(
                "Fidesz-Magyar Polgári Szövetség-Kereszténydemokrata Néppárt",
                Some("Hungary"),
            )
            .unwrap();
        assert!(fidesz.member_ids_at(d(2021, 3, 20)).contains("124720"));

        let independent = roster.find_party("Independent", Some("Germany")).unwrap();
        assert_eq!(independent.country, None);
        assert!(independent.member_ids_at(d(2020, 2, 1)).is_empty());

        let ni = roster.groups.find_by_name(NON_ATTACHED).unwrap();
        let deutsch = &roster.meps["124720"];
        assert!(ni.is_mep_a_member(deutsch, d(2021, 3, 19)));
        assert!(!ni.is_mep_a_member(deutsch, d(2021, 3, 18)));
    }

    #[test]
    fn test_unknown_group_row_fails() {
        let csv = "\
kind,mep_id,name,country,affiliation,affiliation_country,period
group,1,Test MEP,Hungary,Imaginary Group,,02-07-2019 ...
";
        let result = Roster::from_reader(csv.as_bytes(), GroupRegistry::new());
        assert!(matches!(result, Err(Error::UnknownGroup(_))));
    }
}
