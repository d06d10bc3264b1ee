// 📥 Daily Document Sources
// One roll-call document per calendar date, or none when there was no sitting.
//
// A missing document is never an error: `Ok(None)` means "skip this day".

use crate::config::AnalysisConfig;
use crate::error::Result;
use chrono::NaiveDate;
use reqwest::StatusCode;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Provider of daily roll-call documents
pub trait DocumentSource {
    /// Raw XML for `date`, or None when no document exists for that day
    fn fetch(&mut self, date: NaiveDate) -> Result<Option<String>>;
}

/// Every date from `start` to `end`, both inclusive
pub fn days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

// ============================================================================
// CACHED SOURCE (disk cache + optional download)
// ============================================================================

/// Reads `<cache_dir>/<yyyy-mm-dd>.xml`, downloading missing days unless offline
pub struct CachedDocumentSource {
    cache_dir: PathBuf,
    url_template: String,
    fetch_delay: Duration,
    client: Option<reqwest::blocking::Client>,
}

impl CachedDocumentSource {
    /// Source that only ever reads the cache directory
    pub fn offline(cache_dir: impl Into<PathBuf>) -> Self {
        CachedDocumentSource {
            cache_dir: cache_dir.into(),
            url_template: String::new(),
            fetch_delay: Duration::ZERO,
            client: None,
        }
    }

    /// Source that downloads missing days from `url_template`
    ///
    /// `{date}` in the template is replaced by the ISO date.
    pub fn online(
        cache_dir: impl Into<PathBuf>,
        url_template: impl Into<String>,
        fetch_delay: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(CachedDocumentSource {
            cache_dir: cache_dir.into(),
            url_template: url_template.into(),
            fetch_delay,
            client: Some(client),
        })
    }

    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        if config.offline {
            Ok(Self::offline(&config.cache_dir))
        } else {
            Self::online(
                &config.cache_dir,
                config.document_url_template.clone(),
                Duration::from_millis(config.fetch_delay_ms),
            )
        }
    }

    pub fn is_offline(&self) -> bool {
        self.client.is_none()
    }

    pub fn cache_path(&self, date: NaiveDate) -> PathBuf {
        self.cache_dir.join(format!("{}.xml", date))
    }

    fn download(&self, client: &reqwest::blocking::Client, date: NaiveDate, path: &Path) -> Result<Option<String>> {
        let url = self.url_template.replace("{date}", &date.to_string());
        let response = client.get(&url).send()?;

        let document = match response.status() {
            StatusCode::OK => {
                let body = response.text()?;
                fs::create_dir_all(&self.cache_dir)?;
                fs::write(path, &body)?;
                Some(body)
            }
            StatusCode::NOT_FOUND => {
                debug!("file for {} is missing, skipping on the assumption that no vote took place", date);
                None
            }
            status => {
                warn!("unexpected status {} for {}, skipping the day", status, url);
                None
            }
        };

        // Fixed backoff between network fetches
        thread::sleep(self.fetch_delay);

        Ok(document)
    }
}

impl DocumentSource for CachedDocumentSource {
    fn fetch(&mut self, date: NaiveDate) -> Result<Option<String>> {
        let path = self.cache_path(date);
        if path.exists() {
            return Ok(Some(fs::read_to_string(&path)?));
        }

        match &self.client {
            Some(client) => self.download(client, date, &path),
            None => {
                debug!("file for {} is missing, skipping due to offline mode", date);
                Ok(None)
            }
        }
    }
}

// ============================================================================
// IN-MEMORY SOURCE
// ============================================================================

/// Documents held in memory, keyed by date
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    documents: BTreeMap<NaiveDate, String>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, date: NaiveDate, xml: impl Into<String>) {
        self.documents.insert(date, xml.into());
    }
}

impl DocumentSource for InMemorySource {
    fn fetch(&mut self, date: NaiveDate) -> Result<Option<String>> {
        Ok(self.documents.get(&date).cloned())
    }
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

    #[test]
    fn test_days_inclusive_range() {
        let all: Vec<NaiveDate> = days(d(2020, 2, 27), d(2020, 3, 1)).collect();
        assert_eq!(
            all,
            vec![d(2020, 2, 27), d(2020, 2, 28), d(2020, 2, 29), d(2020, 3, 1)]
        );
        assert_eq!(days(d(2020, 3, 1), d(2020, 3, 1)).count(), 1);
        assert_eq!(days(d(2020, 3, 2), d(2020, 3, 1)).count(), 0);
    }

    #[test]
    fn test_offline_source_reads_cache() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2021-03-10.xml"), "<PV.RollCallVoteResults/>").unwrap();

        let mut source = CachedDocumentSource::offline(dir.path());
        assert!(source.is_offline());

        let present = source.fetch(d(2021, 3, 10)).unwrap();
        assert_eq!(present.as_deref(), Some("<PV.RollCallVoteResults/>"));

        let missing = source.fetch(d(2021, 3, 11)).unwrap();
        assert!(missing.is_none(), "Missing day must be skipped, not fail");
    }

    #[test]
    fn test_cache_path_uses_iso_date() {
        let source = CachedDocumentSource::offline("xml");
        assert_eq!(source.cache_path(d(2019, 7, 2)), PathBuf::from("xml/2019-07-02.xml"));
    }

    #[test]
    fn test_in_memory_source() {
        let mut source = InMemorySource::new();
        source.insert(d(2021, 3, 10), "<x/>");

        assert_eq!(source.fetch(d(2021, 3, 10)).unwrap().as_deref(), Some("<x/>"));
        assert!(source.fetch(d(2021, 3, 9)).unwrap().is_none());
    }
}
