// 📚 Price Data - collection of price records over one document
//
// Owns the parsed document and rebuilds every record from it on reload.
// Staging is broadcast to records; persistence always rewrites the whole
// document in one go.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::io::Write;
use std::ops::{AddAssign, DivAssign, Index, MulAssign, SubAssign};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::DocumentConfig;
use crate::document::{fingerprint_file, Document, Node};
use crate::error::{PriceDataError, Result};
use crate::record::{Persist, PriceRecord, RecordSnapshot};
use crate::transform::{ShiftMethod, Transform};

// ============================================================================
// READ-ONLY MAPPING
// ============================================================================

/// Read-only associative view over records, iterated in document order.
pub trait RecordMap {
    fn len(&self) -> usize;

    fn contains_key(&self, name: &str) -> bool;

    fn get_record(&self, name: &str) -> Option<&PriceRecord>;

    fn records(&self) -> Box<dyn Iterator<Item = &PriceRecord> + '_>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// DOCUMENT STORE
// ============================================================================

/// The document handle plus where it lives. Only this type touches storage.
#[derive(Debug)]
struct DocumentStore {
    path: PathBuf,
    document: Document,
    config: Arc<DocumentConfig>,
}

impl DocumentStore {
    fn is_stale(&self) -> Result<bool> {
        Ok(fingerprint_file(&self.path)? != self.document.fingerprint())
    }
}

impl Persist for DocumentStore {
    fn persist(&mut self, committed: &[(&str, &Node)]) -> Result<()> {
        match self.is_stale() {
            Ok(false) => {}
            Ok(true) => {
                warn!(path = %self.path.display(), "document changed on disk since last reload, overwriting")
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "document unreadable since last reload, rewriting")
            }
        }

        let mut next = self.document.clone();
        for (name, node) in committed {
            let slot = next
                .node_mut(&self.config.name_key, name)
                .ok_or_else(|| PriceDataError::NotFound(name.to_string()))?;
            *slot = (*node).clone();
        }

        next.write(&self.path)?;
        self.document = next;
        Ok(())
    }
}

// ============================================================================
// PRICE DATA
// ============================================================================

#[derive(Debug)]
pub struct PriceData {
    store: DocumentStore,
    records: IndexMap<String, PriceRecord>,
    config: Arc<DocumentConfig>,
    loaded_at: DateTime<Utc>,
}

impl PriceData {
    /// Load the price document at `path` with the default layout.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, DocumentConfig::default())
    }

    pub fn open_with(path: impl AsRef<Path>, config: DocumentConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let config = Arc::new(config);
        let document = Document::parse(&path, &config)?;
        let records = build_records(&document, &config);

        info!(path = %path.display(), records = records.len(), "loaded price data");

        Ok(PriceData {
            store: DocumentStore {
                path,
                document,
                config: Arc::clone(&config),
            },
            records,
            config,
            loaded_at: Utc::now(),
        })
    }

    /// Re-read the document and rebuild every record.
    ///
    /// Unsaved staged transforms are discarded. On a read failure the
    /// collection is left as it was.
    pub fn reload(&mut self) -> Result<&mut Self> {
        let document = Document::parse(&self.store.path, &self.config)?;
        let records = build_records(&document, &self.config);

        let dropped: Vec<&str> = self
            .records
            .keys()
            .filter(|name| !records.contains_key(name.as_str()))
            .map(|name| name.as_str())
            .collect();
        if !dropped.is_empty() {
            debug!(?dropped, "records no longer in document");
        }

        self.records = records;
        self.store.document = document;
        self.loaded_at = Utc::now();

        info!(path = %self.store.path.display(), records = self.records.len(), "reloaded price data");
        Ok(self)
    }

    pub fn path(&self) -> &Path {
        &self.store.path
    }

    pub fn config(&self) -> &DocumentConfig {
        &self.config
    }

    /// When the records were last rebuilt from storage
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// SHA-256 of the document as last read or written
    pub fn fingerprint(&self) -> &str {
        self.store.document.fingerprint()
    }

    /// True when storage no longer holds what was last read or written.
    pub fn is_stale(&self) -> Result<bool> {
        self.store.is_stale()
    }

    // ------------------------------------------------------------------------
    // lookup
    // ------------------------------------------------------------------------

    pub fn get(&self, name: &str) -> Result<&PriceRecord> {
        self.records
            .get(name)
            .ok_or_else(|| PriceDataError::NotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut PriceRecord> {
        self.records
            .get_mut(name)
            .ok_or_else(|| PriceDataError::NotFound(name.to_string()))
    }

    /// Records for `names`, in the order asked for.
    pub fn get_many(&self, names: &[&str]) -> Result<Vec<&PriceRecord>> {
        names.iter().map(|name| self.get(name)).collect()
    }

    /// Mutable records for `names`, in document order. Fails before handing
    /// anything out if a name is missing.
    pub fn get_many_mut(&mut self, names: &[&str]) -> Result<Vec<&mut PriceRecord>> {
        if let Some(missing) = names.iter().find(|name| !self.records.contains_key(**name)) {
            return Err(PriceDataError::NotFound(missing.to_string()));
        }
        Ok(self
            .records
            .values_mut()
            .filter(|record| names.contains(&record.name()))
            .collect())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(|name| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &PriceRecord> {
        self.records.values()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut PriceRecord> {
        self.records.values_mut()
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, &PriceRecord)> {
        self.records.iter().map(|(name, record)| (name.as_str(), record))
    }

    /// Names of records with staged transforms
    pub fn pending_names(&self) -> Vec<&str> {
        self.items()
            .filter(|(_, record)| record.has_pending())
            .map(|(name, _)| name)
            .collect()
    }

    // ------------------------------------------------------------------------
    // display
    // ------------------------------------------------------------------------

    /// Diff one record, or every record with staged transforms.
    pub fn describe<W: Write + ?Sized>(&self, name: Option<&str>, out: &mut W) -> Result<()> {
        if let Some(name) = name {
            return self.get(name)?.describe(out);
        }

        for (name, record) in self.items().filter(|(_, r)| r.has_pending()) {
            writeln!(out, "--- {} {}", name, "-".repeat(30usize.saturating_sub(name.len())))
                .map_err(|e| PriceDataError::io("<output>", e))?;
            record.describe(out)?;
        }
        Ok(())
    }

    pub fn snapshots(&self) -> Result<Vec<RecordSnapshot>> {
        self.values().map(|record| record.snapshot()).collect()
    }

    /// Pretty JSON of every record snapshot.
    pub fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.snapshots()?)?)
    }

    // ------------------------------------------------------------------------
    // revert / save
    // ------------------------------------------------------------------------

    pub fn revert(&mut self, count: usize) -> &mut Self {
        for record in self.records.values_mut() {
            record.revert(count);
        }
        self
    }

    pub fn revert_all(&mut self) -> &mut Self {
        for record in self.records.values_mut() {
            record.revert_all();
        }
        self
    }

    /// Commit one record (`Some(name)`) or all of them, then write the whole
    /// document once.
    ///
    /// Every target is folded before anything is written; a fold or write
    /// failure leaves all records as they were.
    pub fn save(&mut self, name: Option<&str>) -> Result<()> {
        if let Some(name) = name {
            let record = self
                .records
                .get_mut(name)
                .ok_or_else(|| PriceDataError::NotFound(name.to_string()))?;
            record.save(&mut self.store)?;
            info!(path = %self.store.path.display(), record = name, "saved price record");
            return Ok(());
        }

        let folded = self
            .records
            .iter()
            .map(|(name, record)| -> Result<(String, Node)> {
                Ok((name.clone(), record.current_value()?))
            })
            .collect::<Result<Vec<_>>>()?;

        let committed: Vec<(&str, &Node)> = folded
            .iter()
            .map(|(name, node)| (name.as_str(), node))
            .collect();
        self.store.persist(&committed)?;

        let changed = self.pending_names().len();
        for (name, node) in folded {
            if let Some(record) = self.records.get_mut(&name) {
                record.commit(node);
            }
        }

        info!(path = %self.store.path.display(), changed, "saved price data");
        Ok(())
    }

    // ------------------------------------------------------------------------
    // bulk staging
    // ------------------------------------------------------------------------

    fn broadcast(&mut self, transform: Transform) -> &mut Self {
        for record in self.records.values_mut() {
            record.stage(transform.clone());
        }
        self
    }

    pub fn stage_absolute_shift(&mut self, delta: f64) -> &mut Self {
        self.broadcast(Transform::AbsoluteShift { delta })
    }

    pub fn stage_relative_shift(&mut self, rate: f64) -> &mut Self {
        self.broadcast(Transform::RelativeShift { rate })
    }

    pub fn stage_log_shift(&mut self, rate: f64) -> &mut Self {
        self.broadcast(Transform::LogShift { rate })
    }

    /// Shift every record; nothing is staged if `method` is unknown.
    pub fn stage_shift(&mut self, amount: f64, method: &str) -> Result<&mut Self> {
        let method: ShiftMethod = method.parse()?;
        Ok(self.broadcast(Transform::shift(amount, method)))
    }
}

fn build_records(document: &Document, config: &Arc<DocumentConfig>) -> IndexMap<String, PriceRecord> {
    document
        .nodes()
        .iter()
        .filter_map(|node| {
            let name = node.attribute(&config.name_key)?.to_string();
            let record = PriceRecord::new(name.clone(), node.clone(), Arc::clone(config));
            Some((name, record))
        })
        .collect()
}

impl RecordMap for PriceData {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn contains_key(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    fn get_record(&self, name: &str) -> Option<&PriceRecord> {
        self.records.get(name)
    }

    fn records(&self) -> Box<dyn Iterator<Item = &PriceRecord> + '_> {
        Box::new(self.records.values())
    }
}

impl Index<&str> for PriceData {
    type Output = PriceRecord;

    /// Panics when `name` is absent; use `get` for a `NotFound` error.
    fn index(&self, name: &str) -> &PriceRecord {
        &self.records[name]
    }
}

impl<'a> IntoIterator for &'a PriceData {
    type Item = (&'a String, &'a PriceRecord);
    type IntoIter = indexmap::map::Iter<'a, String, PriceRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

impl AddAssign<f64> for PriceData {
    fn add_assign(&mut self, delta: f64) {
        self.stage_absolute_shift(delta);
    }
}

impl SubAssign<f64> for PriceData {
    fn sub_assign(&mut self, delta: f64) {
        self.stage_absolute_shift(-delta);
    }
}

impl MulAssign<f64> for PriceData {
    fn mul_assign(&mut self, factor: f64) {
        self.stage_relative_shift(factor - 1.0);
    }
}

impl DivAssign<f64> for PriceData {
    fn div_assign(&mut self, factor: f64) {
        self.stage_relative_shift(1.0 / factor - 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use crate::test_support::CapturedLogs;
    use tempfile::TempDir;

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// Write a price table into a fresh temp dir and open it
    fn open_sample(contents: &str) -> (TempDir, PriceData) {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(&path, contents).unwrap();
        let data = PriceData::open(&path).unwrap();
        (dir, data)
    }

    const AB: &str = "name,value,tag\nA,1.0,PX_LAST\nB,2.0,PX_LAST\n";

    #[test]
    fn test_open_builds_records_in_document_order() {
        let (_dir, data) = open_sample("name,value,tag\nUSD_3M,1.50,PX_LAST\nEUR_1Y,2.0,PX_LAST\nJPY_6M,0.1,PX_LAST\n");

        assert_eq!(data.len(), 3);
        assert!(!data.is_empty());
        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["USD_3M", "EUR_1Y", "JPY_6M"]);
        assert!(data.contains_key("EUR_1Y"));
        assert_eq!(data["USD_3M"].original_numeric().unwrap(), 1.5);
        assert_eq!(data.get_record("JPY_6M").map(|r| r.name()), Some("JPY_6M"));

        let names: Vec<&String> = (&data).into_iter().map(|(name, _)| name).collect();
        assert_eq!(names.len(), 3);
        assert_eq!(data.records().count(), 3);
    }

    #[test]
    fn test_missing_name_is_not_found() {
        let (_dir, mut data) = open_sample(AB);

        assert!(matches!(data.get("C"), Err(PriceDataError::NotFound(_))));
        assert!(matches!(data.get_mut("C"), Err(PriceDataError::NotFound(_))));
        assert!(matches!(data.get_many(&["A", "C"]), Err(PriceDataError::NotFound(_))));
        assert!(matches!(data.get_many_mut(&["C"]), Err(PriceDataError::NotFound(_))));
        assert!(matches!(data.save(Some("C")), Err(PriceDataError::NotFound(_))));

        let mut out = Vec::new();
        assert!(data.describe(Some("C"), &mut out).is_err());
    }

    #[test]
    fn test_get_many() {
        let (_dir, mut data) = open_sample(AB);

        let many = data.get_many(&["B", "A"]).unwrap();
        let names: Vec<&str> = many.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["B", "A"]);

        for record in data.get_many_mut(&["B"]).unwrap() {
            record.stage_absolute_shift(1.0);
        }
        assert_eq!(data.pending_names(), vec!["B"]);
    }

    #[test]
    fn test_bulk_shift_save_and_describe() {
        let (dir, mut data) = open_sample(AB);

        data.stage_absolute_shift(5.0);

        let mut out = Vec::new();
        data.describe(None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("--- A ----"));
        assert!(text.contains("--- B ----"));
        assert!(text.contains("new value: + name=\"A\" value=\"6.0\""));
        assert!(text.contains("new value: + name=\"B\" value=\"7.0\""));

        data.save(None).unwrap();

        let stored = fs::read_to_string(dir.path().join("prices.csv")).unwrap();
        assert_eq!(stored, "name,value,tag\nA,6.0,PX_LAST\nB,7.0,PX_LAST\n");
        assert!(data.pending_names().is_empty());

        let mut out = Vec::new();
        data.describe(None, &mut out).unwrap();
        assert!(out.is_empty(), "no record should report a change after save");

        for name in ["A", "B"] {
            let mut out = Vec::new();
            data.describe(Some(name), &mut out).unwrap();
            assert!(String::from_utf8(out).unwrap().starts_with("no diff  : "));
        }
    }

    #[test]
    fn test_separator_width() {
        let (_dir, mut data) = open_sample("name,value\nUSD_3M,1.0\n");
        data.get_mut("USD_3M").unwrap().stage_absolute_shift(1.0);

        let mut out = Vec::new();
        data.describe(None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().next().unwrap(), format!("--- USD_3M {}", "-".repeat(24)));
    }

    #[test]
    fn test_save_single_record_persists_whole_document() {
        let (dir, mut data) = open_sample(AB);

        data.get_mut("A").unwrap().stage_absolute_shift(0.5);
        data.get_mut("B").unwrap().stage_absolute_shift(0.5);
        data.save(Some("A")).unwrap();

        let stored = fs::read_to_string(dir.path().join("prices.csv")).unwrap();
        assert_eq!(stored, "name,value,tag\nA,1.5,PX_LAST\nB,2.0,PX_LAST\n");
        assert!(!data["A"].has_pending());
        assert_eq!(data["B"].pending_len(), 1, "B stays staged");

        data.save(None).unwrap();
        let stored = fs::read_to_string(dir.path().join("prices.csv")).unwrap();
        assert_eq!(stored, "name,value,tag\nA,1.5,PX_LAST\nB,2.5,PX_LAST\n");
    }

    #[test]
    fn test_reload_after_save_round_trips() {
        let (_dir, mut data) = open_sample(AB);

        data.stage_relative_shift(0.5);
        data.save(None).unwrap();
        let saved: Vec<f64> = data.values().map(|r| r.original_numeric().unwrap()).collect();

        data.reload().unwrap();
        let reloaded: Vec<f64> = data.values().map(|r| r.original_numeric().unwrap()).collect();

        assert_eq!(saved, vec![1.5, 3.0]);
        assert_eq!(reloaded, saved);
        assert!(!data.is_stale().unwrap());
    }

    #[test]
    fn test_reload_discards_staged_and_tracks_removed_names() {
        let (dir, mut data) = open_sample(AB);
        data.stage_absolute_shift(1.0);

        fs::write(dir.path().join("prices.csv"), "name,value,tag\nB,2.0,PX_LAST\nC,3.0,PX_LAST\n").unwrap();
        assert!(data.is_stale().unwrap());

        data.reload().unwrap();

        assert_eq!(data.keys().collect::<Vec<_>>(), vec!["B", "C"]);
        assert!(!data.contains_key("A"));
        assert!(data.pending_names().is_empty());
        assert!(!data.is_stale().unwrap());
    }

    #[test]
    fn test_failed_reload_keeps_state() {
        let (dir, mut data) = open_sample(AB);
        data.stage_absolute_shift(1.0);

        fs::remove_file(dir.path().join("prices.csv")).unwrap();
        let err = data.reload().unwrap_err();

        assert!(err.is_io_failure());
        assert_eq!(data.pending_names(), vec!["A", "B"]);
    }

    #[test]
    fn test_save_is_all_or_nothing_on_bad_value() {
        let (dir, mut data) = open_sample("name,value\nA,1.0\nB,n/a\n");
        data.stage_absolute_shift(1.0);

        let err = data.save(None).unwrap_err();
        assert!(matches!(err, PriceDataError::NumericConversion { .. }));

        assert_eq!(data["A"].pending_len(), 1);
        assert_eq!(data["A"].original().attribute("value"), Some("1.0"));
        let stored = fs::read_to_string(dir.path().join("prices.csv")).unwrap();
        assert_eq!(stored, "name,value\nA,1.0\nB,n/a\n");
    }

    #[test]
    fn test_revert_broadcast() {
        let (_dir, mut data) = open_sample(AB);
        data.stage_absolute_shift(1.0).stage_absolute_shift(2.0);
        data.get_mut("A").unwrap().stage_absolute_shift(3.0);

        data.revert(1);
        assert_eq!(data["A"].current_numeric().unwrap(), 4.0);
        assert_eq!(data["B"].current_numeric().unwrap(), 3.0);

        data.revert(5);
        assert!(data.pending_names().is_empty());

        data.stage_log_shift(0.1);
        data.revert_all();
        assert!(data.pending_names().is_empty());
        assert_eq!(data["A"].current_value().unwrap(), *data["A"].original());
    }

    #[test]
    fn test_bulk_stage_shift_invalid_method_stages_nothing() {
        let (_dir, mut data) = open_sample(AB);

        let err = data.stage_shift(1.0, "banana").unwrap_err();
        assert!(err.to_string().contains("banana"));
        assert!(data.pending_names().is_empty());

        data.stage_shift(0.1, "Rate").unwrap();
        assert!((data["B"].current_numeric().unwrap() - 2.2).abs() < 1e-12);
    }

    #[test]
    fn test_bulk_compound_assignment() {
        let (_dir, mut data) = open_sample(AB);

        data += 1.0;
        data *= 2.0;
        data -= 1.0;
        data /= 2.0;

        assert_eq!(data["A"].current_numeric().unwrap(), 1.5);
        assert_eq!(data["B"].current_numeric().unwrap(), 2.5);
        assert_eq!(data["A"].pending_len(), 4);
    }

    #[test]
    fn test_write_failure_leaves_records_staged() {
        let (dir, mut data) = open_sample(AB);
        data.stage_absolute_shift(1.0);

        // A directory squatting on the temp path makes the write fail
        fs::create_dir(dir.path().join("prices.csv.tmp")).unwrap();
        let err = data.save(None).unwrap_err();

        assert!(err.is_io_failure());
        assert_eq!(data.pending_names(), vec!["A", "B"]);
        assert_eq!(data["A"].original().attribute("value"), Some("1.0"));
    }

    #[test]
    fn test_snapshot_json() {
        let (_dir, mut data) = open_sample(AB);
        data.get_mut("B").unwrap().stage_set(9.5, Some("PX_MID")).unwrap();

        let json: serde_json::Value = serde_json::from_str(&data.snapshot_json().unwrap()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[1]["name"], "B");
        assert_eq!(json[1]["current"], "name=\"B\" value=\"9.5\" tag=\"PX_MID\"");
        assert_eq!(json[1]["pending"][0]["op"], "set_value");
        assert_eq!(json[0]["pending"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_custom_layout() {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prices.csv");
        fs::write(&path, "ticker;px;field\nUSD_3M;1.5;PX_MID\n").unwrap();
        let config = DocumentConfig::new()
            .with_name_key("ticker")
            .with_value_key("px")
            .with_kind_key("field")
            .with_default_kind("PX_MID")
            .with_delimiter(b';');

        let mut data = PriceData::open_with(&path, config).unwrap();
        data.get_mut("USD_3M").unwrap().stage_set(2.0, None).unwrap();
        data.save(Some("USD_3M")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "ticker;px;field\nUSD_3M;2.0;PX_MID\n");
        assert_eq!(data.path(), path.as_path());
        assert!(data.loaded_at() <= Utc::now());
        assert_eq!(data.fingerprint().len(), 64);
    }

    #[test]
    fn test_save_keeps_untouched_crlf_rows() {
        let (dir, mut data) = open_sample("name,value,tag\r\nA,1.0,PX_LAST\r\nB,2.0,PX_LAST\r\n");

        data.get_mut("A").unwrap().stage_absolute_shift(1.0);
        data.save(None).unwrap();

        let stored = fs::read_to_string(dir.path().join("prices.csv")).unwrap();
        assert_eq!(stored, "name,value,tag\r\nA,2.0,PX_LAST\r\nB,2.0,PX_LAST\r\n");
    }

    #[test]
    fn test_save_keeps_untouched_quoted_rows() {
        let (dir, mut data) =
            open_sample("name,value,tag\n\"A\",\"1.0\",\"PX_LAST\"\n\"B\",\"2.0\",\"PX_LAST\"\n");

        data.get_mut("A").unwrap().stage_absolute_shift(1.0);
        data.save(None).unwrap();

        let stored = fs::read_to_string(dir.path().join("prices.csv")).unwrap();
        assert_eq!(stored, "name,value,tag\nA,2.0,PX_LAST\n\"B\",\"2.0\",\"PX_LAST\"\n");

        data.reload().unwrap();
        assert_eq!(data["B"].original().attribute("value"), Some("2.0"));
    }

    #[test]
    fn test_save_after_document_deleted_warns_and_rewrites() {
        let (dir, mut data) = open_sample(AB);
        let path = dir.path().join("prices.csv");
        data.stage_absolute_shift(1.0);

        fs::remove_file(&path).unwrap();
        assert!(data.is_stale().unwrap_err().is_io_failure());

        let logs = CapturedLogs::default();
        tracing::subscriber::with_default(logs.subscriber(tracing::Level::INFO), || {
            data.save(None)
        })
        .unwrap();

        let output = logs.contents();
        assert!(output.contains("WARN"), "expected a warning, got: {}", output);
        assert!(output.contains("unreadable"), "expected the read error, got: {}", output);
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "name,value,tag\nA,2.0,PX_LAST\nB,3.0,PX_LAST\n"
        );
    }
}
