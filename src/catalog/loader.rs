use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use super::CatalogError;
use crate::models::ChantRecord;

/// The whole chant collection plus an id index. Built once and then shared
/// read-only by every screen.
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<ChantRecord>,
    by_id: HashMap<i64, usize>,
}

impl Catalog {
    /// Index the records, rejecting duplicate ids so lookups stay unambiguous.
    pub fn new(records: Vec<ChantRecord>) -> Result<Self, CatalogError> {
        let mut by_id = HashMap::with_capacity(records.len());
        for (idx, record) in records.iter().enumerate() {
            if by_id.insert(record.id, idx).is_some() {
                return Err(CatalogError::DuplicateId(record.id));
            }
        }
        Ok(Self { records, by_id })
    }

    /// Records in document order.
    pub fn records(&self) -> &[ChantRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&ChantRecord> {
        self.by_id.get(&id).map(|idx| &self.records[*idx])
    }

    pub fn require(&self, id: i64) -> Result<&ChantRecord, CatalogError> {
        self.get(id).ok_or(CatalogError::NotFound(id))
    }

    /// Distinct non-empty office-part codes, sorted, for the filter picker.
    pub fn office_part_codes(&self) -> Vec<String> {
        self.distinct(|record| &record.office_part)
    }

    /// Distinct non-empty mode codes, sorted, for the filter picker.
    pub fn mode_codes(&self) -> Vec<String> {
        self.distinct(|record| &record.mode)
    }

    fn distinct<F>(&self, field: F) -> Vec<String>
    where
        F: Fn(&ChantRecord) -> &String,
    {
        self.records
            .iter()
            .map(|record| field(record).trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Parse a catalog document (a JSON array of chant objects).
pub fn parse_catalog(json: &str) -> Result<Catalog, CatalogError> {
    let records: Vec<ChantRecord> = serde_json::from_str(json)?;
    debug!(count = records.len(), "parsed chant records");
    Catalog::new(records)
}

/// Read and index the catalog document at `path`.
pub fn load_catalog(path: &Path) -> Result<Catalog, CatalogError> {
    let contents = fs::read_to_string(path).map_err(|source| CatalogError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = parse_catalog(&contents)?;
    info!(path = %path.display(), count = catalog.len(), "loaded chant catalog");
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {"id": 10, "incipit": "Ad te levavi", "office-part": "in", "mode": "8"},
        {"id": 11, "incipit": "Universi", "office-part": "gr", "mode": "1"},
        {"id": 12, "incipit": "Ostende nobis", "office-part": "al", "mode": "8"}
    ]"#;

    #[test]
    fn indexes_records_by_id() {
        let catalog = parse_catalog(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(11).unwrap().incipit, "Universi");
        assert!(catalog.get(99).is_none());
        assert!(matches!(catalog.require(99), Err(CatalogError::NotFound(99))));
    }

    #[test]
    fn rejects_duplicate_ids() {
        let json = r#"[{"id": 1, "incipit": "A"}, {"id": 1, "incipit": "B"}]"#;
        assert!(matches!(
            parse_catalog(json),
            Err(CatalogError::DuplicateId(1))
        ));
    }

    #[test]
    fn lists_distinct_codes_for_pickers() {
        let catalog = parse_catalog(SAMPLE).unwrap();
        assert_eq!(catalog.office_part_codes(), vec!["al", "gr", "in"]);
        assert_eq!(catalog.mode_codes(), vec!["1", "8"]);
    }

    #[test]
    fn empty_document_is_an_empty_catalog() {
        let catalog = parse_catalog("[]").unwrap();
        assert!(catalog.is_empty());
        assert!(catalog.office_part_codes().is_empty());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_catalog(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
