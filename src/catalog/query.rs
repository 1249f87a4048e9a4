use crate::models::ChantRecord;

/// Active search criteria. Empty text and `None` codes match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChantFilter {
    /// Case-insensitive substring matched against the incipit.
    pub incipit: String,
    /// Office-part code, compared without surrounding whitespace.
    pub office_part: Option<String>,
    /// Mode code, compared without surrounding whitespace.
    pub mode: Option<String>,
}

impl ChantFilter {
    pub fn is_empty(&self) -> bool {
        self.incipit.is_empty() && self.office_part.is_none() && self.mode.is_none()
    }

    pub fn matches(&self, record: &ChantRecord) -> bool {
        self.matches_lowered(record, &self.incipit.to_lowercase())
    }

    fn matches_lowered(&self, record: &ChantRecord, needle: &str) -> bool {
        record.incipit.to_lowercase().contains(needle)
            && self
                .office_part
                .as_deref()
                .map_or(true, |code| record.office_part.trim() == code.trim())
            && self
                .mode
                .as_deref()
                .map_or(true, |code| record.mode.trim() == code.trim())
    }
}

/// Keep the records that satisfy every active criterion, in catalog order.
pub fn filter_chants<'a>(records: &'a [ChantRecord], filter: &ChantFilter) -> Vec<&'a ChantRecord> {
    if filter.is_empty() {
        return records.iter().collect();
    }
    let needle = filter.incipit.to_lowercase();
    records
        .iter()
        .filter(|record| filter.matches_lowered(record, &needle))
        .collect()
}

/// Positions of the matching records within `records`, in order.
pub fn matching_indices(records: &[ChantRecord], filter: &ChantFilter) -> Vec<usize> {
    let needle = filter.incipit.to_lowercase();
    records
        .iter()
        .enumerate()
        .filter(|(_, record)| filter.matches_lowered(record, &needle))
        .map(|(index, _)| index)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chant(id: i64, incipit: &str, office_part: &str, mode: &str) -> ChantRecord {
        ChantRecord {
            id,
            incipit: incipit.to_string(),
            office_part: office_part.to_string(),
            mode: mode.to_string(),
            ..ChantRecord::default()
        }
    }

    fn sample() -> Vec<ChantRecord> {
        vec![
            chant(1, "Puer natus est", "in", "7"),
            chant(2, "Viderunt omnes", "gr", "5"),
            chant(3, "Dies sanctificatus", "al", "2"),
            chant(4, "Tui sunt caeli", "of", "4"),
            chant(5, "Viderunt omnes fines", "co", "1"),
        ]
    }

    fn ids(records: &[&ChantRecord]) -> Vec<i64> {
        records.iter().map(|record| record.id).collect()
    }

    #[test]
    fn empty_filter_returns_everything_in_order() {
        let records = sample();
        let result = filter_chants(&records, &ChantFilter::default());
        assert_eq!(ids(&result), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn incipit_search_is_case_insensitive_substring() {
        let records = sample();
        let filter = ChantFilter {
            incipit: "VIDERUNT".to_string(),
            ..ChantFilter::default()
        };
        assert_eq!(ids(&filter_chants(&records, &filter)), vec![2, 5]);
    }

    #[test]
    fn all_criteria_must_hold() {
        let records = sample();
        let filter = ChantFilter {
            incipit: "omnes".to_string(),
            office_part: Some("co".to_string()),
            mode: Some("1".to_string()),
        };
        assert_eq!(ids(&filter_chants(&records, &filter)), vec![5]);

        let filter = ChantFilter {
            office_part: Some("co".to_string()),
            mode: Some("5".to_string()),
            ..ChantFilter::default()
        };
        assert!(filter_chants(&records, &filter).is_empty());
    }

    #[test]
    fn results_are_a_subset_satisfying_every_predicate() {
        let records = sample();
        let filter = ChantFilter {
            incipit: "s".to_string(),
            office_part: None,
            mode: Some("2".to_string()),
        };
        let result = filter_chants(&records, &filter);
        assert!(result.iter().all(|record| filter.matches(record)));
        assert!(result.len() <= records.len());
    }

    #[test]
    fn indices_follow_filtered_order() {
        let records = sample();
        let filter = ChantFilter {
            incipit: "viderunt".to_string(),
            ..ChantFilter::default()
        };
        assert_eq!(matching_indices(&records, &filter), vec![1, 4]);
        assert_eq!(matching_indices(&records, &ChantFilter::default()).len(), 5);
    }

    #[test]
    fn picker_codes_match_padded_fields() {
        let records = vec![chant(1, "Christus factus est", " gr", "3 ")];
        let catalog = crate::catalog::Catalog::new(records.clone()).unwrap();
        let filter = ChantFilter {
            office_part: catalog.office_part_codes().into_iter().next(),
            mode: catalog.mode_codes().into_iter().next(),
            ..ChantFilter::default()
        };
        assert_eq!(filter.mode.as_deref(), Some("3"));
        assert_eq!(matching_indices(&records, &filter), vec![0]);
    }

    #[test]
    fn empty_collection_yields_nothing() {
        let result = filter_chants(&[], &ChantFilter::default());
        assert!(result.is_empty());
    }
}
