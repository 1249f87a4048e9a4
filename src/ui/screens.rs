use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::catalog::{matching_indices, Catalog, ChantFilter, Debouncer, Pager};
use crate::config::PipelineConfig;
use crate::gabc::{extract_source, transform, TransformOptions};
use crate::links::{score_image_url, EditorLinks};
use crate::models::ChantRecord;
use crate::render::ScoreMode;

use super::forms::SearchInput;

/// Browsing state for the catalog list. Filtering keeps record indices so the
/// screen never borrows from the catalog it was built against.
pub(crate) struct CatalogScreen {
    pub(crate) filter: ChantFilter,
    pub(crate) search: SearchInput,
    pub(crate) matches: Vec<usize>,
    pub(crate) pager: Pager,
    /// Row within the current page.
    pub(crate) selected: usize,
    debouncer: Debouncer,
}

impl CatalogScreen {
    pub(crate) fn new(catalog: &Catalog, debounce: Duration) -> Self {
        let mut screen = Self {
            filter: ChantFilter::default(),
            search: SearchInput::default(),
            matches: Vec::new(),
            pager: Pager::new(0),
            selected: 0,
            debouncer: Debouncer::new(debounce),
        };
        screen.refilter(catalog);
        screen
    }

    /// Recompute the matches and go back to the first page.
    pub(crate) fn refilter(&mut self, catalog: &Catalog) {
        self.matches = matching_indices(catalog.records(), &self.filter);
        self.pager.reset(self.matches.len());
        self.selected = 0;
        debug!(matches = self.matches.len(), filter = ?self.filter, "catalog refiltered");
    }

    /// Record that the search text changed; the filter applies later.
    pub(crate) fn search_edited(&mut self, now: Instant) {
        self.debouncer.touch(now);
    }

    /// Apply the typed search text once the debounce delay has elapsed.
    pub(crate) fn apply_due_search(&mut self, catalog: &Catalog, now: Instant) -> bool {
        if self.debouncer.fire(now) {
            self.apply_search_now(catalog);
            true
        } else {
            false
        }
    }

    pub(crate) fn apply_search_now(&mut self, catalog: &Catalog) {
        self.debouncer.cancel();
        if self.filter.incipit != self.search.query {
            self.filter.incipit = self.search.query.clone();
            self.refilter(catalog);
        }
    }

    pub(crate) fn set_office_part(&mut self, catalog: &Catalog, code: Option<String>) {
        self.filter.office_part = code;
        self.refilter(catalog);
    }

    pub(crate) fn set_mode(&mut self, catalog: &Catalog, code: Option<String>) {
        self.filter.mode = code;
        self.refilter(catalog);
    }

    pub(crate) fn clear_filters(&mut self, catalog: &Catalog) {
        self.debouncer.cancel();
        self.search = SearchInput::default();
        self.filter = ChantFilter::default();
        self.refilter(catalog);
    }

    /// Catalog indices shown on the current page.
    pub(crate) fn page_indices(&self) -> &[usize] {
        let range = self.pager.range();
        &self.matches[range]
    }

    pub(crate) fn current_record<'a>(&self, catalog: &'a Catalog) -> Option<&'a ChantRecord> {
        self.page_indices()
            .get(self.selected)
            .and_then(|&index| catalog.records().get(index))
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        let len = self.page_indices().len();
        if len == 0 {
            return;
        }
        let last = len as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
    }

    pub(crate) fn next_page(&mut self) -> bool {
        let moved = self.pager.next();
        if moved {
            self.selected = 0;
        }
        moved
    }

    pub(crate) fn prev_page(&mut self) -> bool {
        let moved = self.pager.prev();
        if moved {
            self.selected = 0;
        }
        moved
    }
}

/// Detail view toggles. Each change recomputes the processed GABC from the
/// raw source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ViewOptions {
    pub(crate) clean: bool,
    pub(crate) heavy_clean: bool,
    pub(crate) line_breaks: bool,
    pub(crate) live_render: bool,
}

impl ViewOptions {
    pub(crate) fn from_pipeline(pipeline: PipelineConfig) -> Self {
        Self {
            clean: pipeline.clean,
            heavy_clean: pipeline.heavy_clean,
            line_breaks: pipeline.line_breaks,
            live_render: pipeline.live_render,
        }
    }

    pub(crate) fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            clean: self.clean,
            heavy_clean: self.heavy_clean,
            line_breaks: self.line_breaks,
        }
    }

    pub(crate) fn score_mode(&self) -> ScoreMode {
        ScoreMode::from_live(self.live_render)
    }
}

/// What the score panel currently shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScorePanel {
    Static { url: String },
    Rendering,
    Rendered { path: PathBuf },
    /// Inline failure text, already localized.
    Unavailable(String),
}

/// Everything the detail view shows for one chant. Rebuilt on navigation.
pub(crate) struct DetailScreen {
    pub(crate) record: ChantRecord,
    pub(crate) raw: String,
    pub(crate) options: ViewOptions,
    pub(crate) processed: String,
    pub(crate) links: EditorLinks,
    pub(crate) score: ScorePanel,
    pub(crate) last_svg: Option<String>,
    pub(crate) scroll: u16,
}

impl DetailScreen {
    pub(crate) fn new(record: ChantRecord, options: ViewOptions) -> Self {
        let raw = extract_source(record.gabc.as_deref());
        let mut screen = Self {
            links: EditorLinks::build(record.id, ""),
            score: ScorePanel::Static {
                url: score_image_url(record.id),
            },
            record,
            raw,
            options,
            processed: String::new(),
            last_svg: None,
            scroll: 0,
        };
        screen.recompute();
        screen
    }

    pub(crate) fn recompute(&mut self) {
        self.processed = transform(&self.raw, self.options.transform_options());
        self.links = EditorLinks::build(self.record.id, &self.processed);
        debug!(
            id = self.record.id,
            options = ?self.options,
            bytes = self.processed.len(),
            "recomputed processed gabc"
        );
    }

    pub(crate) fn has_source(&self) -> bool {
        !self.raw.is_empty()
    }

    /// Flip a pipeline toggle and recompute. Returns whether a live render
    /// should follow.
    pub(crate) fn toggle_stage(&mut self, stage: PipelineStage) -> bool {
        match stage {
            PipelineStage::Clean => self.options.clean = !self.options.clean,
            PipelineStage::HeavyClean => self.options.heavy_clean = !self.options.heavy_clean,
            PipelineStage::LineBreaks => self.options.line_breaks = !self.options.line_breaks,
        }
        self.recompute();
        self.options.live_render
    }

    pub(crate) fn toggle_live(&mut self) -> ScoreMode {
        self.options.live_render = !self.options.live_render;
        let mode = self.options.score_mode();
        if mode == ScoreMode::Static {
            self.show_static();
        }
        mode
    }

    pub(crate) fn show_static(&mut self) {
        self.score = ScorePanel::Static {
            url: score_image_url(self.record.id),
        };
    }

    pub(crate) fn start_rendering(&mut self) {
        self.score = ScorePanel::Rendering;
        self.last_svg = None;
    }

    pub(crate) fn scroll_by(&mut self, offset: i32) {
        self.scroll = (i32::from(self.scroll) + offset).clamp(0, i32::from(u16::MAX)) as u16;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PipelineStage {
    Clean,
    HeavyClean,
    LineBreaks,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PAGE_SIZE;

    fn chant(id: i64, incipit: &str, office_part: &str, mode: &str) -> ChantRecord {
        ChantRecord {
            id,
            incipit: incipit.to_string(),
            office_part: office_part.to_string(),
            mode: mode.to_string(),
            ..ChantRecord::default()
        }
    }

    fn catalog(size: i64) -> Catalog {
        let records = (1..=size)
            .map(|id| {
                let part = if id % 2 == 0 { "in" } else { "gr" };
                chant(id, &format!("Chant {id}"), part, "1")
            })
            .collect();
        Catalog::new(records).unwrap()
    }

    #[test]
    fn matches_are_catalog_indices() {
        let catalog = catalog(6);
        let mut screen = CatalogScreen::new(&catalog, Duration::from_millis(300));
        screen.set_office_part(&catalog, Some("in".to_string()));
        assert_eq!(screen.matches, vec![1, 3, 5]);
        assert_eq!(screen.current_record(&catalog).unwrap().id, 2);
    }

    #[test]
    fn search_waits_for_debounce() {
        let catalog = catalog(20);
        let mut screen = CatalogScreen::new(&catalog, Duration::from_millis(300));
        let start = Instant::now();
        screen.search.query = "chant 1".to_string();
        screen.search_edited(start);

        assert!(!screen.apply_due_search(&catalog, start + Duration::from_millis(100)));
        assert_eq!(screen.matches.len(), 20);

        assert!(screen.apply_due_search(&catalog, start + Duration::from_millis(300)));
        // "Chant 1" and "Chant 10".."Chant 19".
        assert_eq!(screen.matches.len(), 11);
    }

    #[test]
    fn paging_resets_selection() {
        let catalog = catalog(250);
        let mut screen = CatalogScreen::new(&catalog, Duration::from_millis(300));
        assert_eq!(screen.page_indices().len(), PAGE_SIZE);
        screen.move_selection(5);
        assert!(screen.next_page());
        assert_eq!(screen.selected, 0);
        assert!(screen.next_page());
        assert_eq!(screen.page_indices().len(), 50);
        assert!(!screen.next_page());
        assert_eq!(screen.current_record(&catalog).unwrap().id, 201);
    }

    #[test]
    fn filter_change_returns_to_first_page() {
        let catalog = catalog(250);
        let mut screen = CatalogScreen::new(&catalog, Duration::from_millis(300));
        screen.next_page();
        screen.set_mode(&catalog, Some("1".to_string()));
        assert_eq!(screen.pager.page(), 1);
        screen.clear_filters(&catalog);
        assert!(screen.filter.is_empty());
        assert_eq!(screen.matches.len(), 250);
    }

    #[test]
    fn detail_recomputes_on_toggle() {
        let mut record = chant(9, "Alleluia", "al", "8");
        record.gabc = Some(r#"[["gabc", "(c4) AL(f)le(g)_lu(h)ia.(i)"]]"#.to_string());
        let mut detail = DetailScreen::new(record, ViewOptions::default());
        assert_eq!(detail.raw, "(c4) AL(f)le(g)_lu(h)ia.(i)");
        assert_eq!(detail.processed, "(c4) Al(f)le(g)_lu(h)ia.(i)");
        assert_eq!(detail.links.editors.len(), 4);

        assert!(!detail.toggle_stage(PipelineStage::Clean));
        assert_eq!(detail.processed, "(c4) Al(f)le(g)lu(h)ia.(i)");
    }

    #[test]
    fn detail_without_source_offers_only_gregobase() {
        let detail = DetailScreen::new(chant(3, "Kyrie", "ky", "1"), ViewOptions::default());
        assert!(!detail.has_source());
        assert!(detail.processed.is_empty());
        assert!(detail.links.editors.is_empty());
        assert_eq!(
            detail.score,
            ScorePanel::Static {
                url: "https://gregobase.selapa.net/chant_img.php?id=3".to_string()
            }
        );
    }

    #[test]
    fn live_toggle_switches_score_mode() {
        let mut detail = DetailScreen::new(chant(3, "Kyrie", "ky", "1"), ViewOptions::default());
        assert_eq!(detail.toggle_live(), ScoreMode::Live);
        detail.start_rendering();
        assert_eq!(detail.score, ScorePanel::Rendering);
        assert_eq!(detail.toggle_live(), ScoreMode::Static);
        assert!(matches!(detail.score, ScorePanel::Static { .. }));
    }
}
