use std::io::{self, Write};
use std::mem;
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;
use open::that as open_link;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::export;
use crate::gabc::gabc_document;
use crate::i18n::{next_language, Translations};
use crate::links::score_image_url;
use crate::models::{ChantMode, ChantRecord, OfficePart};
use crate::render::{BackgroundEvent, NotationEngine, RenderDispatcher, RenderError, ScoreMode};

use super::forms::{Picker, PickerOption};
use super::helpers::{centered_rect, key_hints, office_part_badge, surface_error, toggle_line};
use super::screens::{CatalogScreen, DetailScreen, PipelineStage, ScorePanel, ViewOptions};

/// Footer space reserved for the status line and key hints.
const FOOTER_HEIGHT: u16 = 3;
/// Header with the search line and the active filters.
const HEADER_HEIGHT: u16 = 4;
/// How long confirmations like "Copied!" stay in the footer.
const TRANSIENT_STATUS: Duration = Duration::from_secs(2);

/// High-level navigation states.
enum Screen {
    Catalog,
    Detail(DetailScreen),
    /// A chant id that is not in the catalog.
    Missing(i64),
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    Searching,
    PickingFilter(FilterField, Picker<Option<String>>),
    ChoosingLink(Picker<String>),
}

#[derive(Clone, Copy)]
enum FilterField {
    OfficePart,
    Mode,
}

/// Holds the footer message text, its severity and when it disappears.
struct StatusMessage {
    text: String,
    kind: StatusKind,
    expires: Option<Instant>,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    catalog: Catalog,
    load_error: Option<String>,
    settings: Settings,
    translations: Translations,
    browser: CatalogScreen,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
    renderer: RenderDispatcher,
    events: Receiver<BackgroundEvent>,
    clipboard: Box<dyn Write>,
}

impl App {
    pub fn new(
        catalog: Catalog,
        settings: Settings,
        translations: Translations,
        engine: Arc<dyn NotationEngine>,
    ) -> Self {
        let (sender, events) = mpsc::channel();
        let renderer = RenderDispatcher::new(engine, settings.render_width_px, sender);
        let browser = CatalogScreen::new(&catalog, settings.debounce);
        Self {
            catalog,
            load_error: None,
            settings,
            translations,
            browser,
            screen: Screen::Catalog,
            mode: Mode::Normal,
            status: None,
            renderer,
            events,
            clipboard: Box::new(io::stdout()),
        }
    }

    /// Show `message` in place of the list; the catalog stays empty.
    pub fn with_load_error(mut self, message: String) -> Self {
        self.load_error = Some(message);
        self
    }

    /// Jump straight to a chant, as `--chant` does on start-up.
    pub fn open_chant(&mut self, chant_id: i64) {
        match self.catalog.require(chant_id) {
            Ok(record) => {
                let record = record.clone();
                self.show_detail(record);
            }
            Err(err) => {
                warn!(chant_id, error = %err, "requested chant is not in the catalog");
                self.screen = Screen::Missing(chant_id);
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        self.handle_key_at(code, Instant::now())
    }

    /// Returns `true` when the user asked to quit.
    pub(crate) fn handle_key_at(&mut self, code: KeyCode, now: Instant) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Searching => self.handle_search(code, now),
            Mode::PickingFilter(field, picker) => self.handle_filter_picker(code, field, picker),
            Mode::ChoosingLink(picker) => self.handle_link_picker(code, picker),
        };

        exit
    }

    /// Time-driven work: the search debounce and transient status expiry.
    pub fn tick(&mut self, now: Instant) {
        self.browser.apply_due_search(&self.catalog, now);

        let expired = self
            .status
            .as_ref()
            .and_then(|status| status.expires)
            .is_some_and(|expires| now >= expires);
        if expired {
            self.clear_status();
        }
    }

    /// Apply every result the background workers have posted so far.
    pub fn poll_background(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.apply_background_event(event);
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match self.screen {
            Screen::Catalog => self.handle_catalog_key(code, exit),
            Screen::Detail(_) => self.handle_detail_key(code, exit),
            Screen::Missing(_) => {
                match code {
                    KeyCode::Char('q') => *exit = true,
                    KeyCode::Esc | KeyCode::Backspace | KeyCode::Enter => self.back_to_catalog(),
                    KeyCode::Char('L') => self.cycle_language(),
                    _ => {}
                }
                Mode::Normal
            }
        }
    }

    fn handle_catalog_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => *exit = true,
            KeyCode::Up => self.browser.move_selection(-1),
            KeyCode::Down => self.browser.move_selection(1),
            KeyCode::Left | KeyCode::PageUp => {
                self.browser.prev_page();
            }
            KeyCode::Right | KeyCode::PageDown => {
                self.browser.next_page();
            }
            KeyCode::Enter => {
                if let Some(record) = self.browser.current_record(&self.catalog).cloned() {
                    self.show_detail(record);
                }
            }
            KeyCode::Char('f') | KeyCode::Char('/') => return Mode::Searching,
            KeyCode::Char('o') => {
                return Mode::PickingFilter(FilterField::OfficePart, self.office_part_picker())
            }
            KeyCode::Char('m') => return Mode::PickingFilter(FilterField::Mode, self.mode_picker()),
            KeyCode::Char('c') => {
                self.browser.clear_filters(&self.catalog);
                self.flash_status(self.translations.t("filters_cleared"), StatusKind::Info);
            }
            KeyCode::Char('L') => self.cycle_language(),
            _ => {}
        }
        Mode::Normal
    }

    fn handle_search(&mut self, code: KeyCode, now: Instant) -> Mode {
        match code {
            KeyCode::Enter | KeyCode::Esc => {
                self.browser.apply_search_now(&self.catalog);
                return Mode::Normal;
            }
            KeyCode::Backspace => {
                if self.browser.search.backspace() {
                    self.browser.search_edited(now);
                }
            }
            KeyCode::Char(ch) => {
                if self.browser.search.push_char(ch) {
                    self.browser.search_edited(now);
                }
            }
            _ => {}
        }
        Mode::Searching
    }

    fn handle_filter_picker(
        &mut self,
        code: KeyCode,
        field: FilterField,
        mut picker: Picker<Option<String>>,
    ) -> Mode {
        match code {
            KeyCode::Up => picker.move_selection(-1),
            KeyCode::Down => picker.move_selection(1),
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Enter => {
                let value = picker.current().and_then(|option| option.value.clone());
                match field {
                    FilterField::OfficePart => self.browser.set_office_part(&self.catalog, value),
                    FilterField::Mode => self.browser.set_mode(&self.catalog, value),
                }
                return Mode::Normal;
            }
            _ => {}
        }
        Mode::PickingFilter(field, picker)
    }

    fn handle_link_picker(&mut self, code: KeyCode, mut picker: Picker<String>) -> Mode {
        match code {
            KeyCode::Up => picker.move_selection(-1),
            KeyCode::Down => picker.move_selection(1),
            KeyCode::Esc => return Mode::Normal,
            KeyCode::Enter => {
                if let Some(option) = picker.current() {
                    let (label, url) = (option.label.clone(), option.value.clone());
                    self.open_target(&label, &url);
                }
                return Mode::Normal;
            }
            _ => {}
        }
        Mode::ChoosingLink(picker)
    }

    fn handle_detail_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc | KeyCode::Backspace => self.back_to_catalog(),
            KeyCode::Char('1') => self.toggle_stage(PipelineStage::Clean),
            KeyCode::Char('2') => self.toggle_stage(PipelineStage::HeavyClean),
            KeyCode::Char('3') => self.toggle_stage(PipelineStage::LineBreaks),
            KeyCode::Char('r') => self.toggle_live(),
            KeyCode::Char('d') => self.save_gabc(),
            KeyCode::Char('s') => self.save_svg(),
            KeyCode::Char('y') => self.copy_gabc(),
            KeyCode::Char('x') => {
                if let Some(picker) = self.link_picker() {
                    return Mode::ChoosingLink(picker);
                }
            }
            KeyCode::Char('v') => self.view_score(),
            KeyCode::Char('g') => {
                if let Screen::Detail(detail) = &self.screen {
                    let link = detail.links.gregobase.clone();
                    self.open_target(&link.label, &link.url);
                }
            }
            KeyCode::Up => self.scroll_detail(-1),
            KeyCode::Down => self.scroll_detail(1),
            KeyCode::PageUp => self.scroll_detail(-10),
            KeyCode::PageDown => self.scroll_detail(10),
            KeyCode::Char('L') => self.cycle_language(),
            _ => {}
        }
        Mode::Normal
    }

    fn show_detail(&mut self, record: ChantRecord) {
        info!(id = record.id, incipit = %record.incipit, "opening chant");
        let detail = DetailScreen::new(record, ViewOptions::from_pipeline(self.settings.pipeline));
        let live = detail.options.live_render;
        self.screen = Screen::Detail(detail);
        if live {
            self.start_live_render();
        }
    }

    fn back_to_catalog(&mut self) {
        self.renderer.invalidate();
        self.screen = Screen::Catalog;
    }

    fn start_live_render(&mut self) {
        if let Screen::Detail(detail) = &mut self.screen {
            detail.start_rendering();
            self.renderer
                .request(detail.record.id, detail.processed.clone());
        }
    }

    fn toggle_stage(&mut self, stage: PipelineStage) {
        let rerender = match &mut self.screen {
            Screen::Detail(detail) => detail.toggle_stage(stage),
            _ => false,
        };
        if rerender {
            self.start_live_render();
        }
    }

    fn toggle_live(&mut self) {
        let mode = match &mut self.screen {
            Screen::Detail(detail) => detail.toggle_live(),
            _ => return,
        };
        debug!(?mode, "score mode switched");
        match mode {
            ScoreMode::Live => self.start_live_render(),
            ScoreMode::Static => self.renderer.invalidate(),
        }
    }

    fn scroll_detail(&mut self, offset: i32) {
        if let Screen::Detail(detail) = &mut self.screen {
            detail.scroll_by(offset);
        }
    }

    fn save_gabc(&mut self) {
        let Screen::Detail(detail) = &self.screen else {
            return;
        };
        if !detail.has_source() {
            self.set_status(self.translations.t("no_gabc"), StatusKind::Error);
            return;
        }
        let result = export::save_gabc(
            &self.settings.download_dir,
            &detail.record,
            &detail.processed,
        );
        match result {
            Ok(path) => self.report_saved("gabc_saved", &path),
            Err(err) => self.report_save_error(&err),
        }
    }

    fn save_svg(&mut self) {
        let Screen::Detail(detail) = &self.screen else {
            return;
        };
        match detail.options.score_mode() {
            ScoreMode::Live => {
                let Some(svg) = detail.last_svg.as_deref() else {
                    self.set_status(self.translations.t("no_svg_to_download"), StatusKind::Error);
                    return;
                };
                match export::save_svg(&self.settings.download_dir, &detail.record, svg) {
                    Ok(path) => self.report_saved("svg_saved", &path),
                    Err(err) => self.report_save_error(&err),
                }
            }
            ScoreMode::Static => {
                export::spawn_svg_fetch(detail.record.id, self.renderer.sender());
                self.set_status(self.translations.t("fetching_svg"), StatusKind::Info);
            }
        }
    }

    fn copy_gabc(&mut self) {
        let Screen::Detail(detail) = &self.screen else {
            return;
        };
        if !detail.has_source() {
            self.set_status(self.translations.t("no_gabc"), StatusKind::Error);
            return;
        }
        let document = gabc_document(&detail.record, &detail.processed);
        match export::copy_to_clipboard(&mut self.clipboard, &document) {
            Ok(()) => self.flash_status(self.translations.t("copied"), StatusKind::Info),
            Err(err) => {
                warn!(error = %err, "clipboard copy failed");
                self.flash_status(self.translations.t("copy_error"), StatusKind::Error);
            }
        }
    }

    fn view_score(&mut self) {
        let Screen::Detail(detail) = &self.screen else {
            return;
        };
        let target = match (&detail.score, detail.options.score_mode()) {
            (_, ScoreMode::Static) => score_image_url(detail.record.id),
            (ScorePanel::Rendered { path }, ScoreMode::Live) => path.display().to_string(),
            _ => {
                self.set_status(self.translations.t("no_svg_to_download"), StatusKind::Error);
                return;
            }
        };
        let label = self.translations.t("score");
        self.open_target(&label, &target);
    }

    fn open_target(&mut self, label: &str, target: &str) {
        match open_link(target) {
            Ok(()) => {
                info!(target, "opened with system handler");
                self.flash_status(
                    self.translations.t_with("opened", &[("target", label)]),
                    StatusKind::Info,
                );
            }
            Err(err) => {
                warn!(target, error = %err, "failed to open");
                let message = surface_error(&err);
                self.set_status(
                    self.translations
                        .t_with("open_link_error", &[("message", message.as_str())]),
                    StatusKind::Error,
                );
            }
        }
    }

    fn report_saved(&mut self, key: &str, path: &Path) {
        let path = path.display().to_string();
        self.set_status(
            self.translations.t_with(key, &[("path", path.as_str())]),
            StatusKind::Info,
        );
    }

    fn report_save_error(&mut self, err: &export::ExportError) {
        warn!(error = %err, "export failed");
        let message = surface_error(err);
        self.set_status(
            self.translations.t_with("save_error", &[("message", message.as_str())]),
            StatusKind::Error,
        );
    }

    fn apply_background_event(&mut self, event: BackgroundEvent) {
        match event {
            BackgroundEvent::Rendered {
                ticket,
                chant_id,
                result,
            } => {
                if !self.renderer.is_current(ticket) {
                    debug!(chant_id, ?ticket, "discarding stale render");
                    return;
                }
                let Screen::Detail(detail) = &mut self.screen else {
                    return;
                };
                if detail.record.id != chant_id || !detail.options.live_render {
                    return;
                }
                match result {
                    Ok(svg) => {
                        match export::write_render_cache(&self.settings.cache_dir, chant_id, &svg) {
                            Ok(path) => detail.score = ScorePanel::Rendered { path },
                            Err(err) => {
                                warn!(chant_id, error = %err, "could not cache rendered score");
                                let message = surface_error(&err);
                                detail.score = ScorePanel::Unavailable(
                                    self.translations
                                        .t_with("render_gabc_error", &[("message", message.as_str())]),
                                );
                            }
                        }
                        detail.last_svg = Some(svg);
                    }
                    Err(err) => {
                        detail.score =
                            ScorePanel::Unavailable(render_failure_text(&self.translations, &err));
                    }
                }
            }
            BackgroundEvent::SvgFetched { chant_id, result } => {
                let record = self.catalog.get(chant_id).cloned();
                match (result, record) {
                    (Ok(svg), Some(record)) => {
                        match export::save_svg(&self.settings.download_dir, &record, &svg) {
                            Ok(path) => self.report_saved("svg_saved", &path),
                            Err(err) => self.report_save_error(&err),
                        }
                    }
                    (Ok(_), None) => warn!(chant_id, "fetched score for unknown chant"),
                    (Err(err), _) => {
                        let message = surface_error(&err);
                        self.set_status(
                            self.translations
                                .t_with("download_svg_error", &[("message", message.as_str())]),
                            StatusKind::Error,
                        );
                    }
                }
            }
        }
    }

    fn cycle_language(&mut self) {
        let next = next_language(self.translations.language());
        self.translations = Translations::load(&self.settings.locales_dir, next);
        info!(language = next, "language changed");
        self.flash_status(
            self.translations.t_with("language_changed", &[("lang", next)]),
            StatusKind::Info,
        );
    }

    fn office_part_picker(&self) -> Picker<Option<String>> {
        let mut options = vec![PickerOption {
            label: self.translations.t("all_office_parts"),
            value: None,
        }];
        options.extend(self.catalog.office_part_codes().into_iter().map(|code| {
            PickerOption {
                label: OfficePart::from_code(&code).label().to_string(),
                value: Some(code),
            }
        }));
        Picker::new(
            self.translations.t("office_part"),
            options,
            Some(&self.browser.filter.office_part),
        )
    }

    fn mode_picker(&self) -> Picker<Option<String>> {
        let mut options = vec![PickerOption {
            label: self.translations.t("all_modes"),
            value: None,
        }];
        options.extend(self.catalog.mode_codes().into_iter().map(|code| PickerOption {
            label: ChantMode::from_code(&code).to_string(),
            value: Some(code),
        }));
        Picker::new(
            self.translations.t("mode"),
            options,
            Some(&self.browser.filter.mode),
        )
    }

    fn link_picker(&self) -> Option<Picker<String>> {
        let Screen::Detail(detail) = &self.screen else {
            return None;
        };
        let options = detail
            .links
            .all()
            .into_iter()
            .map(|link| PickerOption {
                label: link.label.clone(),
                value: link.url.clone(),
            })
            .collect();
        Some(Picker::new(self.translations.t("links_title"), options, None))
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match &self.screen {
            Screen::Catalog => self.draw_catalog(frame, content_area),
            Screen::Detail(detail) => self.draw_detail(frame, content_area, detail),
            Screen::Missing(chant_id) => self.draw_missing(frame, content_area, *chant_id),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::PickingFilter(_, picker) => self.draw_picker(frame, area, picker),
            Mode::ChoosingLink(picker) => self.draw_picker(frame, area, picker),
            Mode::Normal | Mode::Searching => {}
        }
    }

    fn draw_catalog(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(area);

        self.draw_catalog_header(frame, chunks[0]);

        if let Some(message) = &self.load_error {
            let text = self
                .translations
                .t_with("loading_error", &[("message", message.as_str())]);
            let paragraph = Paragraph::new(text)
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, chunks[2]);
            return;
        }

        let pager = &self.browser.pager;
        let count = pager.total().to_string();
        let page = pager.page().to_string();
        let pages = pager.page_count().to_string();
        let summary = Line::from(vec![
            Span::styled(
                self.translations
                    .t_with("search_results_found", &[("count", count.as_str())]),
                Style::default().fg(Color::Gray),
            ),
            Span::raw("   "),
            Span::raw(self.translations.t_with(
                "page_info",
                &[("currentPage", page.as_str()), ("totalPages", pages.as_str())],
            )),
        ]);
        frame.render_widget(Paragraph::new(summary), chunks[1]);

        let indices = self.browser.page_indices();
        if indices.is_empty() {
            let paragraph = Paragraph::new(self.translations.t("no_results"))
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            frame.render_widget(paragraph, chunks[2]);
            return;
        }

        let records = self.catalog.records();
        let items: Vec<ListItem> = indices
            .iter()
            .filter_map(|&index| records.get(index))
            .map(|record| ListItem::new(self.catalog_row(record)))
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::NONE))
            .highlight_style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(Some(self.browser.selected));
        frame.render_stateful_widget(list, chunks[2], &mut list_state);
    }

    fn draw_catalog_header(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.translations.t("app_title"));
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let search_label = self.translations.t("search");
        let search_line = self
            .browser
            .search
            .build_line(&search_label, &self.translations.t("search_placeholder"));

        let filter = &self.browser.filter;
        let office_part = filter
            .office_part
            .as_deref()
            .map(|code| OfficePart::from_code(code).label().to_string())
            .unwrap_or_else(|| self.translations.t("all_office_parts"));
        let mode = filter
            .mode
            .as_deref()
            .map(|code| ChantMode::from_code(code).to_string())
            .unwrap_or_else(|| self.translations.t("all_modes"));
        let label_style = Style::default().add_modifier(Modifier::BOLD);
        let filter_line = Line::from(vec![
            Span::styled(format!("{}: ", self.translations.t("office_part")), label_style),
            Span::raw(office_part),
            Span::raw("   "),
            Span::styled(format!("{}: ", self.translations.t("mode")), label_style),
            Span::raw(mode),
        ]);

        frame.render_widget(Paragraph::new(vec![search_line, filter_line]), inner);

        if matches!(self.mode, Mode::Searching) && inner.height > 0 {
            let offset = search_label.chars().count() + 2 + self.browser.search.query.chars().count();
            let cursor_x = (inner.x + offset as u16).min(inner.right().saturating_sub(1));
            frame.set_cursor_position((cursor_x, inner.y));
        }
    }

    fn catalog_row(&self, record: &ChantRecord) -> Line<'static> {
        let mut spans = vec![
            office_part_badge(&record.office_part()),
            Span::raw(" "),
            Span::raw(record.display_title().to_string()),
        ];
        if !record.mode.is_empty() {
            spans.push(Span::styled(
                format!("  {} {}", self.translations.t("mode"), record.mode()),
                Style::default().fg(Color::Gray),
            ));
        }
        if let Some(version) = record.version.as_deref().filter(|v| !v.trim().is_empty()) {
            spans.push(Span::styled(
                format!("  {version}"),
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    }

    fn draw_detail(&self, frame: &mut Frame, area: Rect, detail: &DetailScreen) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(6),
                Constraint::Length(6),
                Constraint::Length(5),
            ])
            .split(columns[0]);

        self.draw_details_card(frame, left[0], &detail.record);

        let toggles = vec![
            toggle_line("1", &self.translations.t("clean_gabc"), detail.options.clean),
            toggle_line(
                "2",
                &self.translations.t("heavy_clean_gabc"),
                detail.options.heavy_clean,
            ),
            toggle_line("3", &self.translations.t("line_breaks"), detail.options.line_breaks),
            toggle_line("r", &self.translations.t("live_render"), detail.options.live_render),
        ];
        frame.render_widget(
            Paragraph::new(toggles).block(Block::default().borders(Borders::ALL)),
            left[1],
        );

        let (score_text, score_style) = match &detail.score {
            ScorePanel::Static { url } => (
                self.translations.t_with("static_image", &[("url", url.as_str())]),
                Style::default(),
            ),
            ScorePanel::Rendering => (
                self.translations.t("rendering_score"),
                Style::default().fg(Color::Yellow),
            ),
            ScorePanel::Rendered { path } => (
                self.translations.t_with(
                    "score_rendered",
                    &[("path", path.display().to_string().as_str())],
                ),
                Style::default().fg(Color::Green),
            ),
            ScorePanel::Unavailable(message) => {
                (message.clone(), Style::default().fg(Color::Red))
            }
        };
        let score = Paragraph::new(score_text)
            .style(score_style)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(self.translations.t("score")),
            );
        frame.render_widget(score, left[2]);

        let source_block = Block::default()
            .borders(Borders::ALL)
            .title(self.translations.t("gabc_source"));
        let source = if detail.has_source() {
            Paragraph::new(detail.processed.clone())
                .scroll((detail.scroll, 0))
                .wrap(Wrap { trim: false })
        } else {
            Paragraph::new(self.translations.t("no_gabc"))
                .style(Style::default().fg(Color::DarkGray))
        };
        frame.render_widget(source.block(source_block), columns[1]);
    }

    fn draw_details_card(&self, frame: &mut Frame, area: Rect, record: &ChantRecord) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.translations.t("details"));

        let mut lines = vec![
            Line::from(Span::styled(
                record.display_title().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(office_part_badge(&record.office_part())),
            Line::from(""),
        ];

        let label_style = Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::BOLD);
        let mode = record.mode().to_string();
        let fields = [
            ("mode", Some(mode.as_str())),
            ("version", record.version.as_deref()),
            ("transcriber", record.transcriber.as_deref()),
            ("commentary", record.commentary.as_deref()),
        ];
        for (key, value) in fields {
            let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
                continue;
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", self.translations.t(key)), label_style),
                Span::raw(value.to_string()),
            ]));
        }

        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_missing(&self, frame: &mut Frame, area: Rect, chant_id: i64) {
        let id = chant_id.to_string();
        let paragraph = Paragraph::new(
            self.translations
                .t_with("chant_not_found", &[("chantId", id.as_str())]),
        )
        .style(Style::default().fg(Color::Red))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(self.translations.t("error")),
        );
        frame.render_widget(paragraph, area);
    }

    fn draw_picker<T>(&self, frame: &mut Frame, area: Rect, picker: &Picker<T>) {
        let popup_area = centered_rect(50, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(picker.title.clone())
            .borders(Borders::ALL);
        let items: Vec<ListItem> = picker
            .options
            .iter()
            .map(|option| ListItem::new(option.label.clone()))
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().fg(Color::Yellow))
            .highlight_symbol("▶ ");

        let mut list_state = ListState::default();
        list_state.select(Some(picker.selected));
        frame.render_stateful_widget(list, popup_area, &mut list_state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let t = |key: &str| self.translations.t(key);
        match (&self.screen, &self.mode) {
            (_, Mode::PickingFilter(..)) | (_, Mode::ChoosingLink(_)) => key_hints(&[
                ("↑↓", t("key_select")),
                ("Enter", t("key_open")),
                ("Esc", t("key_cancel")),
            ]),
            (_, Mode::Searching) => {
                key_hints(&[("Enter", t("key_search")), ("Esc", t("key_back"))])
            }
            (Screen::Detail(_), _) => key_hints(&[
                ("1/2/3", t("key_toggles")),
                ("r", t("key_live")),
                ("d", t("key_save_gabc")),
                ("s", t("key_save_svg")),
                ("y", t("key_copy")),
                ("x", t("key_links")),
                ("v", t("key_view")),
                ("g", t("key_gregobase")),
                ("L", t("key_language")),
                ("Esc", t("key_back")),
                ("q", t("key_quit")),
            ]),
            (Screen::Missing(_), _) => key_hints(&[("Esc", t("key_back")), ("q", t("key_quit"))]),
            (Screen::Catalog, _) => key_hints(&[
                ("↑↓", t("key_select")),
                ("Enter", t("key_open")),
                ("f", t("key_search")),
                ("o", t("key_office_part")),
                ("m", t("key_mode")),
                ("c", t("key_clear")),
                ("←→", t("key_page")),
                ("L", t("key_language")),
                ("q", t("key_quit")),
            ]),
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
            expires: None,
        });
    }

    /// Status that clears itself after [`TRANSIENT_STATUS`].
    fn flash_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
            expires: Some(Instant::now() + TRANSIENT_STATUS),
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }
}

fn render_failure_text(translations: &Translations, err: &RenderError) -> String {
    match err {
        RenderError::EngineUnavailable(_) => translations.t("score_unavailable_exsurge_error"),
        RenderError::Layout(message) => {
            translations.t_with("render_gabc_error", &[("message", message.as_str())])
        }
        RenderError::Io(io_err) => {
            let message = io_err.to_string();
            translations.t_with("render_gabc_error", &[("message", message.as_str())])
        }
    }
}
