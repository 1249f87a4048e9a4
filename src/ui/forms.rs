use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Text typed into the incipit search bar. The catalog only sees it once
/// the debounce fires.
#[derive(Default, Clone)]
pub(crate) struct SearchInput {
    pub(crate) query: String,
}

impl SearchInput {
    /// Append a printable character. Control characters are ignored.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            false
        } else {
            self.query.push(ch);
            true
        }
    }

    pub(crate) fn backspace(&mut self) -> bool {
        self.query.pop().is_some()
    }

    pub(crate) fn build_line(&self, label: &str, placeholder: &str) -> Line<'static> {
        let label_span = Span::styled(
            format!("{label}: "),
            Style::default().add_modifier(Modifier::BOLD),
        );
        if self.query.is_empty() {
            Line::from(vec![
                label_span,
                Span::styled(placeholder.to_string(), Style::default().fg(Color::DarkGray)),
            ])
        } else {
            Line::from(vec![label_span, Span::raw(self.query.clone())])
        }
    }
}

/// One selectable row in a [`Picker`].
#[derive(Clone)]
pub(crate) struct PickerOption<T> {
    pub(crate) label: String,
    pub(crate) value: T,
}

/// Popup list used for the filter dropdowns and the link chooser.
#[derive(Clone)]
pub(crate) struct Picker<T> {
    pub(crate) title: String,
    pub(crate) options: Vec<PickerOption<T>>,
    pub(crate) selected: usize,
}

impl<T: PartialEq> Picker<T> {
    /// Build a picker with the row holding `current` preselected.
    pub(crate) fn new(title: String, options: Vec<PickerOption<T>>, current: Option<&T>) -> Self {
        let selected = current
            .and_then(|value| options.iter().position(|option| &option.value == value))
            .unwrap_or(0);
        Self {
            title,
            options,
            selected,
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.options.is_empty() {
            return;
        }
        let last = self.options.len() as isize - 1;
        self.selected = (self.selected as isize + offset).clamp(0, last) as usize;
    }

    pub(crate) fn current(&self) -> Option<&PickerOption<T>> {
        self.options.get(self.selected)
    }
}
