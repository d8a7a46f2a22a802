use crate::dates::MonthKey;
use crate::models::{Student, GRADE_OPTIONS};
use crate::store::RecordStore;
use crate::ui::state::{Command, Notice};
use crate::ui::widgets::{clamp_selection, edit_text, is_ctrl, step_selection, GradeFilter};
use chrono::{Datelike, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuitionFocus {
    List,
    Search,
    Months,
}

#[derive(Debug, Clone)]
pub struct TuitionTab {
    pub search: String,
    pub filter: GradeFilter,
    pub cursor: usize,
    pub selected_stt: Option<u32>,
    pub year: i32,
    /// Month (1-12) under the cursor on the year grid.
    pub month: u32,
    /// Local copy of the selected student's paid months.
    pub paid: BTreeSet<MonthKey>,
    /// Paid months as last loaded; `paid` differs from it while edits are unsaved.
    loaded: BTreeSet<MonthKey>,
    pub focus: TuitionFocus,
}

impl TuitionTab {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            search: String::new(),
            filter: GradeFilter::All,
            cursor: 0,
            selected_stt: None,
            year: today.year(),
            month: today.month(),
            paid: BTreeSet::new(),
            loaded: BTreeSet::new(),
            focus: TuitionFocus::List,
        }
    }

    pub fn visible<'a>(&self, students: &'a [Student]) -> Vec<&'a Student> {
        students
            .iter()
            .filter(|s| self.filter.matches(&s.grade) && s.matches(&self.search))
            .collect()
    }

    pub fn selected<'a>(&self, store: &'a RecordStore) -> Option<&'a Student> {
        store.student(self.selected_stt?)
    }

    pub fn has_changes(&self, store: &RecordStore) -> bool {
        self.selected(store).is_some_and(|s| s.tuition != self.paid)
    }

    fn select(&mut self, student: &Student) {
        self.selected_stt = Some(student.stt);
        self.paid = student.tuition.clone();
        self.loaded = student.tuition.clone();
        self.focus = TuitionFocus::Months;
    }

    fn toggle_month(&mut self) {
        if let Some(month) = MonthKey::new(self.year, self.month) {
            if !self.paid.remove(&month) {
                self.paid.insert(month);
            }
        }
    }

    fn save(&self, store: &RecordStore) -> Command {
        let Some(student) = self.selected(store) else {
            return Command::Notify(Notice::warning("Select a student first"));
        };
        if student.tuition == self.paid {
            return Command::Notify(Notice::info("No tuition changes to save"));
        }
        let mut updated = student.clone();
        updated.tuition = self.paid.clone();
        Command::UpdateStudent(updated)
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &RecordStore) -> Command {
        if is_ctrl(&key, 's') {
            return self.save(store);
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = match self.focus {
                    TuitionFocus::List => TuitionFocus::Search,
                    TuitionFocus::Search if self.selected_stt.is_some() => TuitionFocus::Months,
                    _ => TuitionFocus::List,
                };
                return Command::None;
            }
            KeyCode::Esc => {
                self.focus = TuitionFocus::List;
                return Command::None;
            }
            _ => {}
        }

        match self.focus {
            TuitionFocus::Search => {
                if key.code == KeyCode::Enter {
                    self.focus = TuitionFocus::List;
                } else if edit_text(&mut self.search, &key, 40) {
                    self.cursor = 0;
                }
            }
            TuitionFocus::List => {
                let rows = self.visible(&store.students);
                if step_selection(&mut self.cursor, rows.len(), &key) {
                    return Command::None;
                }
                if self.filter.handle_key(&GRADE_OPTIONS, &key) {
                    self.cursor = 0;
                    return Command::None;
                }
                if key.code == KeyCode::Enter {
                    if let Some(student) = rows.get(self.cursor).copied() {
                        self.select(student);
                    }
                }
            }
            TuitionFocus::Months => match key.code {
                KeyCode::Left => self.month = if self.month == 1 { 12 } else { self.month - 1 },
                KeyCode::Right => self.month = if self.month == 12 { 1 } else { self.month + 1 },
                KeyCode::Up => self.month = if self.month <= 3 { self.month + 9 } else { self.month - 3 },
                KeyCode::Down => self.month = if self.month > 9 { self.month - 9 } else { self.month + 3 },
                KeyCode::PageUp => self.year -= 1,
                KeyCode::PageDown => self.year += 1,
                KeyCode::Char(' ') | KeyCode::Enter => self.toggle_month(),
                _ => {}
            },
        }

        Command::None
    }

    /// Refresh the local copy after a reload unless it holds unsaved edits,
    /// dropping a student that vanished.
    pub fn sync(&mut self, store: &RecordStore) {
        match self.selected(store).map(|s| s.tuition.clone()) {
            Some(stored) => {
                if self.paid == self.loaded {
                    self.paid = stored.clone();
                }
                self.loaded = stored;
            }
            None => {
                self.selected_stt = None;
                self.paid.clear();
                self.loaded.clear();
                if self.focus == TuitionFocus::Months {
                    self.focus = TuitionFocus::List;
                }
            }
        }
        let len = self.visible(&store.students).len();
        clamp_selection(&mut self.cursor, len);
    }
}
