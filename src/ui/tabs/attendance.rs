use crate::dates::{self, DateError};
use crate::models::{Student, ENROLLED_GRADES};
use crate::store::RecordStore;
use crate::ui::state::{Command, Notice};
use crate::ui::widgets::{clamp_selection, edit_text, is_ctrl, step_selection, GradeFilter};
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use indexmap::IndexSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceMode {
    Today,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceFocus {
    List,
    Search,
    Date,
}

#[derive(Debug, Clone)]
pub struct AttendanceTab {
    pub mode: AttendanceMode,
    /// ISO date used in history mode.
    pub date_input: String,
    pub search: String,
    pub filter: GradeFilter,
    pub selected: usize,
    /// Students whose absence flag flips for the active day on save, in toggle order.
    /// Cleared whenever the active day changes.
    pub pending: IndexSet<u32>,
    pub focus: AttendanceFocus,
}

impl AttendanceTab {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            mode: AttendanceMode::Today,
            date_input: dates::format_iso(today),
            search: String::new(),
            filter: GradeFilter::All,
            selected: 0,
            pending: IndexSet::new(),
            focus: AttendanceFocus::List,
        }
    }

    pub fn active_day(&self, today: NaiveDate) -> Result<NaiveDate, DateError> {
        match self.mode {
            AttendanceMode::Today => Ok(today),
            AttendanceMode::History => dates::parse_date(self.date_input.trim()),
        }
    }

    pub fn visible<'a>(&self, students: &'a [Student]) -> Vec<&'a Student> {
        students
            .iter()
            .filter(|s| self.filter.matches(&s.grade) && s.matches(&self.search))
            .collect()
    }

    /// Absence as it will be after saving.
    pub fn marked_absent(&self, student: &Student, day: NaiveDate) -> bool {
        student.is_absent_on(day) != self.pending.contains(&student.stt)
    }

    fn toggle_pending(&mut self, stt: u32) {
        if !self.pending.shift_remove(&stt) {
            self.pending.insert(stt);
        }
    }

    fn next_focus(&self) -> AttendanceFocus {
        match (self.focus, self.mode) {
            (AttendanceFocus::List, _) => AttendanceFocus::Search,
            (AttendanceFocus::Search, AttendanceMode::History) => AttendanceFocus::Date,
            _ => AttendanceFocus::List,
        }
    }

    fn save(&self, today: NaiveDate) -> Command {
        if self.pending.is_empty() {
            return Command::Notify(Notice::info("No attendance changes to save"));
        }
        match self.active_day(today) {
            Ok(day) => Command::RecordAbsences {
                day,
                stts: self.pending.iter().copied().collect(),
            },
            Err(e) => Command::Notify(Notice::warning(format!("Attendance date: {}", e))),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &RecordStore, today: NaiveDate) -> Command {
        if is_ctrl(&key, 's') {
            return self.save(today);
        }

        match key.code {
            KeyCode::Tab => {
                self.focus = self.next_focus();
                return Command::None;
            }
            KeyCode::Esc => {
                self.focus = AttendanceFocus::List;
                return Command::None;
            }
            _ => {}
        }

        match self.focus {
            AttendanceFocus::Search => {
                if key.code == KeyCode::Enter {
                    self.focus = AttendanceFocus::List;
                } else if edit_text(&mut self.search, &key, 40) {
                    self.selected = 0;
                }
            }
            AttendanceFocus::Date => {
                if key.code == KeyCode::Enter {
                    self.focus = AttendanceFocus::List;
                } else if edit_text(&mut self.date_input, &key, 10) {
                    self.pending.clear();
                }
            }
            AttendanceFocus::List => {
                let rows = self.visible(&store.students);
                if step_selection(&mut self.selected, rows.len(), &key) {
                    return Command::None;
                }
                if self.filter.handle_key(&ENROLLED_GRADES, &key) {
                    self.selected = 0;
                    return Command::None;
                }
                match key.code {
                    KeyCode::Char(' ') | KeyCode::Enter => {
                        if let Some(stt) = rows.get(self.selected).map(|s| s.stt) {
                            self.toggle_pending(stt);
                        }
                    }
                    KeyCode::Char('m') => {
                        self.mode = match self.mode {
                            AttendanceMode::Today => AttendanceMode::History,
                            AttendanceMode::History => AttendanceMode::Today,
                        };
                        self.pending.clear();
                    }
                    _ => {}
                }
            }
        }

        Command::None
    }

    pub fn sync(&mut self, store: &RecordStore) {
        self.pending.retain(|stt| store.student(*stt).is_some());
        let len = self.visible(&store.students).len();
        clamp_selection(&mut self.selected, len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PRIVATE_TUTORING;
    use crate::store::tests::{sample_student, ymd};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn store() -> RecordStore {
        let mut absent = sample_student(2, "Bình", "6");
        absent.attendance.insert(ymd(2024, 9, 10));
        RecordStore {
            students: vec![sample_student(1, "An", "6"), absent, sample_student(3, "Chi", "7")],
            ..Default::default()
        }
    }

    #[test]
    fn test_save_without_changes_notifies() {
        let tab = AttendanceTab::new(ymd(2024, 9, 10));
        assert!(matches!(tab.save(ymd(2024, 9, 10)), Command::Notify(_)));
    }

    #[test]
    fn test_toggle_and_save_today() {
        let store = store();
        let today = ymd(2024, 9, 10);
        let mut tab = AttendanceTab::new(today);

        tab.handle_key(key(KeyCode::Char(' ')), &store, today);
        tab.handle_key(key(KeyCode::Down), &store, today);
        tab.handle_key(key(KeyCode::Char(' ')), &store, today);

        assert!(tab.marked_absent(&store.students[0], today));
        // already absent, toggled back to present
        assert!(!tab.marked_absent(&store.students[1], today));

        match tab.handle_key(ctrl('s'), &store, today) {
            Command::RecordAbsences { day, stts } => {
                assert_eq!(day, today);
                assert_eq!(stts, vec![1, 2]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_double_toggle_clears_pending() {
        let store = store();
        let today = ymd(2024, 9, 10);
        let mut tab = AttendanceTab::new(today);
        tab.handle_key(key(KeyCode::Char(' ')), &store, today);
        tab.handle_key(key(KeyCode::Char(' ')), &store, today);
        assert!(tab.pending.is_empty());
    }

    #[test]
    fn test_history_mode_uses_typed_date() {
        let store = store();
        let today = ymd(2024, 9, 10);
        let mut tab = AttendanceTab::new(today);

        tab.handle_key(key(KeyCode::Char('m')), &store, today);
        assert_eq!(tab.mode, AttendanceMode::History);
        tab.handle_key(key(KeyCode::Tab), &store, today);
        tab.handle_key(key(KeyCode::Tab), &store, today);
        assert_eq!(tab.focus, AttendanceFocus::Date);
        for _ in 0..2 {
            tab.handle_key(key(KeyCode::Backspace), &store, today);
        }
        for c in "03".chars() {
            tab.handle_key(key(KeyCode::Char(c)), &store, today);
        }
        tab.handle_key(key(KeyCode::Enter), &store, today);
        tab.handle_key(key(KeyCode::Char(' ')), &store, today);

        match tab.handle_key(ctrl('s'), &store, today) {
            Command::RecordAbsences { day, .. } => assert_eq!(day, ymd(2024, 9, 3)),
            other => panic!("unexpected command {:?}", other),
        }

        tab.date_input = "not a date".to_string();
        assert!(matches!(tab.save(today), Command::Notify(_)));
    }

    #[test]
    fn test_changing_day_drops_pending_toggles() {
        let store = store();
        let today = ymd(2024, 9, 10);
        let mut tab = AttendanceTab::new(today);

        tab.handle_key(key(KeyCode::Char(' ')), &store, today);
        tab.handle_key(key(KeyCode::Char('m')), &store, today);
        assert!(tab.pending.is_empty());

        tab.handle_key(key(KeyCode::Char(' ')), &store, today);
        tab.handle_key(key(KeyCode::Tab), &store, today);
        tab.handle_key(key(KeyCode::Tab), &store, today);
        tab.handle_key(key(KeyCode::Backspace), &store, today);
        tab.handle_key(key(KeyCode::Char('3')), &store, today);
        assert_eq!(tab.date_input, "2024-09-13");
        assert!(tab.pending.is_empty());
        assert!(matches!(tab.handle_key(ctrl('s'), &store, today), Command::Notify(_)));
    }

    #[test]
    fn test_grade_filter_reaches_private_tutoring() {
        let store = store();
        let today = ymd(2024, 9, 10);
        let mut tab = AttendanceTab::new(today);
        tab.handle_key(key(KeyCode::Left), &store, today);
        assert_eq!(tab.filter, GradeFilter::Grade(PRIVATE_TUTORING.to_string()));
        assert!(tab.visible(&store.students).is_empty());
    }

    #[test]
    fn test_search_and_grade_filter() {
        let store = store();
        let today = ymd(2024, 9, 10);
        let mut tab = AttendanceTab::new(today);

        tab.handle_key(key(KeyCode::Tab), &store, today);
        for c in "chi".chars() {
            tab.handle_key(key(KeyCode::Char(c)), &store, today);
        }
        assert_eq!(tab.visible(&store.students).len(), 1);

        tab.search.clear();
        tab.handle_key(key(KeyCode::Esc), &store, today);
        // All -> 1 -> ... -> 6
        for _ in 0..6 {
            tab.handle_key(key(KeyCode::Right), &store, today);
        }
        assert_eq!(tab.filter, GradeFilter::Grade("6".to_string()));
        assert_eq!(tab.visible(&store.students).len(), 2);
    }
}
