use crate::models::{TeacherSchedule, GRADES};
use crate::schedule;
use crate::store::RecordStore;
use crate::ui::state::{Command, Notice};
use crate::ui::widgets::{is_ctrl, CalendarCursor};
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct TeacherScheduleTab {
    /// Index into `GRADES`; nothing is editable until a grade is picked.
    pub grade: Option<usize>,
    pub days: BTreeSet<NaiveDate>,
    /// The grade's days as last loaded; `days` differs from it while edits are unsaved.
    loaded: BTreeSet<NaiveDate>,
    pub calendar: CalendarCursor,
}

impl TeacherScheduleTab {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            grade: None,
            days: BTreeSet::new(),
            loaded: BTreeSet::new(),
            calendar: CalendarCursor::at(today),
        }
    }

    pub fn grade(&self) -> Option<&'static str> {
        self.grade.and_then(|i| GRADES.get(i).copied())
    }

    fn cycle_grade(&mut self, forward: bool, store: &RecordStore) {
        let last = GRADES.len() - 1;
        self.grade = Some(match (self.grade, forward) {
            (None, true) => 0,
            (None, false) => last,
            (Some(i), true) => (i + 1) % GRADES.len(),
            (Some(i), false) => (i + last) % GRADES.len(),
        });
        self.loaded = self.stored_days(store);
        self.days = self.loaded.clone();
    }

    fn stored_days(&self, store: &RecordStore) -> BTreeSet<NaiveDate> {
        self.grade()
            .and_then(|grade| store.template_for(grade).ok())
            .map(|t| t.days.clone())
            .unwrap_or_default()
    }

    fn save(&self, store: &RecordStore) -> Command {
        let Some(grade) = self.grade() else {
            return Command::Notify(Notice::warning("Choose a grade first"));
        };
        let stt = store.template_for(grade).map(|t| t.stt).unwrap_or(0);
        Command::SaveTemplate(TeacherSchedule {
            stt,
            grade: grade.to_string(),
            days: self.days.clone(),
        })
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &RecordStore) -> Command {
        if is_ctrl(&key, 's') {
            return self.save(store);
        }

        match key.code {
            KeyCode::Tab => self.cycle_grade(true, store),
            KeyCode::BackTab => self.cycle_grade(false, store),
            KeyCode::Char(' ') | KeyCode::Enter => {
                if self.grade.is_none() {
                    return Command::Notify(Notice::warning("Choose a grade first"));
                }
                schedule::toggle_teaching_day(&mut self.days, self.calendar.date());
            }
            _ => {
                self.calendar.handle_key(&key);
            }
        }

        Command::None
    }

    /// Follow the grade's stored days after a reload unless there are unsaved edits.
    /// A grade without a template starts empty.
    pub fn sync(&mut self, store: &RecordStore) {
        let stored = self.stored_days(store);
        if self.days == self.loaded {
            self.days = stored.clone();
        }
        self.loaded = stored;
    }
}
