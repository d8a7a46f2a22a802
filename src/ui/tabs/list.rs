use crate::models::{compare_grades, Student, GRADE_OPTIONS};
use crate::store::RecordStore;
use crate::ui::state::Command;
use crate::ui::tabs::form::StudentForm;
use crate::ui::widgets::{clamp_selection, step_selection, GradeFilter};
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use indexmap::IndexMap;

#[derive(Debug, Clone, Default)]
pub struct StudentListTab {
    pub filter: GradeFilter,
    pub selected: usize,
    /// Open while a student is being edited.
    pub editor: Option<StudentForm>,
}

/// Sort by grade, numeric-aware, then by name.
pub fn sorted_roster<'a>(students: &'a [Student], filter: &GradeFilter) -> Vec<&'a Student> {
    let mut rows: Vec<&Student> = students.iter().filter(|s| filter.matches(&s.grade)).collect();
    rows.sort_by(|a, b| {
        compare_grades(&a.grade, &b.grade).then_with(|| a.full_name.cmp(&b.full_name))
    });
    rows
}

/// Head count per grade in display order.
pub fn grade_totals(students: &[Student]) -> IndexMap<String, usize> {
    let mut grades: Vec<&str> = students.iter().map(|s| s.grade.as_str()).collect();
    grades.sort_by(|a, b| compare_grades(a, b));

    let mut totals = IndexMap::new();
    for grade in grades {
        *totals.entry(grade.to_string()).or_insert(0) += 1;
    }
    totals
}

impl StudentListTab {
    pub fn handle_key(&mut self, key: KeyEvent, store: &RecordStore, today: NaiveDate) -> Command {
        if let Some(editor) = self.editor.as_mut() {
            if key.code == KeyCode::Esc {
                self.editor = None;
                return Command::None;
            }
            return editor.handle_key(key, &store.schedules);
        }

        let rows = sorted_roster(&store.students, &self.filter);
        if step_selection(&mut self.selected, rows.len(), &key) {
            return Command::None;
        }
        if self.filter.handle_key(&GRADE_OPTIONS, &key) {
            self.selected = 0;
            return Command::None;
        }

        match key.code {
            KeyCode::Enter => {
                if let Some(student) = rows.get(self.selected) {
                    self.editor = Some(StudentForm::edit(student, today));
                }
                Command::None
            }
            KeyCode::Char('x') => Command::ExportRoster,
            _ => Command::None,
        }
    }

    /// Close the editor once its student has been written.
    pub fn saved(&mut self, stt: u32) {
        if self.editor.as_ref().is_some_and(|e| e.stt == stt) {
            self.editor = None;
        }
    }

    pub fn sync(&mut self, store: &RecordStore) {
        let len = sorted_roster(&store.students, &self.filter).len();
        clamp_selection(&mut self.selected, len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::{sample_student, ymd};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn store() -> RecordStore {
        RecordStore {
            students: vec![
                sample_student(1, "Chi", "10"),
                sample_student(2, "An", "2"),
                sample_student(3, "Bình", "2"),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_roster_sorted_by_grade_then_name() {
        let store = store();
        let names: Vec<&str> = sorted_roster(&store.students, &GradeFilter::All)
            .iter()
            .map(|s| s.full_name.as_str())
            .collect();
        assert_eq!(names, vec!["An", "Bình", "Chi"]);

        let totals = grade_totals(&store.students);
        assert_eq!(totals.get_index(0), Some((&"2".to_string(), &2)));
        assert_eq!(totals.get_index(1), Some((&"10".to_string(), &1)));
    }

    #[test]
    fn test_enter_opens_editor_and_esc_closes() {
        let store = store();
        let mut tab = StudentListTab::default();
        tab.handle_key(key(KeyCode::Down), &store, ymd(2024, 9, 1));
        tab.handle_key(key(KeyCode::Enter), &store, ymd(2024, 9, 1));
        assert_eq!(tab.editor.as_ref().map(|e| e.stt), Some(3));

        // typing goes to the editor, not the list
        assert!(matches!(
            tab.handle_key(key(KeyCode::Char('x')), &store, ymd(2024, 9, 1)),
            Command::None
        ));
        assert_eq!(tab.editor.as_ref().map(|e| e.full_name.as_str()), Some("Bìnhx"));

        tab.handle_key(key(KeyCode::Esc), &store, ymd(2024, 9, 1));
        assert!(tab.editor.is_none());
        assert!(matches!(
            tab.handle_key(key(KeyCode::Char('x')), &store, ymd(2024, 9, 1)),
            Command::ExportRoster
        ));
    }

    #[test]
    fn test_filter_resets_selection() {
        let store = store();
        let mut tab = StudentListTab::default();
        tab.handle_key(key(KeyCode::Down), &store, ymd(2024, 9, 1));
        tab.handle_key(key(KeyCode::Right), &store, ymd(2024, 9, 1));
        assert_eq!(tab.selected, 0);
        assert_eq!(tab.filter, GradeFilter::Grade("1".to_string()));
        assert!(sorted_roster(&store.students, &tab.filter).is_empty());
    }

    #[test]
    fn test_saved_closes_matching_editor() {
        let mut tab = StudentListTab {
            editor: Some(StudentForm::edit(&sample_student(4, "Dũng", "6"), ymd(2024, 9, 1))),
            ..Default::default()
        };
        tab.saved(5);
        assert!(tab.editor.is_some());
        tab.saved(4);
        assert!(tab.editor.is_none());
    }
}
