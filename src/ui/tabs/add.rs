use crate::store::RecordStore;
use crate::ui::state::Command;
use crate::ui::tabs::form::StudentForm;
use chrono::NaiveDate;
use crossterm::event::KeyEvent;

#[derive(Debug, Clone)]
pub struct AddStudentTab {
    pub form: StudentForm,
}

impl AddStudentTab {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            form: StudentForm::new_student(today),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &RecordStore) -> Command {
        self.form.handle_key(key, &store.schedules)
    }

    /// Clear the form after a successful create.
    pub fn reset(&mut self, today: NaiveDate) {
        self.form = StudentForm::new_student(today);
    }
}
