use crate::dates::{self, MonthKey};
use crate::error::{Result, RosterError};
use crate::models::{Student, StoredCells, TeacherSchedule, GRADE_OPTIONS};
use crate::schedule::{self, Reconciliation};
use crate::ui::state::{Command, Notice};
use crate::ui::widgets::{cycle_option, edit_text, is_ctrl, CalendarCursor};
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};
use std::collections::BTreeSet;

const MAX_TEXT: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    FullName,
    Grade,
    ClassName,
    Phone1,
    Phone2,
    StartDate,
    Schedule,
    Tuition,
}

impl FormField {
    pub fn label(&self) -> &'static str {
        match self {
            FormField::FullName => "Full name *",
            FormField::Grade => "Grade *",
            FormField::ClassName => "Class *",
            FormField::Phone1 => "Phone 1 *",
            FormField::Phone2 => "Phone 2",
            FormField::StartDate => "Start date",
            FormField::Schedule => "Schedule",
            FormField::Tuition => "Tuition",
        }
    }
}

const EDIT_FIELDS: [FormField; 7] = [
    FormField::FullName,
    FormField::Grade,
    FormField::ClassName,
    FormField::Phone1,
    FormField::Phone2,
    FormField::StartDate,
    FormField::Schedule,
];

const CREATE_FIELDS: [FormField; 8] = [
    FormField::FullName,
    FormField::Grade,
    FormField::ClassName,
    FormField::Phone1,
    FormField::Phone2,
    FormField::StartDate,
    FormField::Schedule,
    FormField::Tuition,
];

/// Editable copy of a student, shared by the add tab and the list editor.
#[derive(Debug, Clone)]
pub struct StudentForm {
    /// 0 while the student does not exist remotely.
    pub stt: u32,
    pub full_name: String,
    pub grade: String,
    pub class_name: String,
    pub phone1: String,
    pub phone2: String,
    /// ISO text as typed.
    pub start_date: String,
    pub schedule: BTreeSet<NaiveDate>,
    pub attendance: BTreeSet<NaiveDate>,
    pub tuition: BTreeSet<MonthKey>,
    /// Carried through from the edited student.
    pub stored: StoredCells,
    pub focus: FormField,
    pub calendar: CalendarCursor,
    /// Month under the cursor on the tuition grid.
    pub tuition_cursor: MonthKey,
    pub with_tuition: bool,
}

impl StudentForm {
    pub fn new_student(today: NaiveDate) -> Self {
        Self {
            stt: 0,
            full_name: String::new(),
            grade: String::new(),
            class_name: String::new(),
            phone1: String::new(),
            phone2: String::new(),
            start_date: dates::format_iso(today),
            schedule: BTreeSet::new(),
            attendance: BTreeSet::new(),
            tuition: BTreeSet::new(),
            stored: StoredCells::default(),
            focus: FormField::FullName,
            calendar: CalendarCursor::at(today),
            tuition_cursor: MonthKey::of(today),
            with_tuition: true,
        }
    }

    pub fn edit(student: &Student, today: NaiveDate) -> Self {
        Self {
            stt: student.stt,
            full_name: student.full_name.clone(),
            grade: student.grade.clone(),
            class_name: student.class_name.clone(),
            phone1: student.phone1.clone(),
            phone2: student.phone2.clone(),
            start_date: student.start_date.map(dates::format_iso).unwrap_or_default(),
            schedule: student.schedule.clone(),
            attendance: student.attendance.clone(),
            tuition: student.tuition.clone(),
            stored: student.stored.clone(),
            focus: FormField::FullName,
            calendar: CalendarCursor::at(student.start_date.unwrap_or(today)),
            tuition_cursor: MonthKey::of(today),
            with_tuition: false,
        }
    }

    pub fn fields(&self) -> &'static [FormField] {
        if self.with_tuition {
            &CREATE_FIELDS
        } else {
            &EDIT_FIELDS
        }
    }

    fn move_focus(&mut self, forward: bool) {
        let fields = self.fields();
        let index = fields.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (index + 1) % fields.len()
        } else {
            (index + fields.len() - 1) % fields.len()
        };
        self.focus = fields[next];
    }

    /// The start date, `None` when left blank.
    pub fn parsed_start(&self) -> Result<Option<NaiveDate>> {
        let text = self.start_date.trim();
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(dates::parse_date(text)?))
    }

    /// Validate and produce the student to send.
    pub fn build(&self) -> Result<Student> {
        let missing: Vec<&str> = [
            (&self.full_name, "full name"),
            (&self.grade, "grade"),
            (&self.class_name, "class"),
            (&self.phone1, "phone 1"),
        ]
        .iter()
        .filter(|(value, _)| value.trim().is_empty())
        .map(|(_, name)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(RosterError::Validation(format!(
                "Please fill in: {}",
                missing.join(", ")
            )));
        }

        Ok(Student {
            stt: self.stt,
            full_name: self.full_name.trim().to_string(),
            grade: self.grade.trim().to_string(),
            class_name: self.class_name.trim().to_string(),
            phone1: self.phone1.trim().to_string(),
            phone2: self.phone2.trim().to_string(),
            start_date: self.parsed_start()?,
            schedule: self.schedule.clone(),
            attendance: self.attendance.clone(),
            tuition: self.tuition.clone(),
            stored: self.stored.clone(),
        })
    }

    /// Merge the grade's teaching days from the start date on into the schedule.
    pub fn insert_template(&mut self, schedules: &[TeacherSchedule]) -> Notice {
        if self.grade.trim().is_empty() {
            return Notice::warning("Choose the student's grade first");
        }
        let start = match self.parsed_start() {
            Ok(start) => start,
            Err(e) => return Notice::warning(format!("Start date: {}", e)),
        };
        let template = match schedule::template_for(schedules, &self.grade) {
            Ok(template) => template,
            Err(e) => return Notice::warning(format!("Cannot insert: {}", e)),
        };

        match schedule::reconcile(&self.schedule, &template.days, start) {
            Reconciliation::NothingToInsert => Notice::info(format!(
                "Grade {} has no teaching days on or after the start date",
                template.grade
            )),
            Reconciliation::Merged {
                schedule,
                offered,
                added,
            } => {
                self.schedule = schedule;
                if let Some(first) = start.and_then(|s| template.days.range(s..).next().copied()) {
                    self.calendar = CalendarCursor::at(first);
                }
                Notice::info(format!(
                    "Inserted {} teaching days of grade {} ({} new)",
                    offered, template.grade, added
                ))
            }
        }
    }

    fn toggle_day(&mut self) -> Command {
        let start = match self.parsed_start() {
            Ok(start) => start,
            Err(e) => return Command::Notify(Notice::warning(format!("Start date: {}", e))),
        };
        let day = self.calendar.date();
        if !schedule::toggle_schedule_day(&mut self.schedule, day, start) {
            return Command::Notify(Notice::warning(format!(
                "{} is before the start date",
                dates::format_dmy(day)
            )));
        }
        Command::None
    }

    fn handle_tuition_key(&mut self, key: &KeyEvent) {
        let cursor = self.tuition_cursor;
        match key.code {
            KeyCode::Left => self.tuition_cursor = cursor.prev(),
            KeyCode::Right => self.tuition_cursor = cursor.next(),
            KeyCode::PageUp | KeyCode::Up => {
                self.tuition_cursor = MonthKey::new(cursor.year - 1, cursor.month).unwrap_or(cursor)
            }
            KeyCode::PageDown | KeyCode::Down => {
                self.tuition_cursor = MonthKey::new(cursor.year + 1, cursor.month).unwrap_or(cursor)
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                if !self.tuition.remove(&cursor) {
                    self.tuition.insert(cursor);
                }
            }
            _ => {}
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, schedules: &[TeacherSchedule]) -> Command {
        if is_ctrl(&key, 's') {
            return match self.build() {
                Ok(student) if self.stt == 0 => Command::CreateStudent(student),
                Ok(student) => Command::UpdateStudent(student),
                Err(e) => Command::Notify(Notice::warning(e.to_string())),
            };
        }
        if is_ctrl(&key, 't') {
            return Command::Notify(self.insert_template(schedules));
        }

        match key.code {
            KeyCode::Tab => {
                self.move_focus(true);
                return Command::None;
            }
            KeyCode::BackTab => {
                self.move_focus(false);
                return Command::None;
            }
            _ => {}
        }

        match self.focus {
            FormField::FullName => {
                edit_text(&mut self.full_name, &key, MAX_TEXT);
            }
            FormField::ClassName => {
                edit_text(&mut self.class_name, &key, MAX_TEXT);
            }
            FormField::Phone1 => {
                edit_text(&mut self.phone1, &key, MAX_TEXT);
            }
            FormField::Phone2 => {
                edit_text(&mut self.phone2, &key, MAX_TEXT);
            }
            FormField::StartDate => {
                edit_text(&mut self.start_date, &key, 10);
                if let Ok(Some(start)) = self.parsed_start() {
                    self.calendar = CalendarCursor::at(start);
                }
            }
            FormField::Grade => match key.code {
                KeyCode::Left => self.grade = cycle_option(&self.grade, &GRADE_OPTIONS, false),
                KeyCode::Right | KeyCode::Char(' ') => {
                    self.grade = cycle_option(&self.grade, &GRADE_OPTIONS, true)
                }
                KeyCode::Backspace => self.grade.clear(),
                _ => {}
            },
            FormField::Schedule => {
                if matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter) {
                    return self.toggle_day();
                }
                self.calendar.handle_key(&key);
            }
            FormField::Tuition => self.handle_tuition_key(&key),
        }

        Command::None
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

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(form: &mut StudentForm, text: &str) {
        for c in text.chars() {
            form.handle_key(key(KeyCode::Char(c)), &[]);
        }
    }

    fn template(grade: &str, days: &[NaiveDate]) -> TeacherSchedule {
        TeacherSchedule {
            stt: 1,
            grade: grade.to_string(),
            days: days.iter().copied().collect(),
        }
    }

    #[test]
    fn test_save_requires_fields() {
        let mut form = StudentForm::new_student(ymd(2024, 9, 1));
        match form.handle_key(ctrl('s'), &[]) {
            Command::Notify(notice) => assert!(notice.message.contains("full name")),
            other => panic!("unexpected command {:?}", other),
        }

        type_text(&mut form, "An");
        form.handle_key(key(KeyCode::Tab), &[]);
        form.handle_key(key(KeyCode::Right), &[]);
        assert_eq!(form.grade, "1");
        form.handle_key(key(KeyCode::Tab), &[]);
        type_text(&mut form, "1A");
        form.handle_key(key(KeyCode::Tab), &[]);
        type_text(&mut form, "0900");

        match form.handle_key(ctrl('s'), &[]) {
            Command::CreateStudent(student) => {
                assert_eq!(student.full_name, "An");
                assert_eq!(student.stt, 0);
                assert_eq!(student.start_date, Some(ymd(2024, 9, 1)));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_start_date_blocks_save() {
        let mut form = StudentForm::edit(&sample_student(3, "Chi", "7"), ymd(2024, 9, 1));
        form.start_date = "2024-13-01".to_string();
        assert!(matches!(
            form.handle_key(ctrl('s'), &[]),
            Command::Notify(_)
        ));

        form.start_date.clear();
        match form.handle_key(ctrl('s'), &[]) {
            Command::UpdateStudent(student) => {
                assert_eq!(student.stt, 3);
                assert_eq!(student.start_date, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_insert_template_requires_grade() {
        let mut form = StudentForm::new_student(ymd(2024, 9, 1));
        let notice = form.insert_template(&[template("6", &[ymd(2024, 9, 2)])]);
        assert!(notice.message.contains("grade"));
        assert!(form.schedule.is_empty());
    }

    #[test]
    fn test_insert_template_merges_from_start() {
        let mut form = StudentForm::new_student(ymd(2024, 9, 4));
        form.grade = "6".to_string();
        let schedules = [template(
            "6",
            &[ymd(2024, 9, 2), ymd(2024, 9, 4), ymd(2024, 9, 6)],
        )];

        form.insert_template(&schedules);
        assert_eq!(
            form.schedule,
            [ymd(2024, 9, 4), ymd(2024, 9, 6)].into_iter().collect()
        );

        // a second insertion adds nothing new
        let notice = form.insert_template(&schedules);
        assert!(notice.message.contains("0 new"));
    }

    #[test]
    fn test_insert_template_missing_or_empty() {
        let mut form = StudentForm::new_student(ymd(2024, 9, 4));
        form.grade = "6".to_string();
        assert!(form.insert_template(&[]).message.contains("grade 6"));

        let stale = [template("6", &[ymd(2024, 8, 1)])];
        let notice = form.insert_template(&stale);
        assert!(notice.message.contains("no teaching days"));
        assert!(form.schedule.is_empty());
    }

    #[test]
    fn test_calendar_refuses_days_before_start() {
        let mut form = StudentForm::new_student(ymd(2024, 9, 4));
        form.focus = FormField::Schedule;
        form.calendar = CalendarCursor::at(ymd(2024, 9, 3));
        assert!(matches!(
            form.handle_key(key(KeyCode::Char(' ')), &[]),
            Command::Notify(_)
        ));
        assert!(form.schedule.is_empty());

        form.handle_key(key(KeyCode::Right), &[]);
        form.handle_key(key(KeyCode::Char(' ')), &[]);
        assert!(form.schedule.contains(&ymd(2024, 9, 4)));
        form.handle_key(key(KeyCode::Enter), &[]);
        assert!(form.schedule.is_empty());
    }

    #[test]
    fn test_tuition_toggles_only_on_create() {
        let mut form = StudentForm::new_student(ymd(2024, 9, 4));
        form.focus = FormField::Tuition;
        form.handle_key(key(KeyCode::Left), &[]);
        form.handle_key(key(KeyCode::Char(' ')), &[]);
        assert!(form.tuition.contains(&MonthKey::new(2024, 8).unwrap()));

        let edit = StudentForm::edit(&sample_student(1, "An", "6"), ymd(2024, 9, 4));
        assert!(!edit.fields().contains(&FormField::Tuition));
    }

    #[test]
    fn test_edit_keeps_undecoded_cells() {
        use crate::models::StudentRecord;

        let record = StudentRecord {
            stt: Some(4),
            full_name: "Dũng".to_string(),
            grade: "8".to_string(),
            class_name: "8A".to_string(),
            phone1: "0901".to_string(),
            schedule: "2024-09-03, 2024-09-10".to_string(),
            ..Default::default()
        };
        let student = Student::from_record(record.clone());
        let mut form = StudentForm::edit(&student, ymd(2024, 9, 4));
        type_text(&mut form, " Lê");

        let built = form.build().unwrap();
        assert_eq!(built.full_name, "Dũng Lê");
        assert_eq!(built.to_record().schedule, record.schedule);
    }
}
