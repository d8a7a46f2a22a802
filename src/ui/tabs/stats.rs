use crate::models::Student;
use crate::parser::ReportBlock;
use crate::store::RecordStore;
use crate::ui::state::{Command, Notice};
use crate::ui::widgets::{clamp_selection, step_selection};
use crossterm::event::{KeyCode, KeyEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Class,
    Student,
}

#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub kind: ReportKind,
    /// Used in the export filename.
    pub label: String,
    pub blocks: Vec<ReportBlock>,
}

#[derive(Debug, Clone, Default)]
pub struct StatisticsTab {
    pub selected: usize,
    pub report: Option<GeneratedReport>,
    pub scroll: u16,
}

/// Students in name order for the analysis picker.
pub fn by_name(students: &[Student]) -> Vec<&Student> {
    let mut rows: Vec<&Student> = students.iter().collect();
    rows.sort_by(|a, b| a.full_name.cmp(&b.full_name));
    rows
}

impl StatisticsTab {
    pub fn selected_student<'a>(&self, store: &'a RecordStore) -> Option<&'a Student> {
        by_name(&store.students).get(self.selected).copied()
    }

    pub fn show_report(&mut self, report: GeneratedReport) {
        self.report = Some(report);
        self.scroll = 0;
    }

    pub fn handle_key(&mut self, key: KeyEvent, store: &RecordStore) -> Command {
        if self.report.is_some() {
            match key.code {
                KeyCode::Up => {
                    self.scroll = self.scroll.saturating_sub(1);
                    return Command::None;
                }
                KeyCode::Down => {
                    self.scroll = self.scroll.saturating_add(1);
                    return Command::None;
                }
                KeyCode::PageUp => {
                    self.scroll = self.scroll.saturating_sub(10);
                    return Command::None;
                }
                KeyCode::PageDown => {
                    self.scroll = self.scroll.saturating_add(10);
                    return Command::None;
                }
                KeyCode::Esc => {
                    self.report = None;
                    return Command::None;
                }
                KeyCode::Char('e') => return Command::ExportReport,
                _ => {}
            }
        } else if step_selection(&mut self.selected, store.students.len(), &key) {
            return Command::None;
        }

        match key.code {
            KeyCode::Char('g') => Command::ClassReport,
            KeyCode::Char('r') => match self.selected_student(store) {
                Some(student) => Command::StudentReport(student.stt),
                None => Command::Notify(Notice::warning("No student selected")),
            },
            KeyCode::Char('e') => Command::Notify(Notice::info("Generate a report first")),
            _ => Command::None,
        }
    }

    pub fn sync(&mut self, store: &RecordStore) {
        clamp_selection(&mut self.selected, store.students.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::sample_student;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn store() -> RecordStore {
        RecordStore {
            students: vec![sample_student(7, "Chi", "6"), sample_student(4, "An", "6")],
            ..Default::default()
        }
    }

    #[test]
    fn test_report_commands() {
        let store = store();
        let mut tab = StatisticsTab::default();

        assert!(matches!(
            tab.handle_key(key(KeyCode::Char('g')), &store),
            Command::ClassReport
        ));
        assert!(matches!(
            tab.handle_key(key(KeyCode::Char('r')), &store),
            Command::StudentReport(4)
        ));
        tab.handle_key(key(KeyCode::Down), &store);
        assert!(matches!(
            tab.handle_key(key(KeyCode::Char('r')), &store),
            Command::StudentReport(7)
        ));
        assert!(matches!(
            tab.handle_key(key(KeyCode::Char('e')), &store),
            Command::Notify(_)
        ));
    }

    #[test]
    fn test_report_view_scrolls_and_exports() {
        let store = store();
        let mut tab = StatisticsTab::default();
        tab.show_report(GeneratedReport {
            kind: ReportKind::Class,
            label: "class".to_string(),
            blocks: vec![ReportBlock::Paragraph("ok".to_string())],
        });

        tab.handle_key(key(KeyCode::PageDown), &store);
        tab.handle_key(key(KeyCode::Up), &store);
        assert_eq!(tab.scroll, 9);
        // arrows scroll the report instead of moving the selection
        assert_eq!(tab.selected, 0);

        assert!(matches!(
            tab.handle_key(key(KeyCode::Char('e')), &store),
            Command::ExportReport
        ));
        tab.handle_key(key(KeyCode::Esc), &store);
        assert!(tab.report.is_none());
    }
}
