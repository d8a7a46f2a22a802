use crate::dates::MonthKey;
use chrono::{Datelike, Duration, NaiveDate};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub fn is_ctrl(key: &KeyEvent, c: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(c)
}

/// Apply a text-editing key to `field`. Returns whether the key was consumed.
pub fn edit_text(field: &mut String, key: &KeyEvent, max_len: usize) -> bool {
    match key.code {
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            if field.chars().count() < max_len {
                field.push(c);
            }
            true
        }
        KeyCode::Backspace => {
            field.pop();
            true
        }
        _ => false,
    }
}

/// Move a list selection up or down, staying inside `len`.
pub fn step_selection(index: &mut usize, len: usize, key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Up => {
            *index = index.saturating_sub(1);
            true
        }
        KeyCode::Down => {
            if *index + 1 < len {
                *index += 1;
            }
            true
        }
        KeyCode::Home => {
            *index = 0;
            true
        }
        KeyCode::End => {
            *index = len.saturating_sub(1);
            true
        }
        _ => false,
    }
}

pub fn clamp_selection(index: &mut usize, len: usize) {
    if *index >= len {
        *index = len.saturating_sub(1);
    }
}

/// Roster filter over the grade field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GradeFilter {
    #[default]
    All,
    Grade(String),
}

impl GradeFilter {
    pub fn matches(&self, grade: &str) -> bool {
        match self {
            GradeFilter::All => true,
            GradeFilter::Grade(g) => g == grade.trim(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            GradeFilter::All => "All grades".to_string(),
            GradeFilter::Grade(g) if g.parse::<u32>().is_ok() => format!("Grade {}", g),
            GradeFilter::Grade(g) => g.clone(),
        }
    }

    /// Step through `All` followed by every option, wrapping at both ends.
    pub fn cycle(&mut self, options: &[&str], forward: bool) {
        let position = match self {
            GradeFilter::All => None,
            GradeFilter::Grade(g) => options.iter().position(|o| o == g),
        };

        let next = match (position, forward) {
            (None, true) => options.first(),
            (None, false) => options.last(),
            (Some(i), true) => options.get(i + 1),
            (Some(i), false) if i > 0 => options.get(i - 1),
            (Some(_), false) => None,
        };

        *self = match next {
            Some(g) => GradeFilter::Grade(g.to_string()),
            None => GradeFilter::All,
        };
    }

    pub fn handle_key(&mut self, options: &[&str], key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Left => {
                self.cycle(options, false);
                true
            }
            KeyCode::Right => {
                self.cycle(options, true);
                true
            }
            _ => false,
        }
    }
}

/// Cycle a value through a fixed list of options. Unknown values restart the cycle.
pub fn cycle_option(current: &str, options: &[&str], forward: bool) -> String {
    let next = match options.iter().position(|o| *o == current) {
        None if forward => 0,
        None => options.len().saturating_sub(1),
        Some(i) if forward => (i + 1) % options.len(),
        Some(i) => (i + options.len() - 1) % options.len(),
    };
    options.get(next).map(|o| o.to_string()).unwrap_or_default()
}

/// A month page of a calendar with a day under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarCursor {
    pub month: MonthKey,
    pub day: u32,
}

impl CalendarCursor {
    pub fn at(date: NaiveDate) -> Self {
        Self {
            month: MonthKey::of(date),
            day: date.day(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        let day = self.day.clamp(1, self.month.days());
        NaiveDate::from_ymd_opt(self.month.year, self.month.month, day)
            .unwrap_or_else(|| self.month.first_day())
    }

    pub fn move_days(&mut self, delta: i64) {
        *self = Self::at(self.date() + Duration::days(delta));
    }

    pub fn shift_month(&mut self, forward: bool) {
        self.month = if forward {
            self.month.next()
        } else {
            self.month.prev()
        };
        self.day = self.day.min(self.month.days());
    }

    /// Blank cells before day 1 in a Monday-first grid.
    pub fn leading_blanks(&self) -> u32 {
        self.month.first_day().weekday().num_days_from_monday()
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Left => self.move_days(-1),
            KeyCode::Right => self.move_days(1),
            KeyCode::Up => self.move_days(-7),
            KeyCode::Down => self.move_days(7),
            KeyCode::PageUp => self.shift_month(false),
            KeyCode::PageDown => self.shift_month(true),
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calendar_navigation_crosses_months() {
        let mut cursor = CalendarCursor::at(ymd(2024, 1, 31));
        cursor.handle_key(&key(KeyCode::Right));
        assert_eq!(cursor.date(), ymd(2024, 2, 1));
        cursor.handle_key(&key(KeyCode::Up));
        assert_eq!(cursor.date(), ymd(2024, 1, 25));

        let mut cursor = CalendarCursor::at(ymd(2024, 1, 31));
        cursor.handle_key(&key(KeyCode::PageDown));
        assert_eq!(cursor.date(), ymd(2024, 2, 29));
        cursor.handle_key(&key(KeyCode::PageUp));
        assert_eq!(cursor.date(), ymd(2024, 1, 29));
    }

    #[test]
    fn test_leading_blanks_monday_first() {
        // 1 September 2024 is a Sunday
        assert_eq!(CalendarCursor::at(ymd(2024, 9, 10)).leading_blanks(), 6);
        // 1 July 2024 is a Monday
        assert_eq!(CalendarCursor::at(ymd(2024, 7, 10)).leading_blanks(), 0);
    }

    #[test]
    fn test_grade_filter_cycles_through_all() {
        let options = ["1", "2"];
        let mut filter = GradeFilter::All;
        filter.cycle(&options, true);
        assert_eq!(filter, GradeFilter::Grade("1".to_string()));
        filter.cycle(&options, true);
        filter.cycle(&options, true);
        assert_eq!(filter, GradeFilter::All);
        filter.cycle(&options, false);
        assert_eq!(filter, GradeFilter::Grade("2".to_string()));
        assert!(filter.matches(" 2"));
        assert!(!filter.matches("1"));
        assert_eq!(filter.label(), "Grade 2");
        assert_eq!(GradeFilter::Grade("Kèm riêng".to_string()).label(), "Kèm riêng");
    }

    #[test]
    fn test_cycle_option_wraps() {
        let options = ["a", "b", "c"];
        assert_eq!(cycle_option("", &options, true), "a");
        assert_eq!(cycle_option("", &options, false), "c");
        assert_eq!(cycle_option("c", &options, true), "a");
        assert_eq!(cycle_option("a", &options, false), "c");
    }

    #[test]
    fn test_edit_text_respects_max_len() {
        let mut field = String::from("ab");
        assert!(edit_text(&mut field, &key(KeyCode::Char('c')), 3));
        assert!(edit_text(&mut field, &key(KeyCode::Char('d')), 3));
        assert_eq!(field, "abc");
        assert!(edit_text(&mut field, &key(KeyCode::Backspace), 3));
        assert_eq!(field, "ab");
        assert!(!edit_text(&mut field, &key(KeyCode::Enter), 3));
    }
}
