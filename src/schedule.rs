use crate::error::{Result, RosterError};
use crate::models::TeacherSchedule;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Result of merging a teaching-day template into a student's schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// The template has no day on or after the start date.
    NothingToInsert,
    Merged {
        schedule: BTreeSet<NaiveDate>,
        /// Template days on or after the start date.
        offered: usize,
        /// Days that were not already in the schedule.
        added: usize,
    },
}

/// Additive merge of `template` days on or after `start` into `existing`.
///
/// Days already in `existing` are never removed, including ones that predate
/// `start`. Without a start date every template day qualifies.
pub fn reconcile(
    existing: &BTreeSet<NaiveDate>,
    template: &BTreeSet<NaiveDate>,
    start: Option<NaiveDate>,
) -> Reconciliation {
    let eligible: Vec<NaiveDate> = match start {
        Some(start) => template.range(start..).copied().collect(),
        None => template.iter().copied().collect(),
    };

    if eligible.is_empty() {
        return Reconciliation::NothingToInsert;
    }

    let mut schedule = existing.clone();
    let added = eligible.iter().filter(|day| schedule.insert(**day)).count();

    Reconciliation::Merged {
        schedule,
        offered: eligible.len(),
        added,
    }
}

/// The template saved for `grade`.
pub fn template_for<'a>(schedules: &'a [TeacherSchedule], grade: &str) -> Result<&'a TeacherSchedule> {
    let grade = grade.trim();
    schedules
        .iter()
        .find(|s| s.grade == grade)
        .ok_or_else(|| RosterError::MissingTemplate {
            grade: grade.to_string(),
        })
}

/// Toggle `day` in a student's schedule. Days before `start` are refused.
/// Returns whether the schedule changed.
pub fn toggle_schedule_day(
    schedule: &mut BTreeSet<NaiveDate>,
    day: NaiveDate,
    start: Option<NaiveDate>,
) -> bool {
    if start.is_some_and(|start| day < start) {
        return false;
    }
    if !schedule.remove(&day) {
        schedule.insert(day);
    }
    true
}

/// Flip `day` in an absence list. Returns `true` when the student is now absent.
pub fn toggle_absence(attendance: &mut BTreeSet<NaiveDate>, day: NaiveDate) -> bool {
    if attendance.remove(&day) {
        false
    } else {
        attendance.insert(day);
        true
    }
}

/// Toggle a day in a template. Returns `true` when the day is now a teaching day.
pub fn toggle_teaching_day(days: &mut BTreeSet<NaiveDate>, day: NaiveDate) -> bool {
    if days.remove(&day) {
        false
    } else {
        days.insert(day);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn set(days: &[NaiveDate]) -> BTreeSet<NaiveDate> {
        days.iter().copied().collect()
    }

    #[test]
    fn test_reconcile_filters_template_by_start() {
        let existing = set(&[ymd(2024, 9, 2)]);
        let template = set(&[ymd(2024, 9, 1), ymd(2024, 9, 4), ymd(2024, 9, 6)]);

        match reconcile(&existing, &template, Some(ymd(2024, 9, 4))) {
            Reconciliation::Merged {
                schedule,
                offered,
                added,
            } => {
                assert_eq!(offered, 2);
                assert_eq!(added, 2);
                assert_eq!(
                    schedule,
                    set(&[ymd(2024, 9, 2), ymd(2024, 9, 4), ymd(2024, 9, 6)])
                );
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_reconcile_keeps_days_before_start() {
        let existing = set(&[ymd(2024, 1, 15)]);
        let template = set(&[ymd(2024, 3, 1)]);
        let Reconciliation::Merged { schedule, .. } =
            reconcile(&existing, &template, Some(ymd(2024, 2, 1)))
        else {
            panic!("expected a merge");
        };
        assert!(existing.is_subset(&schedule));
        assert!(schedule.contains(&ymd(2024, 1, 15)));
    }

    #[test]
    fn test_reconcile_reports_nothing_to_insert() {
        let existing = set(&[ymd(2024, 1, 15)]);
        let template = set(&[ymd(2024, 1, 1), ymd(2024, 1, 8)]);
        assert_eq!(
            reconcile(&existing, &template, Some(ymd(2024, 2, 1))),
            Reconciliation::NothingToInsert
        );
        assert_eq!(
            reconcile(&existing, &BTreeSet::new(), None),
            Reconciliation::NothingToInsert
        );
    }

    #[test]
    fn test_reconcile_twice_adds_nothing_new() {
        let template = set(&[ymd(2024, 9, 4), ymd(2024, 9, 6)]);
        let Reconciliation::Merged { schedule: first, .. } =
            reconcile(&BTreeSet::new(), &template, Some(ymd(2024, 9, 1)))
        else {
            panic!("expected a merge");
        };
        let Reconciliation::Merged {
            schedule: second,
            offered,
            added,
        } = reconcile(&first, &template, Some(ymd(2024, 9, 1)))
        else {
            panic!("expected a merge");
        };
        assert_eq!(first, second);
        assert_eq!(offered, 2);
        assert_eq!(added, 0);

        // wire round trip keeps the same sorted set
        let json = serde_json::to_string(
            &second
                .iter()
                .map(|d| crate::dates::format_iso(*d))
                .collect::<Vec<_>>(),
        )
        .unwrap();
        assert_eq!(json, r#"["2024-09-04","2024-09-06"]"#);
    }

    #[test]
    fn test_reconcile_without_start_takes_everything() {
        let template = set(&[ymd(2020, 1, 1), ymd(2030, 1, 1)]);
        let Reconciliation::Merged { offered, .. } = reconcile(&BTreeSet::new(), &template, None)
        else {
            panic!("expected a merge");
        };
        assert_eq!(offered, 2);
    }

    #[test]
    fn test_template_lookup() {
        let schedules = vec![TeacherSchedule {
            stt: 1,
            grade: "6".to_string(),
            days: BTreeSet::new(),
        }];
        assert!(template_for(&schedules, "6").is_ok());
        assert!(template_for(&schedules, " 6 ").is_ok());
        assert!(matches!(
            template_for(&schedules, "7"),
            Err(RosterError::MissingTemplate { .. })
        ));
    }

    #[test]
    fn test_toggle_schedule_day_respects_start() {
        let mut schedule = BTreeSet::new();
        let start = Some(ymd(2024, 9, 5));
        assert!(!toggle_schedule_day(&mut schedule, ymd(2024, 9, 4), start));
        assert!(schedule.is_empty());
        assert!(toggle_schedule_day(&mut schedule, ymd(2024, 9, 5), start));
        assert!(schedule.contains(&ymd(2024, 9, 5)));
        assert!(toggle_schedule_day(&mut schedule, ymd(2024, 9, 5), start));
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_toggle_absence() {
        let mut attendance = BTreeSet::new();
        assert!(toggle_absence(&mut attendance, ymd(2024, 9, 5)));
        assert!(!toggle_absence(&mut attendance, ymd(2024, 9, 5)));
        assert!(attendance.is_empty());
    }
}
