use crate::dates::MonthKey;
use crate::models::Student;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Attendance and tuition figures for one student as of a given day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentMetrics {
    pub scheduled_up_to_now: usize,
    pub absents: usize,
    pub actual_attendance: usize,
    pub paid_count: usize,
    /// Chronological.
    pub paid_months: Vec<MonthKey>,
    /// Chronological, start month through the `as_of` month inclusive.
    pub unpaid_months: Vec<MonthKey>,
    pub unpaid_count: usize,
    pub total_months: usize,
}

impl StudentMetrics {
    pub fn paid_labels(&self) -> Vec<String> {
        self.paid_months.iter().map(MonthKey::label).collect()
    }

    pub fn unpaid_labels(&self) -> Vec<String> {
        self.unpaid_months.iter().map(MonthKey::label).collect()
    }
}

pub fn compute_metrics(
    schedule: &BTreeSet<NaiveDate>,
    attendance: &BTreeSet<NaiveDate>,
    tuition: &BTreeSet<MonthKey>,
    start: Option<NaiveDate>,
    as_of: NaiveDate,
) -> StudentMetrics {
    let scheduled_up_to_now = schedule.range(..=as_of).count();
    // Absences are not date-bounded.
    let absents = attendance.len();
    let actual_attendance = scheduled_up_to_now.saturating_sub(absents);

    let current = MonthKey::of(as_of);
    let (unpaid_months, total_months) = match start {
        Some(start) => {
            let months: Vec<MonthKey> = MonthKey::of(start).through(current).collect();
            let total = months.len();
            let unpaid = months.into_iter().filter(|m| !tuition.contains(m)).collect();
            (unpaid, total)
        }
        None => (Vec::new(), 0),
    };

    StudentMetrics {
        scheduled_up_to_now,
        absents,
        actual_attendance,
        paid_count: tuition.len(),
        paid_months: tuition.iter().copied().collect(),
        unpaid_count: unpaid_months.len(),
        unpaid_months,
        total_months,
    }
}

impl Student {
    pub fn metrics(&self, as_of: NaiveDate) -> StudentMetrics {
        compute_metrics(
            &self.schedule,
            &self.attendance,
            &self.tuition,
            self.start_date,
            as_of,
        )
    }

    /// The first month before `current` (from the start month on) left unpaid.
    pub fn first_debt_month(&self, current: MonthKey) -> Option<MonthKey> {
        let start = MonthKey::of(self.start_date?);
        start.until(current).find(|m| !self.tuition.contains(m))
    }

    /// All months before `current` (from the start month on) left unpaid.
    pub fn debt_months(&self, current: MonthKey) -> Vec<MonthKey> {
        match self.start_date {
            Some(start) => MonthKey::of(start)
                .until(current)
                .filter(|m| !self.tuition.contains(m))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn is_in_debt(&self, current: MonthKey) -> bool {
        self.first_debt_month(current).is_some()
    }
}

/// Class-wide tuition picture for one month.
///
/// `paid` and `unpaid` partition the roster. `in_debt` is independent of
/// both: paying the current month does not clear earlier months.
#[derive(Debug, Clone, Default)]
pub struct TuitionStatus<'a> {
    pub paid: Vec<&'a Student>,
    pub unpaid: Vec<&'a Student>,
    pub in_debt: Vec<&'a Student>,
}

pub fn classify(students: &[Student], month: MonthKey) -> TuitionStatus<'_> {
    let mut status = TuitionStatus::default();

    for student in students {
        if student.has_paid(month) {
            status.paid.push(student);
        } else {
            status.unpaid.push(student);
        }

        if student.is_in_debt(month) {
            status.in_debt.push(student);
        }
    }

    status
}
