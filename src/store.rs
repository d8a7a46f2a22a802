use crate::dates;
use crate::error::{Result as RosterResult, RosterError};
use crate::models::{Student, TeacherSchedule};
use crate::schedule;
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{error, info, warn};

/// The remote roster. Writes are best-effort: `Ok` only means the request went out.
#[async_trait]
pub trait RosterBackend: Send + Sync {
    async fn fetch_students(&self) -> Result<Vec<Student>>;
    async fn fetch_teacher_schedules(&self) -> Result<Vec<TeacherSchedule>>;
    async fn add_student(&self, student: &Student) -> Result<()>;
    async fn update_student(&self, student: &Student) -> Result<()>;
    async fn update_teacher_schedule(&self, schedule: &TeacherSchedule) -> Result<()>;
}

/// Client-side copy of both sheets, replaced wholesale on every load.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    pub students: Vec<Student>,
    pub schedules: Vec<TeacherSchedule>,
    /// Set when either fetch failed and fallback data is shown.
    pub degraded: bool,
}

/// Shown in place of the roster when the students sheet cannot be read.
pub fn placeholder_students() -> Vec<Student> {
    let mut student = Student::blank();
    student.stt = 1;
    student.full_name = "Sample data - connecting...".to_string();
    student.grade = "6".to_string();
    student.class_name = "6A1".to_string();
    student.phone1 = "0987654321".to_string();
    student.start_date = NaiveDate::from_ymd_opt(2024, 1, 1);
    vec![student]
}

impl RecordStore {
    /// Fetch both sheets concurrently. Either failure is logged and replaced
    /// with fallback data; loading itself never fails.
    pub async fn load(backend: &dyn RosterBackend) -> Self {
        let (students, schedules) =
            tokio::join!(backend.fetch_students(), backend.fetch_teacher_schedules());

        let mut degraded = false;

        let students = match students {
            Ok(students) => students,
            Err(e) => {
                warn!("Error fetching students, using placeholder data: {:#}", e);
                degraded = true;
                placeholder_students()
            }
        };

        let schedules = match schedules {
            Ok(schedules) => schedules,
            Err(e) => {
                warn!("Error fetching teacher schedules: {:#}", e);
                degraded = true;
                Vec::new()
            }
        };

        info!(
            "Loaded {} students and {} teacher schedules",
            students.len(),
            schedules.len()
        );

        Self {
            students,
            schedules,
            degraded,
        }
    }

    pub fn student(&self, stt: u32) -> Option<&Student> {
        self.students.iter().find(|s| s.stt == stt)
    }

    pub fn template_for(&self, grade: &str) -> RosterResult<&TeacherSchedule> {
        schedule::template_for(&self.schedules, grade)
    }
}

/// How many of a batch of independent writes went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkOutcome {
    pub attempted: usize,
    pub succeeded: usize,
}

/// Toggle `day` in the absence list of every listed student, one write per
/// student, in order. No rollback on partial failure.
pub async fn record_absences(
    backend: &dyn RosterBackend,
    students: &[Student],
    day: NaiveDate,
    stts: &[u32],
) -> BulkOutcome {
    let mut outcome = BulkOutcome {
        attempted: 0,
        succeeded: 0,
    };

    for stt in stts {
        let Some(student) = students.iter().find(|s| s.stt == *stt) else {
            warn!("{}", RosterError::UnknownStudent(*stt));
            continue;
        };

        outcome.attempted += 1;
        let mut updated = student.clone();
        let absent = schedule::toggle_absence(&mut updated.attendance, day);

        match backend.update_student(&updated).await {
            Ok(()) => {
                outcome.succeeded += 1;
                info!(
                    "Marked student #{} {} on {}",
                    stt,
                    if absent { "absent" } else { "present" },
                    dates::format_dmy(day)
                );
            }
            Err(e) => error!("Error updating attendance for student #{}: {:#}", stt, e),
        }
    }

    outcome
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::StudentRecord;
    use anyhow::anyhow;
    use std::collections::BTreeSet;
    use std::sync::Mutex;

    /// In-memory backend recording every write.
    #[derive(Default)]
    pub struct FakeBackend {
        pub students: Vec<Student>,
        pub schedules: Vec<TeacherSchedule>,
        pub fail_students: bool,
        pub fail_schedules: bool,
        pub reject_updates_for: Vec<u32>,
        pub updates: Mutex<Vec<Student>>,
        pub created: Mutex<Vec<Student>>,
        pub saved_schedules: Mutex<Vec<TeacherSchedule>>,
    }

    #[async_trait]
    impl RosterBackend for FakeBackend {
        async fn fetch_students(&self) -> Result<Vec<Student>> {
            if self.fail_students {
                return Err(anyhow!("network down"));
            }
            Ok(self.students.clone())
        }

        async fn fetch_teacher_schedules(&self) -> Result<Vec<TeacherSchedule>> {
            if self.fail_schedules {
                return Err(anyhow!("network down"));
            }
            Ok(self.schedules.clone())
        }

        async fn add_student(&self, student: &Student) -> Result<()> {
            self.created.lock().unwrap().push(student.clone());
            Ok(())
        }

        async fn update_student(&self, student: &Student) -> Result<()> {
            if self.reject_updates_for.contains(&student.stt) {
                return Err(anyhow!("connection reset"));
            }
            self.updates.lock().unwrap().push(student.clone());
            Ok(())
        }

        async fn update_teacher_schedule(&self, schedule: &TeacherSchedule) -> Result<()> {
            self.saved_schedules.lock().unwrap().push(schedule.clone());
            Ok(())
        }
    }

    pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn sample_student(stt: u32, name: &str, grade: &str) -> Student {
        let mut s = Student::blank();
        s.stt = stt;
        s.full_name = name.to_string();
        s.grade = grade.to_string();
        s.class_name = format!("{}A1", grade);
        s.phone1 = format!("09000000{:02}", stt);
        s.start_date = Some(ymd(2024, 9, 1));
        s
    }

    #[tokio::test]
    async fn test_load_reads_both_sheets() {
        let backend = FakeBackend {
            students: vec![sample_student(1, "An", "6")],
            schedules: vec![TeacherSchedule {
                stt: 1,
                grade: "6".to_string(),
                days: BTreeSet::new(),
            }],
            ..Default::default()
        };
        let store = RecordStore::load(&backend).await;
        assert!(!store.degraded);
        assert_eq!(store.students.len(), 1);
        assert!(store.template_for("6").is_ok());
        assert!(store.student(1).is_some());
    }

    #[tokio::test]
    async fn test_load_fails_open() {
        let backend = FakeBackend {
            fail_students: true,
            fail_schedules: true,
            ..Default::default()
        };
        let store = RecordStore::load(&backend).await;
        assert!(store.degraded);
        assert_eq!(store.students, placeholder_students());
        assert!(store.schedules.is_empty());
    }

    #[tokio::test]
    async fn test_load_keeps_students_when_schedules_fail() {
        let backend = FakeBackend {
            students: vec![sample_student(1, "An", "6")],
            fail_schedules: true,
            ..Default::default()
        };
        let store = RecordStore::load(&backend).await;
        assert!(store.degraded);
        assert_eq!(store.students[0].full_name, "An");
    }

    #[tokio::test]
    async fn test_record_absences_counts_partial_success() {
        let mut absent_already = sample_student(2, "Bình", "6");
        absent_already.attendance.insert(ymd(2024, 9, 10));

        let students = vec![
            sample_student(1, "An", "6"),
            absent_already,
            sample_student(3, "Chi", "7"),
        ];
        let backend = FakeBackend {
            reject_updates_for: vec![3],
            ..Default::default()
        };

        let outcome =
            record_absences(&backend, &students, ymd(2024, 9, 10), &[1, 2, 3, 99]).await;
        assert_eq!(
            outcome,
            BulkOutcome {
                attempted: 3,
                succeeded: 2
            }
        );

        let updates = backend.updates.lock().unwrap();
        assert!(updates[0].is_absent_on(ymd(2024, 9, 10)));
        // toggling an existing absence marks the student present again
        assert!(!updates[1].is_absent_on(ymd(2024, 9, 10)));
    }

    #[tokio::test]
    async fn test_record_absences_leaves_other_cells_untouched() {
        let record = StudentRecord {
            stt: Some(5),
            full_name: "Em".to_string(),
            schedule: "2024-09-03, 2024-09-10".to_string(),
            tuition: "[\"T9/2024\",\"10/2024\"]".to_string(),
            ..Default::default()
        };
        let students = vec![Student::from_record(record.clone())];
        let backend = FakeBackend::default();

        record_absences(&backend, &students, ymd(2024, 9, 10), &[5]).await;

        let written = backend.updates.lock().unwrap()[0].to_record();
        assert_eq!(written.schedule, record.schedule);
        assert_eq!(written.tuition, record.tuition);
        assert_eq!(written.attendance, r#"["10/9/2024"]"#);
    }
}
