use crate::dates::{self, MonthKey};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::warn;

// ============================================================================
// Grades
// ============================================================================

pub const PRIVATE_TUTORING: &str = "Kèm riêng";
pub const WITHDRAWN: &str = "Đã thôi học";

/// Grades that can carry a teaching-day template.
pub const GRADES: [&str; 12] = ["1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12"];

/// Groups of students still attending: numbered grades plus private tutoring.
pub const ENROLLED_GRADES: [&str; 13] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", PRIVATE_TUTORING,
];

/// Every value the grade field of a student may take.
pub const GRADE_OPTIONS: [&str; 14] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", PRIVATE_TUTORING, WITHDRAWN,
];

/// Numeric-aware ordering: "2" < "10", numbers before the sentinel groups.
pub fn compare_grades(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u32>(), b.trim().parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

// ============================================================================
// Spreadsheet wire records
// ============================================================================

/// A student row as the spreadsheet endpoint sends and accepts it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(
        default,
        deserialize_with = "lenient_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub stt: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub full_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub grade: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub class_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone1: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub phone2: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub schedule: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub attendance: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub tuition: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct TeacherScheduleRecord {
    #[serde(default, deserialize_with = "lenient_u32")]
    pub stt: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub grade: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub days: String,
}

/// Spreadsheet cells come back as strings or numbers depending on their content.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Decode a JSON-encoded string array cell. A cell that is not a JSON array yields no entries.
pub fn decode_list(field: &str, raw: &str) -> Vec<String> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<Value>>(raw) {
        Ok(values) => values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Err(e) => {
            warn!("Stored {} field is not a JSON array ({}): {:?}", field, e, raw);
            Vec::new()
        }
    }
}

pub fn encode_list<I: IntoIterator<Item = String>>(items: I) -> String {
    Value::from(items.into_iter().collect::<Vec<String>>()).to_string()
}

fn decode_dates(field: &str, raw: &str) -> BTreeSet<NaiveDate> {
    decode_list(field, raw)
        .iter()
        .filter_map(|entry| match dates::parse_date(dates::clean_date(entry)) {
            Ok(date) => Some(date),
            Err(e) => {
                warn!("Dropping {} entry: {}", field, e);
                None
            }
        })
        .collect()
}

fn decode_months(raw: &str) -> BTreeSet<MonthKey> {
    decode_list("tuition", raw)
        .iter()
        .filter_map(|entry| match MonthKey::parse_token(entry) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!("Dropping tuition entry: {}", e);
                None
            }
        })
        .collect()
}

/// A list cell exactly as it was read, next to what was decoded from it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredCell<T> {
    raw: String,
    decoded: BTreeSet<T>,
}

impl<T: Ord + Clone> StoredCell<T> {
    fn new(raw: String, decoded: &BTreeSet<T>) -> Self {
        Self {
            raw,
            decoded: decoded.clone(),
        }
    }

    /// The stored text while `current` still matches what was read, a fresh encoding otherwise.
    fn write(cell: &Option<Self>, current: &BTreeSet<T>, encode: impl FnOnce() -> String) -> String {
        match cell {
            Some(cell) if cell.decoded == *current => cell.raw.clone(),
            _ => encode(),
        }
    }
}

/// The list cells of a fetched student row. Writing a student re-encodes only
/// the lists that changed, so entries that failed to decode survive unrelated edits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredCells {
    schedule: Option<StoredCell<NaiveDate>>,
    attendance: Option<StoredCell<NaiveDate>>,
    tuition: Option<StoredCell<MonthKey>>,
}

// ============================================================================
// Roster models
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub stt: u32,
    pub full_name: String,
    pub grade: String,
    pub class_name: String,
    pub phone1: String,
    pub phone2: String,
    pub start_date: Option<NaiveDate>,
    /// Days the student is expected in class.
    pub schedule: BTreeSet<NaiveDate>,
    /// Days the student was absent. Presence is the default.
    pub attendance: BTreeSet<NaiveDate>,
    /// Months paid for.
    pub tuition: BTreeSet<MonthKey>,
    /// Empty for students created locally.
    pub stored: StoredCells,
}

impl Student {
    pub fn blank() -> Self {
        Self {
            stt: 0,
            full_name: String::new(),
            grade: String::new(),
            class_name: String::new(),
            phone1: String::new(),
            phone2: String::new(),
            start_date: None,
            schedule: BTreeSet::new(),
            attendance: BTreeSet::new(),
            tuition: BTreeSet::new(),
            stored: StoredCells::default(),
        }
    }

    pub fn is_absent_on(&self, day: NaiveDate) -> bool {
        self.attendance.contains(&day)
    }

    pub fn has_paid(&self, month: MonthKey) -> bool {
        self.tuition.contains(&month)
    }

    /// Case-insensitive match against name, class or the primary phone number.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.full_name.to_lowercase().contains(&term)
            || self.class_name.to_lowercase().contains(&term)
            || self.phone1.contains(&term)
    }

    pub fn from_record(record: StudentRecord) -> Self {
        let start = dates::clean_date(&record.start_date);
        let start_date = if start.is_empty() {
            None
        } else {
            match dates::parse_date(start) {
                Ok(date) => Some(date),
                Err(e) => {
                    warn!("Student {:?} has an unusable start date: {}", record.full_name, e);
                    None
                }
            }
        };

        let schedule = decode_dates("schedule", &record.schedule);
        let attendance = decode_dates("attendance", &record.attendance);
        let tuition = decode_months(&record.tuition);
        let stored = StoredCells {
            schedule: Some(StoredCell::new(record.schedule, &schedule)),
            attendance: Some(StoredCell::new(record.attendance, &attendance)),
            tuition: Some(StoredCell::new(record.tuition, &tuition)),
        };

        Self {
            stt: record.stt.unwrap_or_default(),
            schedule,
            attendance,
            tuition,
            stored,
            start_date,
            full_name: record.full_name,
            grade: record.grade.trim().to_string(),
            class_name: record.class_name,
            phone1: record.phone1,
            phone2: record.phone2,
        }
    }

    /// Wire form. `stt` is left out for records that do not exist yet. List
    /// cells that still hold what was fetched are written back untouched.
    pub fn to_record(&self) -> StudentRecord {
        StudentRecord {
            stt: (self.stt != 0).then_some(self.stt),
            full_name: self.full_name.clone(),
            grade: self.grade.clone(),
            class_name: self.class_name.clone(),
            phone1: self.phone1.clone(),
            phone2: self.phone2.clone(),
            start_date: self.start_date.map(dates::format_iso).unwrap_or_default(),
            schedule: StoredCell::write(&self.stored.schedule, &self.schedule, || {
                encode_list(self.schedule.iter().copied().map(dates::format_iso))
            }),
            attendance: StoredCell::write(&self.stored.attendance, &self.attendance, || {
                encode_list(self.attendance.iter().copied().map(dates::format_dmy))
            }),
            tuition: StoredCell::write(&self.stored.tuition, &self.tuition, || {
                encode_list(self.tuition.iter().map(MonthKey::token))
            }),
        }
    }
}

/// A grade's reusable calendar of teaching days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherSchedule {
    pub stt: u32,
    pub grade: String,
    pub days: BTreeSet<NaiveDate>,
}

impl TeacherSchedule {
    pub fn from_record(record: TeacherScheduleRecord) -> Self {
        Self {
            stt: record.stt.unwrap_or_default(),
            days: decode_dates("days", &record.days),
            grade: record.grade.trim().to_string(),
        }
    }

    pub fn to_record(&self) -> TeacherScheduleRecord {
        TeacherScheduleRecord {
            stt: Some(self.stt),
            grade: self.grade.clone(),
            days: encode_list(self.days.iter().copied().map(dates::format_iso)),
        }
    }
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UserAccount {
    pub username: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_student_record_accepts_numeric_cells() {
        let json = r#"{
            "stt": 3,
            "fullName": "Nguyễn Văn An",
            "grade": 6,
            "className": "6A1",
            "phone1": 987654321,
            "phone2": "",
            "startDate": "2024-01-01T17:00:00.000Z",
            "schedule": "[\"2024-01-03\",\"2024-01-05\"]",
            "attendance": "[\"05/01/2024\",\"5/1/2024\"]",
            "tuition": "[\"1/2024\",\"2/2024\"]"
        }"#;

        let record: StudentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.stt, Some(3));
        assert_eq!(record.grade, "6");
        assert_eq!(record.phone1, "987654321");

        let student = Student::from_record(record);
        assert_eq!(student.start_date, Some(ymd(2024, 1, 1)));
        assert_eq!(student.schedule.len(), 2);
        // both encodings of the same day collapse into one absence
        assert_eq!(student.attendance.len(), 1);
        assert!(student.is_absent_on(ymd(2024, 1, 5)));
        assert!(student.has_paid(MonthKey { year: 2024, month: 2 }));
    }

    #[test]
    fn test_string_stt_and_missing_fields() {
        let record: StudentRecord =
            serde_json::from_str(r#"{"stt": "7", "fullName": "B"}"#).unwrap();
        let student = Student::from_record(record);
        assert_eq!(student.stt, 7);
        assert!(student.start_date.is_none());
        assert!(student.schedule.is_empty());
    }

    #[test]
    fn test_broken_fields_fall_back_to_empty() {
        let record = StudentRecord {
            stt: Some(1),
            schedule: "not json".to_string(),
            attendance: "[\"garbage\", \"2/3/2024\"]".to_string(),
            tuition: "[\"13/2024\", \"12/2024\"]".to_string(),
            ..Default::default()
        };
        let student = Student::from_record(record);
        assert!(student.schedule.is_empty());
        assert_eq!(student.attendance.len(), 1);
        assert_eq!(student.tuition.len(), 1);
    }

    #[test]
    fn test_record_round_trip_keeps_sorted_sets() {
        let mut student = Student::blank();
        student.stt = 4;
        student.start_date = Some(ymd(2024, 9, 1));
        student.schedule = [ymd(2024, 9, 10), ymd(2024, 9, 3)].into_iter().collect();
        student.attendance = [ymd(2024, 9, 3)].into_iter().collect();
        student.tuition = ["10/2024", "9/2024"]
            .iter()
            .map(|t| MonthKey::parse_token(t).unwrap())
            .collect();

        let record = student.to_record();
        assert_eq!(record.schedule, r#"["2024-09-03","2024-09-10"]"#);
        assert_eq!(record.attendance, r#"["3/9/2024"]"#);
        assert_eq!(record.tuition, r#"["9/2024","10/2024"]"#);
        assert_eq!(record.start_date, "2024-09-01");

        let json = serde_json::to_string(&record).unwrap();
        let back = Student::from_record(serde_json::from_str(&json).unwrap());
        assert_eq!(back.schedule, student.schedule);
        assert_eq!(back.attendance, student.attendance);
        assert_eq!(back.tuition, student.tuition);
        assert_eq!(back.to_record(), record);
    }

    #[test]
    fn test_write_keeps_unchanged_cells_verbatim() {
        let record = StudentRecord {
            stt: Some(2),
            full_name: "Bình".to_string(),
            schedule: "2024-09-03, 2024-09-10".to_string(),
            attendance: "[\"3/9/2024\"]".to_string(),
            tuition: "[\"T9/2024\",\"10/2024\"]".to_string(),
            ..Default::default()
        };
        let mut student = Student::from_record(record.clone());
        assert!(student.schedule.is_empty());
        assert_eq!(student.tuition.len(), 1);

        student.attendance.insert(ymd(2024, 9, 10));
        let written = student.to_record();
        assert_eq!(written.schedule, record.schedule);
        assert_eq!(written.tuition, record.tuition);
        assert_eq!(written.attendance, r#"["3/9/2024","10/9/2024"]"#);
    }

    #[test]
    fn test_changed_cell_is_re_encoded() {
        let record = StudentRecord {
            stt: Some(2),
            tuition: "[\"T9/2024\",\"10/2024\"]".to_string(),
            ..Default::default()
        };
        let mut student = Student::from_record(record);
        student.tuition.insert(MonthKey { year: 2024, month: 11 });
        assert_eq!(student.to_record().tuition, r#"["10/2024","11/2024"]"#);
        // the empty attendance cell is left as it was
        assert_eq!(student.to_record().attendance, "");
    }

    #[test]
    fn test_new_student_has_no_stt_on_the_wire() {
        let student = Student::blank();
        let json = serde_json::to_value(student.to_record()).unwrap();
        assert!(json.get("stt").is_none());
        assert_eq!(json["schedule"], "[]");
    }

    #[test]
    fn test_grade_ordering() {
        let mut grades = vec!["10", "2", PRIVATE_TUTORING, "1", WITHDRAWN];
        grades.sort_by(|a, b| compare_grades(a, b));
        assert_eq!(grades[..3], ["1", "2", "10"]);
    }

    #[test]
    fn test_search_matches_name_class_phone() {
        let mut student = Student::blank();
        student.full_name = "Trần Thị Bình".to_string();
        student.class_name = "7A2".to_string();
        student.phone1 = "0912345678".to_string();
        assert!(student.matches("bình"));
        assert!(student.matches("7a2"));
        assert!(student.matches("0912"));
        assert!(student.matches(""));
        assert!(!student.matches("xyz"));
    }
}
