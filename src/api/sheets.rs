use crate::models::{Student, StudentRecord, TeacherSchedule, TeacherScheduleRecord};
use crate::store::RosterBackend;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

/// One spreadsheet-backed endpoint: `GET ?action=read` lists rows, `POST` writes one.
#[derive(Clone)]
pub struct SheetClient {
    client: reqwest::Client,
    url: String,
    name: &'static str,
}

#[derive(Serialize)]
struct WriteRequest<'a, T: Serialize> {
    action: &'a str,
    #[serde(flatten)]
    record: &'a T,
}

impl SheetClient {
    pub fn new(client: reqwest::Client, url: String, name: &'static str) -> Self {
        Self { client, url, name }
    }

    async fn read<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("action", "read")])
            .send()
            .await
            .with_context(|| format!("Failed to send read request to the {} sheet", self.name))?;

        let status = response.status();
        let response_text = response.text().await.context("Failed to get response text")?;

        if !status.is_success() {
            anyhow::bail!(
                "Read of the {} sheet failed with status {}\nResponse body: {}",
                self.name,
                status,
                response_text
            );
        }

        let value: Value = serde_json::from_str(&response_text).with_context(|| {
            format!(
                "Failed to parse JSON from the {} sheet. Response body (first 500 chars): {}",
                self.name,
                &response_text.chars().take(500).collect::<String>()
            )
        })?;

        let Value::Array(rows) = value else {
            anyhow::bail!("The {} sheet did not return a list of rows", self.name);
        };

        let total = rows.len();
        let parsed: Vec<T> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(index, row)| match serde_json::from_value(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping row {} of the {} sheet: {}", index + 1, self.name, e);
                    None
                }
            })
            .collect();

        debug!("Read {}/{} rows from the {} sheet", parsed.len(), total, self.name);
        Ok(parsed)
    }

    /// Fire-and-forget write. Only the dispatch itself can fail; the body of the
    /// response is never read, so a rejection by the sheet goes unnoticed.
    async fn write<T: Serialize>(&self, action: &str, record: &T) -> Result<()> {
        let body = serde_json::to_string(&WriteRequest { action, record })
            .context("Failed to encode write request")?;

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, HeaderValue::from_static("text/plain;charset=utf-8"))
            .body(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to the {} sheet", action, self.name))?;

        if !response.status().is_success() {
            warn!(
                "The {} sheet answered {} to a {} request",
                self.name,
                response.status(),
                action
            );
        }

        Ok(())
    }
}

/// The two sheets that hold the roster.
#[derive(Clone)]
pub struct SheetsApi {
    students: SheetClient,
    schedules: SheetClient,
}

impl SheetsApi {
    pub fn new(students_url: String, schedules_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .connect_timeout(std::time::Duration::from_secs(15))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            students: SheetClient::new(client.clone(), students_url, "students"),
            schedules: SheetClient::new(client, schedules_url, "teacher schedule"),
        })
    }
}

#[async_trait]
impl RosterBackend for SheetsApi {
    async fn fetch_students(&self) -> Result<Vec<Student>> {
        let records: Vec<StudentRecord> = self.students.read().await?;
        Ok(records.into_iter().map(Student::from_record).collect())
    }

    async fn fetch_teacher_schedules(&self) -> Result<Vec<TeacherSchedule>> {
        let records: Vec<TeacherScheduleRecord> = self.schedules.read().await?;
        Ok(records.into_iter().map(TeacherSchedule::from_record).collect())
    }

    async fn add_student(&self, student: &Student) -> Result<()> {
        let mut record = student.to_record();
        record.stt = None;
        self.students.write("create", &record).await?;
        info!("Dispatched new student {:?}", student.full_name);
        Ok(())
    }

    async fn update_student(&self, student: &Student) -> Result<()> {
        self.students.write("update", &student.to_record()).await?;
        info!("Dispatched update for student #{}", student.stt);
        Ok(())
    }

    async fn update_teacher_schedule(&self, schedule: &TeacherSchedule) -> Result<()> {
        self.schedules.write("update", &schedule.to_record()).await?;
        info!("Dispatched teaching days for grade {}", schedule.grade);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_request_flattens_record() {
        let record = TeacherScheduleRecord {
            stt: Some(2),
            grade: "6".to_string(),
            days: "[\"2024-09-04\"]".to_string(),
        };
        let json = serde_json::to_value(WriteRequest {
            action: "update",
            record: &record,
        })
        .unwrap();
        assert_eq!(json["action"], "update");
        assert_eq!(json["stt"], 2);
        assert_eq!(json["grade"], "6");
        assert_eq!(json["days"], "[\"2024-09-04\"]");
    }
}
