use crate::dates::{self, MonthKey};
use crate::metrics::StudentMetrics;
use crate::models::{Student, StudentRecord};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const FALLBACK_TEXT: &str = "Unable to generate the report.";

const FORMAT_RULES: &str = "\
Rules:
- Put an upper-case title, without # or ** markers, on its own line before every table.
- Never use double asterisks (**) for emphasis.
- Never label tables as \"### TABLE 1:\", \"### TABLE 2:\" and so on.
- Return only the titles and standard markdown tables, written in Vietnamese.";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateResponse {
    fn text(self) -> Option<String> {
        let text: String = self
            .candidates
            .into_iter()
            .next()?
            .content?
            .parts
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// Client for the text-generation service that writes narrative reports.
#[derive(Clone)]
pub struct ReportClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ReportClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .connect_timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent", API_BASE, self.model);
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig { temperature: 0.1 },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context(format!("Failed to send request to {}", url))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Report request failed with status {}: {}", status, error_text);
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Failed to parse report response")?;

        info!("Generated a report with model {}", self.model);
        Ok(body.text().unwrap_or_else(|| FALLBACK_TEXT.to_string()))
    }

    pub async fn class_report(&self, students: &[Student], month: MonthKey) -> Result<String> {
        self.generate(&class_report_prompt(students, month)?).await
    }

    pub async fn student_report(&self, student: &Student, metrics: &StudentMetrics) -> Result<String> {
        self.generate(&student_report_prompt(student, metrics)).await
    }
}

pub fn class_report_prompt(students: &[Student], month: MonthKey) -> Result<String> {
    let records: Vec<StudentRecord> = students.iter().map(Student::to_record).collect();
    let dataset = serde_json::to_string(&records).context("Failed to encode the roster")?;

    Ok(format!(
        "Using the student list below, write a professional tuition report for month {month}.
{FORMAT_RULES}

Data: {dataset}

Sections:
1. TITLE: CLASS SUMMARY
   Table: (Total students | Paid | Unpaid this month | Owing earlier months).
2. TITLE: STUDENTS WHO PAID THIS MONTH
   Table: (No. | Full name | Class | Phone | Months paid).
3. TITLE: STUDENTS WHO HAVE NOT PAID THIS MONTH
   Table: (No. | Full name | Class | Phone | Start date).
4. TITLE: STUDENTS OWING EARLIER MONTHS
   Table: (No. | Full name | Class | Phone | Months owed).

Tuition months are M/YYYY tokens. The current month is {token}.",
        month = month.label(),
        token = month.token(),
    ))
}

pub fn student_report_prompt(student: &Student, metrics: &StudentMetrics) -> String {
    let start = student
        .start_date
        .map(dates::format_iso)
        .unwrap_or_default();

    format!(
        "Write a professional attendance and tuition report for the student below.
{FORMAT_RULES}

Data:
Full name: {name}, Grade: {grade}, Class: {class}, Start date: {start}

Sections:
1. TITLE: STUDENT DETAILS
   Two-column table: Field | Detail.
2. TITLE: ATTENDANCE
   Table: Scheduled sessions | Sessions attended | Sessions missed.
   Data: Scheduled: {scheduled}, Attended: {attended}, Missed: {absents}.
3. TITLE: TUITION
   Table: Months paid | Months unpaid.
   Data: Paid: {paid}, Unpaid: {unpaid} ({unpaid_list}).",
        name = student.full_name,
        grade = student.grade,
        class = student.class_name,
        scheduled = metrics.scheduled_up_to_now,
        attended = metrics.actual_attendance,
        absents = metrics.absents,
        paid = metrics.paid_count,
        unpaid = metrics.unpaid_count,
        unpaid_list = metrics.unpaid_labels().join(", "),
    )
}
