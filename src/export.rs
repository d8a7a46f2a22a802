use crate::dates;
use crate::models::{compare_grades, Student};
use crate::parser::ReportBlock;
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use std::path::{Path, PathBuf};

/// Turn a free-form label (often a student's name) into a filename fragment.
fn file_label(label: &str) -> String {
    let label: String = label
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if label.is_empty() {
        "report".to_string()
    } else {
        label
    }
}

fn timestamped_path(dir: &Path, prefix: &str, label: &str) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    dir.join(format!("{}_{}_{}.csv", prefix, file_label(label), timestamp))
}

/// Export a parsed report to CSV: titles and paragraphs as single-cell rows,
/// tables as header plus rows, a blank row between blocks.
pub fn export_report(blocks: &[ReportBlock], label: &str, dir: &Path) -> Result<PathBuf> {
    if blocks.is_empty() {
        anyhow::bail!("No report to export");
    }

    let filepath = timestamped_path(dir, "report", label);

    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(&filepath)
        .context("Failed to create CSV file")?;

    for (index, block) in blocks.iter().enumerate() {
        if index > 0 {
            wtr.write_record([""]).context("Failed to write CSV record")?;
        }
        match block {
            ReportBlock::Title(text) | ReportBlock::Paragraph(text) => {
                wtr.write_record([text]).context("Failed to write CSV record")?;
            }
            ReportBlock::Table { header, rows } => {
                wtr.write_record(header)
                    .context("Failed to write CSV headers")?;
                for row in rows {
                    wtr.write_record(row).context("Failed to write CSV record")?;
                }
            }
        }
    }

    wtr.flush().context("Failed to flush CSV writer")?;

    Ok(filepath)
}

/// Export the roster with per-student attendance and tuition figures as of `as_of`.
pub fn export_roster(students: &[Student], as_of: NaiveDate, dir: &Path) -> Result<PathBuf> {
    if students.is_empty() {
        anyhow::bail!("No students to export");
    }

    let filepath = timestamped_path(dir, "roster", &dates::format_iso(as_of));

    let headers = [
        "stt",
        "full_name",
        "grade",
        "class_name",
        "phone1",
        "phone2",
        "start_date",
        "scheduled_to_date",
        "absent",
        "attended",
        "paid_months",
        "unpaid_months",
    ];

    let mut wtr = csv::Writer::from_path(&filepath).context("Failed to create CSV file")?;

    wtr.write_record(headers)
        .context("Failed to write CSV headers")?;

    let mut ordered: Vec<&Student> = students.iter().collect();
    ordered.sort_by(|a, b| {
        compare_grades(&a.grade, &b.grade).then_with(|| a.full_name.cmp(&b.full_name))
    });

    for student in ordered {
        let metrics = student.metrics(as_of);
        let record = vec![
            student.stt.to_string(),
            student.full_name.clone(),
            student.grade.clone(),
            student.class_name.clone(),
            student.phone1.clone(),
            student.phone2.clone(),
            student.start_date.map(dates::format_iso).unwrap_or_default(),
            metrics.scheduled_up_to_now.to_string(),
            metrics.absents.to_string(),
            metrics.actual_attendance.to_string(),
            metrics.paid_labels().join(" "),
            metrics.unpaid_labels().join(" "),
        ];
        wtr.write_record(&record)
            .context("Failed to write CSV record")?;
    }

    wtr.flush().context("Failed to flush CSV writer")?;

    Ok(filepath)
}
