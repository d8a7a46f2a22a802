use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"###?\s*").unwrap());
static TABLE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)BẢNG\s*\d+:?").unwrap());
static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9À-Ỹ\s\-]+$").unwrap());

/// Title lines longer than this are treated as paragraphs.
const MAX_TITLE_LEN: usize = 120;

/// One rendered piece of a generated report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportBlock {
    Title(String),
    Paragraph(String),
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// Parse the loosely-markdown text returned by the report service.
///
/// Lines starting with `|` are table rows (divider rows containing `---` are
/// dropped, the first row is the header). Anything else is a title or a
/// paragraph, so unexpected output still renders as plain text.
pub fn parse_report(text: &str) -> Vec<ReportBlock> {
    let cleaned = BOLD.replace_all(text, "");
    let cleaned = HEADING.replace_all(&cleaned, "");
    let cleaned = TABLE_LABEL.replace_all(&cleaned, "");

    let mut blocks = Vec::new();
    let mut table_lines: Vec<&str> = Vec::new();

    for line in cleaned.trim().lines() {
        let trimmed = line.trim();

        if trimmed.starts_with('|') {
            table_lines.push(trimmed);
            continue;
        }

        flush_table(&mut table_lines, &mut blocks);

        if trimmed.is_empty() {
            continue;
        }

        if is_title(trimmed) {
            blocks.push(ReportBlock::Title(trimmed.to_string()));
        } else {
            blocks.push(ReportBlock::Paragraph(trimmed.to_string()));
        }
    }

    flush_table(&mut table_lines, &mut blocks);
    blocks
}

fn is_title(line: &str) -> bool {
    let upper = line.to_uppercase();
    (TITLE.is_match(line) || upper.starts_with("TIÊU ĐỀ") || upper.starts_with("TITLE"))
        && line.chars().count() < MAX_TITLE_LEN
}

fn split_cells(line: &str) -> Vec<String> {
    let inner = line.strip_prefix('|').unwrap_or(line);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|cell| cell.trim().to_string()).collect()
}

fn flush_table(lines: &mut Vec<&str>, blocks: &mut Vec<ReportBlock>) {
    if lines.is_empty() {
        return;
    }

    let mut rows = lines
        .drain(..)
        .filter(|line| !line.contains("---"))
        .map(split_cells)
        .filter(|cells| cells.iter().any(|c| !c.is_empty()));

    if let Some(header) = rows.next() {
        blocks.push(ReportBlock::Table {
            header,
            rows: rows.collect(),
        });
    }
}

/// Flatten blocks back into plain lines, used for the on-screen preview.
pub fn plain_lines(blocks: &[ReportBlock]) -> Vec<String> {
    let mut lines = Vec::new();
    for block in blocks {
        match block {
            ReportBlock::Title(text) => {
                if !lines.is_empty() {
                    lines.push(String::new());
                }
                lines.push(text.clone());
            }
            ReportBlock::Paragraph(text) => lines.push(text.clone()),
            ReportBlock::Table { header, rows } => {
                lines.push(header.join(" | "));
                lines.push("-".repeat(header.join(" | ").chars().count().max(3)));
                lines.extend(rows.iter().map(|row| row.join(" | ")));
            }
        }
    }
    lines
}
