use crate::dates::{self, MonthKey};
use crate::metrics;
use crate::models::{Student, GRADES};
use crate::parser;
use crate::ui::state::{AppState, LoginField, LoginForm, NoticeLevel, Tab, Workspace};
use crate::ui::tabs::attendance::{AttendanceFocus, AttendanceMode};
use crate::ui::tabs::form::{FormField, StudentForm};
use crate::ui::tabs::list::{grade_totals, sorted_roster};
use crate::ui::tabs::stats::{by_name, ReportKind};
use crate::ui::tabs::tuition::TuitionFocus;
use crate::ui::widgets::CalendarCursor;
use chrono::{Datelike, NaiveDate};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};
use std::collections::BTreeSet;

const GLOBAL_HELP: &str = "F1-F6: Tabs | Ctrl-R: Reload | Ctrl-L: Logout | Ctrl-Q: Quit";

pub fn render_ui(frame: &mut Frame, state: &AppState) {
    match state {
        AppState::Login(form) => render_login(frame, form),
        AppState::Ready(workspace) => render_workspace(frame, workspace),
    }
}

fn highlight() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn titled(title: impl Into<String>, focused: bool) -> Block<'static> {
    let color = if focused { Color::Yellow } else { Color::Cyan };
    Block::default()
        .title(title.into())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn field_line(label: &str, value: &str, focused: bool) -> Line<'static> {
    let cursor = if focused { "_" } else { "" };
    Line::from(vec![
        Span::styled(format!("{:<12} ", label), bold()),
        Span::styled(
            format!("{}{}", value, cursor),
            if focused { highlight() } else { Style::default() },
        ),
    ])
}

fn render_login(frame: &mut Frame, form: &LoginForm) {
    let area = centered_rect(56, 11, frame.area());
    let masked = "*".repeat(form.password.chars().count());

    let mut lines = vec![
        Line::from(""),
        field_line(
            "Username:",
            &form.username,
            form.focused_field == LoginField::Username,
        ),
        field_line(
            "Password:",
            &masked,
            form.focused_field == LoginField::Password,
        ),
        Line::from(""),
    ];
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab: Switch field | Enter: Sign in | Esc: Quit",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(titled("Class Roster - Sign in", true))
        .alignment(Alignment::Center);

    frame.render_widget(paragraph, area);
}

fn render_workspace(frame: &mut Frame, ws: &Workspace) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let titles: Vec<String> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| format!("F{} {}", i + 1, tab.title()))
        .collect();
    let tabs = Tabs::new(titles)
        .select(ws.tab.index())
        .block(titled(
            format!("Class Roster - {} - {}", ws.user.name, dates::format_dmy(ws.today)),
            false,
        ))
        .highlight_style(highlight());
    frame.render_widget(tabs, chunks[0]);

    let help = match ws.tab {
        Tab::StudentList if ws.list.editor.is_some() => {
            "Tab: Next field | Space: Toggle day | Ctrl-T: Insert teacher schedule | Ctrl-S: Save | Esc: Close"
        }
        Tab::StudentList => "↑↓: Navigate | ←→: Grade filter | Enter: Edit | x: Export CSV",
        Tab::Attendance => "Tab: Focus | Space: Toggle absent | m: Today/History | ←→: Grade | Ctrl-S: Save",
        Tab::AddStudent => {
            "Tab: Next field | Space: Toggle | Ctrl-T: Insert teacher schedule | Ctrl-S: Add student"
        }
        Tab::Tuition => "Tab: Focus | Enter: Select | ←→↑↓: Month | PgUp/PgDn: Year | Space: Toggle | Ctrl-S: Save",
        Tab::Statistics if ws.stats.report.is_some() => {
            "↑↓/PgUp/PgDn: Scroll | e: Export CSV | g/r: Regenerate | Esc: Close report"
        }
        Tab::Statistics => "↑↓: Select student | g: Class report | r: Student report",
        Tab::TeacherSchedule => "Tab/Shift-Tab: Grade | Arrows/PgUp/PgDn: Move | Space: Toggle | Ctrl-S: Save",
    };

    match ws.tab {
        Tab::StudentList => render_student_list(frame, chunks[1], ws),
        Tab::Attendance => render_attendance(frame, chunks[1], ws),
        Tab::AddStudent => render_form(frame, chunks[1], &ws.add.form, "Add Student", ws.today),
        Tab::Tuition => render_tuition(frame, chunks[1], ws),
        Tab::Statistics => render_statistics(frame, chunks[1], ws),
        Tab::TeacherSchedule => render_teacher_schedule(frame, chunks[1], ws),
    }

    let footer_title = if ws.store.degraded {
        Span::styled(
            " Offline: showing fallback data ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    } else {
        Span::raw("")
    };
    let footer = Paragraph::new(format!("{} | {}", help, GLOBAL_HELP))
        .block(Block::default().borders(Borders::ALL).title(footer_title))
        .alignment(Alignment::Center);
    frame.render_widget(footer, chunks[2]);

    if let Some(label) = ws.busy {
        render_popup(frame, "Please wait", label, Color::Cyan);
    } else if let Some(notice) = &ws.notice {
        let (title, color) = match notice.level {
            NoticeLevel::Info => ("Notice", Color::Green),
            NoticeLevel::Warning => ("Warning", Color::Yellow),
            NoticeLevel::Error => ("Error", Color::Red),
        };
        render_popup(
            frame,
            title,
            &format!("{}\n\nPress any key to continue", notice.message),
            color,
        );
    }
}

fn render_popup(frame: &mut Frame, title: &str, message: &str, color: Color) {
    let area = centered_rect(64, 9, frame.area());
    let paragraph = Paragraph::new(message.to_string())
        .block(
            Block::default()
                .title(Span::styled(
                    title.to_string(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, area);
    frame.render_widget(paragraph, area);
}

/// Monday-first month grid. `marked` days are filled, days before `start` are dimmed.
fn calendar(
    cursor: &CalendarCursor,
    marked: &BTreeSet<NaiveDate>,
    start: Option<NaiveDate>,
    today: NaiveDate,
    focused: bool,
) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            cursor.month.first_day().format("%B %Y").to_string(),
            bold(),
        )),
        Line::from(Span::styled(
            "Mo Tu We Th Fr Sa Su",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let mut column = cursor.leading_blanks();
    let mut row: Vec<Span<'static>> = (0..column).map(|_| Span::raw("   ")).collect();

    for day in cursor.month.first_day().iter_days().take(cursor.month.days() as usize) {
        let mut style = Style::default();
        if marked.contains(&day) {
            style = style.fg(Color::Black).bg(Color::Green);
        } else if start.is_some_and(|s| day < s) {
            style = style.fg(Color::DarkGray);
        }
        if day == today {
            style = style.add_modifier(Modifier::UNDERLINED);
        }
        if focused && day == cursor.date() {
            style = style.add_modifier(Modifier::REVERSED | Modifier::BOLD);
        }

        row.push(Span::styled(format!("{:>2}", day.day()), style));
        row.push(Span::raw(" "));

        column += 1;
        if column == 7 {
            lines.push(Line::from(std::mem::take(&mut row)));
            column = 0;
        }
    }
    if !row.is_empty() {
        lines.push(Line::from(row));
    }

    lines
}

fn metrics_header() -> Row<'static> {
    Row::new(vec![
        "#", "Full name", "Grade", "Class", "Phone", "Start", "Sessions", "Absent", "Attended",
        "Paid months",
    ])
    .style(bold())
}

fn render_student_list(frame: &mut Frame, area: Rect, ws: &Workspace) {
    if let Some(editor) = &ws.list.editor {
        let title = format!("Edit student #{} - {}", editor.stt, editor.full_name);
        render_form(frame, area, editor, &title, ws.today);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let mut totals = vec![Span::styled(
        format!("Total: {}", ws.store.students.len()),
        bold(),
    )];
    for (grade, count) in grade_totals(&ws.store.students) {
        let label = if grade.is_empty() { "?".to_string() } else { grade };
        totals.push(Span::raw(format!("  |  {}: {}", label, count)));
    }
    let summary = Paragraph::new(Line::from(totals))
        .block(titled(format!("Students ({})", ws.list.filter.label()), false));
    frame.render_widget(summary, chunks[0]);

    let rows: Vec<Row> = sorted_roster(&ws.store.students, &ws.list.filter)
        .into_iter()
        .map(|student| {
            let m = student.metrics(ws.today);
            Row::new(vec![
                Cell::from(student.stt.to_string()),
                Cell::from(student.full_name.clone()),
                Cell::from(student.grade.clone()),
                Cell::from(student.class_name.clone()),
                Cell::from(student.phone1.clone()),
                Cell::from(student.start_date.map(dates::format_dmy).unwrap_or_default()),
                Cell::from(m.scheduled_up_to_now.to_string()),
                Cell::from(m.absents.to_string()),
                Cell::from(m.actual_attendance.to_string()),
                Cell::from(m.paid_labels().join(" ")),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(4),
            Constraint::Min(18),
            Constraint::Length(11),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(11),
            Constraint::Length(9),
            Constraint::Length(7),
            Constraint::Length(9),
            Constraint::Min(12),
        ],
    )
    .header(metrics_header())
    .block(titled("Roster", true))
    .highlight_style(highlight())
    .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(ws.list.selected));
    frame.render_stateful_widget(table, chunks[1], &mut state);
}

fn render_form(frame: &mut Frame, area: Rect, form: &StudentForm, title: &str, today: NaiveDate) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let text_fields: Vec<Line> = form
        .fields()
        .iter()
        .filter_map(|field| {
            let value = match field {
                FormField::FullName => &form.full_name,
                FormField::Grade => &form.grade,
                FormField::ClassName => &form.class_name,
                FormField::Phone1 => &form.phone1,
                FormField::Phone2 => &form.phone2,
                FormField::StartDate => &form.start_date,
                FormField::Schedule | FormField::Tuition => return None,
            };
            let value = if *field == FormField::Grade {
                format!("◀ {} ▶", value)
            } else {
                value.clone()
            };
            Some(field_line(field.label(), &value, form.focus == *field))
        })
        .collect();

    let mut lines = text_fields;
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("Scheduled days: ", bold()),
        Span::raw(form.schedule.len().to_string()),
    ]));
    if let (Some(first), Some(last)) = (form.schedule.first(), form.schedule.last()) {
        lines.push(Line::from(format!(
            "  {} - {}",
            dates::format_dmy(*first),
            dates::format_dmy(*last)
        )));
    }
    if !form.attendance.is_empty() {
        lines.push(Line::from(vec![
            Span::styled("Absences: ", bold()),
            Span::raw(form.attendance.len().to_string()),
        ]));
    }
    if form.start_date.trim().is_empty() {
        lines.push(Line::from(Span::styled(
            "No start date: every day can be scheduled",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(
        Paragraph::new(lines).block(titled(title.to_string(), true)),
        columns[0],
    );

    let right = if form.with_tuition {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(10), Constraint::Min(6)])
            .split(columns[1])
    } else {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(10)])
            .split(columns[1])
    };

    let start = form.parsed_start().ok().flatten();
    let schedule_focused = form.focus == FormField::Schedule;
    frame.render_widget(
        Paragraph::new(calendar(
            &form.calendar,
            &form.schedule,
            start,
            today,
            schedule_focused,
        ))
        .block(titled("Schedule (PgUp/PgDn: month)", schedule_focused)),
        right[0],
    );

    if form.with_tuition {
        let focused = form.focus == FormField::Tuition;
        frame.render_widget(
            Paragraph::new(month_grid(form.tuition_cursor, &form.tuition, focused))
                .block(titled(format!("Tuition {}", form.tuition_cursor.year), focused)),
            right[1],
        );
    }
}

/// Twelve months of `cursor.year` in rows of three, paid months marked.
fn month_grid(cursor: MonthKey, paid: &BTreeSet<MonthKey>, focused: bool) -> Vec<Line<'static>> {
    (0..4u32)
        .map(|row| {
            let spans: Vec<Span> = (1..=3u32)
                .filter_map(|col| MonthKey::new(cursor.year, row * 3 + col))
                .flat_map(|month| {
                    let is_paid = paid.contains(&month);
                    let mut style = if is_paid {
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    if focused && month == cursor {
                        style = style.add_modifier(Modifier::REVERSED);
                    }
                    let mark = if is_paid { "x" } else { " " };
                    [
                        Span::styled(format!("T{:02} [{}]", month.month, mark), style),
                        Span::raw("  "),
                    ]
                })
                .collect();
            Line::from(spans)
        })
        .collect()
}

fn render_attendance(frame: &mut Frame, area: Rect, ws: &Workspace) {
    let tab = &ws.attendance;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(3)])
        .split(area);

    let day = tab.active_day(ws.today);
    let date_text = match (tab.mode, &day) {
        (AttendanceMode::Today, Ok(day)) => format!("Today {}", dates::format_dmy(*day)),
        (AttendanceMode::History, Ok(_)) => match dates::normalize(&tab.date_input) {
            Ok(canonical) => format!("{} ({})", tab.date_input, canonical),
            Err(_) => tab.date_input.clone(),
        },
        (AttendanceMode::History, Err(_)) => tab.date_input.clone(),
        (AttendanceMode::Today, Err(_)) => String::new(),
    };

    let mut search_line = field_line("Search:", &tab.search, tab.focus == AttendanceFocus::Search);
    search_line.spans.push(Span::styled(
        format!("   Pending changes: {}", tab.pending.len()),
        Style::default().fg(Color::Yellow),
    ));

    let controls = vec![
        Line::from(vec![
            Span::styled("Mode: ", bold()),
            Span::raw(match tab.mode {
                AttendanceMode::Today => "Today   ",
                AttendanceMode::History => "History ",
            }),
            Span::styled("Date: ", bold()),
            Span::styled(
                format!("{:<26}", date_text),
                if tab.focus == AttendanceFocus::Date {
                    highlight()
                } else {
                    Style::default()
                },
            ),
            Span::styled("Filter: ", bold()),
            Span::raw(tab.filter.label()),
        ]),
        search_line,
    ];
    frame.render_widget(
        Paragraph::new(controls).block(titled("Attendance", false)),
        chunks[0],
    );

    let rows: Vec<Row> = match &day {
        Ok(day) => tab
            .visible(&ws.store.students)
            .into_iter()
            .map(|student| {
                let absent = tab.marked_absent(student, *day);
                let pending = if tab.pending.contains(&student.stt) { " *" } else { "" };
                let status = if absent {
                    Cell::from(format!("Absent{}", pending)).style(Style::default().fg(Color::Red))
                } else {
                    Cell::from(format!("Present{}", pending))
                        .style(Style::default().fg(Color::Green))
                };
                Row::new(vec![
                    Cell::from(student.full_name.clone()),
                    Cell::from(student.grade.clone()),
                    Cell::from(student.class_name.clone()),
                    Cell::from(student.phone1.clone()),
                    status,
                ])
            })
            .collect(),
        Err(e) => vec![Row::new(vec![Cell::from(format!("Invalid date: {}", e))
            .style(Style::default().fg(Color::Red))])],
    };

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(11),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
    )
    .header(Row::new(vec!["Full name", "Grade", "Class", "Phone", "Status"]).style(bold()))
    .block(titled("Students", tab.focus == AttendanceFocus::List))
    .highlight_style(highlight())
    .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(tab.selected));
    frame.render_stateful_widget(table, chunks[1], &mut state);
}

fn student_items<'a>(students: &[&Student], selected: usize) -> Vec<ListItem<'a>> {
    students
        .iter()
        .enumerate()
        .map(|(i, student)| {
            let style = if i == selected {
                highlight()
            } else {
                Style::default()
            };
            let prefix = if i == selected { "> " } else { "  " };
            ListItem::new(format!(
                "{}{} ({}, {})",
                prefix, student.full_name, student.grade, student.class_name
            ))
            .style(style)
        })
        .collect()
}

fn render_tuition(frame: &mut Frame, area: Rect, ws: &Workspace) {
    let tab = &ws.tuition;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(columns[0]);

    frame.render_widget(
        Paragraph::new(field_line("Search:", &tab.search, tab.focus == TuitionFocus::Search))
            .block(titled(tab.filter.label(), tab.focus == TuitionFocus::Search)),
        left[0],
    );
    frame.render_widget(
        List::new(student_items(&tab.visible(&ws.store.students), tab.cursor))
            .block(titled("Students", tab.focus == TuitionFocus::List)),
        left[1],
    );

    let focused = tab.focus == TuitionFocus::Months;
    let lines = match tab.selected(&ws.store) {
        None => vec![Line::from(Span::styled(
            "Select a student with Enter",
            Style::default().fg(Color::DarkGray),
        ))],
        Some(student) => {
            let mut lines = vec![
                Line::from(vec![
                    Span::styled("Student: ", bold()),
                    Span::raw(format!("{} ({})", student.full_name, student.class_name)),
                ]),
                Line::from(vec![
                    Span::styled("Start: ", bold()),
                    Span::raw(student.start_date.map(dates::format_dmy).unwrap_or_default()),
                ]),
                Line::from(""),
            ];
            let cursor = MonthKey::new(tab.year, tab.month).unwrap_or_else(|| MonthKey::of(ws.today));
            lines.extend(month_grid(cursor, &tab.paid, focused));
            lines.push(Line::from(""));
            if tab.has_changes(&ws.store) {
                lines.push(Line::from(Span::styled(
                    "Unsaved changes (Ctrl-S to save)",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
            }
            let debts = student.debt_months(MonthKey::of(ws.today));
            if !debts.is_empty() {
                lines.push(Line::from(Span::styled(
                    format!(
                        "Owes {} month(s): {}",
                        debts.len(),
                        debts.iter().map(MonthKey::label).collect::<Vec<_>>().join(" ")
                    ),
                    Style::default().fg(Color::Red),
                )));
            }
            lines
        }
    };

    frame.render_widget(
        Paragraph::new(lines)
            .block(titled(format!("Tuition {}", tab.year), focused))
            .wrap(Wrap { trim: true }),
        columns[1],
    );
}

fn names(students: &[&Student]) -> String {
    if students.is_empty() {
        return "-".to_string();
    }
    students
        .iter()
        .map(|s| s.full_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_statistics(frame: &mut Frame, area: Rect, ws: &Workspace) {
    let month = MonthKey::of(ws.today);
    let status = metrics::classify(&ws.store.students, month);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(5)])
        .split(area);

    let summary = vec![
        Line::from(vec![
            Span::styled(format!("{}  ", month.label()), bold()),
            Span::styled(
                format!("Paid: {}  ", status.paid.len()),
                Style::default().fg(Color::Green),
            ),
            Span::styled(
                format!("Unpaid: {}  ", status.unpaid.len()),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                format!("In debt: {}", status.in_debt.len()),
                Style::default().fg(Color::Red),
            ),
        ]),
        Line::from(format!("Unpaid: {}", names(&status.unpaid))),
        Line::from(format!("In debt: {}", names(&status.in_debt))),
    ];
    frame.render_widget(
        Paragraph::new(summary)
            .block(titled("Tuition overview", false))
            .wrap(Wrap { trim: true }),
        chunks[0],
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);

    let ordered = by_name(&ws.store.students);
    frame.render_widget(
        List::new(student_items(&ordered, ws.stats.selected))
            .block(titled("Students", ws.stats.report.is_none())),
        columns[0],
    );

    if let Some(report) = &ws.stats.report {
        let title = match report.kind {
            ReportKind::Class => format!("Class report - {}", report.label),
            ReportKind::Student => format!("Student report - {}", report.label),
        };
        let lines: Vec<Line> = parser::plain_lines(&report.blocks)
            .into_iter()
            .map(Line::from)
            .collect();
        frame.render_widget(
            Paragraph::new(lines)
                .block(titled(title, true))
                .wrap(Wrap { trim: false })
                .scroll((ws.stats.scroll, 0)),
            columns[1],
        );
        return;
    }

    let lines = match ws.stats.selected_student(&ws.store) {
        None => vec![Line::from("No students")],
        Some(student) => {
            let m = student.metrics(ws.today);
            let debts = student.debt_months(month);
            let row = |label: &str, value: String| {
                Line::from(vec![Span::styled(format!("{:<22}", label), bold()), Span::raw(value)])
            };
            vec![
                row("Student:", format!("{} ({})", student.full_name, student.class_name)),
                row(
                    "Start date:",
                    student.start_date.map(dates::format_dmy).unwrap_or_default(),
                ),
                row("Sessions to date:", m.scheduled_up_to_now.to_string()),
                row("Absences:", m.absents.to_string()),
                row("Attended:", m.actual_attendance.to_string()),
                row(
                    "Months paid:",
                    format!("{} {}", m.paid_count, m.paid_labels().join(" ")),
                ),
                row(
                    "Months unpaid:",
                    format!("{} {}", m.unpaid_count, m.unpaid_labels().join(" ")),
                ),
                row("Months enrolled:", m.total_months.to_string()),
                row(
                    "Earlier months owed:",
                    debts.iter().map(MonthKey::label).collect::<Vec<_>>().join(" "),
                ),
            ]
        }
    };
    frame.render_widget(
        Paragraph::new(lines)
            .block(titled("Student analysis", false))
            .wrap(Wrap { trim: true }),
        columns[1],
    );
}

fn render_teacher_schedule(frame: &mut Frame, area: Rect, ws: &Workspace) {
    let tab = &ws.teacher;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(16), Constraint::Min(30)])
        .split(area);

    let items: Vec<ListItem> = GRADES
        .iter()
        .enumerate()
        .map(|(i, grade)| {
            let selected = tab.grade == Some(i);
            let saved = ws.store.template_for(grade).is_ok();
            let marker = if saved { " •" } else { "" };
            ListItem::new(format!(
                "{}Grade {}{}",
                if selected { "> " } else { "  " },
                grade,
                marker
            ))
            .style(if selected { highlight() } else { Style::default() })
        })
        .collect();
    frame.render_widget(List::new(items).block(titled("Grades", false)), columns[0]);

    let mut lines = calendar(&tab.calendar, &tab.days, None, ws.today, tab.grade.is_some());
    lines.push(Line::from(""));
    match tab.grade() {
        None => lines.push(Line::from(Span::styled(
            "Choose a grade with Tab",
            Style::default().fg(Color::Yellow),
        ))),
        Some(grade) => {
            let in_month = tab
                .days
                .iter()
                .filter(|d| MonthKey::of(**d) == tab.calendar.month)
                .count();
            lines.push(Line::from(format!(
                "Grade {}: {} teaching day(s) this month, {} in total",
                grade,
                in_month,
                tab.days.len()
            )));
        }
    }

    let title = match tab.grade() {
        Some(grade) => format!("Teaching days - grade {}", grade),
        None => "Teaching days".to_string(),
    };
    frame.render_widget(
        Paragraph::new(lines).block(titled(title, tab.grade.is_some())),
        columns[1],
    );
}
