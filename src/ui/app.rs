use crate::api::ReportClient;
use crate::dates::{self, MonthKey};
use crate::error::RosterError;
use crate::export;
use crate::models::UserAccount;
use crate::parser;
use crate::store::{self, RecordStore, RosterBackend};
use crate::ui::render::render_ui;
use crate::ui::state::{AppState, Command, LoginEvent, LoginForm, Notice, Workspace};
use crate::ui::tabs::stats::{GeneratedReport, ReportKind};
use anyhow::Result;
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use tracing::{error, info, warn};

pub struct App {
    backend: Box<dyn RosterBackend>,
    reports: Option<ReportClient>,
    users: Vec<UserAccount>,
    export_dir: PathBuf,
    state: AppState,
    /// Runs on the next loop iteration, after the busy overlay has been drawn.
    pending: Option<Command>,
}

impl App {
    pub fn new(
        backend: Box<dyn RosterBackend>,
        reports: Option<ReportClient>,
        users: Vec<UserAccount>,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            backend,
            reports,
            users,
            export_dir,
            state: AppState::Login(LoginForm::default()),
            pending: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.event_loop(&mut terminal).await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        loop {
            terminal.draw(|f| render_ui(f, &self.state))?;

            if let Some(command) = self.pending.take() {
                self.execute(command).await;
                continue;
            }

            if event::poll(std::time::Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let command = self.handle_key_event(key);
                    if self.dispatch(command) {
                        break;
                    }
                }
            }

            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Command {
        match &mut self.state {
            AppState::Ready(workspace) => workspace.handle_key(key),
            AppState::Login(form) => match form.handle_key(key, &self.users) {
                LoginEvent::None => Command::None,
                LoginEvent::Quit => Command::Quit,
                LoginEvent::SignedIn(user) => {
                    let today = Local::now().date_naive();
                    self.state = AppState::Ready(Box::new(Workspace::new(user, today)));
                    Command::Reload
                }
            },
        }
    }

    /// Apply a command's immediate effect. Returns `true` when the app should exit.
    fn dispatch(&mut self, command: Command) -> bool {
        match command {
            Command::None => {}
            Command::Quit => return true,
            Command::Logout => {
                if let AppState::Ready(workspace) = &self.state {
                    info!("User {} signed out", workspace.user.username);
                }
                self.state = AppState::Login(LoginForm::default());
            }
            Command::Notify(notice) => {
                if let AppState::Ready(workspace) = &mut self.state {
                    workspace.notice = Some(notice);
                }
            }
            command => {
                if let AppState::Ready(workspace) = &mut self.state {
                    workspace.busy = Some(command.busy_label());
                    self.pending = Some(command);
                }
            }
        }
        false
    }

    async fn execute(&mut self, command: Command) {
        let AppState::Ready(workspace) = &mut self.state else {
            return;
        };
        let backend = self.backend.as_ref();

        let notice = match command {
            Command::Reload => reload(backend, workspace).await,
            Command::UpdateStudent(student) => match backend.update_student(&student).await {
                Ok(()) => {
                    workspace.list.saved(student.stt);
                    let degraded = reload(backend, workspace).await;
                    degraded.or_else(|| Some(Notice::info(format!("Saved {}", student.full_name))))
                }
                Err(e) => {
                    error!("Error updating student #{}: {:#}", student.stt, e);
                    Some(Notice::error(format!("Could not save {}: {}", student.full_name, e)))
                }
            },
            Command::CreateStudent(student) => match backend.add_student(&student).await {
                Ok(()) => {
                    workspace.add.reset(workspace.today);
                    let degraded = reload(backend, workspace).await;
                    degraded.or_else(|| Some(Notice::info(format!("Added {}", student.full_name))))
                }
                Err(e) => {
                    error!("Error adding student: {:#}", e);
                    Some(Notice::error(format!("Could not add {}: {}", student.full_name, e)))
                }
            },
            Command::RecordAbsences { day, stts } => {
                let outcome =
                    store::record_absences(backend, &workspace.store.students, day, &stts).await;
                workspace.attendance.pending.clear();
                let degraded = reload(backend, workspace).await;
                let message = format!(
                    "Updated attendance for {} of {} student(s) on {}",
                    outcome.succeeded,
                    outcome.attempted,
                    dates::format_dmy(day)
                );
                degraded.or_else(|| {
                    Some(if outcome.succeeded == outcome.attempted {
                        Notice::info(message)
                    } else {
                        Notice::warning(message)
                    })
                })
            }
            Command::SaveTemplate(template) => {
                match backend.update_teacher_schedule(&template).await {
                    Ok(()) => {
                        let degraded = reload(backend, workspace).await;
                        degraded.or_else(|| {
                            Some(Notice::info(format!(
                                "Saved {} teaching day(s) for grade {}",
                                template.days.len(),
                                template.grade
                            )))
                        })
                    }
                    Err(e) => {
                        error!("Error saving teacher schedule for grade {}: {:#}", template.grade, e);
                        Some(Notice::error(format!("Could not save teacher schedule: {}", e)))
                    }
                }
            }
            Command::ClassReport => match &self.reports {
                None => Some(Notice::warning(RosterError::ReportsDisabled.to_string())),
                Some(client) => {
                    let month = MonthKey::of(workspace.today);
                    match client.class_report(&workspace.store.students, month).await {
                        Ok(text) => {
                            workspace.stats.show_report(GeneratedReport {
                                kind: ReportKind::Class,
                                label: month.label(),
                                blocks: parser::parse_report(&text),
                            });
                            None
                        }
                        Err(e) => {
                            error!("Error generating class report: {:#}", e);
                            Some(Notice::error(format!("Report generation failed: {}", e)))
                        }
                    }
                }
            },
            Command::StudentReport(stt) => {
                let student = workspace.store.student(stt).cloned();
                match (&self.reports, student) {
                    (None, _) => Some(Notice::warning(RosterError::ReportsDisabled.to_string())),
                    (Some(_), None) => {
                        Some(Notice::warning(RosterError::UnknownStudent(stt).to_string()))
                    }
                    (Some(client), Some(student)) => {
                        let metrics = student.metrics(workspace.today);
                        match client.student_report(&student, &metrics).await {
                            Ok(text) => {
                                workspace.stats.show_report(GeneratedReport {
                                    kind: ReportKind::Student,
                                    label: student.full_name,
                                    blocks: parser::parse_report(&text),
                                });
                                None
                            }
                            Err(e) => {
                                error!("Error generating report for student #{}: {:#}", stt, e);
                                Some(Notice::error(format!("Report generation failed: {}", e)))
                            }
                        }
                    }
                }
            }
            Command::ExportReport => match &workspace.stats.report {
                None => Some(Notice::info("Generate a report first")),
                Some(report) => Some(exported(export::export_report(
                    &report.blocks,
                    &report.label,
                    &self.export_dir,
                ))),
            },
            Command::ExportRoster => Some(exported(export::export_roster(
                &workspace.store.students,
                workspace.today,
                &self.export_dir,
            ))),
            Command::None | Command::Quit | Command::Logout | Command::Notify(_) => None,
        };

        workspace.busy = None;
        if notice.is_some() {
            workspace.notice = notice;
        }
    }
}

/// Reload both sheets into the workspace. Returns a warning when fallback data is shown.
async fn reload(backend: &dyn RosterBackend, workspace: &mut Workspace) -> Option<Notice> {
    workspace.today = Local::now().date_naive();
    let store = RecordStore::load(backend).await;
    let degraded = store.degraded;
    workspace.replace_store(store);

    degraded.then(|| {
        warn!("Showing fallback data after a failed load");
        Notice::warning("Could not reach the spreadsheet. Showing fallback data.")
    })
}

fn exported(result: Result<PathBuf>) -> Notice {
    match result {
        Ok(path) => {
            info!("Exported {}", path.display());
            Notice::info(format!("Exported to {}", path.display()))
        }
        Err(e) => {
            error!("Export failed: {:#}", e);
            Notice::error(format!("Export failed: {:#}", e))
        }
    }
}
