use crate::auth;
use crate::models::{AuthUser, Student, TeacherSchedule, UserAccount};
use crate::store::RecordStore;
use crate::ui::tabs::{
    AddStudentTab, AttendanceTab, StatisticsTab, StudentListTab, TeacherScheduleTab, TuitionTab,
};
use crate::ui::widgets::{edit_text, is_ctrl};
use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent};

pub enum AppState {
    Login(LoginForm),
    Ready(Box<Workspace>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub focused_field: LoginField,
    pub error: Option<String>,
}

pub enum LoginEvent {
    None,
    Quit,
    SignedIn(AuthUser),
}

impl LoginForm {
    pub fn handle_key(&mut self, key: KeyEvent, users: &[UserAccount]) -> LoginEvent {
        if is_ctrl(&key, 'q') || key.code == KeyCode::Esc {
            return LoginEvent::Quit;
        }

        match key.code {
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.focused_field = match self.focused_field {
                    LoginField::Username => LoginField::Password,
                    LoginField::Password => LoginField::Username,
                };
            }
            KeyCode::Enter => {
                if self.focused_field == LoginField::Username {
                    self.focused_field = LoginField::Password;
                    return LoginEvent::None;
                }
                return match auth::authenticate(users, &self.username, &self.password) {
                    Some(user) => LoginEvent::SignedIn(user),
                    None => {
                        self.password.clear();
                        self.error = Some("Wrong username or password".to_string());
                        LoginEvent::None
                    }
                };
            }
            _ => {
                let field = match self.focused_field {
                    LoginField::Username => &mut self.username,
                    LoginField::Password => &mut self.password,
                };
                if edit_text(field, &key, 64) {
                    self.error = None;
                }
            }
        }

        LoginEvent::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    StudentList,
    Attendance,
    AddStudent,
    Tuition,
    Statistics,
    TeacherSchedule,
}

impl Tab {
    pub const ALL: [Tab; 6] = [
        Tab::StudentList,
        Tab::Attendance,
        Tab::AddStudent,
        Tab::Tuition,
        Tab::Statistics,
        Tab::TeacherSchedule,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::StudentList => "Students",
            Tab::Attendance => "Attendance",
            Tab::AddStudent => "Add Student",
            Tab::Tuition => "Tuition",
            Tab::Statistics => "Statistics",
            Tab::TeacherSchedule => "Teacher Schedule",
        }
    }

    pub fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A modal message; the next key press dismisses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// What a key press asks the application to do.
#[derive(Debug, Clone)]
pub enum Command {
    None,
    Quit,
    Logout,
    Reload,
    Notify(Notice),
    UpdateStudent(Student),
    CreateStudent(Student),
    RecordAbsences { day: NaiveDate, stts: Vec<u32> },
    SaveTemplate(TeacherSchedule),
    ClassReport,
    StudentReport(u32),
    ExportReport,
    ExportRoster,
}

impl Command {
    /// Text for the busy overlay while the command runs.
    pub fn busy_label(&self) -> &'static str {
        match self {
            Command::Reload => "Loading roster...",
            Command::UpdateStudent(_) => "Saving student...",
            Command::CreateStudent(_) => "Adding student...",
            Command::RecordAbsences { .. } => "Saving attendance...",
            Command::SaveTemplate(_) => "Saving teacher schedule...",
            Command::ClassReport | Command::StudentReport(_) => "Generating report...",
            Command::ExportReport | Command::ExportRoster => "Exporting...",
            _ => "Working...",
        }
    }
}

/// Everything behind the login screen.
pub struct Workspace {
    pub user: AuthUser,
    pub tab: Tab,
    pub store: RecordStore,
    pub today: NaiveDate,
    pub list: StudentListTab,
    pub attendance: AttendanceTab,
    pub add: AddStudentTab,
    pub tuition: TuitionTab,
    pub stats: StatisticsTab,
    pub teacher: TeacherScheduleTab,
    pub notice: Option<Notice>,
    pub busy: Option<&'static str>,
}

impl Workspace {
    pub fn new(user: AuthUser, today: NaiveDate) -> Self {
        Self {
            user,
            tab: Tab::StudentList,
            store: RecordStore::default(),
            today,
            list: StudentListTab::default(),
            attendance: AttendanceTab::new(today),
            add: AddStudentTab::new(today),
            tuition: TuitionTab::new(today),
            stats: StatisticsTab::default(),
            teacher: TeacherScheduleTab::new(today),
            notice: None,
            busy: None,
        }
    }

    /// Swap in freshly loaded records and bring every tab back in line with them.
    pub fn replace_store(&mut self, store: RecordStore) {
        self.store = store;
        self.list.sync(&self.store);
        self.attendance.sync(&self.store);
        self.tuition.sync(&self.store);
        self.stats.sync(&self.store);
        self.teacher.sync(&self.store);
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Command {
        if self.busy.is_some() {
            return Command::None;
        }
        if self.notice.take().is_some() {
            return Command::None;
        }

        if is_ctrl(&key, 'q') {
            return Command::Quit;
        }
        if is_ctrl(&key, 'l') {
            return Command::Logout;
        }
        if is_ctrl(&key, 'r') {
            return Command::Reload;
        }
        if let KeyCode::F(n) = key.code {
            if let Some(tab) = Tab::ALL.get(usize::from(n).wrapping_sub(1)) {
                self.tab = *tab;
            }
            return Command::None;
        }

        match self.tab {
            Tab::StudentList => self.list.handle_key(key, &self.store, self.today),
            Tab::Attendance => self.attendance.handle_key(key, &self.store, self.today),
            Tab::AddStudent => self.add.handle_key(key, &self.store),
            Tab::Tuition => self.tuition.handle_key(key, &self.store),
            Tab::Statistics => self.stats.handle_key(key, &self.store),
            Tab::TeacherSchedule => self.teacher.handle_key(key, &self.store),
        }
    }
}
