pub mod add;
pub mod attendance;
pub mod form;
pub mod list;
pub mod stats;
pub mod teacher;
pub mod tuition;

pub use add::AddStudentTab;
pub use attendance::AttendanceTab;
pub use list::StudentListTab;
pub use stats::StatisticsTab;
pub use teacher::TeacherScheduleTab;
pub use tuition::TuitionTab;
