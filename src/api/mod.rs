pub mod reports;
pub mod sheets;

pub use reports::ReportClient;
pub use sheets::SheetsApi;
