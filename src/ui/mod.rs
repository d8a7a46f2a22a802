mod app;
mod render;
mod state;
mod tabs;
mod widgets;

pub use app::App;
