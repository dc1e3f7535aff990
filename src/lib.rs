pub mod app;
pub mod audio;
pub mod calendar;
pub mod calendar_log;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod i18n;
pub mod models;
pub mod shell;
pub mod state;
pub mod storage;
pub mod timer;
pub mod ui;
pub mod wheel;

pub use app::router;
pub use state::AppState;
pub use storage::resolve_data_dir;
