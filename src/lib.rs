pub mod config;
pub mod csv;
pub mod error;
pub mod input;
pub mod logger;
pub mod models;
pub mod service;
pub mod session;
pub mod ui;
pub mod utils;
pub mod worker;

// Re-exports for convenience
pub use config::{AppConfig, ServiceBackend, SessionConfig};
pub use error::{ConfigError, ServiceError, ValidationError};
pub use input::{
    handle_exercise_input, handle_menu_input, AnswerInput, ExerciseAction, ExerciseView,
    MenuAction, MenuState,
};
pub use models::{Answer, AppState, Mode, Prompt, PromptKind, SessionStats, TurnResult};
pub use service::{HttpWordService, LocalWordService, WordService};
pub use session::{ExerciseSession, SessionState, Speaker};
pub use ui::{draw_exercise, draw_menu};
pub use worker::spawn_service_worker;
