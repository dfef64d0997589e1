pub mod audio_handlers;
pub mod extract;
pub mod handlers;
pub mod routes;

pub use handlers::{ApiError, AppState, ErrorResponse};
pub use routes::*;
