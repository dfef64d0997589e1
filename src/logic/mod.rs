pub mod error;
pub mod health;
pub mod user_audios;
pub mod users;
pub mod validate;

pub use error::*;
pub use health::*;
pub use user_audios::*;
pub use users::*;
pub use validate::{
    FieldError, LocSegment, UserAudioCreateRequest, UserAudioUpdateRequest, UserCreateRequest,
    UserUpdateRequest, ValidationErrors,
};
