pub mod common;
pub mod ticks;
pub mod user;
pub mod user_audio;

pub use common::*;
pub use ticks::*;
pub use user::*;
pub use user_audio::*;
