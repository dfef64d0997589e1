//! Request payload validation.
//!
//! Payloads arrive with every field optional so that a missing field, an
//! explicit `null` and a real value can be told apart. Validation turns them
//! into the typed inputs of the model, or reports every offending field at
//! once.

use serde::{Deserialize, Deserializer, Serialize};
use std::ops::RangeInclusive;
use thiserror::Error;

use crate::model::{
    NewUser, NewUserAudio, Ticks, TicksError, UserAudioChanges, UserChanges, SELECTED_TICK_RANGE,
    STEP_COUNT_RANGE, TICK_COUNT, TICK_MAX, TICK_MIN,
};

/// A payload field: `None` when absent, `Some(None)` when sent as `null`.
pub type Sparse<T> = Option<Option<T>>;

/// Keeps an explicit `null` distinct from a missing field.
fn present<'de, D, T>(deserializer: D) -> Result<Sparse<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserCreateRequest {
    #[serde(default, deserialize_with = "present")]
    pub name: Sparse<String>,
    #[serde(default, deserialize_with = "present")]
    pub email: Sparse<String>,
    #[serde(default, deserialize_with = "present")]
    pub address: Sparse<String>,
    #[serde(default, deserialize_with = "present")]
    pub image: Sparse<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdateRequest {
    #[serde(default, deserialize_with = "present")]
    pub name: Sparse<String>,
    #[serde(default, deserialize_with = "present")]
    pub email: Sparse<String>,
    #[serde(default, deserialize_with = "present")]
    pub address: Sparse<String>,
    #[serde(default, deserialize_with = "present")]
    pub image: Sparse<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserAudioCreateRequest {
    #[serde(default, deserialize_with = "present")]
    pub ticks: Sparse<Vec<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub selected_tick: Sparse<i64>,
    #[serde(default, deserialize_with = "present")]
    pub session_id: Sparse<i64>,
    #[serde(default, deserialize_with = "present")]
    pub step_count: Sparse<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserAudioUpdateRequest {
    #[serde(default, deserialize_with = "present")]
    pub ticks: Sparse<Vec<f64>>,
    #[serde(default, deserialize_with = "present")]
    pub selected_tick: Sparse<i64>,
    #[serde(default, deserialize_with = "present")]
    pub session_id: Sparse<i64>,
    #[serde(default, deserialize_with = "present")]
    pub step_count: Sparse<i64>,
}

/// One step of an error location, e.g. `["body", "ticks", 3]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LocSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for LocSegment {
    fn from(key: &str) -> Self {
        LocSegment::Key(key.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: Vec<LocSegment>,
    pub msg: String,
}

impl FieldError {
    pub fn new(loc: Vec<LocSegment>, msg: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
        }
    }

    fn body(field: &str, msg: impl Into<String>) -> Self {
        Self::new(vec!["body".into(), field.into()], msg)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{} invalid field(s)", .0.len())]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }
}

#[derive(Default)]
struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    fn required<T>(&mut self, field: &str, value: Sparse<T>) -> Option<T> {
        match value {
            None => {
                self.errors.push(FieldError::body(field, "field required"));
                None
            }
            other => self.optional(field, other),
        }
    }

    fn optional<T>(&mut self, field: &str, value: Sparse<T>) -> Option<T> {
        match value {
            None => None,
            Some(None) => {
                self.errors
                    .push(FieldError::body(field, "none is not an allowed value"));
                None
            }
            Some(Some(value)) => Some(value),
        }
    }

    fn ticks(&mut self, values: Vec<f64>) -> Option<Ticks> {
        match Ticks::try_from(values) {
            Ok(ticks) => Some(ticks),
            Err(errors) => {
                self.errors.extend(errors.into_iter().map(|error| match error {
                    TicksError::TooFew(_) => FieldError::body(
                        "ticks",
                        format!("ensure this value has at least {} items", TICK_COUNT),
                    ),
                    TicksError::TooMany(_) => FieldError::body(
                        "ticks",
                        format!("ensure this value has at most {} items", TICK_COUNT),
                    ),
                    TicksError::AboveMax { index } => FieldError::new(
                        vec!["body".into(), "ticks".into(), LocSegment::Index(index)],
                        format!("ensure this value is less than or equal to {:?}", TICK_MAX),
                    ),
                    TicksError::BelowMin { index } => FieldError::new(
                        vec!["body".into(), "ticks".into(), LocSegment::Index(index)],
                        format!("ensure this value is greater than or equal to {:?}", TICK_MIN),
                    ),
                }));
                None
            }
        }
    }

    fn bounded(&mut self, field: &str, value: i64, range: RangeInclusive<i32>) -> Option<i32> {
        if value < i64::from(*range.start()) {
            self.errors.push(FieldError::body(
                field,
                format!("ensure this value is greater than or equal to {}", range.start()),
            ));
            return None;
        }
        if value > i64::from(*range.end()) {
            self.errors.push(FieldError::body(
                field,
                format!("ensure this value is less than or equal to {}", range.end()),
            ));
            return None;
        }
        i32::try_from(value).ok()
    }

    fn into_result<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(ValidationErrors(self.errors)),
        }
    }
}

const SESSION_ID_RANGE: RangeInclusive<i32> = i32::MIN..=i32::MAX;

pub fn new_user(request: UserCreateRequest) -> Result<NewUser, ValidationErrors> {
    let mut v = Validator::default();

    let name = v.required("name", request.name);
    let email = v.required("email", request.email);
    let address = v.required("address", request.address);
    let image = v.required("image", request.image);

    let new_user = match (name, email, address, image) {
        (Some(name), Some(email), Some(address), Some(image)) => Some(NewUser {
            name,
            email,
            address,
            image,
        }),
        _ => None,
    };
    v.into_result(new_user)
}

pub fn user_changes(request: UserUpdateRequest) -> Result<UserChanges, ValidationErrors> {
    let mut v = Validator::default();

    let changes = UserChanges {
        name: v.optional("name", request.name),
        email: v.optional("email", request.email),
        address: v.optional("address", request.address),
        image: v.optional("image", request.image),
    };
    v.into_result(Some(changes))
}

pub fn new_user_audio(request: UserAudioCreateRequest) -> Result<NewUserAudio, ValidationErrors> {
    let mut v = Validator::default();

    let ticks = v.required("ticks", request.ticks).and_then(|t| v.ticks(t));
    let selected_tick = v
        .required("selected_tick", request.selected_tick)
        .and_then(|n| v.bounded("selected_tick", n, SELECTED_TICK_RANGE));
    let session_id = v
        .required("session_id", request.session_id)
        .and_then(|n| v.bounded("session_id", n, SESSION_ID_RANGE));
    let step_count = v
        .required("step_count", request.step_count)
        .and_then(|n| v.bounded("step_count", n, STEP_COUNT_RANGE));

    let new_audio = match (ticks, selected_tick, session_id, step_count) {
        (Some(ticks), Some(selected_tick), Some(session_id), Some(step_count)) => {
            Some(NewUserAudio {
                ticks,
                selected_tick,
                session_id,
                step_count,
            })
        }
        _ => None,
    };
    v.into_result(new_audio)
}

pub fn user_audio_changes(
    request: UserAudioUpdateRequest,
) -> Result<UserAudioChanges, ValidationErrors> {
    let mut v = Validator::default();

    let ticks = v.optional("ticks", request.ticks).and_then(|t| v.ticks(t));
    let selected_tick = v
        .optional("selected_tick", request.selected_tick)
        .and_then(|n| v.bounded("selected_tick", n, SELECTED_TICK_RANGE));
    let session_id = v
        .optional("session_id", request.session_id)
        .and_then(|n| v.bounded("session_id", n, SESSION_ID_RANGE));
    let step_count = v
        .optional("step_count", request.step_count)
        .and_then(|n| v.bounded("step_count", n, STEP_COUNT_RANGE));

    let changes = UserAudioChanges {
        ticks,
        selected_tick,
        session_id,
        step_count,
    };
    v.into_result(Some(changes))
}
