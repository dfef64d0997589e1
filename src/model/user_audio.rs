use crate::model::{generate_id, next_update_time, now, Id, Ticks, Timestamp, TICK_COUNT};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const SELECTED_TICK_RANGE: RangeInclusive<i32> = 0..=(TICK_COUNT as i32 - 1);
pub const STEP_COUNT_RANGE: RangeInclusive<i32> = 0..=9;

/// Audio calibration captured for one session of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAudio {
    pub id: Id,
    pub user_id: Id,
    pub ticks: Ticks,
    pub selected_tick: i32,
    pub session_id: i32, // unique across all audios
    pub step_count: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserAudio {
    pub fn new(user_id: Id, new_audio: NewUserAudio) -> Self {
        let created_at = now();
        Self {
            id: generate_id(),
            user_id,
            ticks: new_audio.ticks,
            selected_tick: new_audio.selected_tick,
            session_id: new_audio.session_id,
            step_count: new_audio.step_count,
            created_at,
            updated_at: created_at,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = next_update_time(self.updated_at);
    }
}

/// Validated input for creating an audio record
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserAudio {
    pub ticks: Ticks,
    pub selected_tick: i32,
    pub session_id: i32,
    pub step_count: i32,
}

/// Validated sparse update of an audio record.
///
/// The owner and identity cannot be changed, so they have no field here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserAudioChanges {
    pub ticks: Option<Ticks>,
    pub selected_tick: Option<i32>,
    pub session_id: Option<i32>,
    pub step_count: Option<i32>,
}

impl UserAudioChanges {
    pub fn apply_to(self, audio: &mut UserAudio) {
        if let Some(ticks) = self.ticks {
            audio.ticks = ticks;
        }
        if let Some(selected_tick) = self.selected_tick {
            audio.selected_tick = selected_tick;
        }
        if let Some(session_id) = self.session_id {
            audio.session_id = session_id;
        }
        if let Some(step_count) = self.step_count {
            audio.step_count = step_count;
        }
    }
}

/// Equality filters for listing audio records.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct UserAudioFilter {
    pub user_id: Option<Id>,
    pub session_id: Option<i32>,
    pub step_count: Option<i32>,
    pub selected_tick: Option<i32>,
}

impl UserAudioFilter {
    pub fn for_user(user_id: Id) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, audio: &UserAudio) -> bool {
        self.user_id.map_or(true, |user_id| audio.user_id == user_id)
            && self.session_id.map_or(true, |session_id| audio.session_id == session_id)
            && self.step_count.map_or(true, |step_count| audio.step_count == step_count)
            && self
                .selected_tick
                .map_or(true, |selected_tick| audio.selected_tick == selected_tick)
    }
}
