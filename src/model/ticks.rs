use serde::{Deserialize, Serialize};

/// Number of calibration ticks recorded per session.
pub const TICK_COUNT: usize = 15;
pub const TICK_MIN: f64 = -100.0;
pub const TICK_MAX: f64 = -10.0;

/// Calibration levels for one audio session, in dB.
///
/// Holds exactly [`TICK_COUNT`] values, each within `[TICK_MIN, TICK_MAX]`.
/// The only way to build one from loose values is [`Ticks::try_from`], so a
/// `Ticks` in hand is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ticks([f64; TICK_COUNT]);

/// Why a sequence of values was rejected as ticks.
#[derive(Debug, Clone, PartialEq)]
pub enum TicksError {
    TooFew(usize),
    TooMany(usize),
    AboveMax { index: usize },
    BelowMin { index: usize },
}

impl Ticks {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Checks every value, reporting all out-of-range positions rather than
    /// stopping at the first.
    pub fn check(values: &[f64]) -> Vec<TicksError> {
        if values.len() < TICK_COUNT {
            return vec![TicksError::TooFew(values.len())];
        }
        if values.len() > TICK_COUNT {
            return vec![TicksError::TooMany(values.len())];
        }

        values
            .iter()
            .enumerate()
            .filter_map(|(index, value)| {
                if *value > TICK_MAX {
                    Some(TicksError::AboveMax { index })
                } else if *value < TICK_MIN || value.is_nan() {
                    Some(TicksError::BelowMin { index })
                } else {
                    None
                }
            })
            .collect()
    }
}

impl TryFrom<Vec<f64>> for Ticks {
    type Error = Vec<TicksError>;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        let errors = Self::check(&values);
        if !errors.is_empty() {
            return Err(errors);
        }

        let array: [f64; TICK_COUNT] = values
            .try_into()
            .map_err(|values: Vec<f64>| vec![TicksError::TooMany(values.len())])?;
        Ok(Self(array))
    }
}

impl<'de> Deserialize<'de> for Ticks {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let values = Vec::<f64>::deserialize(deserializer)?;
        Ticks::try_from(values).map_err(|errors| {
            serde::de::Error::custom(format!("invalid ticks: {:?}", errors))
        })
    }
}
