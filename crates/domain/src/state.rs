//! Power state: the on/off reading of an outlet, and the cell caching it.

use std::sync::atomic::{AtomicU8, Ordering};

use serde::{Deserialize, Serialize};

/// Tri-state reading of an outlet.
///
/// [`Unknown`](Self::Unknown) is the value before the first successful poll
/// and the result of any read the hardware did not answer clearly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
    #[default]
    Unknown,
}

impl PowerState {
    /// Whether the reading is a definite on/off value.
    #[must_use]
    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// The definite value, if any.
    #[must_use]
    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::On => Some(true),
            Self::Off => Some(false),
            Self::Unknown => None,
        }
    }

    const fn to_raw(self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Off => 1,
            Self::On => 2,
        }
    }

    const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => Self::Off,
            2 => Self::On,
            _ => Self::Unknown,
        }
    }
}

impl From<bool> for PowerState {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Cached state of one outlet.
///
/// A single atomic byte: readers on the accessory side never observe a
/// torn value while a reconciliation or a command stores a new one.
#[derive(Debug, Default)]
pub struct StateCell(AtomicU8);

impl StateCell {
    /// A cell holding `state`.
    #[must_use]
    pub const fn new(state: PowerState) -> Self {
        Self(AtomicU8::new(state.to_raw()))
    }

    /// Current cached value.
    #[must_use]
    pub fn load(&self) -> PowerState {
        PowerState::from_raw(self.0.load(Ordering::Acquire))
    }

    /// Replace the cached value.
    pub fn store(&self, state: PowerState) {
        self.0.store(state.to_raw(), Ordering::Release);
    }

    /// Replace the cached value, returning the previous one.
    pub fn swap(&self, state: PowerState) -> PowerState {
        PowerState::from_raw(self.0.swap(state.to_raw(), Ordering::AcqRel))
    }
}
