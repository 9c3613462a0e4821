use std::fmt;

use serde::{Deserialize, Serialize};

/// Direction and acknowledgment mode under which an endpoint is used.
///
/// Discriminants follow the fixed enumeration order; [`AccessLevels`]
/// iterates in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[repr(u8)]
pub enum AccessLevel {
    Read = 0,
    WriteWithResponse = 1,
    WriteNoResponse = 2,
    Notify = 3,
}

impl AccessLevel {
    /// Every level, in enumeration order.
    pub const ALL: [AccessLevel; 4] = [
        AccessLevel::Read,
        AccessLevel::WriteWithResponse,
        AccessLevel::WriteNoResponse,
        AccessLevel::Notify,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_write(self) -> bool {
        matches!(
            self,
            AccessLevel::WriteWithResponse | AccessLevel::WriteNoResponse
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::WriteWithResponse => "writeWithResponse",
            AccessLevel::WriteNoResponse => "writeNoResponse",
            AccessLevel::Notify => "notify",
        }
    }

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of access levels. Iteration is always in enumeration order.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AccessLevels(u8);

impl AccessLevels {
    pub const EMPTY: AccessLevels = AccessLevels(0);
    pub const ALL: AccessLevels = AccessLevels(0b1111);
    /// Read, acknowledged write and notify.
    pub const DEFAULT: AccessLevels = AccessLevels(0b1011);

    pub fn new() -> Self {
        Self::EMPTY
    }

    pub fn only(level: AccessLevel) -> Self {
        Self(level.bit())
    }

    pub fn with(mut self, level: AccessLevel) -> Self {
        self.insert(level);
        self
    }

    /// Returns true if `level` was not already present.
    pub fn insert(&mut self, level: AccessLevel) -> bool {
        let added = !self.contains(level);
        self.0 |= level.bit();
        added
    }

    /// Returns true if `level` was present.
    pub fn remove(&mut self, level: AccessLevel) -> bool {
        let present = self.contains(level);
        self.0 &= !level.bit();
        present
    }

    pub fn contains(&self, level: AccessLevel) -> bool {
        self.0 & level.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = AccessLevel> + '_ {
        AccessLevel::ALL
            .into_iter()
            .filter(move |level| self.contains(*level))
    }
}

impl fmt::Debug for AccessLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<AccessLevel> for AccessLevels {
    fn from_iter<I: IntoIterator<Item = AccessLevel>>(iter: I) -> Self {
        let mut levels = AccessLevels::new();
        for level in iter {
            levels.insert(level);
        }
        levels
    }
}

impl From<AccessLevel> for AccessLevels {
    fn from(level: AccessLevel) -> Self {
        AccessLevels::only(level)
    }
}

impl Serialize for AccessLevels {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for AccessLevels {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let levels = Vec::<AccessLevel>::deserialize(deserializer)?;
        Ok(levels.into_iter().collect())
    }
}
