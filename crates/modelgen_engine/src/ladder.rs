//! Experience ladders.
//!
//! A ladder instance lists cumulative experience thresholds, one per level.
//! Level lookups never run past the last defined level.

// Allow usize to u32 casts for levels - bounded by the ladder length
#![allow(clippy::cast_possible_truncation)]

use modelgen_foundation::{Error, ErrorContext, Result, Value};
use modelgen_schema::Instance;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Field holding a ladder's level list.
pub const LEVELS_FIELD: &str = "levels";

/// Field holding a level's experience threshold.
pub const EXPERIENCE_FIELD: &str = "experience";

/// Thresholds of one ladder instance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LadderTable {
    thresholds: Vec<u64>,
}

impl LadderTable {
    /// Creates a table from raw thresholds.
    #[must_use]
    pub fn new(thresholds: Vec<u64>) -> Self {
        Self { thresholds }
    }

    /// Reads `levels[].experience` from a ladder instance.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` or `ValueMismatch` if the instance does not
    /// carry a list of levels with non-negative integer experience.
    pub fn from_instance(entity: &str, instance: &Instance) -> Result<Self> {
        let context = || ErrorContext::new().with_entity(entity).with_instance(instance.id());
        let value = instance
            .record()
            .get(LEVELS_FIELD)
            .ok_or_else(|| Error::missing_field(entity, LEVELS_FIELD).with_context(context()))?;
        let levels = value.as_list().ok_or_else(|| {
            Error::value_mismatch("list", value.kind_name())
                .with_context(context().with_field(LEVELS_FIELD))
        })?;

        let mut thresholds = Vec::with_capacity(levels.len());
        for (i, level) in levels.iter().enumerate() {
            let field = format!("{LEVELS_FIELD}[{i}].{EXPERIENCE_FIELD}");
            let experience = level
                .as_record()
                .and_then(|r| r.get(EXPERIENCE_FIELD))
                .and_then(Value::as_int)
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| {
                    Error::value_mismatch("level with non-negative experience", level.kind_name())
                        .with_context(context().with_field(field))
                })?;
            thresholds.push(experience);
        }
        Ok(Self { thresholds })
    }

    /// Highest reachable level.
    #[must_use]
    pub fn max_level(&self) -> u32 {
        self.thresholds.len() as u32
    }

    /// Thresholds in level order.
    #[must_use]
    pub fn thresholds(&self) -> &[u64] {
        &self.thresholds
    }

    /// Level reached with `exp` total experience, starting from `current`,
    /// and the experience accumulated past that level's threshold.
    ///
    /// Advances while the next threshold is reached and stops at
    /// [`max_level`](Self::max_level).
    #[must_use]
    pub fn level_for(&self, current: u32, exp: u64) -> (u32, u64) {
        let max = self.max_level();
        let mut level = current.min(max);
        while level < max && exp >= self.thresholds[level as usize] {
            level += 1;
        }
        let into = match level {
            0 => exp,
            reached => exp.saturating_sub(self.thresholds[reached as usize - 1]),
        };
        (level, into)
    }
}
