//! XP and levels.
//!
//! Level `n` needs `floor(100 × 1.5^(n−1))` XP. XP above the requirement
//! rolls into the next level, so after every mutation `xp < xp_required(level)`.

use serde::{Deserialize, Serialize};

/// XP removed by a relapse.
pub const RELAPSE_XP_PENALTY: u32 = 50;

/// Streak lengths (days) that trigger a milestone.
pub const MILESTONES: [u32; 9] = [1, 3, 7, 14, 30, 60, 90, 180, 365];

/// XP needed to finish `level`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn xp_required(level: u32) -> u32 {
    let exponent = i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX);
    // Float-to-int casts saturate, so huge levels clamp to u32::MAX
    (100.0 * 1.5_f64.powi(exponent)).floor() as u32
}

/// Milestone reached at `streak`, if any.
pub fn milestone_for(streak: u32) -> Option<u32> {
    MILESTONES.contains(&streak).then_some(streak)
}

/// XP and level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Progression {
    /// XP toward the next level.
    pub xp: u32,
    /// Current level, starting at 1.
    pub level: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self { xp: 0, level: 1 }
    }
}

impl Progression {
    /// Add XP, rolling over into as many levels as it covers. Returns the
    /// number of levels gained.
    pub fn gain(&mut self, amount: u32) -> u32 {
        self.xp = self.xp.saturating_add(amount);
        self.roll_forward()
    }

    /// Remove XP, floored at zero. Never lowers the level.
    pub fn penalize(&mut self, amount: u32) {
        self.xp = self.xp.saturating_sub(amount);
    }

    /// Restore the invariants after loading untrusted data.
    pub fn normalize(&mut self) {
        self.level = self.level.max(1);
        let _ = self.roll_forward();
    }

    fn roll_forward(&mut self) -> u32 {
        let mut gained = 0;
        loop {
            let required = xp_required(self.level);
            if self.xp < required || self.level == u32::MAX {
                break;
            }
            self.xp -= required;
            self.level += 1;
            gained += 1;
        }
        gained
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
