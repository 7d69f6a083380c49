//! Daily activity generation.
//!
//! A batch is a random subset of a fixed pool, sized by the profile's focus
//! task count, with the daily commitment split evenly across it.

use rand::Rng;
use rand::seq::IndexedRandom;
use unhook_core::ActivityId;

use crate::types::{ActivityKind, DailyActivity, HabitProfile};

struct Template {
    title: &'static str,
    kind: ActivityKind,
}

const POOL: &[Template] = &[
    Template {
        title: "Write down today's biggest trigger",
        kind: ActivityKind::Reflection,
    },
    Template {
        title: "List three reasons you are quitting",
        kind: ActivityKind::Reflection,
    },
    Template {
        title: "Note one thing you are grateful for",
        kind: ActivityKind::Reflection,
    },
    Template {
        title: "Box breathing (4-4-4-4)",
        kind: ActivityKind::Breathing,
    },
    Template {
        title: "4-7-8 breathing",
        kind: ActivityKind::Breathing,
    },
    Template {
        title: "Slow exhale practice",
        kind: ActivityKind::Breathing,
    },
    Template {
        title: "Read about how cravings peak and fade",
        kind: ActivityKind::Learning,
    },
    Template {
        title: "Learn what your body repairs this week",
        kind: ActivityKind::Learning,
    },
    Template {
        title: "Read a recovery story",
        kind: ActivityKind::Learning,
    },
    Template {
        title: "Take a brisk walk",
        kind: ActivityKind::Action,
    },
    Template {
        title: "Drink a glass of cold water",
        kind: ActivityKind::Action,
    },
    Template {
        title: "Message someone who supports you",
        kind: ActivityKind::Action,
    },
];

const TIME_SLOTS: &[&str] = &["Morning", "Midday", "Afternoon", "Evening", "Night"];

/// Activities per batch when the profile does not say.
pub const DEFAULT_TASK_COUNT: usize = 3;

/// Minutes per day when the profile does not say.
pub const DEFAULT_COMMITMENT_MINUTES: u32 = 15;

/// Generate a fresh batch for `profile` (defaults when `None`).
pub fn generate<R: Rng + ?Sized>(profile: Option<&HabitProfile>, rng: &mut R) -> Vec<DailyActivity> {
    let count = profile
        .map(|p| usize::try_from(p.focus_task_count).unwrap_or(usize::MAX))
        .filter(|&n| n > 0)
        .unwrap_or(DEFAULT_TASK_COUNT)
        .min(POOL.len());
    let minutes = profile
        .map(|p| p.daily_commitment_minutes)
        .filter(|&m| m > 0)
        .unwrap_or(DEFAULT_COMMITMENT_MINUTES);

    let per_item = (minutes / u32::try_from(count).unwrap_or(1)).max(1);

    POOL.choose_multiple(rng, count)
        .enumerate()
        .map(|(i, template)| DailyActivity {
            id: ActivityId::new(),
            title: template.title.to_string(),
            kind: template.kind,
            completed: false,
            time_label: TIME_SLOTS[i * TIME_SLOTS.len() / count].to_string(),
            duration_label: format!("{per_item} min"),
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::HabitKind;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn profile(tasks: u32, minutes: u32) -> HabitProfile {
        HabitProfile {
            focus_task_count: tasks,
            daily_commitment_minutes: minutes,
            ..HabitProfile::new(HabitKind::Smoking)
        }
    }

    #[test]
    fn batch_size_follows_focus_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let batch = generate(Some(&profile(4, 20)), &mut rng);
        assert_eq!(batch.len(), 4);
        assert!(batch.iter().all(|a| !a.completed));
        assert!(batch.iter().all(|a| a.duration_label == "5 min"));
    }

    #[test]
    fn titles_are_distinct() {
        let mut rng = StdRng::seed_from_u64(1);
        let batch = generate(Some(&profile(6, 30)), &mut rng);
        let mut titles: Vec<_> = batch.iter().map(|a| a.title.clone()).collect();
        titles.sort();
        titles.dedup();
        assert_eq!(titles.len(), 6);
    }

    #[test]
    fn oversized_count_is_capped() {
        let mut rng = StdRng::seed_from_u64(3);
        let batch = generate(Some(&profile(100, 60)), &mut rng);
        assert_eq!(batch.len(), POOL.len());
        assert_eq!(batch[0].duration_label, "5 min");
    }

    #[test]
    fn defaults_without_profile() {
        let mut rng = StdRng::seed_from_u64(9);
        let batch = generate(None, &mut rng);
        assert_eq!(batch.len(), DEFAULT_TASK_COUNT);
        assert_eq!(batch[0].duration_label, "5 min");
        assert_eq!(batch[0].time_label, "Morning");
    }

    #[test]
    fn zero_values_fall_back() {
        let mut rng = StdRng::seed_from_u64(2);
        let batch = generate(Some(&profile(0, 0)), &mut rng);
        assert_eq!(batch.len(), DEFAULT_TASK_COUNT);
    }

    #[test]
    fn short_commitment_never_below_one_minute() {
        let mut rng = StdRng::seed_from_u64(5);
        let batch = generate(Some(&profile(5, 2)), &mut rng);
        assert!(batch.iter().all(|a| a.duration_label == "1 min"));
    }

    #[test]
    fn same_seed_same_batch() {
        let a = generate(None, &mut StdRng::seed_from_u64(42));
        let b = generate(None, &mut StdRng::seed_from_u64(42));
        let titles = |v: &[DailyActivity]| v.iter().map(|x| x.title.clone()).collect::<Vec<_>>();
        assert_eq!(titles(&a), titles(&b));
    }
}
