//! Default coping-strategy catalog.

use unhook_core::StrategyId;

use crate::types::CopingStrategy;

fn builtin(
    id: &str,
    title: &str,
    description: &str,
    icon: &str,
    duration_minutes: Option<u32>,
    route: Option<&str>,
) -> CopingStrategy {
    CopingStrategy {
        id: StrategyId::from(id),
        title: title.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        duration_minutes,
        route: route.map(str::to_string),
    }
}

/// The fixed catalog a fresh install starts with.
pub fn default_strategies() -> Vec<CopingStrategy> {
    vec![
        builtin(
            "breathing",
            "Guided breathing",
            "Slow your breath until the urge passes.",
            "wind",
            Some(3),
            Some("/tools/breathing"),
        ),
        builtin(
            "urge-surfing",
            "Urge surfing",
            "Notice the craving, rate it, and watch it rise and fall.",
            "waves",
            Some(5),
            Some("/tools/urge-surfing"),
        ),
        builtin(
            "mini-game",
            "Distraction game",
            "Keep your hands and mind busy for a few minutes.",
            "gamepad",
            Some(2),
            Some("/games"),
        ),
        builtin(
            "cold-water",
            "Cold water",
            "Splash your face or drink a glass of cold water.",
            "droplet",
            Some(1),
            None,
        ),
        builtin(
            "walk",
            "Short walk",
            "Change the scene. Walk around the block.",
            "footprints",
            Some(10),
            None,
        ),
        builtin(
            "reach-out",
            "Reach out",
            "Message a friend or the community.",
            "users",
            None,
            Some("/community"),
        ),
        builtin(
            "journal",
            "Write it down",
            "Put the craving and its trigger into words.",
            "book",
            Some(5),
            Some("/journal"),
        ),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
