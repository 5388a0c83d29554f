use chrono::{DateTime, Local, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};

// ─── Time buckets ────────────────────────────────────────────────────────────

/// Part of day used to weight mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Morning,
    Day,
    Night,
}

impl TimeBucket {
    /// `[06,12)` is morning, `[22,24)` and `[00,06)` are night, the rest is day.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => Self::Morning,
            22..=23 | 0..=5 => Self::Night,
            _ => Self::Day,
        }
    }

    pub fn current(now: &DateTime<Local>) -> Self {
        Self::from_hour(now.hour())
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Morning => "morning",
            Self::Day => "day",
            Self::Night => "night",
        };
        write!(f, "{label}")
    }
}

// ─── Heartbeat modes ─────────────────────────────────────────────────────────

/// A named behavioral template for one autonomous tick.
///
/// Loaded once from config; immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatMode {
    pub name: String,
    /// Instruction embedded into the tick prompt
    pub prompt: String,
    #[serde(default)]
    pub weight_night: u32,
    #[serde(default)]
    pub weight_morning: u32,
    #[serde(default)]
    pub weight_day: u32,
}

impl HeartbeatMode {
    pub fn weight(&self, bucket: TimeBucket) -> u32 {
        match bucket {
            TimeBucket::Morning => self.weight_morning,
            TimeBucket::Day => self.weight_day,
            TimeBucket::Night => self.weight_night,
        }
    }
}

/// Weighted-random mode selection via pool expansion: each mode is repeated
/// `weight` times in a flat pool and one element is drawn uniformly. O(total
/// weight) per call, which is fine for the small weight sums in practice.
///
/// Returns `None` when every mode has zero weight for the bucket; config
/// validation rejects such tables before the daemon starts.
pub fn select_mode<'a, R: Rng + ?Sized>(
    modes: &'a [HeartbeatMode],
    bucket: TimeBucket,
    rng: &mut R,
) -> Option<&'a HeartbeatMode> {
    let mut pool = Vec::new();
    for mode in modes {
        for _ in 0..mode.weight(bucket) {
            pool.push(mode);
        }
    }
    if pool.is_empty() {
        return None;
    }
    let idx = rng.random_range(0..pool.len());
    Some(pool[idx])
}

/// The built-in behavior table. Weights shift the daemon toward reflection at
/// night, practical prompts in the morning, and a flatter mix during the day.
pub fn default_modes() -> Vec<HeartbeatMode> {
    fn mode(name: &str, prompt: &str, night: u32, morning: u32, day: u32) -> HeartbeatMode {
        HeartbeatMode {
            name: name.into(),
            prompt: prompt.into(),
            weight_night: night,
            weight_morning: morning,
            weight_day: day,
        }
    }

    vec![
        mode(
            "reflection",
            "Time for quiet reflection. Share a brief philosophical thought or observation, or stay silent.",
            4, 1, 2,
        ),
        mode(
            "curiosity",
            "What are you curious about right now? Share a brief question or wonder.",
            2, 3, 3,
        ),
        mode(
            "practical",
            "What practical task or improvement could be done? Suggest something brief and actionable.",
            1, 4, 3,
        ),
        mode(
            "ambient",
            "Just exist. Share a simple observation about this moment, or be silent.",
            3, 2, 2,
        ),
        mode(
            "greeting",
            "Say something friendly. Or stay quiet if it's not the right moment.",
            1, 4, 2,
        ),
        mode(
            "creative",
            "Express yourself creatively. Write a short poem, haiku, or imaginative thought.",
            3, 1, 2,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn weighted(name: &str, night: u32, morning: u32, day: u32) -> HeartbeatMode {
        HeartbeatMode {
            name: name.into(),
            prompt: format!("prompt for {name}"),
            weight_night: night,
            weight_morning: morning,
            weight_day: day,
        }
    }

    // ── Time buckets ─────────────────────────────────────────

    #[test]
    fn morning_bucket_covers_six_to_noon() {
        for hour in 6..12 {
            assert_eq!(TimeBucket::from_hour(hour), TimeBucket::Morning, "{hour}");
        }
    }

    #[test]
    fn night_bucket_wraps_midnight() {
        for hour in [22, 23, 0, 1, 5] {
            assert_eq!(TimeBucket::from_hour(hour), TimeBucket::Night, "{hour}");
        }
    }

    #[test]
    fn day_bucket_covers_the_rest() {
        for hour in 12..22 {
            assert_eq!(TimeBucket::from_hour(hour), TimeBucket::Day, "{hour}");
        }
    }

    // ── Selection ────────────────────────────────────────────

    #[test]
    fn sole_nonzero_weight_always_wins() {
        let modes = vec![
            weighted("silent", 0, 0, 0),
            weighted("only", 0, 0, 5),
            weighted("also-silent", 0, 0, 0),
        ];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let picked = select_mode(&modes, TimeBucket::Day, &mut rng).unwrap();
            assert_eq!(picked.name, "only");
        }
    }

    #[test]
    fn all_zero_weights_selects_nothing() {
        let modes = vec![weighted("a", 0, 0, 0), weighted("b", 0, 0, 0)];
        let mut rng = StdRng::seed_from_u64(7);
        assert!(select_mode(&modes, TimeBucket::Night, &mut rng).is_none());
    }

    #[test]
    fn empirical_distribution_tracks_weights() {
        let modes = vec![weighted("a", 1, 1, 1), weighted("b", 3, 3, 3)];
        let mut rng = StdRng::seed_from_u64(42);

        let mut b_hits = 0u32;
        for _ in 0..10_000 {
            if select_mode(&modes, TimeBucket::Day, &mut rng).unwrap().name == "b" {
                b_hits += 1;
            }
        }
        // Expect ~75%; binomial sigma is ~43, so a 300 margin is ~7 sigma.
        assert!((7200..=7800).contains(&b_hits), "b_hits = {b_hits}");
    }

    #[test]
    fn selection_respects_bucket_specific_weights() {
        let modes = vec![weighted("night-owl", 5, 0, 0), weighted("lark", 0, 5, 0)];
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..100 {
            let night = select_mode(&modes, TimeBucket::Night, &mut rng).unwrap();
            assert_eq!(night.name, "night-owl");
            let morning = select_mode(&modes, TimeBucket::Morning, &mut rng).unwrap();
            assert_eq!(morning.name, "lark");
        }
    }

    // ── Defaults ─────────────────────────────────────────────

    #[test]
    fn default_table_has_six_modes_with_coverage() {
        let modes = default_modes();
        assert_eq!(modes.len(), 6);
        for bucket in [TimeBucket::Morning, TimeBucket::Day, TimeBucket::Night] {
            assert!(modes.iter().any(|m| m.weight(bucket) > 0));
        }
    }
}
