use once_cell::sync::Lazy;

pub const MAX_LEVEL: i64 = 99;

// EXPERIENCE_TABLE[l] is the total experience required to reach level l.
static EXPERIENCE_TABLE: Lazy<Vec<i64>> = Lazy::new(|| {
    let mut table = vec![0; MAX_LEVEL as usize + 1];
    let mut points = 0.0f64;
    for level in 1..MAX_LEVEL as usize {
        points += (level as f64 + 300.0 * 2f64.powf(level as f64 / 7.0)).floor();
        table[level + 1] = (points / 4.0).floor() as i64;
    }
    table
});

/// Total experience required to reach `level`, for `1 <= level <= 99`.
pub fn experience_for_level(level: i64) -> Option<i64> {
    (1..=MAX_LEVEL)
        .contains(&level)
        .then(|| EXPERIENCE_TABLE[level as usize])
}

/// Experience threshold of the level after `level`, or `None` at the maximum level.
pub fn next_level_exp(level: i64) -> Option<i64> {
    if level >= MAX_LEVEL {
        return None;
    }
    experience_for_level(level.max(1) + 1)
}
