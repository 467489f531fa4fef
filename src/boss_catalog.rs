use getset::CopyGetters;
use thiserror::Error;

/// Ordered list of the bosses making up the tail of the hiscore feed.
///
/// The feed carries no labels, so `names` must match the upstream row order exactly.
/// A stale catalog shifts every (rank, kills) pair onto the wrong boss,
/// which is only detectable through [`BossCatalog::check_feed_len`].
#[derive(Clone, Copy, Debug, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct BossCatalog {
    version: &'static str,
    names: &'static [&'static str],
    /// Number of two-valued activity rows (clues, minigames, ...) between skills and bosses.
    activity_count: usize,
}

#[derive(PartialEq, Eq, Debug, Error)]
#[error("The feed has {actual} values, but boss catalog {version} expects {expected}")]
pub struct LayoutMismatch {
    pub version: &'static str,
    pub expected: usize,
    pub actual: usize,
}

impl BossCatalog {
    pub const fn new(
        version: &'static str,
        names: &'static [&'static str],
        activity_count: usize,
    ) -> Self {
        Self {
            version,
            names,
            activity_count,
        }
    }

    pub const fn current() -> Self {
        Self::new("2025-01", CURRENT_BOSSES, CURRENT_ACTIVITY_COUNT)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Length of the trailing feed segment the bosses are read from,
    /// including the marker value just before the first pair.
    pub fn required_tail_len(&self) -> usize {
        2 * self.len() + 1
    }

    pub fn expected_feed_len(&self, skill_count: usize) -> usize {
        3 * skill_count + 2 * (self.activity_count + self.len())
    }

    pub fn check_feed_len(&self, skill_count: usize, feed_len: usize) -> Result<(), LayoutMismatch> {
        let expected = self.expected_feed_len(skill_count);
        if feed_len == expected {
            Ok(())
        } else {
            Err(LayoutMismatch {
                version: self.version,
                expected,
                actual: feed_len,
            })
        }
    }
}

impl Default for BossCatalog {
    fn default() -> Self {
        Self::current()
    }
}

// League Points, Deadman Points, four Bounty Hunter rows, seven Clue Scroll rows,
// LMS, PvP Arena, Soul Wars Zeal, Rifts closed, Colosseum Glory, Collections Logged
const CURRENT_ACTIVITY_COUNT: usize = 19;

const CURRENT_BOSSES: &[&str] = &[
    "Abyssal Sire",
    "Alchemical Hydra",
    "Amoxliatl",
    "Araxxor",
    "Artio",
    "Barrows Chests",
    "Bryophyta",
    "Callisto",
    "Calvar'ion",
    "Cerberus",
    "Chambers of Xeric",
    "Chambers of Xeric: Challenge Mode",
    "Chaos Elemental",
    "Chaos Fanatic",
    "Commander Zilyana",
    "Corporeal Beast",
    "Crazy Archaeologist",
    "Dagannoth Prime",
    "Dagannoth Rex",
    "Dagannoth Supreme",
    "Deranged Archaeologist",
    "Duke Sucellus",
    "General Graardor",
    "Giant Mole",
    "Grotesque Guardians",
    "Hespori",
    "Kalphite Queen",
    "King Black Dragon",
    "Kraken",
    "Kree'Arra",
    "K'ril Tsutsaroth",
    "Lunar Chests",
    "Mimic",
    "Nex",
    "Nightmare",
    "Phosani's Nightmare",
    "Obor",
    "Phantom Muspah",
    "Sarachnis",
    "Scorpia",
    "Scurrius",
    "Skotizo",
    "Sol Heredit",
    "Spindel",
    "Tempoross",
    "The Gauntlet",
    "The Corrupted Gauntlet",
    "The Hueycoatl",
    "The Leviathan",
    "The Royal Titans",
    "The Whisperer",
    "Theatre of Blood",
    "Theatre of Blood: Hard Mode",
    "Thermonuclear Smoke Devil",
    "Tombs of Amascut",
    "Tombs of Amascut: Expert Mode",
    "TzKal-Zuk",
    "TzTok-Jad",
    "Vardorvis",
    "Venenatis",
    "Vet'ion",
    "Vorkath",
    "Wintertodt",
    "Zalcano",
    "Zulrah",
];
