//! Static Quran reference data: ayah counts per surah, reference
//! validation and sequential ayah arithmetic.

use std::fmt;

use thiserror::Error;

pub const SURAH_COUNT: u32 = 114;

/// Number of ayahs in each surah, indexed by `surah - 1`.
pub static AYAH_COUNTS: [u32; 114] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, // 1-10
    123, 111, 43, 52, 99, 128, 111, 110, 98, 135, // 11-20
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, // 21-30
    34, 30, 73, 54, 45, 83, 182, 88, 75, 85, // 31-40
    54, 53, 89, 59, 37, 35, 38, 29, 18, 45, // 41-50
    60, 49, 62, 55, 78, 96, 29, 22, 24, 13, // 51-60
    14, 11, 11, 18, 12, 12, 30, 52, 52, 44, // 61-70
    28, 28, 20, 56, 40, 31, 50, 40, 46, 42, // 71-80
    29, 19, 36, 25, 22, 17, 19, 26, 30, 20, // 81-90
    15, 21, 11, 8, 8, 19, 5, 8, 8, 11, // 91-100
    11, 8, 3, 9, 5, 4, 7, 3, 6, 3, // 101-110
    5, 4, 5, 6, // 111-114
];

/// Section numbers spelled out in the textbook headings.
pub static NUMBER_WORDS: [&str; 40] = [
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen", "nineteen", "twenty",
    "twenty-one", "twenty-two", "twenty-three", "twenty-four", "twenty-five",
    "twenty-six", "twenty-seven", "twenty-eight", "twenty-nine", "thirty",
    "thirty-one", "thirty-two", "thirty-three", "thirty-four", "thirty-five",
    "thirty-six", "thirty-seven", "thirty-eight", "thirty-nine", "forty",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("Chapter {0} is invalid (valid range: 1-114)")]
    InvalidChapter(u32),
    #[error("Verse {ayah} is invalid for chapter {surah} (valid range: 1-{max})")]
    InvalidVerse { surah: u32, ayah: u32, max: u32 },
}

/// A `surah:ayah` pair. Orders by surah, then ayah.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VerseKey {
    pub surah: u32,
    pub ayah: u32,
}

impl VerseKey {
    pub fn new(surah: u32, ayah: u32) -> Self {
        VerseKey { surah, ayah }
    }

    /// `None` when either number is zero, i.e. the entry has no reference.
    pub fn from_nonzero(surah: u32, ayah: u32) -> Option<Self> {
        if surah == 0 || ayah == 0 {
            None
        } else {
            Some(VerseKey { surah, ayah })
        }
    }
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.surah, self.ayah)
    }
}

pub fn ayah_count(surah: u32) -> Option<u32> {
    if surah == 0 || surah > SURAH_COUNT {
        return None;
    }
    Some(AYAH_COUNTS[(surah - 1) as usize])
}

pub fn validate_reference(surah: u32, ayah: u32) -> Result<(), ReferenceError> {
    let max = ayah_count(surah).ok_or(ReferenceError::InvalidChapter(surah))?;
    if ayah < 1 || ayah > max {
        return Err(ReferenceError::InvalidVerse { surah, ayah, max });
    }
    Ok(())
}

/// Step `offset` ayahs away from `surah:ayah`, crossing into the
/// previous or next surah as needed.
///
/// Returns `None` when the starting reference is invalid or the result
/// would fall before 1:1 or after 114:6.
pub fn sequential_ayah(surah: u32, ayah: u32, offset: i64) -> Option<VerseKey> {
    validate_reference(surah, ayah).ok()?;

    let mut s = surah;
    let mut a = ayah as i64 + offset;

    while a < 1 {
        if s == 1 {
            return None;
        }
        s -= 1;
        a += ayah_count(s)? as i64;
    }

    loop {
        let max = ayah_count(s)? as i64;
        if a <= max {
            break;
        }
        if s == SURAH_COUNT {
            return None;
        }
        a -= max;
        s += 1;
    }

    Some(VerseKey::new(s, a as u32))
}

/// Integer value of a spelled-out or digit section number. Unknown words give 0.
pub fn convert_written_number(word: &str) -> u32 {
    let lower = word.trim().to_lowercase();
    if let Some(pos) = NUMBER_WORDS.iter().position(|w| *w == lower) {
        return pos as u32 + 1;
    }
    lower.parse::<u32>().unwrap_or(0)
}
