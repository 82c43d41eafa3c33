//! The 24-entry Camelot wheel: key <-> Camelot code mapping, canonicalization
//! of free-form key strings, and the wheel's harmonic-mixing relations.
//!
//! Grounded in the Camelot tables of a real key-detector (major/minor name
//! tables indexed by pitch class) and supplemented with the wheel-position /
//! transition-quality / suggestion helpers a DJ-facing harmonic mixing tool
//! needs beyond the bare bijection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the 12 pitch classes, sharp-spelled, in the fixed order the
/// Camelot table is indexed by.
const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Camelot number for each major-key pitch class (index = pitch class, 0=C).
const CAMELOT_MAJOR_NUMBER: [u8; 12] = [8, 3, 10, 5, 12, 7, 2, 9, 4, 11, 6, 1];
/// Camelot number for each minor-key pitch class (index = pitch class, 0=C minor).
const CAMELOT_MINOR_NUMBER: [u8; 12] = [5, 12, 7, 2, 9, 4, 11, 6, 1, 8, 3, 10];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    Major,
    Minor,
}

impl fmt::Display for Mode {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Major => "major",
            Self::Minor => "minor",
        })
    }
}

/// A canonicalised musical key: a pitch class (0=C .. 11=B) plus mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyName {
    pub pitch_class: u8,
    pub mode: Mode,
}

impl KeyName {
    #[must_use]
    #[inline]
    pub const fn new(pitch_class: u8, mode: Mode) -> Self {
        Self {
            pitch_class: pitch_class % 12,
            mode,
        }
    }

    #[must_use]
    #[inline]
    pub const fn c_major() -> Self {
        Self::new(0, Mode::Major)
    }
}

impl fmt::Display for KeyName {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", PITCH_CLASS_NAMES[self.pitch_class as usize], self.mode)
    }
}

/// A two-character Camelot label: number 1..=12 and letter A (minor) / B (major).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CamelotCode {
    pub number: u8,
    pub is_minor: bool,
}

impl CamelotCode {
    /// # Panics
    /// Panics if `number` is not in `1..=12`.
    #[must_use]
    #[inline]
    pub const fn new(number: u8, is_minor: bool) -> Self {
        assert!(number >= 1 && number <= 12, "camelot number out of range");
        Self { number, is_minor }
    }

    #[must_use]
    #[inline]
    pub const fn letter(self) -> char {
        if self.is_minor { 'A' } else { 'B' }
    }

    /// `adjacent(c) = +-1 on the number (mod 12), same letter`.
    #[must_use]
    #[inline]
    pub const fn adjacent(self) -> (Self, Self) {
        (self.shifted(-1), self.shifted(1))
    }

    /// `relative(c) = same number, other letter`.
    #[must_use]
    #[inline]
    pub const fn relative(self) -> Self {
        Self::new(self.number, !self.is_minor)
    }

    /// `dominant(c) = +7 mod 12, same letter`.
    #[must_use]
    #[inline]
    pub const fn dominant(self) -> Self {
        self.shifted(7)
    }

    /// `subdominant(c) = +5 mod 12, same letter`.
    #[must_use]
    #[inline]
    pub const fn subdominant(self) -> Self {
        self.shifted(5)
    }

    #[must_use]
    #[inline]
    const fn shifted(self, delta: i8) -> Self {
        let n = self.number as i8 - 1;
        let shifted = (((n + delta) % 12) + 12) % 12;
        Self::new((shifted + 1) as u8, self.is_minor)
    }

    /// Circular shortest-path distance on the wheel, plus a 0.5 penalty if
    /// the letter differs, or 0.1 if the number is equal and the letter
    /// differs (the relative-key special case).
    #[must_use]
    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        let a = i32::from(self.number) - 1;
        let b = i32::from(other.number) - 1;
        let raw = (a - b).rem_euclid(12);
        let circular = f64::from(raw.min(12 - raw));

        if self.number == other.number && self.is_minor != other.is_minor {
            return 0.1;
        }
        if self.is_minor == other.is_minor {
            circular
        } else {
            circular + 0.5
        }
    }

    #[must_use]
    #[inline]
    pub fn transition_quality(self, other: Self) -> TransitionQuality {
        let d = self.distance(other);
        if d == 0.0 {
            TransitionQuality::Perfect
        } else if d <= 0.1 {
            TransitionQuality::Excellent
        } else if d <= 1.0 {
            TransitionQuality::Good
        } else if d <= 2.0 {
            TransitionQuality::Fair
        } else if d <= 3.0 {
            TransitionQuality::Poor
        } else {
            TransitionQuality::Bad
        }
    }

    /// Polar-to-cartesian wheel layout position, position 1 at 12 o'clock,
    /// minor keys on the inner ring. Presentation-layer helper only; never
    /// consumed by the index or solver.
    #[must_use]
    #[inline]
    pub fn wheel_position(self) -> (f64, f64) {
        let angle = (f64::from(self.number) - 1.0) * 30.0_f64.to_radians() - std::f64::consts::FRAC_PI_2;
        let radius = if self.is_minor { 0.7 } else { 1.0 };
        (radius * angle.cos(), radius * angle.sin())
    }

    /// Compatibility set membership at the given compatibility level.
    #[must_use]
    #[inline]
    pub fn is_compatible_at(self, other: Self, level: CompatLevel) -> bool {
        if self == other {
            return true;
        }
        match level {
            CompatLevel::Perfect => false,
            CompatLevel::Adjacent => {
                let (lo, hi) = self.adjacent();
                other == lo || other == hi || other == self.relative()
            }
            CompatLevel::Extended => {
                let (lo, hi) = self.adjacent();
                other == lo
                    || other == hi
                    || other == self.relative()
                    || other == self.dominant()
                    || other == self.subdominant()
            }
            CompatLevel::Harmonic => self.distance(other) <= 1.0,
            CompatLevel::All => true,
        }
    }

    /// Ranked suggestions for what to mix into next, grounded in the
    /// original prototype's `suggest_next_keys`: same key, relative, both
    /// adjacent, plus an energy-directed dominant/subdominant pick.
    #[must_use]
    #[inline]
    pub fn suggest_next_keys(self, direction: EnergyDirection) -> Vec<(Self, &'static str, f64)> {
        let (down, up) = self.adjacent();
        let mut out = vec![
            (self, "Same key", 1.0),
            (self.relative(), "Relative key", 0.95),
            (up, "Adjacent (+1)", 0.85),
            (down, "Adjacent (-1)", 0.85),
        ];
        match direction {
            EnergyDirection::Up => out.push((self.dominant(), "Energy raise (dominant)", 0.8)),
            EnergyDirection::Down => {
                out.push((self.subdominant(), "Energy drop (subdominant)", 0.8));
            }
            EnergyDirection::Flat => {}
        }
        out
    }
}

impl fmt::Display for CamelotCode {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.letter())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionQuality {
    Perfect,
    Excellent,
    Good,
    Fair,
    Poor,
    Bad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompatLevel {
    Perfect,
    Adjacent,
    Extended,
    Harmonic,
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyDirection {
    Up,
    Down,
    Flat,
}

/// Map a canonical `KeyName` to its Camelot code via the fixed 24-entry table.
#[must_use]
#[inline]
pub const fn camelot_of(key: KeyName) -> CamelotCode {
    let number = match key.mode {
        Mode::Major => CAMELOT_MAJOR_NUMBER[key.pitch_class as usize],
        Mode::Minor => CAMELOT_MINOR_NUMBER[key.pitch_class as usize],
    };
    CamelotCode::new(number, matches!(key.mode, Mode::Minor))
}

/// Inverse of [`camelot_of`]: every Camelot code maps to exactly one key.
#[must_use]
#[inline]
pub fn key_of_camelot(code: CamelotCode) -> KeyName {
    let table = if code.is_minor {
        &CAMELOT_MINOR_NUMBER
    } else {
        &CAMELOT_MAJOR_NUMBER
    };
    let pitch_class = table
        .iter()
        .position(|&n| n == code.number)
        .expect("camelot table is a bijection over 1..=12") as u8;
    KeyName::new(
        pitch_class,
        if code.is_minor { Mode::Minor } else { Mode::Major },
    )
}

/// Canonicalise a free-form key string ("Ab minor", "C# Dur", "7A", ...) into
/// a `KeyName`. Returns `None` if the string cannot be parsed at all, in
/// which case the caller must fall back to `KeyName::c_major()` and record
/// `KEY_UNKNOWN`.
#[must_use]
#[allow(clippy::missing_inline_in_public_items)]
pub fn canonicalize_key(raw: &str) -> Option<KeyName> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    // Camelot shorthand, e.g. "8A", "12B".
    if let Some(code) = parse_camelot_shorthand(raw) {
        return Some(key_of_camelot(code));
    }

    let mut chars = raw.chars();
    let first = chars.next()?.to_ascii_uppercase();
    let mut pitch_class = match first {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        'H' => 11, // German notation: H == B
        _ => return None,
    };

    let mut rest = chars.as_str();
    if let Some(stripped) = rest.strip_prefix('#') {
        pitch_class = (pitch_class + 1) % 12;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('b') {
        pitch_class = (pitch_class + 11) % 12;
        rest = stripped;
    }

    let rest = rest.trim().to_ascii_lowercase();
    let mode = if rest.is_empty() || rest.starts_with("maj") || rest == "dur" || rest == "major" {
        Mode::Major
    } else if rest.starts_with("min") || rest == "m" || rest == "moll" || rest == "minor" {
        Mode::Minor
    } else {
        return None;
    };

    Some(KeyName::new(pitch_class, mode))
}

fn parse_camelot_shorthand(raw: &str) -> Option<CamelotCode> {
    let raw = raw.trim();
    let letter = raw.chars().last()?;
    if !matches!(letter.to_ascii_uppercase(), 'A' | 'B') {
        return None;
    }
    let digits = &raw[..raw.len() - letter.len_utf8()];
    let number: u8 = digits.parse().ok()?;
    if !(1..=12).contains(&number) {
        return None;
    }
    Some(CamelotCode::new(number, letter.eq_ignore_ascii_case(&'A')))
}
