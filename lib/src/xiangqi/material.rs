//! C1 name algebra, Xiangqi side: parses/validates `kraabbkaabb`-style names, orders strong vs
//! weak side, and enumerates sub-endgames, in the spirit of [`crate::material`]'s chess version
//! but over the piece alphabet and caps `spec.md` §3/§4.1 define for this variant.

use std::{cmp::Ordering, fmt, str::FromStr};

use retroboard::shakmaty::Color;

/// Xiangqi piece letters: king, advisor, elephant, rook, cannon, horse (knight), pawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum XqRole {
    King,
    Advisor,
    Elephant,
    Rook,
    Cannon,
    Horse,
    Pawn,
}

impl XqRole {
    #[must_use]
    pub const fn char(self) -> char {
        match self {
            Self::King => 'k',
            Self::Advisor => 'a',
            Self::Elephant => 'b',
            Self::Rook => 'r',
            Self::Cannon => 'c',
            Self::Horse => 'n',
            Self::Pawn => 'p',
        }
    }

    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'k' => Self::King,
            'a' => Self::Advisor,
            'b' => Self::Elephant,
            'r' => Self::Rook,
            'c' => Self::Cannon,
            'n' => Self::Horse,
            'p' => Self::Pawn,
            _ => return None,
        })
    }

    /// Whether the role counts towards the "attacker" tally used for canonical ordering.
    #[must_use]
    pub const fn is_attacker(self) -> bool {
        matches!(self, Self::Rook | Self::Cannon | Self::Horse | Self::Pawn)
    }

    /// Relative value used to break ties when ordering attackers within a side (descending).
    #[must_use]
    pub const fn value(self) -> u8 {
        match self {
            Self::King => 0,
            Self::Rook => 9,
            Self::Cannon => 5,
            Self::Horse => 4,
            Self::Pawn => 2,
            Self::Advisor | Self::Elephant => 0,
        }
    }

    /// Per-side count cap: exactly 1 king, at most 2 of each defender, at most 5 pawns,
    /// at most 2 of each other attacker.
    #[must_use]
    pub const fn cap(self) -> u8 {
        match self {
            Self::King => 1,
            Self::Advisor | Self::Elephant => 2,
            Self::Pawn => 5,
            Self::Rook | Self::Cannon | Self::Horse => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct XqMaterialSide {
    pub king: u8,
    pub advisor: u8,
    pub elephant: u8,
    pub rook: u8,
    pub cannon: u8,
    pub horse: u8,
    pub pawn: u8,
}

impl XqMaterialSide {
    #[must_use]
    pub fn get(&self, role: XqRole) -> u8 {
        match role {
            XqRole::King => self.king,
            XqRole::Advisor => self.advisor,
            XqRole::Elephant => self.elephant,
            XqRole::Rook => self.rook,
            XqRole::Cannon => self.cannon,
            XqRole::Horse => self.horse,
            XqRole::Pawn => self.pawn,
        }
    }

    pub fn increment(&mut self, role: XqRole) {
        *self.get_mut(role) += 1;
    }

    fn get_mut(&mut self, role: XqRole) -> &mut u8 {
        match role {
            XqRole::King => &mut self.king,
            XqRole::Advisor => &mut self.advisor,
            XqRole::Elephant => &mut self.elephant,
            XqRole::Rook => &mut self.rook,
            XqRole::Cannon => &mut self.cannon,
            XqRole::Horse => &mut self.horse,
            XqRole::Pawn => &mut self.pawn,
        }
    }

    #[must_use]
    pub fn attacker_count(&self) -> u32 {
        u32::from(self.rook) + u32::from(self.cannon) + u32::from(self.horse) + u32::from(self.pawn)
    }

    #[must_use]
    pub fn attacker_value_sum(&self) -> u32 {
        u32::from(self.rook) * u32::from(XqRole::Rook.value())
            + u32::from(self.cannon) * u32::from(XqRole::Cannon.value())
            + u32::from(self.horse) * u32::from(XqRole::Horse.value())
            + u32::from(self.pawn) * u32::from(XqRole::Pawn.value())
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.attacker_count() + u32::from(self.advisor) + u32::from(self.elephant) + u32::from(self.king)
    }

    /// Every square-removal descendant with one fewer non-king piece, used by sub-endgame
    /// enumeration.
    pub fn descendants(&self) -> impl Iterator<Item = Self> + '_ {
        [
            XqRole::Advisor,
            XqRole::Elephant,
            XqRole::Rook,
            XqRole::Cannon,
            XqRole::Horse,
            XqRole::Pawn,
        ]
        .into_iter()
        .filter(|role| self.get(*role) > 0)
        .map(|role| {
            let mut side = *self;
            *side.get_mut(role) -= 1;
            side
        })
    }

    fn from_str_part(s: &str) -> Option<Self> {
        let mut side = Self::default();
        for ch in s.chars() {
            let role = XqRole::from_char(ch)?;
            let count = side.get_mut(role);
            *count += 1;
            if *count > role.cap() {
                return None;
            }
        }
        (side.king == 1).then_some(side)
    }
}

impl fmt::Display for XqMaterialSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", XqRole::King.char())?;
        for (role, count) in [
            (XqRole::Advisor, self.advisor),
            (XqRole::Elephant, self.elephant),
            (XqRole::Rook, self.rook),
            (XqRole::Cannon, self.cannon),
            (XqRole::Horse, self.horse),
            (XqRole::Pawn, self.pawn),
        ] {
            for _ in 0..count {
                write!(f, "{}", role.char())?;
            }
        }
        Ok(())
    }
}

/// A parsed, canonically-ordered endgame name: `by_color.white` is always the strong side.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct XqMaterial {
    pub strong: XqMaterialSide,
    pub weak: XqMaterialSide,
}

#[derive(Debug, PartialEq, Eq)]
pub enum XqNameError {
    BadChar(char),
    WrongKingCount,
    WrongOrder,
    CountOverflow,
    DefenderOverflow,
}

fn side_order_key(s: &XqMaterialSide) -> (u32, u32, u32) {
    (s.attacker_count(), s.attacker_value_sum(), s.total_count())
}

impl XqMaterial {
    /// Places the heavier side first per §4.1's strong/weak ordering rule.
    #[must_use]
    pub fn canonicalize(a: XqMaterialSide, b: XqMaterialSide) -> Self {
        match side_order_key(&a).cmp(&side_order_key(&b)) {
            Ordering::Less => Self { strong: b, weak: a },
            _ => Self { strong: a, weak: b },
        }
    }

    /// Whether `winner`'s side in this canonical material retains an attacking piece
    /// (rook/cannon/horse/pawn) — bare defenders (advisors, elephants) alone can never force
    /// mate, only hold a fortress.
    #[must_use]
    pub fn can_mate(&self, winner: Color) -> bool {
        match winner {
            Color::White => self.strong.attacker_count() > 0,
            Color::Black => self.weak.attacker_count() > 0,
        }
    }

    #[must_use]
    pub fn color_of_strong_side(&self, board_is_flipped: bool) -> Color {
        if board_is_flipped {
            Color::Black
        } else {
            Color::White
        }
    }

    /// Every name obtained by removing one non-king piece, that still satisfies the name
    /// invariants, deduplicated and ordered per §4.1: attacker count, then material, ascending.
    #[must_use]
    pub fn sub_endgames(&self) -> Vec<Self> {
        let mut out: Vec<Self> = self
            .strong
            .descendants()
            .map(|strong| Self::canonicalize(strong, self.weak))
            .chain(
                self.weak
                    .descendants()
                    .map(|weak| Self::canonicalize(self.strong, weak)),
            )
            .collect();
        out.sort_by_key(|m| {
            (
                m.strong.attacker_count() + m.weak.attacker_count(),
                m.strong.total_count() + m.weak.total_count(),
                m.strong.attacker_count(),
                m.strong.total_count(),
            )
        });
        out.dedup();
        out
    }
}

impl fmt::Display for XqMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.strong, self.weak)
    }
}

/// Splits a name into its two side substrings. Accepts both the `'v'`-separated form
/// (`"kraabbvkaabb"`, this crate's own `Display`/CLI convention) and the bare concatenated
/// form `spec.md`'s own scenarios use (`"kraabbkaabb"`, `"kckaabb"`): with exactly two `'k'`
/// characters in the name, the second one unambiguously starts the weak side's substring.
fn split_sides(s: &str) -> Result<(&str, &str), XqNameError> {
    if let Some(parts) = s.split_once('v') {
        return Ok(parts);
    }
    let king_positions: Vec<usize> = s
        .char_indices()
        .filter_map(|(i, c)| (c == 'k').then_some(i))
        .collect();
    match king_positions[..] {
        [_, second] => Ok((&s[..second], &s[second..])),
        _ => Err(XqNameError::WrongKingCount),
    }
}

impl FromStr for XqMaterial {
    type Err = XqNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (strong_str, weak_str) = split_sides(s)?;
        for ch in s.chars() {
            if ch != 'v' && XqRole::from_char(ch).is_none() {
                return Err(XqNameError::BadChar(ch));
            }
        }
        let strong = XqMaterialSide::from_str_part(strong_str).ok_or(XqNameError::CountOverflow)?;
        let weak = XqMaterialSide::from_str_part(weak_str).ok_or(XqNameError::CountOverflow)?;
        if strong.advisor > 2 || strong.elephant > 2 || weak.advisor > 2 || weak.elephant > 2 {
            return Err(XqNameError::DefenderOverflow);
        }
        if side_order_key(&strong) < side_order_key(&weak) {
            return Err(XqNameError::WrongOrder);
        }
        Ok(Self { strong, weak })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let m: XqMaterial = "kraabbvkaabb".parse().unwrap();
        assert_eq!(m.to_string(), "kraabbvkaabb");
    }

    #[test]
    fn test_parse_bare_concatenated_name() {
        // spec.md's own scenarios write these with no 'v' separator.
        let m: XqMaterial = "kraabbkaabb".parse().unwrap();
        assert_eq!(m.to_string(), "kraabbvkaabb");
        let m: XqMaterial = "kckaabb".parse().unwrap();
        assert_eq!(m.to_string(), "kcvkaabb");
    }

    #[test]
    fn test_wrong_order_rejected() {
        assert_eq!(
            "kvkraabb".parse::<XqMaterial>(),
            Err(XqNameError::WrongOrder)
        );
    }

    #[test]
    fn test_bad_char_rejected() {
        assert_eq!(
            "kxvk".parse::<XqMaterial>(),
            Err(XqNameError::BadChar('x'))
        );
    }

    #[test]
    fn test_sub_endgames_are_smaller() {
        let m: XqMaterial = "kcvkaabb".parse().unwrap();
        for sub in m.sub_endgames() {
            assert!(
                sub.strong.total_count() + sub.weak.total_count()
                    < m.strong.total_count() + m.weak.total_count()
            );
        }
    }
}
