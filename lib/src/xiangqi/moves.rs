//! C2 board model for xiangqi: piece placement, pseudo-legal move generation per role, and
//! check detection including the "flying generals" rule, the variant-specific analogue of
//! `crate::generation`'s chess move handling (which defers to `retroboard`/`shakmaty`, a crate
//! with no xiangqi support).

use retroboard::shakmaty::Color;

use super::board::{advisor_squares, elephant_squares, palace_squares, Square, FILES, NB_SQUARES, RANKS};
use super::material::XqRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XqPiece {
    pub color: Color,
    pub role: XqRole,
}

#[derive(Debug, Clone)]
pub struct XqBoard {
    squares: [Option<XqPiece>; NB_SQUARES],
}

impl Default for XqBoard {
    fn default() -> Self {
        Self {
            squares: [None; NB_SQUARES],
        }
    }
}

fn step(from: Square, df: i8, dr: i8) -> Option<Square> {
    let file = i8::try_from(from.file()).ok()? + df;
    let rank = i8::try_from(from.rank()).ok()? + dr;
    if (0..i8::try_from(FILES).ok()?).contains(&file) && (0..i8::try_from(RANKS).ok()?).contains(&rank) {
        Some(Square::new(file as u8, rank as u8))
    } else {
        None
    }
}

impl XqBoard {
    #[must_use]
    pub fn from_placement(placement: &[(Color, XqRole, Square)]) -> Self {
        let mut board = Self::default();
        for &(color, role, sq) in placement {
            board.put(sq, XqPiece { color, role });
        }
        board
    }

    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<XqPiece> {
        self.squares[sq.index() as usize]
    }

    pub fn put(&mut self, sq: Square, piece: XqPiece) {
        self.squares[sq.index() as usize] = Some(piece);
    }

    pub fn remove(&mut self, sq: Square) -> Option<XqPiece> {
        self.squares[sq.index() as usize].take()
    }

    /// Every occupied square with its piece, in no particular order — the flat form
    /// [`super::indexer::XqIndexer`] ranks/unranks.
    #[must_use]
    pub fn placement(&self) -> Vec<(Color, XqRole, Square)> {
        Square::all()
            .into_iter()
            .filter_map(|sq| self.piece_at(sq).map(|p| (p.color, p.role, sq)))
            .collect()
    }

    #[must_use]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        Square::all()
            .into_iter()
            .find(|&sq| matches!(self.piece_at(sq), Some(p) if p.color == color && p.role == XqRole::King))
    }

    fn file_clear_between(&self, file: u8, from_rank: u8, to_rank: u8) -> bool {
        let (lo, hi) = if from_rank < to_rank {
            (from_rank, to_rank)
        } else {
            (to_rank, from_rank)
        };
        ((lo + 1)..hi).all(|rank| self.piece_at(Square::new(file, rank)).is_none())
    }

    /// The two generals face each other on an open file: illegal to leave on the board, and
    /// (per spec §4.2's "isInCheck" contract) treated as check on whichever side is to move.
    #[must_use]
    pub fn kings_face_each_other(&self) -> bool {
        match (self.king_square(Color::White), self.king_square(Color::Black)) {
            (Some(w), Some(b)) if w.file() == b.file() => {
                self.file_clear_between(w.file(), w.rank(), b.rank())
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn is_in_check(&self, color: Color) -> bool {
        let Some(king_sq) = self.king_square(color) else {
            return false;
        };
        if self.kings_face_each_other() {
            return true;
        }
        let attacker = !color;
        Square::all().into_iter().any(|from| {
            matches!(self.piece_at(from), Some(p) if p.color == attacker)
                && self.pseudo_legal_targets(from).contains(&king_sq)
        })
    }

    /// Pseudo-legal destinations for the piece on `from`, ignoring whether the mover's own
    /// king would be left in check.
    #[must_use]
    pub fn pseudo_legal_targets(&self, from: Square) -> Vec<Square> {
        let Some(piece) = self.piece_at(from) else {
            return Vec::new();
        };
        match piece.role {
            XqRole::King => self.king_targets(from, piece.color),
            XqRole::Advisor => self.advisor_targets(from, piece.color),
            XqRole::Elephant => self.elephant_targets(from, piece.color),
            XqRole::Rook => self.sliding_targets(from, piece.color, &[(1, 0), (-1, 0), (0, 1), (0, -1)]),
            XqRole::Cannon => self.cannon_targets(from, piece.color),
            XqRole::Horse => self.horse_targets(from, piece.color),
            XqRole::Pawn => self.pawn_targets(from, piece.color),
        }
    }

    fn not_own(&self, sq: Square, color: Color) -> bool {
        !matches!(self.piece_at(sq), Some(p) if p.color == color)
    }

    fn king_targets(&self, from: Square, color: Color) -> Vec<Square> {
        let palace = palace_squares(color);
        [(1, 0), (-1, 0), (0, 1), (0, -1)]
            .into_iter()
            .filter_map(|(df, dr)| step(from, df, dr))
            .filter(|sq| palace.contains(sq) && self.not_own(*sq, color))
            .collect()
    }

    fn advisor_targets(&self, from: Square, color: Color) -> Vec<Square> {
        let points = advisor_squares(color);
        [(1, 1), (1, -1), (-1, 1), (-1, -1)]
            .into_iter()
            .filter_map(|(df, dr)| step(from, df, dr))
            .filter(|sq| points.contains(sq) && self.not_own(*sq, color))
            .collect()
    }

    fn elephant_targets(&self, from: Square, color: Color) -> Vec<Square> {
        let points = elephant_squares(color);
        [(2, 2), (2, -2), (-2, 2), (-2, -2)]
            .into_iter()
            .filter_map(|(df, dr)| {
                let to = step(from, df, dr)?;
                let eye = step(from, df / 2, dr / 2)?;
                self.piece_at(eye).is_none().then_some(to)
            })
            .filter(|sq| points.contains(sq) && self.not_own(*sq, color))
            .collect()
    }

    fn horse_targets(&self, from: Square, color: Color) -> Vec<Square> {
        const DELTAS: [(i8, i8, i8, i8); 8] = [
            (1, 2, 0, 1),
            (2, 1, 1, 0),
            (2, -1, 1, 0),
            (1, -2, 0, -1),
            (-1, -2, 0, -1),
            (-2, -1, -1, 0),
            (-2, 1, -1, 0),
            (-1, 2, 0, 1),
        ];
        DELTAS
            .into_iter()
            .filter_map(|(df, dr, leg_f, leg_r)| {
                let leg = step(from, leg_f, leg_r)?;
                if self.piece_at(leg).is_some() {
                    return None;
                }
                step(from, df, dr)
            })
            .filter(|sq| self.not_own(*sq, color))
            .collect()
    }

    fn sliding_targets(&self, from: Square, color: Color, dirs: &[(i8, i8)]) -> Vec<Square> {
        let mut out = Vec::new();
        for &(df, dr) in dirs {
            let mut cur = from;
            while let Some(next) = step(cur, df, dr) {
                match self.piece_at(next) {
                    None => out.push(next),
                    Some(p) => {
                        if p.color != color {
                            out.push(next);
                        }
                        break;
                    }
                }
                cur = next;
            }
        }
        out
    }

    fn cannon_targets(&self, from: Square, color: Color) -> Vec<Square> {
        let mut out = Vec::new();
        for &(df, dr) in &[(1, 0), (-1, 0), (0, 1), (0, -1)] {
            let mut cur = from;
            let mut screen = false;
            while let Some(next) = step(cur, df, dr) {
                match self.piece_at(next) {
                    None => {
                        if !screen {
                            out.push(next);
                        }
                    }
                    Some(p) => {
                        if screen {
                            if p.color != color {
                                out.push(next);
                            }
                            break;
                        }
                        screen = true;
                    }
                }
                cur = next;
            }
        }
        out
    }

    fn pawn_targets(&self, from: Square, color: Color) -> Vec<Square> {
        let forward: i8 = match color {
            Color::White => 1,
            Color::Black => -1,
        };
        let crossed = match color {
            Color::White => from.rank() >= RANKS / 2,
            Color::Black => from.rank() < RANKS / 2,
        };
        let mut deltas = vec![(0, forward)];
        if crossed {
            deltas.push((1, 0));
            deltas.push((-1, 0));
        }
        deltas
            .into_iter()
            .filter_map(|(df, dr)| step(from, df, dr))
            .filter(|sq| self.not_own(*sq, color))
            .collect()
    }

    /// Retro-moves: squares `color` could have moved from to reach its current placement on this
    /// same board, captures excluded. A capture can't be retraced this way (the captured piece's
    /// identity isn't recoverable from the board alone), so material-changing retractions are
    /// handled separately by consulting the smaller material's table, not by this function.
    #[must_use]
    pub fn unmoves(&self, color: Color) -> Vec<(Square, Square)> {
        Square::all()
            .into_iter()
            .filter(|&to| matches!(self.piece_at(to), Some(p) if p.color == color))
            .flat_map(|to| {
                let piece = self.piece_at(to).expect("checked by filter above");
                Square::all().into_iter().filter_map(move |from| {
                    if from == to || self.piece_at(from).is_some() {
                        return None;
                    }
                    let mut before = self.clone();
                    before.remove(to);
                    before.put(from, piece);
                    before
                        .pseudo_legal_targets(from)
                        .contains(&to)
                        .then_some((from, to))
                })
            })
            .collect()
    }

    /// Legal moves: pseudo-legal, minus anything that leaves the mover's own king in check or
    /// the two generals facing each other.
    #[must_use]
    pub fn legal_moves(&self, color: Color) -> Vec<(Square, Square)> {
        Square::all()
            .into_iter()
            .filter(|&from| matches!(self.piece_at(from), Some(p) if p.color == color))
            .flat_map(|from| {
                self.pseudo_legal_targets(from).into_iter().filter_map(move |to| {
                    let mut after = self.clone();
                    let piece = after.remove(from).expect("piece present, checked above");
                    after.remove(to);
                    after.put(to, piece);
                    (!after.is_in_check(color)).then_some((from, to))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(color: Color, role: XqRole) -> XqPiece {
        XqPiece { color, role }
    }

    #[test]
    fn test_flying_generals_is_check() {
        let mut b = XqBoard::default();
        b.put(Square::new(4, 0), piece(Color::White, XqRole::King));
        b.put(Square::new(4, 9), piece(Color::Black, XqRole::King));
        assert!(b.kings_face_each_other());
        assert!(b.is_in_check(Color::White));
        assert!(b.is_in_check(Color::Black));
    }

    #[test]
    fn test_elephant_blocked_by_eye() {
        let mut b = XqBoard::default();
        b.put(Square::new(2, 0), piece(Color::White, XqRole::Elephant));
        b.put(Square::new(1, 1), piece(Color::White, XqRole::Pawn));
        let targets = b.pseudo_legal_targets(Square::new(2, 0));
        assert!(!targets.contains(&Square::new(0, 2)));
        assert!(targets.contains(&Square::new(4, 2)));
    }

    #[test]
    fn test_horse_leg_block() {
        let mut b = XqBoard::default();
        b.put(Square::new(4, 4), piece(Color::White, XqRole::Horse));
        b.put(Square::new(4, 5), piece(Color::Black, XqRole::Pawn));
        let targets = b.pseudo_legal_targets(Square::new(4, 4));
        assert!(!targets.contains(&Square::new(5, 6)));
        assert!(!targets.contains(&Square::new(3, 6)));
    }

    #[test]
    fn test_cannon_needs_exactly_one_screen() {
        let mut b = XqBoard::default();
        b.put(Square::new(0, 0), piece(Color::White, XqRole::Cannon));
        b.put(Square::new(0, 3), piece(Color::White, XqRole::Pawn));
        b.put(Square::new(0, 6), piece(Color::Black, XqRole::Rook));
        let targets = b.pseudo_legal_targets(Square::new(0, 0));
        // slides freely up to the screen
        assert!(targets.contains(&Square::new(0, 1)));
        assert!(targets.contains(&Square::new(0, 2)));
        // can't land on the screen itself, or pass through it without capturing
        assert!(!targets.contains(&Square::new(0, 3)));
        assert!(!targets.contains(&Square::new(0, 4)));
        assert!(!targets.contains(&Square::new(0, 5)));
        // captures the enemy piece directly behind the screen
        assert!(targets.contains(&Square::new(0, 6)));
    }

    #[test]
    fn test_unmoves_are_inverse_of_a_legal_move() {
        let mut b = XqBoard::default();
        b.put(Square::new(4, 4), piece(Color::White, XqRole::Horse));
        let to = Square::new(5, 6);
        assert!(b.legal_moves(Color::White).contains(&(Square::new(4, 4), to)));
        let mut after = b.clone();
        let p = after.remove(Square::new(4, 4)).unwrap();
        after.put(to, p);
        assert!(after.unmoves(Color::White).contains(&(Square::new(4, 4), to)));
    }
}
