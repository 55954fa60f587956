//! Position-level glue for xiangqi: legality (the side not to move must not be left in check),
//! the "no legal move is a loss" rule (xiangqi has no stalemate draw, unlike chess), retro-move
//! generation for the backward tagging pass, and the same-material/strong-side canonicalisation
//! [`crate::material::is_black_stronger`] performs for chess, adapted to the vertical river flip.

use retroboard::shakmaty::Color;

use super::board::Square;
use super::material::{XqMaterial, XqMaterialSide};
use super::moves::{XqBoard, XqPiece};

#[derive(Debug, Clone)]
pub struct XqPosition {
    pub board: XqBoard,
    pub turn: Color,
}

/// A position is legal iff the side *not* to move isn't left in check (which also covers the
/// flying-generals rule, since `is_in_check` treats facing generals as check on both sides).
#[must_use]
pub fn is_legal(board: &XqBoard, turn: Color) -> bool {
    !board.is_in_check(!turn)
}

impl XqPosition {
    #[must_use]
    pub fn legal(&self) -> bool {
        is_legal(&self.board, self.turn)
    }

    /// Legal moves with a capture flag; xiangqi has no promotion.
    #[must_use]
    pub fn legal_moves_with_capture(&self) -> Vec<(Square, Square, bool)> {
        self.board
            .legal_moves(self.turn)
            .into_iter()
            .map(|(from, to)| (from, to, self.board.piece_at(to).is_some()))
            .collect()
    }

    #[must_use]
    pub fn after_move(&self, from: Square, to: Square) -> Self {
        let mut board = self.board.clone();
        let piece = board.remove(from).expect("piece present, checked by caller");
        board.remove(to);
        board.put(to, piece);
        Self {
            board,
            turn: !self.turn,
        }
    }

    /// Side to move has no legal move: xiangqi has no stalemate, both checkmate and stalemate
    /// are a loss for the side to move.
    #[must_use]
    pub fn is_immediate_loss(&self) -> bool {
        self.board.legal_moves(self.turn).is_empty()
    }

    /// Legal predecessor positions one same-material, non-capturing retro-move away. Captures
    /// are never retraced here: they're resolved forward, by consulting the descendant table
    /// for the smaller material, mirroring how [`crate::file_handler::Descendants`] handles
    /// chess captures/promotions instead of asking `RetroBoard` to "unplay" them.
    #[must_use]
    pub fn retro_predecessors(&self) -> Vec<Self> {
        let mover = !self.turn;
        self.board
            .unmoves(mover)
            .into_iter()
            .filter_map(|(from, to)| {
                let mut board = self.board.clone();
                let piece = board.remove(to).expect("piece present, returned by unmoves");
                board.put(from, piece);
                let pred = Self { board, turn: mover };
                pred.legal().then_some(pred)
            })
            .collect()
    }

    /// Material + strong-side colour for this position's raw (not yet canonicalised) board.
    #[must_use]
    pub fn raw_material(&self) -> XqMaterial {
        let (white, black) = side_counts(&self.board);
        XqMaterial::canonicalize(white, black)
    }

    /// Canonical view used to consult a sub-table: vertical-flips the board (and swaps piece
    /// colours) when the actual white side turns out to be the weak one, so the strong side
    /// always lands in the table's `Color::White` domain, the same normalisation
    /// [`crate::material::is_black_stronger`] performs before a chess lookup.
    #[must_use]
    pub fn canonical(&self) -> (XqBoard, XqMaterial, Color, bool) {
        let (white, black) = side_counts(&self.board);
        let flipped = side_order_key(&black) > side_order_key(&white);
        let material = if flipped {
            XqMaterial {
                strong: black,
                weak: white,
            }
        } else {
            XqMaterial {
                strong: white,
                weak: black,
            }
        };
        if !flipped {
            (self.board.clone(), material, self.turn, false)
        } else {
            let mut board = XqBoard::default();
            for sq in Square::all() {
                if let Some(p) = self.board.piece_at(sq) {
                    board.put(
                        sq.flip_vertical(),
                        XqPiece {
                            color: !p.color,
                            role: p.role,
                        },
                    );
                }
            }
            (board, material, !self.turn, true)
        }
    }
}

fn side_counts(board: &XqBoard) -> (XqMaterialSide, XqMaterialSide) {
    let mut white = XqMaterialSide::default();
    let mut black = XqMaterialSide::default();
    for sq in Square::all() {
        if let Some(p) = board.piece_at(sq) {
            let side = match p.color {
                Color::White => &mut white,
                Color::Black => &mut black,
            };
            side.increment(p.role);
        }
    }
    (white, black)
}

fn side_order_key(s: &XqMaterialSide) -> (u32, u32, u32) {
    (s.attacker_count(), s.attacker_value_sum(), s.total_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xiangqi::material::XqRole;

    fn piece(color: Color, role: XqRole) -> XqPiece {
        XqPiece { color, role }
    }

    #[test]
    fn test_no_legal_move_is_a_loss_even_without_check() {
        // bare kings facing off on adjacent files can't stalemate (no blocking pieces to run
        // out of), so build a position where black's sole piece truly has no legal move: a
        // king in the corner of its palace with every palace exit occupied by its own advisor.
        let mut board = XqBoard::default();
        board.put(Square::new(4, 0), piece(Color::White, XqRole::King));
        board.put(Square::new(3, 9), piece(Color::Black, XqRole::King));
        board.put(Square::new(4, 9), piece(Color::Black, XqRole::Advisor));
        board.put(Square::new(3, 8), piece(Color::Black, XqRole::Advisor));
        let pos = XqPosition {
            board,
            turn: Color::Black,
        };
        assert!(pos.is_immediate_loss());
    }

    #[test]
    fn test_canonical_flips_when_black_is_strong() {
        let mut board = XqBoard::default();
        board.put(Square::new(4, 0), piece(Color::White, XqRole::King));
        board.put(Square::new(4, 9), piece(Color::Black, XqRole::King));
        board.put(Square::new(0, 9), piece(Color::Black, XqRole::Rook));
        let pos = XqPosition {
            board,
            turn: Color::White,
        };
        let (_, material, turn, flipped) = pos.canonical();
        assert!(flipped);
        assert_eq!(turn, Color::Black);
        assert_eq!(material.strong.rook, 1);
    }
}
