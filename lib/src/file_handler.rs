use std::borrow::Cow;
use std::fmt;
use std::path::Path;
use std::{collections::HashMap, str::FromStr};

use positioned_io::RandomAccessFile;
use retroboard::shakmaty::{ByColor, Chess, Color, Position};

use crate::{
    error::EgtbResult, fold_child_outcomes, indexer::Indexer, is_black_stronger, ChildFold,
    DefaultIndexer, EgtbError, EncoderDecoder, Material, Outcome, Outcomes, SideToMoveGetter,
};

#[derive(Debug)]
pub struct FileHandler<T = DefaultIndexer> {
    pub indexer: T,
    pub outcomes: Outcomes,
}

impl<T: Indexer + From<Material>> FileHandler<T> {
    pub fn new(mat: &MaterialWinner, tablebase_dir: &Path) -> EgtbResult<Self> {
        let path = tablebase_dir.join(format!("{mat:?}"));
        let raf = RandomAccessFile::open(&path).map_err(|e| {
            log::error!("table not found at {path:?}: {e}");
            EgtbError::Io(e)
        })?;
        let outcomes = EncoderDecoder::new(raf).decompress_file().map_err(EgtbError::Io)?;
        let indexer = T::from(mat.material.clone().into_owned());
        Ok(Self { indexer, outcomes })
    }
}

#[derive(Eq, Hash, PartialEq)]
pub struct MaterialWinner<'a> {
    pub material: Cow<'a, Material>,
    pub winner: Color,
}

impl<'a> MaterialWinner<'a> {
    #[must_use]
    pub fn new(material: &'a Material, winner: Color) -> Self {
        Self {
            material: Cow::Borrowed(material),
            winner,
        }
    }

    #[must_use]
    pub fn owned(material: Material, winner: Color) -> MaterialWinner<'static> {
        MaterialWinner {
            material: Cow::Owned(material),
            winner,
        }
    }
}

impl FromStr for MaterialWinner<'_> {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.is_ascii() {
            return Err("material should only contain ascii cases");
        }
        let full_string = s.to_string();
        let (mat_str, color_str) = full_string.split_at(s.len() - 1);
        let winner = char::from_str(color_str)
            .ok()
            .and_then(Color::from_char)
            .ok_or("last char must be 'b' for black or 'w' for white")?;
        let material = Material::from_str(mat_str).expect("Valid material config");
        Ok(Self {
            material: Cow::Owned(material),
            winner,
        })
    }
}

impl fmt::Debug for MaterialWinner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{}", self.material, self.winner.char())
    }
}

/// Looks up a position's helpmate outcome, normalising the colour flip used to halve table
/// sizes and degrading material with no mating force to `Draw` without touching disk.
pub trait RetrieveOutcome {
    fn raw_access_outcome(
        &self,
        mat: Material,
        pos: &Chess,
        winner: Color,
        flip: bool,
    ) -> EgtbResult<Outcome>;

    fn retrieve_outcome(&self, pos: &Chess, winner: Color) -> EgtbResult<Outcome> {
        let flip = is_black_stronger(pos.board());
        let mat = Material::from_board(pos.board());
        if mat.is_draw_by_insufficient_material() {
            return Ok(Outcome::Draw);
        }
        self.raw_access_outcome(mat, pos, winner, flip)
    }
}

#[derive(Debug)]
pub struct Descendants<T = DefaultIndexer>(HashMap<Material, ByColor<FileHandler<T>>>);

impl<T: Indexer + From<Material>> Descendants<T> {
    pub fn new(mat: &Material, tablebase_dir: &Path) -> EgtbResult<Self> {
        let mut map = HashMap::new();
        for m in mat.descendants_not_draw() {
            let mat_winner_white = MaterialWinner::new(&m, Color::White);
            let mat_winner_black = MaterialWinner::new(&m, Color::Black);
            let white = FileHandler::new(&mat_winner_white, tablebase_dir).map_err(|_| {
                EgtbError::MissingSubTable {
                    name: format!("{mat_winner_white:?}"),
                }
            })?;
            let black = FileHandler::new(&mat_winner_black, tablebase_dir).map_err(|_| {
                EgtbError::MissingSubTable {
                    name: format!("{mat_winner_black:?}"),
                }
            })?;
            map.insert(m, ByColor { white, black });
        }
        Ok(Self(map))
    }

    // For test purpose
    #[must_use]
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Returns the outcome stored in the descendant table, relative to `pos`'s own side to
    /// move — not to `winner`, which only selects which of the two winner-keyed sub-table files
    /// to read (both hold the same adversarial values once generated; see DESIGN.md). Panics if
    /// `pos`'s material isn't a declared descendant.
    fn retrieve_outcome(&self, pos: &Chess, winner: Color) -> Outcome {
        let flip = is_black_stronger(pos.board());
        let mat = Material::from_board(pos.board());
        // special case for material config known to be draw in every position
        if mat.is_draw_by_insufficient_material() {
            return Outcome::Draw;
        }
        let table_file = self
            .0
            .get(&mat)
            .expect("Position to be among descendants")
            .get(winner ^ flip);
        let idx = table_file.indexer.encode(pos).usize();
        table_file.outcomes[idx].get_by_color(pos.turn() ^ flip)
    }

    /// Folds every capturing/promoting move's descendant outcome into `pos`'s own side to move:
    /// a move is a `Win` if it leaves the opponent losing, a `Lose` only once *every* such move
    /// does. Quiet moves aren't considered here; the caller accounts for them separately since
    /// their outcome isn't known until the backward pass resolves them.
    /// Example: in "`KPvRK`", a pawn that can capture-and-promote then mate in 4, or just
    /// capture and mate in 2, folds to `Win(2)`.
    #[must_use]
    pub fn outcome_from_captures_promotion(&self, pos: &Chess, winner: Color) -> ChildFold {
        let mut moves = pos.legal_moves();
        moves.retain(|m| m.is_capture() || m.is_promotion());
        fold_child_outcomes(moves.iter().map(|chess_move| {
            let mut pos_after_move = pos.clone();
            pos_after_move.play_unchecked(chess_move);
            self.retrieve_outcome(&pos_after_move, winner)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retroboard::shakmaty::{
        fen::Fen,
        CastlingMode::Standard,
        Color::{Black, White},
    };

    use std::path::PathBuf;
    use std::str::FromStr;

    fn tb_test_dir() -> PathBuf {
        ["..", "table"].iter().collect()
    }

    #[test]
    fn test_material_winner() {
        for ((m, c), expected_file_name) in [
            ((Material::from_str("KQvK").unwrap(), White), "KQvKw"),
            ((Material::from_str("KBvKN").unwrap(), Black), "KBvKNb"),
        ] {
            let mat_winner = MaterialWinner::new(&m, c);
            assert_eq!(format!("{mat_winner:?}"), expected_file_name)
        }
    }

    #[cfg(not(miri))]
    #[test]
    fn test_outcome_from_captures_promotion_immediate_mate_white() {
        // White to move, Qxb7 is the only capture and immediately mates the black king boxed in
        // on the back rank: a distance-0 descendant folds to Win(1) for the mover either way the
        // descendant's own stored side-to-move value is labelled, since Lose(0) negated is
        // Win(0).
        let chess: Chess = Fen::from_ascii("1k6/1r6/1K6/8/4Q3/8/8/8 w - - 0 1".as_bytes())
            .unwrap()
            .into_position(Standard)
            .unwrap();
        let material = Material::from_board(chess.board());
        let descendants: Descendants = Descendants::new(&material, &tb_test_dir()).unwrap();
        assert_eq!(
            descendants.outcome_from_captures_promotion(&chess, White).best(),
            Some(Outcome::Win(1))
        );
    }

    #[cfg(not(miri))]
    #[test]
    fn test_outcome_from_captures_promotion_immediate_mate_black() {
        // Black to move, Rxd1 is the only capture and immediately mates the boxed-in white king.
        let chess: Chess = Fen::from_ascii("8/8/8/8/8/1k6/3r4/1K1Q4 b - - 0 1".as_bytes())
            .unwrap()
            .into_position(Standard)
            .unwrap();
        let material = Material::from_board(chess.board());
        let descendants: Descendants = Descendants::new(&material, &tb_test_dir()).unwrap();
        assert_eq!(
            descendants.outcome_from_captures_promotion(&chess, Black).best(),
            Some(Outcome::Win(1))
        );
    }

    #[test]
    fn test_outcome_from_captures_special_case_only_2_kings_left() {
        // the only capture (Kxd7) reduces to bare kings, caught by `is_draw_by_insufficient_material`
        // before any sub-table lookup; a move that only ever leads to a draw isn't folded into
        // either `best_win` or `worst_lose` — it's left for the backward pass to leave `Unknown`.
        for winner in Color::ALL {
            let chess: Chess = Fen::from_ascii("4k3/3Q4/8/8/8/8/8/3K4 b - - 0 1".as_bytes())
                .unwrap()
                .into_position(Standard)
                .unwrap();
            let material = Material::from_board(chess.board());
            let descendants: Descendants = Descendants::new(&material, &tb_test_dir()).unwrap();
            let fold = descendants.outcome_from_captures_promotion(&chess, winner);
            assert_eq!(fold.best_win, None);
            assert_eq!(fold.lose_count, 0);
        }
    }
}
