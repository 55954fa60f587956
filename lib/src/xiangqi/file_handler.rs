//! C4 table file + C5 table collection for xiangqi, mirroring [`crate::file_handler`]'s chess
//! `FileHandler`/`Descendants` but keyed by [`XqMaterial`]/[`XqIndexer`]. No explicit per-side
//! (`.w`/`.b`) file merge is needed here either, for the same reason as chess: [`XqDescendants`]
//! keys its map by `XqMaterial` and holds a `ByColor<XqFileHandler>` per entry, so both sides are
//! reachable from one lookup.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use positioned_io::RandomAccessFile;
use retroboard::shakmaty::{ByColor, Color};

use crate::error::{EgtbError, EgtbResult};
use crate::generation::SideToMoveGetter;
use crate::{fold_child_outcomes, ChildFold, EncoderDecoder, Outcome, Outcomes};

use super::indexer::XqIndexer;
use super::material::XqMaterial;
use super::position::XqPosition;

#[derive(Eq, Hash, PartialEq, Clone)]
pub struct XqMaterialWinner {
    pub material: XqMaterial,
    pub winner: Color,
}

impl XqMaterialWinner {
    #[must_use]
    pub fn new(material: XqMaterial, winner: Color) -> Self {
        Self { material, winner }
    }
}

impl fmt::Debug for XqMaterialWinner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "xq-{}{}", self.material, self.winner.char())
    }
}

#[derive(Debug)]
pub struct XqFileHandler {
    pub indexer: XqIndexer,
    pub outcomes: Outcomes,
}

impl XqFileHandler {
    pub fn new(mat_win: &XqMaterialWinner, tablebase_dir: &Path) -> EgtbResult<Self> {
        let path = tablebase_dir.join(format!("{mat_win:?}"));
        let raf = RandomAccessFile::open(&path).map_err(|e| {
            log::error!("xiangqi table not found at {path:?}: {e}");
            EgtbError::Io(e)
        })?;
        let outcomes = EncoderDecoder::new(raf)
            .decompress_file()
            .map_err(EgtbError::Io)?;
        let indexer = XqIndexer::new(&mat_win.material);
        Ok(Self { indexer, outcomes })
    }
}

#[derive(Debug)]
pub struct XqDescendants(HashMap<XqMaterial, ByColor<XqFileHandler>>);

impl XqDescendants {
    pub fn new(mat: &XqMaterial, tablebase_dir: &Path) -> EgtbResult<Self> {
        let mut map = HashMap::new();
        for m in mat.sub_endgames() {
            let white = XqMaterialWinner::new(m.clone(), Color::White);
            let black = XqMaterialWinner::new(m.clone(), Color::Black);
            let white_fh = XqFileHandler::new(&white, tablebase_dir).map_err(|_| {
                EgtbError::MissingSubTable {
                    name: format!("{white:?}"),
                }
            })?;
            let black_fh = XqFileHandler::new(&black, tablebase_dir).map_err(|_| {
                EgtbError::MissingSubTable {
                    name: format!("{black:?}"),
                }
            })?;
            map.insert(
                m,
                ByColor {
                    white: white_fh,
                    black: black_fh,
                },
            );
        }
        Ok(Self(map))
    }

    /// For test purpose.
    #[must_use]
    pub fn empty() -> Self {
        Self(HashMap::new())
    }

    /// Folds every capturing move's descendant outcome into `pos`'s own side to move: a `Win`
    /// if any capture leaves the opponent losing, a `Lose` only once every capture does. Empty
    /// when `pos` has no capture available (the forward generator then leaves the position
    /// `Unknown`, to be resolved by backward tagging or finalised to `Draw`).
    #[must_use]
    pub fn outcome_from_captures(&self, pos: &XqPosition, winner: Color) -> ChildFold {
        fold_child_outcomes(
            pos.legal_moves_with_capture()
                .into_iter()
                .filter(|&(_, _, is_capture)| is_capture)
                .map(|(from, to, _)| self.retrieve_outcome(&pos.after_move(from, to), winner)),
        )
    }

    /// Outcome of one specific (already-played) position, read from its declared sub-table.
    /// Used both to fold captures into `outcome_from_captures` and, by the verifier, to
    /// recompute a single stored cell's expected value.
    #[must_use]
    pub fn retrieve_outcome(&self, pos: &XqPosition, winner: Color) -> Outcome {
        let (board, material, turn, flipped) = pos.canonical();
        let file_handler = self
            .0
            .get(&material)
            .expect("capture leads to a declared sub-endgame")
            .get(winner ^ flipped);
        let idx = file_handler
            .indexer
            .forward(&board.placement())
            .expect("canonical board matches its own material's index domain");
        file_handler.outcomes[usize::try_from(idx).expect("fits in usize")].get_by_color(turn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_winner_debug_format() {
        let material: XqMaterial = "kcvk".parse().unwrap();
        let mat_winner = XqMaterialWinner::new(material, Color::White);
        assert_eq!(format!("{mat_winner:?}"), "xq-kcvkw");
    }

    #[test]
    fn test_descendants_empty_has_no_captures() {
        use super::super::moves::XqBoard;
        let descendants = XqDescendants::empty();
        let board = XqBoard::default();
        let pos = XqPosition {
            board,
            turn: Color::White,
        };
        let fold = descendants.outcome_from_captures(&pos, Color::White);
        assert_eq!(fold.best_win, None);
        assert_eq!(fold.lose_count, 0);
    }
}
