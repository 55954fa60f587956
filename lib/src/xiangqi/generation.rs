//! C6 retrograde generator for xiangqi. Mirrors [`crate::generation`]'s two-phase shape — forward
//! enumeration seeded from captures, then backward retraction to a fixed point — but walks
//! [`XqIndexer::reverse`]'s dense `0..total_size` range instead of chess's piece-placement
//! backtracking (xiangqi's indexer already supports direct unranking, so there's no need to
//! duplicate `Generator::generate_positions_internal`'s combinatorial board-building).
//!
//! Xiangqi has no stalemate draw: a side with no legal move loses outright, whether or not it's
//! in check, so there's a single "no legal move" branch in place of chess's
//! `ChessOutcome::Decisive`/`ChessOutcome::Draw` split. The `Outcome::Perpetual*` verdicts (the
//! no-perpetual-check rule) are produced here too: a position still unresolved after the normal
//! fixed point is drawn, and is further classified by whether the side to move has no option but
//! to check, is itself escaping a forced check, or both — a one-ply scoped heuristic, not a full
//! repetition-history search (see DESIGN.md).

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::path::Path;

use log::debug;
use retroboard::shakmaty::{ByColor, Color};

use crate::error::EgtbResult;
use crate::generation::{IndexWithTurn, SideToMoveGetter};
use crate::{Outcome, Report, Reports, UNDEFINED_OUTCOME_BYCOLOR};

use super::file_handler::{XqDescendants, XqMaterialWinner};
use super::indexer::XqIndexer;
use super::moves::XqBoard;
use super::position::{is_legal, XqPosition};

/// Running totals used by `cli`'s xiangqi stats command, the xiangqi analogue of what
/// [`crate::generation::TableBaseBuilder::build`]'s caller logs via `debug!`.
#[derive(Debug, Default, Clone, Copy)]
pub struct XqOutcomeStats {
    pub total: u64,
    pub legal: u64,
    pub wins: u64,
    pub draws: u64,
    pub losses: u64,
    pub perpetual: u64,
    pub max_dtm: u8,
}

pub struct XqCommon {
    pub all_pos: Reports,
    /// Per-(position, side to move) count of legal moves not yet proven to hand the opponent a
    /// win, mirroring [`crate::common::Common::remaining_moves`].
    pub remaining_moves: Vec<ByColor<u8>>,
    mat_win: XqMaterialWinner,
    can_mate: bool,
    indexer: XqIndexer,
}

impl XqCommon {
    #[must_use]
    pub fn new(mat_win: XqMaterialWinner) -> Self {
        let indexer = XqIndexer::new(&mat_win.material);
        let size = usize::try_from(indexer.total_size()).expect("table fits in memory");
        let can_mate = mat_win.material.can_mate(mat_win.winner);
        Self {
            all_pos: vec![UNDEFINED_OUTCOME_BYCOLOR; size],
            remaining_moves: vec![ByColor { white: 0, black: 0 }; size],
            can_mate,
            indexer,
            mat_win,
        }
    }

    #[must_use]
    pub fn material_winner(&self) -> &XqMaterialWinner {
        &self.mat_win
    }

    #[must_use]
    pub fn winner(&self) -> Color {
        self.mat_win.winner
    }

    /// Whether `winner`'s side keeps any attacking material at all in this table. No longer
    /// gates the backward pass (see `XqTagger`), kept as a descriptive accessor.
    #[must_use]
    pub fn can_mate(&self) -> bool {
        self.can_mate
    }

    #[must_use]
    pub fn indexer(&self) -> &XqIndexer {
        &self.indexer
    }
}

/// Forward phase: enumerate every slot the indexer can unrank, mark illegal ones `Undefined`,
/// seed immediate losses (`no legal move`) and capture-reachable outcomes, leave the rest
/// `Unknown` for the backward pass.
struct XqGenerator {
    common: XqCommon,
    descendants: XqDescendants,
}

impl XqGenerator {
    fn new(common: XqCommon, tablebase_dir: &Path) -> EgtbResult<Self> {
        let descendants = XqDescendants::new(&common.mat_win.material, tablebase_dir)?;
        Ok(Self { common, descendants })
    }

    fn generate_positions(&mut self) {
        let total = self.common.indexer.total_size();
        for idx in 0..total {
            let Some(placement) = self.common.indexer.reverse(idx) else {
                continue; // intrinsically invalid slot, stays Undefined
            };
            let board = XqBoard::from_placement(&placement);
            for turn in Color::ALL {
                if !is_legal(&board, turn) {
                    continue; // stays Undefined
                }
                let pos = XqPosition {
                    board: board.clone(),
                    turn,
                };
                let all_pos_idx = usize::try_from(idx).expect("fits in usize");
                let report = if pos.is_immediate_loss() {
                    // no stalemate in xiangqi: a side with no legal move always loses, whichever
                    // side `winner` names in this table.
                    Report::Unprocessed(Outcome::Lose(0))
                } else {
                    let total_moves = pos.legal_moves_with_capture().len();
                    let fold = self.descendants.outcome_from_captures(&pos, self.common.winner());
                    if let Some(win) = fold.best_win {
                        Report::Unprocessed(win)
                    } else {
                        let remaining = total_moves - fold.lose_count;
                        if remaining == 0 {
                            let lose = fold.worst_lose.expect(
                                "lose_count == total_moves implies at least one losing move",
                            );
                            Report::Unprocessed(lose)
                        } else {
                            *self.common.remaining_moves[all_pos_idx].get_mut(turn) =
                                u8::try_from(remaining).expect("fewer than 256 legal moves");
                            Report::Unprocessed(fold.worst_lose.unwrap_or(Outcome::Unknown))
                        }
                    }
                };
                *self.common.all_pos[all_pos_idx].get_mut(turn) = report.into();
            }
        }
    }
}

fn outcome_distance(outcome: Outcome) -> u8 {
    match outcome {
        Outcome::Win(n) | Outcome::Lose(n) => n,
        _ => unreachable!("only decided Win/Lose outcomes are ever queued for propagation"),
    }
}

type TagHeap = BinaryHeap<Reverse<(u8, u64, bool)>>;

fn heap_push(heap: &mut TagHeap, idx_with_turn: IndexWithTurn, outcome: Outcome) {
    heap.push(Reverse((
        outcome_distance(outcome),
        idx_with_turn.idx,
        idx_with_turn.turn == Color::White,
    )));
}

fn heap_pop(heap: &mut TagHeap) -> Option<IndexWithTurn> {
    heap.pop().map(|Reverse((_, idx, is_white))| IndexWithTurn {
        idx,
        turn: if is_white { Color::White } else { !Color::White },
    })
}

/// Backward phase: true adversarial retrograde analysis, mirroring
/// [`crate::generation::Tagger`] — a `Win` commits the first time any move hands the opponent a
/// `Lose` (the heap walks non-decreasing ply distance, so "first" means "shortest"), a `Lose`
/// commits only once every legal move has been proven to hand the opponent a `Win`.
struct XqTagger {
    common: XqCommon,
}

impl XqTagger {
    fn process_positions(&mut self) {
        let mut heap: TagHeap = BinaryHeap::new();
        for idx in 0..self.common.all_pos.len() {
            for turn in Color::ALL {
                let idx_with_turn = IndexWithTurn {
                    idx: idx as u64,
                    turn,
                };
                if let Report::Unprocessed(outcome) =
                    Report::from(self.common.all_pos[idx].get_by_color(turn))
                {
                    if matches!(outcome, Outcome::Win(_) | Outcome::Lose(_)) {
                        heap_push(&mut heap, idx_with_turn, outcome);
                    }
                }
            }
        }

        while let Some(idx_with_turn) = heap_pop(&mut heap) {
            let outcome = match Report::from(
                self.common.all_pos[idx_with_turn.usize()].get_by_color(idx_with_turn.turn),
            ) {
                Report::Unprocessed(outcome) => outcome,
                Report::Processed(_) => continue, // settled via another path already
            };
            *self.common.all_pos[idx_with_turn.usize()].get_mut(idx_with_turn.turn) =
                Report::Processed(outcome).into();

            let placement = self
                .common
                .indexer
                .reverse(idx_with_turn.idx)
                .expect("idx was populated by the forward pass");
            let board = XqBoard::from_placement(&placement);
            let pos = XqPosition {
                board,
                turn: idx_with_turn.turn,
            };
            for pred in pos.retro_predecessors() {
                let Some(pred_idx) = self.common.indexer.forward(&pred.board.placement()) else {
                    continue;
                };
                let pred_idx_with_turn = IndexWithTurn {
                    idx: pred_idx,
                    turn: pred.turn,
                };
                let pred_existing = match Report::from(
                    self.common.all_pos[pred_idx_with_turn.usize()].get_by_color(pred.turn),
                ) {
                    Report::Processed(_) | Report::Unprocessed(Outcome::Win(_)) => continue,
                    Report::Unprocessed(existing) => existing,
                };

                match !outcome + 1 {
                    win @ Outcome::Win(_) => {
                        *self.common.all_pos[pred_idx_with_turn.usize()]
                            .get_mut(pred_idx_with_turn.turn) = Report::Unprocessed(win).into();
                        heap_push(&mut heap, pred_idx_with_turn, win);
                    }
                    lose @ Outcome::Lose(_) => {
                        let remaining = self.common.remaining_moves[pred_idx_with_turn.usize()]
                            .get_mut(pred_idx_with_turn.turn);
                        *remaining -= 1;
                        let worst = pred_existing.max(lose);
                        *self.common.all_pos[pred_idx_with_turn.usize()]
                            .get_mut(pred_idx_with_turn.turn) = Report::Unprocessed(worst).into();
                        if *remaining == 0 {
                            heap_push(&mut heap, pred_idx_with_turn, worst);
                        }
                    }
                    _ => unreachable!("negating a decided outcome is always Win or Lose"),
                }
            }
        }

        self.finalize();
    }

    /// Any position that never settled is a draw, further classified by the perpetual-check
    /// heuristic; unlike the old wavefront this covers every leftover `Unprocessed` cell, not
    /// just the ones still holding `Unknown`.
    fn finalize(&mut self) {
        let total = self.common.indexer.total_size();
        for idx in 0..total {
            let Some(placement) = self.common.indexer.reverse(idx) else {
                continue;
            };
            let board = XqBoard::from_placement(&placement);
            for turn in Color::ALL {
                let usize_idx = usize::try_from(idx).expect("fits in usize");
                let cell = self.common.all_pos[usize_idx].get_mut(turn);
                if let Report::Unprocessed(_) = Report::from(*cell) {
                    let pos = XqPosition {
                        board: board.clone(),
                        turn,
                    };
                    let outcome = classify_perpetual(&pos).unwrap_or(Outcome::Draw);
                    *cell = Report::Processed(outcome).into();
                }
            }
        }
    }
}

/// Scoped one-ply heuristic for the no-perpetual-check rule: among positions that the normal
/// fixed point leaves undecided (true fortress draws), flag the ones where the side to move can
/// only check (`PerpetualChecked`), is itself forced to keep dodging check
/// (`PerpetualEvasion`), or both. Positions resolved this way never had a legal-move-count of
/// zero (that's `Lose(0)`, handled in the forward pass), so `moves` below is never empty when
/// `in_check` holds only through the opponent's prior move, not this position's own exits.
fn classify_perpetual(pos: &XqPosition) -> Option<Outcome> {
    let moves = pos.legal_moves_with_capture();
    if moves.is_empty() {
        return None;
    }
    let in_check = pos.board.is_in_check(pos.turn);
    let all_moves_give_check = moves.iter().all(|&(from, to, _)| {
        let after = pos.after_move(from, to);
        after.board.is_in_check(after.turn)
    });
    match (all_moves_give_check, in_check) {
        (true, true) => Some(Outcome::PerpetualCheckedEvasion),
        (true, false) => Some(Outcome::PerpetualChecked),
        (false, true) => Some(Outcome::PerpetualEvasion),
        (false, false) => None,
    }
}

pub struct XqTableBaseBuilder;

impl XqTableBaseBuilder {
    pub fn build(mat_win: XqMaterialWinner, tablebase_dir: &Path) -> EgtbResult<Reports> {
        let common = XqCommon::new(mat_win);
        let mut generator = XqGenerator::new(common, tablebase_dir)?;
        generator.generate_positions();
        debug!(
            "xiangqi {:?}: {} positions generated",
            generator.common.mat_win,
            generator.common.all_pos.len()
        );
        let mut tagger = XqTagger {
            common: generator.common,
        };
        tagger.process_positions();
        Ok(tagger.common.all_pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xiangqi::material::{XqMaterial, XqRole};
    use crate::xiangqi::moves::XqPiece;

    #[test]
    fn test_build_bare_kings_is_all_draw() {
        let material: XqMaterial = "kvk".parse().unwrap();
        let mat_win = XqMaterialWinner::new(material, Color::White);
        let all_pos = XqTableBaseBuilder::build(mat_win, Path::new("/nonexistent")).unwrap();
        for bc in &all_pos {
            for turn in Color::ALL {
                if let Report::Processed(outcome) = Report::from(*bc.get(turn)) {
                    assert!(matches!(outcome, Outcome::Draw | Outcome::Undefined));
                }
            }
        }
    }

    #[test]
    fn test_classify_perpetual_none_when_quiet_move_available() {
        let mut board = XqBoard::default();
        board.put(
            super::super::board::Square::new(4, 0),
            XqPiece {
                color: Color::White,
                role: XqRole::King,
            },
        );
        board.put(
            super::super::board::Square::new(4, 9),
            XqPiece {
                color: Color::Black,
                role: XqRole::King,
            },
        );
        board.put(
            super::super::board::Square::new(0, 5),
            XqPiece {
                color: Color::White,
                role: XqRole::Rook,
            },
        );
        let pos = XqPosition {
            board,
            turn: Color::White,
        };
        // the rook has plenty of non-checking moves available
        assert_eq!(classify_perpetual(&pos), None);
    }
}
