//! CLI entry points for the xiangqi variant: generate, stats and verify, mirroring
//! `generate`/`stats`/`verify` but over `XqMaterial`/`XqMaterialWinner` instead of chess's.

use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Subcommand};
use log::{debug, error, info};
use retroboard::shakmaty::Color;

use retro_egtb::xiangqi::{
    XqBoard, XqDescendants, XqFileHandler, XqIndexer, XqMaterial, XqMaterialWinner, XqPosition,
    XqTableBaseBuilder,
};
use retro_egtb::{EncoderDecoder, Outcome, Reports, SideToMoveGetter};

#[derive(Args, Debug)]
pub struct Xiangqi {
    #[command(subcommand)]
    cmd: XqCmd,
}

#[derive(Subcommand, Debug)]
enum XqCmd {
    Generate(XqGenerate),
    Stats(XqStats),
    Verify(XqVerify),
}

impl Xiangqi {
    pub fn run(self) {
        match self.cmd {
            XqCmd::Generate(g) => g.run(),
            XqCmd::Stats(s) => s.run(),
            XqCmd::Verify(v) => v.run(),
        }
    }
}

#[derive(Args, Debug)]
pub struct XqGenerate {
    #[arg(short, long, value_parser = XqMaterial::from_str, help = "example \"kcvkaabb\"")]
    material: XqMaterial,
    #[arg(short = 'd', long, default_value = "xq_table/")]
    tb_dir: PathBuf,
}

impl XqGenerate {
    pub fn run(self) {
        for winner in Color::ALL {
            info!("Generating xiangqi {:?} with winner: {winner}", self.material);
            let mat_win = XqMaterialWinner::new(self.material.clone(), winner);
            let all_pos = match XqTableBaseBuilder::build(mat_win.clone(), &self.tb_dir) {
                Ok(all_pos) => all_pos,
                Err(e) => {
                    error!(
                        "Generating xiangqi {:?} with winner {winner} failed: {e}, skipping this name",
                        self.material
                    );
                    continue;
                }
            };
            let mut encoder = EncoderDecoder::new(
                File::create(self.tb_dir.join(format!("{mat_win:?}"))).unwrap(),
            );
            encoder
                .compress(&all_pos)
                .expect("compression failed for xiangqi material");
            xq_stats(&mat_win, &all_pos);
        }
    }
}

#[derive(Args, Debug)]
pub struct XqStats {
    #[arg(value_parser = XqMaterial::from_str, help = "example \"kcvkaabb\"")]
    material: XqMaterial,
    #[arg(short = 'd', long, default_value = "xq_table/")]
    tb_dir: PathBuf,
}

impl XqStats {
    pub fn run(self) {
        for winner in Color::ALL {
            let mat_win = XqMaterialWinner::new(self.material.clone(), winner);
            match XqFileHandler::new(&mat_win, &self.tb_dir) {
                Ok(file_handler) => xq_stats(&mat_win, &file_handler.outcomes),
                Err(e) => error!("xiangqi {mat_win:?} not found: {e}"),
            }
        }
    }
}

/// Total/legal positions, per-side win/draw/loss fractions and max observed DTM, the xiangqi
/// analogue of `generate::stats`/`explore::stats`.
fn xq_stats(mat_win: &XqMaterialWinner, outcomes: &Reports) {
    let mut win = 0u64;
    let mut draw = 0u64;
    let mut lose = 0u64;
    let mut unknown = 0u64;
    let mut perpetual = 0u64;
    let mut undefined = 0u64;
    let mut max_dtm = 0u8;
    let total = outcomes.len() as u64 * 2;

    for by_color in outcomes {
        for turn in Color::ALL {
            match by_color.get_outcome_by_color(turn) {
                Outcome::Draw => draw += 1,
                Outcome::Win(n) => {
                    win += 1;
                    max_dtm = max_dtm.max(n);
                }
                Outcome::Lose(n) => {
                    lose += 1;
                    max_dtm = max_dtm.max(n);
                }
                Outcome::Undefined => undefined += 1,
                Outcome::Unknown => unknown += 1,
                Outcome::PerpetualChecked
                | Outcome::PerpetualEvasion
                | Outcome::PerpetualCheckedEvasion => perpetual += 1,
            }
        }
    }
    let legal = total - undefined;
    debug_assert_eq!(unknown, 0, "every slot should be resolved after generation");
    info!(
        "xiangqi {:?} winner {}: {legal}/{total} legal ({:.1}%), win {win} ({:.1}%), draw {draw} ({:.1}%), lose {lose} ({:.1}%), perpetual {perpetual}, max dtm {max_dtm}",
        mat_win.material,
        mat_win.winner,
        100.0 * legal as f64 / total as f64,
        100.0 * win as f64 / legal as f64,
        100.0 * draw as f64 / legal as f64,
        100.0 * lose as f64 / legal as f64,
    );
}

#[derive(Args, Debug)]
pub struct XqVerify {
    #[arg(value_parser = XqMaterial::from_str, help = "example \"kcvkaabb\"")]
    material: XqMaterial,
    #[arg(short = 'd', long, default_value = "xq_table/")]
    tb_dir: PathBuf,
}

impl XqVerify {
    pub fn run(&self) {
        for winner in Color::ALL {
            let mat_win = XqMaterialWinner::new(self.material.clone(), winner);
            self.verify_keys(&mat_win);
            self.verify_data(&mat_win);
        }
    }

    /// `verifyKeys`: every stored index round-trips through `reverse`/`forward`.
    fn verify_keys(&self, mat_win: &XqMaterialWinner) {
        let indexer = XqIndexer::new(&mat_win.material);
        let mut checked = 0u64;
        let mut bad = 0u64;
        for idx in 0..indexer.total_size() {
            if let Some(placement) = indexer.reverse(idx) {
                match indexer.forward(&placement) {
                    Some(round_tripped) if round_tripped == idx => checked += 1,
                    round_tripped => {
                        bad += 1;
                        error!(
                            "xiangqi {:?}: index {idx} round-trips to {round_tripped:?}",
                            mat_win.material
                        );
                    }
                }
            }
        }
        info!(
            "xiangqi {:?}: verified {checked} keys, {bad} mismatches, out of {}",
            mat_win.material,
            indexer.total_size()
        );
    }

    /// `verifyData`: for every legal move out of a stored position, the mover's own stored
    /// value must be at least one ply ahead of whatever the move leads to — re-derived the same
    /// way the generator derived it the first time, from the self table for quiet moves and the
    /// descendant table for captures.
    fn verify_data(&self, mat_win: &XqMaterialWinner) {
        let file_handler = match XqFileHandler::new(mat_win, &self.tb_dir) {
            Ok(fh) => fh,
            Err(e) => {
                error!("xiangqi {mat_win:?} not found: {e}");
                return;
            }
        };
        let descendants = match XqDescendants::new(&mat_win.material, &self.tb_dir) {
            Ok(d) => d,
            Err(e) => {
                error!("xiangqi {mat_win:?}: missing descendant table: {e}");
                return;
            }
        };
        let mut distrib: HashMap<Outcome, u64> = HashMap::new();
        for (idx, by_color) in file_handler.outcomes.iter().enumerate() {
            for turn in Color::ALL {
                let outcome = by_color.get_outcome_by_color(turn);
                if outcome == Outcome::Undefined {
                    continue;
                }
                *distrib.entry(outcome).or_insert(0) += 1;
                let placement = file_handler
                    .indexer
                    .reverse(idx as u64)
                    .expect("in-range idx stored on disk");
                let board = XqBoard::from_placement(&placement);
                let pos = XqPosition { board, turn };
                for (from, to, is_capture) in pos.legal_moves_with_capture() {
                    let after = pos.after_move(from, to);
                    let outcome_after = if is_capture {
                        descendants.retrieve_outcome(&after, mat_win.winner)
                    } else {
                        let (canon_board, material, canon_turn, flipped) = after.canonical();
                        debug_assert_eq!(
                            material, mat_win.material,
                            "quiet move never changes material"
                        );
                        let fwd_idx = file_handler
                            .indexer
                            .forward(&canon_board.placement())
                            .expect("same-material move stays in this table's domain");
                        file_handler.outcomes[fwd_idx as usize]
                            .get_outcome_by_color(canon_turn ^ flipped)
                    };
                    if outcome_after != Outcome::Undefined && outcome_after + 1 > outcome {
                        error!(
                            "xiangqi {:?}: idx {idx} turn {turn:?} outcome {outcome:?}, but move {from:?}->{to:?} leads to {outcome_after:?}",
                            mat_win.material
                        );
                    }
                }
            }
        }
        debug!("xiangqi {:?} verify_data distribution: {distrib:?}", mat_win.material);
    }
}
