pub use retro_egtb::{Material, MaterialWinner};
use retro_egtb::FileHandler;

use std::path::PathBuf;

use clap::Args;
use from_str_sequential::FromStrSequential;
use retroboard::shakmaty::Color;

use crate::explore::{stats, MatOrAll};

/// Print the win/draw/lose/DTM distribution for one or every generated table, without the
/// interactive position/outcome lookup `explore` also offers.
#[derive(Args, Debug)]
pub struct Stats {
    #[arg(help = "example \"KQvK\", use special value 'all' to search across all positions", value_parser = MatOrAll::from_str_sequential)]
    mat_or_all: MatOrAll,
    #[arg(short, long, help = "Restrict to one side winning")]
    winner: Option<Color>,
    #[arg(short = 'd', long, default_value = "table/")]
    tb_dir: PathBuf,
}

impl Stats {
    pub fn run(&self) {
        for mat_win in self.mat_or_all.mat_winners(&self.tb_dir, self.winner) {
            let file_handler: FileHandler = FileHandler::new(&mat_win, &self.tb_dir).unwrap();
            stats(mat_win, None, &file_handler.outcomes, None);
        }
    }
}
