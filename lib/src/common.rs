use crate::{
    indexer::Indexer, DefaultIndexer, Material, MaterialWinner, Reports, UNDEFINED_OUTCOME_BYCOLOR,
};

use indicatif::{ProgressBar, ProgressStyle};
use log::trace;
use retroboard::shakmaty::{ByColor, Color};

#[derive(Debug)]
pub struct Common<T = DefaultIndexer> {
    pub all_pos: Reports,
    /// Per-(position, side to move) count of legal moves not yet proven to hand the opponent a
    /// win, kept in lockstep with `all_pos`. Reaching 0 is what lets the backward pass commit a
    /// `Lose` only once every reply has been accounted for, instead of on the first one found.
    pub remaining_moves: Vec<ByColor<u8>>,
    pub counter: u64,
    mat_win: MaterialWinner,
    can_mate: bool, // whether `winner`'s side keeps any attacking material in this table at all
    indexer: T,
}

impl<T: From<Material>> Common<T> {
    #[must_use]
    pub fn new(mat_win: MaterialWinner) -> Self {
        trace!("Creating a new `Common` instance");
        let nb_pos = get_estimate_nb_pos(&mat_win.material);
        Self {
            all_pos: vec![UNDEFINED_OUTCOME_BYCOLOR; nb_pos],
            remaining_moves: vec![ByColor { white: 0, black: 0 }; nb_pos],
            counter: 0,
            can_mate: mat_win.material.can_mate(mat_win.winner),
            indexer: T::from(mat_win.material.clone()),
            mat_win,
        }
    }
}

impl<T> Common<T> {
    #[must_use]
    pub fn get_progress_bar(&self) -> ProgressBar {
        let pb = ProgressBar::new((get_estimate_nb_pos(&self.material()) * 2) as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{msg} {spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
            )
            .expect("Invalid indicatif template syntax")
            .progress_chars("#>-"),
        );
        pb
    }

    #[must_use]
    pub fn can_mate(&self) -> bool {
        self.can_mate
    }

    #[must_use]
    pub fn material(&self) -> &Material {
        &self.mat_win.material
    }

    #[must_use]
    pub fn winner(&self) -> Color {
        self.mat_win.winner
    }

    #[must_use]
    pub fn material_winner(&self) -> &MaterialWinner {
        &self.mat_win
    }
}

impl<T: Indexer> Common<T> {
    #[must_use]
    pub fn indexer(&self) -> &T {
        &self.indexer
    }
}

#[inline]
fn get_estimate_nb_pos(mat: &Material) -> usize {
    // white king is already included in `material.count()`, so substract it, and multiply by 10 instead, real number of cases the white king can go on
    // heuristic, less than 92% of pos are legals.
    (pow_minus_1(63, mat.count() - 1) * 10) as usize / 100 * 92
}

// instead of 64**4 get 64*63*62*61
#[inline]
const fn pow_minus_1(exp: u64, left: usize) -> u64 {
    if left > 0 {
        exp * pow_minus_1(exp - 1, left - 1)
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_pow_minus_1() {
        assert_eq!(pow_minus_1(64, 1), 64);
        assert_eq!(pow_minus_1(64, 2), 64 * 63);
    }
}
