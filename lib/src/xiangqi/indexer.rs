//! C3 index codec for xiangqi. `crate::indexer_syzygy` tabulates canonical (K,K)/(P,P) pairs
//! for chess ahead of time; here the same idea — rank/unrank a combination of squares with the
//! combinatorial number system — is applied per piece group instead of a single joint pair
//! table, since xiangqi's defender geometry (palace, advisor crosses, elephant points) doesn't
//! collapse into the handful of hardcoded constants the chess side uses. Collisions between
//! groups (two groups landing on the same square) are caught by `reverse`, exactly as spec
//! describes for "no valid position" slots.

use std::collections::HashSet;

use retroboard::shakmaty::Color;

use super::board::{advisor_squares, elephant_squares, palace_squares, pawn_squares, Square};
use super::material::{XqMaterial, XqRole};

const fn binomial(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = if k > n - k { n - k } else { k };
    let mut result: u64 = 1;
    let mut i = 0;
    while i < k {
        result = result * (n - i) / (i + 1);
        i += 1;
    }
    result
}

/// Rank an ascending-sorted `k`-combination of `0..n` indices via the combinatorial number
/// system: `sum(C(c_i, i + 1))`.
fn rank_combination(combo: &[usize]) -> u64 {
    combo
        .iter()
        .enumerate()
        .map(|(i, &c)| binomial(c as u64, (i + 1) as u64))
        .sum()
}

/// Inverse of [`rank_combination`].
fn unrank_combination(rank: u64, n: usize, k: usize) -> Option<Vec<usize>> {
    if k > n {
        return None;
    }
    let mut combo = vec![0usize; k];
    let mut remaining = rank;
    let mut upper = n;
    for pos in (1..=k).rev() {
        let mut c = pos - 1;
        while c + 1 < upper && binomial((c + 1) as u64, pos as u64) <= remaining {
            c += 1;
        }
        if binomial(c as u64, pos as u64) > remaining {
            return None;
        }
        remaining -= binomial(c as u64, pos as u64);
        combo[pos - 1] = c;
        upper = c;
    }
    Some(combo)
}

/// One piece-group's contribution to the index: `count` identical pieces of `role`/`side`
/// drawn from `domain`, ranked as an unordered combination.
#[derive(Debug, Clone)]
struct Group {
    role: XqRole,
    side: Color,
    domain: Vec<Square>,
    count: u8,
}

impl Group {
    fn size(&self) -> u64 {
        binomial(self.domain.len() as u64, self.count as u64)
    }
}

fn full_board() -> Vec<Square> {
    Square::all().to_vec()
}

/// Index codec for one canonical xiangqi material key. Built once per name; `forward`/`reverse`
/// are cheap afterwards (no re-enumeration of the board).
#[derive(Debug, Clone)]
pub struct XqIndexer {
    groups: Vec<Group>,
}

impl XqIndexer {
    /// Domains assume the canonical orientation: strong side is always `Color::White`'s half,
    /// weak side `Color::Black`'s — the caller applies spec's described flip before indexing.
    #[must_use]
    pub fn new(material: &XqMaterial) -> Self {
        let mut groups = Vec::new();
        for (side, side_mat) in [(Color::White, &material.strong), (Color::Black, &material.weak)] {
            groups.push(Group {
                role: XqRole::King,
                side,
                domain: palace_squares(side).to_vec(),
                count: side_mat.king,
            });
            groups.push(Group {
                role: XqRole::Advisor,
                side,
                domain: advisor_squares(side).to_vec(),
                count: side_mat.advisor,
            });
            groups.push(Group {
                role: XqRole::Elephant,
                side,
                domain: elephant_squares(side).to_vec(),
                count: side_mat.elephant,
            });
            for role in [XqRole::Rook, XqRole::Cannon, XqRole::Horse] {
                groups.push(Group {
                    role,
                    side,
                    domain: full_board(),
                    count: side_mat.get(role),
                });
            }
            groups.push(Group {
                role: XqRole::Pawn,
                side,
                domain: pawn_squares(side),
                count: side_mat.pawn,
            });
        }
        Self { groups }
    }

    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.groups.iter().map(Group::size).product()
    }

    /// `forward`: piece list (side, role, square) in any order to a dense index, `None` if the
    /// piece list doesn't match this table's per-group counts.
    #[must_use]
    pub fn forward(&self, placement: &[(Color, XqRole, Square)]) -> Option<u64> {
        let mut total: u64 = 0;
        for group in &self.groups {
            let mut squares: Vec<Square> = placement
                .iter()
                .filter(|(c, r, _)| *c == group.side && *r == group.role)
                .map(|(_, _, sq)| *sq)
                .collect();
            if squares.len() != group.count as usize {
                return None;
            }
            squares.sort();
            let combo: Vec<usize> = squares
                .iter()
                .map(|sq| group.domain.iter().position(|d| d == sq))
                .collect::<Option<_>>()?;
            total = total * group.size() + rank_combination(&combo);
        }
        Some(total)
    }

    /// `reverse`: dense index back to a piece list, or `None` for an intrinsically illegal
    /// slot (out of range, or the reconstructed groups collide on a square).
    #[must_use]
    pub fn reverse(&self, idx: u64) -> Option<Vec<(Color, XqRole, Square)>> {
        let mut remaining = idx;
        let mut digits = vec![0u64; self.groups.len()];
        for (i, group) in self.groups.iter().enumerate().rev() {
            let size = group.size();
            digits[i] = remaining % size;
            remaining /= size;
        }
        if remaining != 0 {
            return None;
        }
        let mut used = HashSet::new();
        let mut out = Vec::new();
        for (group, digit) in self.groups.iter().zip(digits) {
            let combo = unrank_combination(digit, group.domain.len(), group.count as usize)?;
            for c in combo {
                let sq = group.domain[c];
                if !used.insert(sq) {
                    return None;
                }
                out.push((group.side, group.role, sq));
            }
        }
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_all_indices() {
        let material: XqMaterial = "kcvka".parse().unwrap();
        let indexer = XqIndexer::new(&material);
        assert!(indexer.total_size() > 0);
        let mut checked = 0;
        for idx in 0..indexer.total_size().min(5000) {
            if let Some(placement) = indexer.reverse(idx) {
                assert_eq!(indexer.forward(&placement), Some(idx));
                checked += 1;
            }
        }
        assert!(checked > 0);
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let material: XqMaterial = "kvk".parse().unwrap();
        let indexer = XqIndexer::new(&material);
        assert_eq!(indexer.reverse(indexer.total_size()), None);
    }

    #[test]
    fn test_combination_rank_unrank_roundtrip() {
        for n in [4usize, 9, 45] {
            for k in 0..=n.min(3) {
                for rank in 0..binomial(n as u64, k as u64) {
                    let combo = unrank_combination(rank, n, k).unwrap();
                    assert_eq!(rank_combination(&combo), rank);
                }
            }
        }
    }
}
