use retroboard::shakmaty::ByColor;
use std::cmp::Ordering;
use std::ops::Add;
use std::ops::Not;

#[derive(Debug, PartialEq, Eq, Hash)]
pub struct OutcomeOutOfBound;

pub type Outcomes = Vec<ByColor<OutcomeU8>>;
pub type OutcomesSlice<'a> = &'a [ByColor<OutcomeU8>];

pub type Reports = Vec<ByColor<ReportU8>>;
pub type ReportsSlice<'a> = &'a [ByColor<ReportU8>];

/// Wrapper around `Outcome` to track if it has already been processed (ie retro moves generated) or not
/// When a position is generated it's `Unprocessed` by default.
#[derive(Debug, Clone, Eq, PartialEq, Copy, Hash)]
pub enum Report {
    Unprocessed(Outcome),
    Processed(Outcome),
}

#[repr(transparent)]
#[derive(Debug, Clone, Eq, PartialEq, Copy, Hash)]
pub struct ReportU8(u8);

impl ReportU8 {
    pub fn from_raw_u8(u: u8) -> Self {
        Self(u)
    }
}

#[repr(transparent)]
#[derive(Debug, Clone, Eq, PartialEq, Copy, Hash)]
pub struct OutcomeU8(u8);

impl OutcomeU8 {
    pub fn from_raw_u8(u: u8) -> Option<Self> {
        if u < 128 {
            Some(Self(u))
        } else {
            None
        }
    }

    pub fn as_raw_u8(&self) -> u8 {
        self.0
    }
}

impl Report {
    #[inline]
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::Unprocessed(outcome) => *outcome,
            Self::Processed(outcome) => *outcome,
        }
    }
}

impl From<Report> for ReportU8 {
    fn from(r: Report) -> Self {
        match r {
            Report::Unprocessed(outcome) => ReportU8(OutcomeU8::from(outcome).as_raw_u8()),
            Report::Processed(outcome) => ReportU8(OutcomeU8::from(outcome).as_raw_u8() + 128),
        }
    }
}

impl From<ReportU8> for Report {
    fn from(r: ReportU8) -> Self {
        if r.0 > 127 {
            Self::Processed(OutcomeU8(r.0 - 128).into())
        } else {
            Self::Unprocessed(OutcomeU8(r.0).into())
        }
    }
}

impl From<&ReportU8> for Report {
    fn from(u: &ReportU8) -> Self {
        (*u).into()
    }
}

/// According to winnner set in `Generator`. This struct need to fit in a u7
#[derive(Debug, Clone, Eq, PartialEq, Copy, Hash)]
pub enum Outcome {
    // TODO replace by an enum with 63 elements?
    Win(u8), // Need to be between 0 and 60 excluded due to conversion to u7
    Unknown, // Used for positions we don't know the outcome yet. Cannot use `Draw` by default for positions where Drawing is the desired state (eg: KQvKb)
    Draw,
    // TODO replace by an enum with 63 elements?
    Lose(u8),  // Need to be between 0 and **62** excluded due to conversion to u7
    Undefined, // Used for illegal positions. Should we use Option<Outcome> without that variant instead?
    // Xiangqi-only verdicts, never combined with a numeric DTM: a side perpetually checking (loses
    // on the no-perpetual-check rule), perpetually evading, or both.
    PerpetualChecked,
    PerpetualEvasion,
    PerpetualCheckedEvasion,
}

pub const UNDEFINED_OUTCOME_BYCOLOR: ByColor<ReportU8> = ByColor {
    // Report::Processed(Outcome::Undefined).into()
    black: ReportU8(255),
    white: ReportU8(255),
};

impl From<OutcomeU8> for Outcome {
    fn from(u: OutcomeU8) -> Self {
        match u.0 {
            0 => Self::Draw,
            1 => Self::Unknown,
            124 => Self::PerpetualChecked,
            125 => Self::PerpetualEvasion,
            126 => Self::PerpetualCheckedEvasion,
            127 => Self::Undefined,
            w if w > 63 => Self::Win(w - 64),
            l => Self::Lose(l - 2),
        }
    }
}

impl From<&OutcomeU8> for Outcome {
    fn from(u: &OutcomeU8) -> Self {
        (*u).into()
    }
}

impl Ord for Outcome {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Undefined, _) | (_, Self::Undefined) => {
                panic!("No Undefined/Unknown in comparison")
            }
            (
                Self::PerpetualChecked | Self::PerpetualEvasion | Self::PerpetualCheckedEvasion,
                _,
            )
            | (
                _,
                Self::PerpetualChecked | Self::PerpetualEvasion | Self::PerpetualCheckedEvasion,
            ) => panic!("Perpetual-check verdicts are never ordered against a numeric outcome"),
            (Self::Win(x), Self::Win(y)) => x.cmp(y).reverse(), // short win is better,
            (Self::Win(_), Self::Draw | Self::Lose(_)) => Ordering::Greater, // if other is not a Win, we're greater
            (Self::Draw, Self::Win(_)) => Ordering::Less,
            (Self::Draw, Self::Draw) => Ordering::Equal,
            (Self::Draw, Self::Lose(_)) => Ordering::Greater,
            (Self::Lose(x), Self::Lose(y)) => x.cmp(y), // losing in many moves is better,
            (Self::Lose(_), Self::Win(_) | Self::Draw) => Ordering::Less,
            (Self::Unknown, _) => Ordering::Less,
            (_, Self::Unknown) => Ordering::Greater,
        }
    }
}

impl PartialOrd for Outcome {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn try_into_util(o: Outcome) -> Result<OutcomeU8, OutcomeOutOfBound> {
    match o {
        Outcome::Draw => Ok(0),
        Outcome::Unknown => Ok(1),
        Outcome::PerpetualChecked => Ok(124),
        Outcome::PerpetualEvasion => Ok(125),
        Outcome::PerpetualCheckedEvasion => Ok(126),
        Outcome::Undefined => Ok(127),
        Outcome::Win(w) if w < 60 => Ok(w + 64),
        Outcome::Lose(l) if l < 62 => Ok(l + 2),
        _ => Err(OutcomeOutOfBound),
    }
    .map(|u| OutcomeU8::from_raw_u8(u).expect("Value is crafted such that it fits in u7"))
}

impl From<Outcome> for OutcomeU8 {
    fn from(o: Outcome) -> Self {
        try_into_util(o).unwrap()
    }
}

impl Not for Outcome {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Win(x) => Self::Lose(x),
            Self::Lose(x) => Self::Win(x),
            Self::Draw => Self::Draw,
            Self::Undefined | Self::Unknown => panic!("Cannot invert undefined/unkown outcome"),
            Self::PerpetualChecked
            | Self::PerpetualEvasion
            | Self::PerpetualCheckedEvasion => {
                panic!("Cannot invert a perpetual-check verdict")
            }
        }
    }
}

/// Folds a set of capturing/promoting moves' already-decided descendant outcomes (each relative
/// to *that* descendant's own side to move) into the mover's perspective: negate and advance one
/// ply per move, per the retrograde rule, then keep the best win (if any) and, failing that, the
/// worst (longest-surviving) loss plus how many moves were proven losing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChildFold {
    pub best_win: Option<Outcome>,
    pub lose_count: usize,
    pub worst_lose: Option<Outcome>,
}

impl ChildFold {
    /// A single representative value across every folded move, `best_win` taking priority over
    /// `worst_lose` — `None` only when no move was folded at all.
    #[must_use]
    pub fn best(&self) -> Option<Outcome> {
        self.best_win.or(self.worst_lose)
    }
}

#[must_use]
pub fn fold_child_outcomes(children: impl Iterator<Item = Outcome>) -> ChildFold {
    let mut fold = ChildFold::default();
    for child in children {
        match !child + 1 {
            win @ Outcome::Win(_) => {
                fold.best_win = Some(fold.best_win.map_or(win, |b| b.max(win)));
            }
            lose @ Outcome::Lose(_) => {
                fold.lose_count += 1;
                fold.worst_lose = Some(fold.worst_lose.map_or(lose, |w| w.max(lose)));
            }
            Outcome::Draw => {}
            Outcome::Undefined
            | Outcome::Unknown
            | Outcome::PerpetualChecked
            | Outcome::PerpetualEvasion
            | Outcome::PerpetualCheckedEvasion => {
                unreachable!("descendant outcomes are always decided Win/Lose/Draw")
            }
        }
    }
    fold
}

impl Add<u8> for Outcome {
    type Output = Self;

    fn add(self, rhs: u8) -> Self {
        match self {
            Self::Win(x) => Self::Win(x + rhs),
            Self::Lose(x) => Self::Lose(x + rhs),
            Self::Draw => Self::Draw,
            Self::Undefined | Self::Unknown => panic!("Cannot add undefined/unkown outcome"),
            Self::PerpetualChecked
            | Self::PerpetualEvasion
            | Self::PerpetualCheckedEvasion => {
                panic!("Cannot add plies to a perpetual-check verdict")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_outcome_to_u7() {
        assert_eq!(OutcomeU8::from(Outcome::Draw), OutcomeU8(0));
        assert_eq!(OutcomeU8::from(Outcome::Undefined), OutcomeU8(127));
        assert_eq!(OutcomeU8::from(Outcome::Lose(0)), OutcomeU8(2));
        assert_eq!(OutcomeU8::from(Outcome::Win(0)), OutcomeU8(64));
        assert_eq!(OutcomeU8::from(Outcome::Lose(61)), OutcomeU8(63));
    }

    #[test]
    fn test_u7_to_outcome() {
        for i in 0..127 {
            let outcome_u8 = OutcomeU8(i);
            assert_eq!(OutcomeU8::from(Outcome::from(outcome_u8)), outcome_u8)
        }
    }

    #[test]
    fn test_report_to_u8() {
        for outcome in [
            Outcome::Win(10),
            Outcome::Draw,
            Outcome::Lose(61),
            Outcome::Win(62),
            Outcome::Undefined,
            Outcome::Unknown,
        ] {
            println!("{:?}", outcome);
            assert_eq!(
                Report::Unprocessed(outcome),
                ReportU8::from(Report::Unprocessed(outcome)).into()
            );
            assert_eq!(
                Report::Processed(outcome),
                ReportU8::from(Report::Processed(outcome)).into()
            );
        }
    }

    #[test]
    fn test_u8_to_report() {
        for i in 0..u8::MAX {
            let report_u8 = ReportU8(i);
            assert_eq!(ReportU8::from(Report::from(report_u8)), report_u8)
        }
    }

    #[test]
    fn test_undefined_outcome_bycolor() {
        assert_eq!(
            UNDEFINED_OUTCOME_BYCOLOR,
            ByColor {
                black: Report::Processed(Outcome::Undefined).into(),
                white: Report::Processed(Outcome::Undefined).into(),
            }
        );
    }

    #[test]
    fn test_ord_outcome() {
        assert!(Outcome::Win(1) > Outcome::Win(2));
        assert!(Outcome::Win(100) > Outcome::Draw);
        assert!(Outcome::Win(100) > Outcome::Lose(1));
        assert!(Outcome::Draw > Outcome::Lose(1));
        assert!(Outcome::Lose(2) > Outcome::Lose(1));
    }

    #[test]
    #[should_panic]
    fn test_ord_outcome_panic() {
        let _ = Outcome::Undefined > Outcome::Win(1);
    }

    #[test]
    fn test_fold_child_outcomes_win_takes_priority_and_shortest_wins() {
        // a child that's Lose(1) for its own mover is a Win(2) for us; a child Win(5) for its
        // own mover is a Lose(6) for us; the win beats the loss outright.
        let fold = fold_child_outcomes([Outcome::Draw, Outcome::Lose(1), Outcome::Win(5)].into_iter());
        assert_eq!(fold.best_win, Some(Outcome::Win(2)));
        assert_eq!(fold.lose_count, 1);
        assert_eq!(fold.worst_lose, Some(Outcome::Lose(6)));
        assert_eq!(fold.best(), Some(Outcome::Win(2)));
    }

    #[test]
    fn test_fold_child_outcomes_prefers_shortest_win() {
        let fold = fold_child_outcomes([Outcome::Lose(4), Outcome::Lose(0)].into_iter());
        // Lose(4) -> Win(5), Lose(0) -> Win(1): the shorter win wins.
        assert_eq!(fold.best(), Some(Outcome::Win(1)));
    }

    #[test]
    fn test_fold_child_outcomes_all_losing_keeps_worst() {
        let fold = fold_child_outcomes([Outcome::Win(0), Outcome::Win(3)].into_iter());
        assert_eq!(fold.best_win, None);
        assert_eq!(fold.lose_count, 2);
        // Win(0) -> Lose(1), Win(3) -> Lose(4): worst (longest surviving) is kept.
        assert_eq!(fold.worst_lose, Some(Outcome::Lose(4)));
    }

    #[test]
    fn test_fold_child_outcomes_empty_is_none() {
        let fold = fold_child_outcomes(std::iter::empty());
        assert_eq!(fold.best(), None);
        assert_eq!(fold.lose_count, 0);
    }
}
