// 🗳️ Vote Tallies - Majority & Cohesion
//
// cohesion = 100 * majority_count / total_count
//
// Majority ties are broken by a fixed priority: For > Against > Abstention.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// VOTE CHOICE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VoteChoice {
    For,
    Against,
    Abstention,
}

impl VoteChoice {
    /// Every choice, in tie-break priority order
    pub const ALL: [VoteChoice; 3] = [VoteChoice::For, VoteChoice::Against, VoteChoice::Abstention];

    pub fn as_str(&self) -> &'static str {
        match self {
            VoteChoice::For => "For",
            VoteChoice::Against => "Against",
            VoteChoice::Abstention => "Abstention",
        }
    }

    /// Element name of this choice's result subtree in roll-call documents
    pub fn result_tag(&self) -> &'static str {
        match self {
            VoteChoice::For => "Result.For",
            VoteChoice::Against => "Result.Against",
            VoteChoice::Abstention => "Result.Abstention",
        }
    }

    fn index(&self) -> usize {
        match self {
            VoteChoice::For => 0,
            VoteChoice::Against => 1,
            VoteChoice::Abstention => 2,
        }
    }
}

impl fmt::Display for VoteChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// VOTE TALLY
// ============================================================================

/// Per-choice vote counts of one entity on one roll-call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    counts: [u32; 3],
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tally from explicit counts
    pub fn from_counts(for_votes: u32, against: u32, abstention: u32) -> Self {
        VoteTally {
            counts: [for_votes, against, abstention],
        }
    }

    pub fn record(&mut self, choice: VoteChoice) {
        self.add(choice, 1);
    }

    pub fn add(&mut self, choice: VoteChoice, count: u32) {
        self.counts[choice.index()] += count;
    }

    pub fn count(&self, choice: VoteChoice) -> u32 {
        self.counts[choice.index()]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Choice with the strictly highest count, None if nobody voted
    ///
    /// On a tie the earlier choice in `VoteChoice::ALL` wins.
    pub fn select_majority(&self) -> Option<VoteChoice> {
        let mut best: Option<VoteChoice> = None;
        for choice in VoteChoice::ALL {
            let count = self.count(choice);
            if count == 0 {
                continue;
            }
            match best {
                Some(current) if self.count(current) >= count => {}
                _ => best = Some(choice),
            }
        }
        best
    }

    /// Share of voters who went with the majority, in percent
    ///
    /// None when the tally is empty.
    pub fn cohesion(&self) -> Option<f64> {
        let majority = self.select_majority()?;
        Some(100.0 * self.count(majority) as f64 / self.total() as f64)
    }
}

impl fmt::Display for VoteTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "For: {}, Against: {}, Abstention: {}",
            self.count(VoteChoice::For),
            self.count(VoteChoice::Against),
            self.count(VoteChoice::Abstention)
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
