//! Score milestones tracked as achievements on the hosted store.

/// An achievement earned by reaching `target` points in a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Milestone {
    pub name: &'static str,
    pub description: &'static str,
    pub target: u32,
}

pub static MILESTONES: [Milestone; 4] = [
    Milestone {
        name: "first_flight",
        description: "Pass your first pipe",
        target: 1,
    },
    Milestone {
        name: "sky_rider",
        description: "Score 10 in one run",
        target: 10,
    },
    Milestone {
        name: "high_flyer",
        description: "Score 25 in one run",
        target: 25,
    },
    Milestone {
        name: "legend",
        description: "Score 50 in one run",
        target: 50,
    },
];

/// Milestones a run moved forward, paired with their new progress.
///
/// Progress is the best score capped at the target, so only a run that beats
/// `previous_best` can advance anything, and completed milestones are left
/// alone.
pub fn advanced_milestones(previous_best: u32, score: u32) -> Vec<(&'static Milestone, u32)> {
    if score <= previous_best {
        return Vec::new();
    }
    MILESTONES
        .iter()
        .filter(|m| previous_best < m.target)
        .map(|m| (m, score.min(m.target)))
        .collect()
}
