//! # Tally Store
//!
//! Candidate registry and per-candidate vote counts. Each candidate and its
//! count live in one entry, so a count without a candidate cannot exist.
//!
//! The store does no locking of its own; it is only reached through the
//! guarded [`PollState`](super::state::PollState).

use std::collections::BTreeMap;
use std::fmt;

use crate::common::error::{PollError, Result};
use crate::common::messages::{CandidateId, CandidateInfo};

#[derive(Debug, Clone)]
struct TallyEntry {
    name: String,
    votes: u64,
}

#[derive(Debug, Default)]
pub struct TallyStore {
    entries: BTreeMap<CandidateId, TallyEntry>,
}

impl TallyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate under the next id (highest existing id + 1, or 1
    /// when empty) with a zero count.
    pub fn add_candidate(&mut self, name: &str) -> Result<CandidateId> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PollError::InvalidInput("candidate name must not be empty".to_string()));
        }

        let id = match self.entries.keys().next_back() {
            Some(last) => last
                .checked_add(1)
                .ok_or_else(|| PollError::InvalidInput("candidate ids exhausted".to_string()))?,
            None => 1,
        };

        self.entries.insert(
            id,
            TallyEntry {
                name: name.to_string(),
                votes: 0,
            },
        );
        Ok(id)
    }

    /// Add exactly one vote to `id`, returning the candidate's name.
    pub fn record_vote(&mut self, id: CandidateId) -> Result<&str> {
        let entry = self.entries.get_mut(&id).ok_or(PollError::CandidateNotFound)?;
        entry.votes += 1;
        Ok(&entry.name)
    }

    /// Snapshot of the registry ordered by id.
    pub fn list_candidates(&self) -> Vec<CandidateInfo> {
        self.entries
            .iter()
            .map(|(id, entry)| CandidateInfo {
                id: *id,
                name: entry.name.clone(),
            })
            .collect()
    }

    pub fn votes_for(&self, id: CandidateId) -> Option<u64> {
        self.entries.get(&id).map(|entry| entry.votes)
    }

    pub fn total_votes(&self) -> u64 {
        self.entries.values().map(|entry| entry.votes).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Totals, percentages, and winners. Candidates tied for the top count all win.
    pub fn compute_outcome(&self) -> Outcome {
        let total_votes = self.total_votes();

        let results = self
            .entries
            .iter()
            .map(|(id, entry)| CandidateResult {
                id: *id,
                name: entry.name.clone(),
                votes: entry.votes,
                percentage: (total_votes > 0)
                    .then(|| entry.votes as f64 / total_votes as f64 * 100.0),
            })
            .collect::<Vec<_>>();

        let winners = if total_votes == 0 {
            Vec::new()
        } else {
            let top = results.iter().map(|r| r.votes).max().unwrap_or(0);
            results
                .iter()
                .filter(|r| r.votes == top)
                .map(|r| r.name.clone())
                .collect()
        };

        Outcome {
            total_votes,
            results,
            winners,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateResult {
    pub id: CandidateId,
    pub name: String,
    pub votes: u64,
    /// `None` when no votes were cast at all.
    pub percentage: Option<f64>,
}

/// Final result of a voting window.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub total_votes: u64,
    pub results: Vec<CandidateResult>,
    /// Every candidate tied for the highest count, in id order. Empty when no
    /// votes were cast.
    pub winners: Vec<String>,
}

impl Outcome {
    pub fn has_votes(&self) -> bool {
        self.total_votes > 0
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total votes: {}", self.total_votes)?;
        if !self.has_votes() {
            return write!(f, "No votes recorded.");
        }

        writeln!(f, "Results:")?;
        for result in &self.results {
            writeln!(
                f,
                "  - {}: {} votes ({:.2}%)",
                result.name,
                result.votes,
                result.percentage.unwrap_or(0.0)
            )?;
        }
        write!(f, "Winner(s): {}", self.winners.join(" and "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(names: &[&str]) -> TallyStore {
        let mut store = TallyStore::new();
        for name in names {
            store.add_candidate(name).unwrap();
        }
        store
    }

    #[test]
    fn test_ids_are_increasing_and_start_at_zero_votes() {
        let mut store = TallyStore::new();
        let first = store.add_candidate("Candidato A").unwrap();
        let second = store.add_candidate("Candidato B").unwrap();
        let third = store.add_candidate("Candidato C").unwrap();

        assert_eq!((first, second, third), (1, 2, 3));
        assert_eq!(store.votes_for(third), Some(0));
        assert!(matches!(store.add_candidate("  "), Err(PollError::InvalidInput(_))));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_vote_counts_exactly_once_per_call() {
        let mut store = store_with(&["A", "B"]);

        assert_eq!(store.record_vote(1).unwrap(), "A");
        store.record_vote(1).unwrap();
        store.record_vote(2).unwrap();
        assert_eq!(store.record_vote(999).unwrap_err(), PollError::CandidateNotFound);

        assert_eq!(store.votes_for(1), Some(2));
        assert_eq!(store.votes_for(2), Some(1));
        assert_eq!(store.total_votes(), 3);
    }

    #[test]
    fn test_listing_is_ordered_by_id() {
        let store = store_with(&["Zed", "Amy"]);
        let names: Vec<_> = store.list_candidates().into_iter().map(|c| (c.id, c.name)).collect();
        assert_eq!(names, vec![(1, "Zed".to_string()), (2, "Amy".to_string())]);
    }

    #[test]
    fn test_outcome_reports_ties_jointly() {
        let mut store = store_with(&["A", "B", "C"]);
        for id in [1, 1, 1, 2, 2, 2, 3] {
            store.record_vote(id).unwrap();
        }

        let outcome = store.compute_outcome();
        assert_eq!(outcome.total_votes, 7);
        assert_eq!(outcome.winners, vec!["A".to_string(), "B".to_string()]);

        let percentages: Vec<f64> = outcome.results.iter().map(|r| r.percentage.unwrap()).collect();
        assert!((percentages[0] - 42.857).abs() < 0.01);
        assert!((percentages[1] - 42.857).abs() < 0.01);
        assert!((percentages[2] - 14.286).abs() < 0.01);

        let summary = outcome.to_string();
        assert!(summary.contains("A: 3 votes (42.86%)"));
        assert!(summary.contains("Winner(s): A and B"));
    }

    #[test]
    fn test_outcome_without_votes() {
        let outcome = store_with(&["A"]).compute_outcome();
        assert!(!outcome.has_votes());
        assert!(outcome.winners.is_empty());
        assert_eq!(outcome.results[0].percentage, None);
        assert!(outcome.to_string().contains("No votes recorded."));
    }
}
