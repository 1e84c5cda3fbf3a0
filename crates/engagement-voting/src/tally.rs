use crate::types::{TallyResult, Vote, VoteBallot, VoteType};
use engagement_common::Id;
use std::collections::{HashMap, HashSet};

/// Tallies `ballots` cast against `vote` according to its `vote_type`
/// ("type `single|multi|ranked|approval`").
pub fn tally(vote: &Vote, ballots: &[VoteBallot]) -> TallyResult {
    match vote.vote_type {
        VoteType::Single | VoteType::Multi | VoteType::Approval => tally_count(ballots),
        VoteType::Ranked => tally_ranked(vote, ballots),
    }
}

/// `single`/`multi`/`approval` all reduce to "count every selection
/// across every ballot, highest count wins" — they differ only in how
/// many selections a ballot is allowed to carry, which is validated at
/// cast time, not at tally time.
fn tally_count(ballots: &[VoteBallot]) -> TallyResult {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for ballot in ballots {
        for option in &ballot.selections {
            *counts.entry(option.as_str().to_string()).or_insert(0) += 1;
        }
    }
    let winner = counts
        .iter()
        .max_by_key(|(_, count)| **count)
        .map(|(id, _)| id.parse().expect("tally keys are always valid ids"));
    TallyResult { counts, winner, total_ballots: ballots.len() as u32 }
}

/// Instant-runoff ranked-choice tally: repeatedly drop the option with the
/// fewest first-preference votes among non-eliminated options until one
/// clears a strict majority of non-exhausted ballots.
fn tally_ranked(vote: &Vote, ballots: &[VoteBallot]) -> TallyResult {
    let total_ballots = ballots.len() as u32;
    let all_options: HashSet<Id> = vote.options.iter().map(|o| o.id.clone()).collect();
    let mut eliminated: HashSet<Id> = HashSet::new();

    loop {
        let mut counts: HashMap<Id, u32> = HashMap::new();
        let mut active = 0u32;
        for ballot in ballots {
            if let Some(choice) = ballot.selections.iter().find(|c| !eliminated.contains(*c)) {
                *counts.entry(choice.clone()).or_insert(0) += 1;
                active += 1;
            }
        }
        let majority = active / 2 + 1;

        if let Some((winner, count)) = counts.iter().max_by_key(|(_, c)| **c) {
            if *count >= majority {
                return TallyResult {
                    counts: counts.iter().map(|(k, v)| (k.as_str().to_string(), *v)).collect(),
                    winner: Some(winner.clone()),
                    total_ballots,
                };
            }
        }

        let remaining: HashSet<Id> = all_options.difference(&eliminated).cloned().collect();
        if remaining.len() <= 1 {
            let winner = remaining.into_iter().next();
            return TallyResult {
                counts: counts.iter().map(|(k, v)| (k.as_str().to_string(), *v)).collect(),
                winner,
                total_ballots,
            };
        }

        let Some(loser) = counts.iter().min_by_key(|(_, c)| **c).map(|(k, _)| k.clone()) else {
            // No active ballots left to count at all.
            return TallyResult { counts: HashMap::new(), winner: None, total_ballots };
        };
        eliminated.insert(loser);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ResultsVisibility, VoteOption, VoteScope, VoteStatus};
    use chrono::Utc;

    fn ranked_vote(options: &[&str]) -> Vote {
        Vote {
            id: Id::new("vote", "v1"),
            scope: VoteScope::Adventure,
            scope_id: Id::new("adventure", "a1"),
            vote_type: VoteType::Ranked,
            prompt: "destination".into(),
            options: options.iter().map(|o| VoteOption { id: Id::new("option", o), label: o.to_string() }).collect(),
            opens_at: Utc::now(),
            closes_at: Utc::now(),
            results_visibility: ResultsVisibility::Public,
            status: VoteStatus::Open,
        }
    }

    fn ballot(voter: &str, prefs: &[&str]) -> VoteBallot {
        VoteBallot {
            id: Id::new("ballot", voter),
            vote_id: Id::new("vote", "v1"),
            voter_id: Id::new("user", voter),
            voter_display_name: voter.to_string(),
            selections: prefs.iter().map(|p| Id::new("option", p)).collect(),
            cast_at: Utc::now(),
        }
    }

    #[test]
    fn single_vote_tally_picks_highest_count() {
        let ballots = vec![
            ballot("a", &["x"]),
            ballot("b", &["x"]),
            ballot("c", &["y"]),
        ];
        let vote = Vote { vote_type: VoteType::Single, ..ranked_vote(&["x", "y"]) };
        let result = tally(&vote, &ballots);
        assert_eq!(result.winner, Some(Id::new("option", "x")));
        assert_eq!(result.total_ballots, 3);
    }

    #[test]
    fn ranked_tally_eliminates_until_majority() {
        let vote = ranked_vote(&["x", "y", "z"]);
        let ballots = vec![
            ballot("a", &["x", "y"]),
            ballot("b", &["x", "z"]),
            ballot("c", &["y", "x"]),
            ballot("d", &["z", "y"]),
            ballot("e", &["y", "z"]),
        ];
        // Round 1: x=2, y=2, z=1 -> eliminate z. Round 2: z's ballots
        // (d: z,y) redistribute to y -> x=2, y=3 -> y has a 3/5 majority.
        let result = tally(&vote, &ballots);
        assert_eq!(result.winner, Some(Id::new("option", "y")));
    }
}
