use log::debug;
use std::collections::{HashMap, HashSet};

use crate::config::*;

/// Collapses the follow chains of the rapporteur and reviewer ballots.
///
/// Every returned ballot carries a substantive position, in the order of the
/// input. A follow must point to another ballot of the same set, and chains may
/// not loop (a ballot following itself is a loop of length one).
///
/// Terminal positions are memoized, so that each chain is only walked once.
pub fn resolve(ballots: &[(Role, Ballot)]) -> Result<Vec<ResolvedBallot>, VotingErrors> {
    let by_name: HashMap<&str, &BallotChoice> = ballots
        .iter()
        .map(|(_, b)| (b.voter.as_str(), &b.choice))
        .collect();
    let mut resolved: HashMap<&str, Outcome> = HashMap::new();

    let mut res: Vec<ResolvedBallot> = Vec::with_capacity(ballots.len());
    for (role, b) in ballots.iter() {
        let outcome = resolve_one(b.voter.as_str(), &by_name, &mut resolved)?;
        let follows = match &b.choice {
            BallotChoice::Follows(name) => Some(name.clone()),
            _ => None,
        };
        res.push(ResolvedBallot {
            voter: b.voter.clone(),
            role: *role,
            position: ResolvedPosition::Cast(outcome),
            follows,
        });
    }
    Ok(res)
}

fn resolve_one<'a>(
    start: &'a str,
    by_name: &HashMap<&'a str, &'a BallotChoice>,
    resolved: &mut HashMap<&'a str, Outcome>,
) -> Result<Outcome, VotingErrors> {
    let mut path: Vec<&'a str> = Vec::new();
    let mut on_path: HashSet<&'a str> = HashSet::new();
    let mut current: &'a str = start;

    let outcome = loop {
        if let Some(o) = resolved.get(current) {
            break *o;
        }
        if !on_path.insert(current) {
            let mut cycle: Vec<String> = path.iter().map(|s| s.to_string()).collect();
            cycle.push(current.to_string());
            return Err(VotingErrors::CycleDetected(cycle));
        }
        path.push(current);
        let choice: &'a BallotChoice = by_name
            .get(current)
            .copied()
            .ok_or_else(|| VotingErrors::UnknownReference(current.to_string()))?;
        current = match choice {
            BallotChoice::Approved => break Outcome::Approved,
            BallotChoice::Denied => break Outcome::Denied,
            BallotChoice::Partial => break Outcome::Partial,
            BallotChoice::Follows(name) => name.as_str(),
            // Reconciliation only lets substantive choices and follows into this group.
            other => {
                return Err(VotingErrors::InvalidChoice {
                    voter: current.to_string(),
                    choice: other.clone(),
                })
            }
        };
    };

    if path.len() > 1 {
        debug!("resolve: {} -> {}", path.join(" -> "), outcome);
    }
    for name in path {
        resolved.insert(name, outcome);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follows(voter: &str, target: &str) -> (Role, Ballot) {
        (
            Role::Reviewer,
            Ballot::new(voter, BallotChoice::Follows(target.to_string())),
        )
    }

    fn direct(voter: &str, choice: BallotChoice) -> (Role, Ballot) {
        (Role::Rapporteur, Ballot::new(voter, choice))
    }

    fn positions(res: &[ResolvedBallot]) -> Vec<ResolvedPosition> {
        res.iter().map(|rb| rb.position).collect()
    }

    #[test]
    fn direct_votes_pass_through() {
        let res = resolve(&[direct("Ana", BallotChoice::Partial)]).unwrap();
        assert_eq!(positions(&res), vec![ResolvedPosition::Cast(Outcome::Partial)]);
        assert_eq!(res[0].follows, None);
        assert_eq!(res[0].role, Role::Rapporteur);
    }

    #[test]
    fn chains_of_any_length_terminate() {
        for n in 1..12 {
            // v0 votes, v1 follows v0, ..., vn follows v(n-1). Listed backwards so
            // that the longest chain is walked first.
            let mut ballots = vec![direct("v0", BallotChoice::Denied)];
            for i in 1..=n {
                ballots.push(follows(&format!("v{}", i), &format!("v{}", i - 1)));
            }
            ballots.reverse();
            let res = resolve(&ballots).unwrap();
            assert_eq!(res.len(), n + 1);
            assert!(res
                .iter()
                .all(|rb| rb.position == ResolvedPosition::Cast(Outcome::Denied)));
        }
    }

    #[test]
    fn order_is_preserved_and_follow_recorded() {
        let res = resolve(&[
            follows("Rui", "Ana"),
            direct("Ana", BallotChoice::Approved),
            follows("Sofia", "Rui"),
        ])
        .unwrap();
        let names: Vec<&str> = res.iter().map(|rb| rb.voter.as_str()).collect();
        assert_eq!(names, vec!["Rui", "Ana", "Sofia"]);
        assert_eq!(res[2].follows, Some("Rui".to_string()));
        assert_eq!(
            positions(&res),
            vec![ResolvedPosition::Cast(Outcome::Approved); 3]
        );
    }

    #[test]
    fn self_reference_is_a_cycle() {
        let res = resolve(&[follows("Ana", "Ana")]);
        assert_eq!(
            res,
            Err(VotingErrors::CycleDetected(vec![
                "Ana".to_string(),
                "Ana".to_string()
            ]))
        );
    }

    #[test]
    fn longer_cycles_are_detected() {
        let res = resolve(&[
            direct("Zoe", BallotChoice::Approved),
            follows("Ana", "Rui"),
            follows("Rui", "Sofia"),
            follows("Sofia", "Ana"),
        ]);
        assert_eq!(
            res,
            Err(VotingErrors::CycleDetected(
                ["Ana", "Rui", "Sofia", "Ana"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            ))
        );
    }

    #[test]
    fn chain_into_a_cycle_is_detected() {
        let res = resolve(&[
            follows("Ana", "Rui"),
            follows("Rui", "Sofia"),
            follows("Sofia", "Rui"),
        ]);
        assert!(matches!(res, Err(VotingErrors::CycleDetected(_))));
    }

    #[test]
    fn unknown_reference() {
        let res = resolve(&[
            direct("Ana", BallotChoice::Approved),
            follows("Rui", "Bruno"),
        ]);
        assert_eq!(res, Err(VotingErrors::UnknownReference("Bruno".to_string())));
    }
}
