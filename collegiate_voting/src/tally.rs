use log::debug;

use crate::config::*;

/// Counts the resolved rapporteur ballots and the council ballots.
///
/// Council members who abstain, are absent or barred are counted apart and
/// never weigh on the decision. The result does not depend on the order of
/// the ballots. A council ballot that follows another voter is an
/// `InvalidChoice`: follows must be resolved first, and only rapporteurs and
/// reviewers may cast them.
pub fn tally(
    rapporteur_ballots: &[ResolvedBallot],
    council_ballots: &[Ballot],
) -> Result<Tally, VotingErrors> {
    let mut t = Tally::default();
    for rb in rapporteur_ballots.iter() {
        t.add(rb.position);
    }
    for b in council_ballots.iter() {
        t.add(council_position(b)?);
    }
    Ok(t)
}

/// The position of a council ballot. Council members never follow.
pub(crate) fn council_position(b: &Ballot) -> Result<ResolvedPosition, VotingErrors> {
    match &b.choice {
        BallotChoice::Approved => Ok(ResolvedPosition::Cast(Outcome::Approved)),
        BallotChoice::Denied => Ok(ResolvedPosition::Cast(Outcome::Denied)),
        BallotChoice::Partial => Ok(ResolvedPosition::Cast(Outcome::Partial)),
        BallotChoice::Abstain => Ok(ResolvedPosition::Withheld(Standing::Abstain)),
        BallotChoice::Absent => Ok(ResolvedPosition::Withheld(Standing::Absent)),
        BallotChoice::Barred => Ok(ResolvedPosition::Withheld(Standing::Barred)),
        BallotChoice::Follows(_) => Err(VotingErrors::InvalidChoice {
            voter: b.voter.clone(),
            choice: b.choice.clone(),
        }),
    }
}

/// Ranks the substantive counts of a tally.
///
/// The two highest counts being equal and nonzero is a tie, including the case
/// where all three are equal. A tie never carries a decision: it has to be
/// broken by the presiding voter.
pub fn decide(tally: &Tally) -> Ruling {
    let mut ranked: Vec<(Outcome, u64)> = Outcome::ALL
        .iter()
        .map(|o| (*o, tally.count(*o)))
        .collect();
    // Stable sort: equal counts stay in canonical order.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    debug!("decide: ranked: {:?}", ranked);

    let (top, top_count) = ranked[0];
    let runner_up_count = ranked[1].1;
    if top_count == 0 {
        return Ruling {
            is_tie: false,
            decision: None,
            tied: Vec::new(),
        };
    }
    if top_count == runner_up_count {
        let mut tied: Vec<Outcome> = ranked
            .iter()
            .filter(|(_, c)| *c == top_count)
            .map(|(o, _)| *o)
            .collect();
        tied.sort();
        return Ruling {
            is_tie: true,
            decision: None,
            tied,
        };
    }
    Ruling {
        is_tie: false,
        decision: Some(top),
        tied: Vec::new(),
    }
}

/// Folds the presiding ballot into a tied tally.
///
/// The presiding voter must pick one of the tied outcomes: any other choice
/// would leave the tally tied. Returns the new tally and the decision.
pub fn break_tie(tally: &Tally, presiding: Outcome) -> Result<(Tally, Outcome), VotingErrors> {
    let ruling = decide(tally);
    if !ruling.tied.contains(&presiding) {
        return Err(VotingErrors::InvalidTieBreak {
            outcome: presiding,
            tied: ruling.tied,
        });
    }
    let final_tally = tally.with_tie_break(presiding);
    let final_ruling = decide(&final_tally);
    match final_ruling.decision {
        Some(o) => Ok((final_tally, o)),
        None => Err(VotingErrors::InvalidTieBreak {
            outcome: presiding,
            tied: final_ruling.tied,
        }),
    }
}
