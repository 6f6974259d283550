mod config;
mod resolve;
mod roster;
mod tally;

pub mod builder;
pub mod manual;
pub mod workflow;

use log::{debug, info, warn};

pub use crate::config::*;
pub use crate::resolve::resolve;
pub use crate::roster::{reconcile, Reconciled, Roster};
pub use crate::tally::{break_tie, decide, tally};

/// Evaluates the ballots of one judgment round.
///
/// Arguments:
/// * `roster` the voters of this round, with promotions already applied
/// * `ballots` one ballot per voter of the roster, the presiding voter excluded
/// * `tie_break` the ballot of the presiding voter, only needed when the
/// members are tied
///
/// Malformed input (follow cycles, dangling follows, ballots outside the roster)
/// is an error. Missing ballots and a tie without a presiding ballot are not:
/// they are reported in the verdict so that the missing ballots can be collected.
pub fn evaluate_session(
    roster: &Roster,
    ballots: &[Ballot],
    tie_break: Option<Outcome>,
) -> Result<SessionResult, VotingErrors> {
    info!(
        "Evaluating {} ballots for {} voters",
        ballots.len(),
        roster.voters().len()
    );
    let rec = reconcile(roster, ballots)?;
    if !rec.missing.is_empty() {
        info!("Missing ballots: {:?}", rec.missing);
        return Ok(SessionResult {
            resolved_ballots: Vec::new(),
            tally: Tally::default(),
            is_tie: false,
            verdict: Verdict::IncompleteRoster {
                missing: rec.missing,
            },
        });
    }

    let resolved_rapporteurs = resolve(&rec.rapporteur_ballots)?;
    let t = tally(&resolved_rapporteurs, &rec.council_ballots)?;
    let mut resolved_ballots = resolved_rapporteurs;
    for b in rec.council_ballots.iter() {
        resolved_ballots.push(ResolvedBallot {
            voter: b.voter.clone(),
            role: Role::CouncilMember,
            position: tally::council_position(b)?,
            follows: None,
        });
    }
    for rb in resolved_ballots.iter() {
        debug!("evaluate_session: {} ({}): {}", rb.voter, rb.role, rb.position);
    }
    info!(
        "Tally: approved {}, denied {}, partial {} (abstain {}, absent {}, barred {})",
        t.approved, t.denied, t.partial, t.abstain, t.absent, t.barred
    );

    let ruling = decide(&t);
    let (final_tally, verdict) = match (ruling.decision, tie_break) {
        (Some(outcome), presiding) => {
            if let Some(p) = presiding {
                warn!("No tie to break, ignoring the presiding ballot {}", p);
            }
            (
                t,
                Verdict::Decided {
                    outcome,
                    tie_break: None,
                },
            )
        }
        (None, _) if !ruling.is_tie => return Err(VotingErrors::NoSubstantiveVotes),
        (None, Some(p)) => {
            let (final_tally, outcome) = break_tie(&t, p)?;
            info!("Tie between {:?} broken by the presiding ballot {}", ruling.tied, p);
            (
                final_tally,
                Verdict::Decided {
                    outcome,
                    tie_break: Some(p),
                },
            )
        }
        (None, None) => {
            info!("Tie between {:?}, waiting for the presiding ballot", ruling.tied);
            (t, Verdict::UnresolvedTie { tied: ruling.tied })
        }
    };

    Ok(SessionResult {
        resolved_ballots,
        tally: final_tally,
        is_tie: ruling.is_tie,
        verdict,
    })
}
