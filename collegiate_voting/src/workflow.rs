/*!
The steps of a judgment round, from collecting the votes to the confirmed decision.

A round first collects the ballots of the rapporteurs and reviewers, then the
ballots of the council members. If the members are tied, the presiding voter
has to cast a ballot before the result can be reviewed and confirmed. Once
confirmed, the round cannot change anymore: voting again requires a new round.

```
use collegiate_voting::workflow::{Advance, JudgmentRound, Pending, Stage};
use collegiate_voting::{BallotChoice, Outcome, Roster, Role, Voter};
# use collegiate_voting::workflow::WorkflowError;

let roster = Roster::new(
    vec![
        Voter::new(None, "Ana", Role::Rapporteur),
        Voter::new(Some("c1"), "Bruno", Role::CouncilMember),
    ],
    Some(Voter::new(Some("p1"), "Paulo", Role::CouncilMember)),
)?;
let mut round = JudgmentRound::new(roster);
round.cast("Ana", BallotChoice::Approved)?;
assert_eq!(round.advance()?, Advance::Moved(Stage::CollectingCouncilVotes));
round.cast("Bruno", BallotChoice::Denied)?;
assert_eq!(round.advance()?, Advance::Moved(Stage::TieBreakRequired));
assert!(matches!(round.advance()?, Advance::Blocked(Pending::TieBreak(_))));
round.cast_tie_break(Outcome::Denied)?;
assert_eq!(round.advance()?, Advance::Moved(Stage::Reviewing));
let decision = round.confirm()?;
assert_eq!(decision.outcome(), Outcome::Denied);
# Ok::<(), WorkflowError>(())
```
*/

use log::{debug, info};
use std::error::Error;
use std::fmt::Display;

use crate::config::*;
use crate::roster::Roster;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Stage {
    CollectingRapporteurVotes,
    CollectingCouncilVotes,
    TieBreakRequired,
    TieBreakResolved,
    Reviewing,
    Confirmed,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::CollectingRapporteurVotes => "collecting rapporteur votes",
            Stage::CollectingCouncilVotes => "collecting council votes",
            Stage::TieBreakRequired => "tie-break required",
            Stage::TieBreakResolved => "tie-break resolved",
            Stage::Reviewing => "reviewing",
            Stage::Confirmed => "confirmed",
        };
        write!(f, "{}", s)
    }
}

/// Why a round cannot move forward yet.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Pending {
    MissingBallots(Vec<String>),
    /// The presiding voter must pick one of these outcomes.
    TieBreak(Vec<Outcome>),
    /// The members are tied but the roster has no presiding voter.
    NoPresidingVoter,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Advance {
    Moved(Stage),
    Blocked(Pending),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum WorkflowError {
    Voting(VotingErrors),
    /// The round is confirmed and cannot change.
    RoundConfirmed,
    WrongStage { stage: Stage, action: &'static str },
}

impl Error for WorkflowError {}

impl Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowError::Voting(e) => e.fmt(f),
            WorkflowError::RoundConfirmed => write!(f, "the round is already confirmed"),
            WorkflowError::WrongStage { stage, action } => {
                write!(f, "cannot {} while {}", action, stage)
            }
        }
    }
}

impl From<VotingErrors> for WorkflowError {
    fn from(e: VotingErrors) -> Self {
        WorkflowError::Voting(e)
    }
}

/// The confirmed decision of a round. It cannot be modified.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Decision {
    round: u32,
    outcome: Outcome,
    tally: Tally,
    tie_broken: bool,
}

impl Decision {
    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// The final tally, including the presiding ballot if there was one.
    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    pub fn tie_broken(&self) -> bool {
        self.tie_broken
    }
}

/// One round of voting on a case.
#[derive(Debug, Clone)]
pub struct JudgmentRound {
    round: u32,
    roster: Roster,
    ballots: Vec<Ballot>,
    tie_break: Option<Outcome>,
    stage: Stage,
    decision: Option<Decision>,
}

impl JudgmentRound {
    pub fn new(roster: Roster) -> JudgmentRound {
        JudgmentRound {
            round: 1,
            roster,
            ballots: Vec::new(),
            tie_break: None,
            stage: Stage::CollectingRapporteurVotes,
            decision: None,
        }
    }

    /// Starts the next round with the same roster and no ballots.
    pub fn next_round(&self) -> JudgmentRound {
        JudgmentRound {
            round: self.round + 1,
            ..JudgmentRound::new(self.roster.clone())
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn tie_break(&self) -> Option<Outcome> {
        self.tie_break
    }

    pub fn decision(&self) -> Option<&Decision> {
        self.decision.as_ref()
    }

    /// Records or replaces the ballot of a voter.
    ///
    /// Council ballots are only accepted once the rapporteur group is done.
    /// Changing a ballot drops the presiding ballot and brings the round back to
    /// the stage collecting that group.
    pub fn cast(&mut self, voter: &str, choice: BallotChoice) -> Result<(), WorkflowError> {
        self.check_open()?;
        let role = self
            .roster
            .get(voter)
            .map(|v| v.role)
            .ok_or_else(|| VotingErrors::UnknownVoter(voter.to_string()))?;
        if !choice.allowed_for(role) {
            return Err(VotingErrors::InvalidChoice {
                voter: voter.to_string(),
                choice,
            }
            .into());
        }
        let collecting = if role.is_rapporteur_group() {
            Stage::CollectingRapporteurVotes
        } else {
            Stage::CollectingCouncilVotes
        };
        if self.stage < collecting {
            return Err(WorkflowError::WrongStage {
                stage: self.stage,
                action: "cast a council ballot",
            });
        }

        debug!("cast: round {}: {} -> {}", self.round, voter, choice);
        self.ballots.retain(|b| b.voter != voter);
        self.ballots.push(Ballot::new(voter, choice));
        self.tie_break = None;
        self.stage = collecting;
        Ok(())
    }

    /// Records the ballot of the presiding voter. Only possible when the
    /// members are tied, and only for one of the tied outcomes.
    pub fn cast_tie_break(&mut self, outcome: Outcome) -> Result<(), WorkflowError> {
        self.check_open()?;
        if !matches!(
            self.stage,
            Stage::TieBreakRequired | Stage::TieBreakResolved
        ) {
            return Err(WorkflowError::WrongStage {
                stage: self.stage,
                action: "cast the presiding ballot",
            });
        }
        crate::evaluate_session(&self.roster, &self.ballots, Some(outcome))?;
        info!("Round {}: presiding ballot {}", self.round, outcome);
        self.tie_break = Some(outcome);
        self.stage = Stage::TieBreakResolved;
        Ok(())
    }

    pub fn retract_tie_break(&mut self) -> Result<(), WorkflowError> {
        self.check_open()?;
        if self.stage != Stage::TieBreakResolved {
            return Err(WorkflowError::WrongStage {
                stage: self.stage,
                action: "retract the presiding ballot",
            });
        }
        self.tie_break = None;
        self.stage = Stage::TieBreakRequired;
        Ok(())
    }

    /// Tries to move to the next stage.
    ///
    /// Malformed ballots are errors. Missing ballots are reported as a blocked
    /// move, and the round stays where it is.
    pub fn advance(&mut self) -> Result<Advance, WorkflowError> {
        self.check_open()?;
        let next = match self.stage {
            Stage::CollectingRapporteurVotes => {
                let rec = crate::reconcile(&self.roster, &self.ballots)?;
                let missing: Vec<String> = self
                    .roster
                    .rapporteur_group()
                    .filter(|v| rec.missing.contains(&v.name))
                    .map(|v| v.name.clone())
                    .collect();
                if !missing.is_empty() {
                    return Ok(Advance::Blocked(Pending::MissingBallots(missing)));
                }
                crate::resolve(&rec.rapporteur_ballots)?;
                Stage::CollectingCouncilVotes
            }
            Stage::CollectingCouncilVotes => {
                let res = crate::evaluate_session(&self.roster, &self.ballots, None)?;
                match res.verdict {
                    Verdict::IncompleteRoster { missing } => {
                        return Ok(Advance::Blocked(Pending::MissingBallots(missing)))
                    }
                    Verdict::UnresolvedTie { .. } if self.roster.presiding().is_none() => {
                        return Ok(Advance::Blocked(Pending::NoPresidingVoter))
                    }
                    Verdict::UnresolvedTie { .. } => Stage::TieBreakRequired,
                    Verdict::Decided { .. } => Stage::Reviewing,
                }
            }
            Stage::TieBreakRequired => match self.tie_break {
                Some(_) => Stage::TieBreakResolved,
                None => {
                    let tied = crate::decide(&self.evaluate()?.tally).tied;
                    return Ok(Advance::Blocked(Pending::TieBreak(tied)));
                }
            },
            Stage::TieBreakResolved => {
                let res = self.evaluate()?;
                match res.verdict {
                    Verdict::Decided { .. } => Stage::Reviewing,
                    Verdict::UnresolvedTie { tied } => {
                        self.stage = Stage::TieBreakRequired;
                        return Ok(Advance::Blocked(Pending::TieBreak(tied)));
                    }
                    Verdict::IncompleteRoster { missing } => {
                        return Ok(Advance::Blocked(Pending::MissingBallots(missing)))
                    }
                }
            }
            Stage::Reviewing | Stage::Confirmed => {
                return Err(WorkflowError::WrongStage {
                    stage: self.stage,
                    action: "advance (confirm instead)",
                })
            }
        };
        info!("Round {}: {} -> {}", self.round, self.stage, next);
        self.stage = next;
        Ok(Advance::Moved(next))
    }

    /// Goes back one stage. Leaving the tie-break stages drops the presiding ballot.
    pub fn back(&mut self) -> Result<Stage, WorkflowError> {
        self.check_open()?;
        let previous = match self.stage {
            Stage::CollectingRapporteurVotes => {
                return Err(WorkflowError::WrongStage {
                    stage: self.stage,
                    action: "go back",
                })
            }
            Stage::CollectingCouncilVotes => Stage::CollectingRapporteurVotes,
            Stage::TieBreakRequired | Stage::TieBreakResolved => {
                self.tie_break = None;
                Stage::CollectingCouncilVotes
            }
            Stage::Reviewing if self.tie_break.is_some() => Stage::TieBreakResolved,
            Stage::Reviewing => Stage::CollectingCouncilVotes,
            Stage::Confirmed => return Err(WorkflowError::RoundConfirmed),
        };
        self.stage = previous;
        Ok(previous)
    }

    /// Confirms the decision under review. The round is closed afterwards.
    pub fn confirm(&mut self) -> Result<Decision, WorkflowError> {
        self.check_open()?;
        if self.stage != Stage::Reviewing {
            return Err(WorkflowError::WrongStage {
                stage: self.stage,
                action: "confirm",
            });
        }
        let res = self.evaluate()?;
        let outcome = match res.verdict {
            Verdict::Decided { outcome, .. } => outcome,
            // Every ballot change sends the round back before review.
            _ => {
                return Err(WorkflowError::WrongStage {
                    stage: self.stage,
                    action: "confirm an undecided round",
                })
            }
        };
        let decision = Decision {
            round: self.round,
            outcome,
            tally: res.tally,
            tie_broken: res.is_tie,
        };
        info!("Round {}: confirmed {}", self.round, outcome);
        self.stage = Stage::Confirmed;
        self.decision = Some(decision.clone());
        Ok(decision)
    }

    fn evaluate(&self) -> Result<SessionResult, WorkflowError> {
        Ok(crate::evaluate_session(
            &self.roster,
            &self.ballots,
            self.tie_break,
        )?)
    }

    fn check_open(&self) -> Result<(), WorkflowError> {
        if self.stage == Stage::Confirmed {
            Err(WorkflowError::RoundConfirmed)
        } else {
            Ok(())
        }
    }
}
