// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;
use std::str::FromStr;

/// The part a voter plays in a judgment round.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Role {
    /// The member presenting the case.
    Rapporteur,
    /// An additional member reviewing the same case.
    Reviewer,
    /// A member of the council voting on the case.
    CouncilMember,
}

impl Role {
    /// Rapporteurs and reviewers vote in the same group, and only they may follow
    /// another vote.
    pub fn is_rapporteur_group(&self) -> bool {
        matches!(self, Role::Rapporteur | Role::Reviewer)
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Voter {
    pub id: Option<String>,
    pub name: String,
    pub role: Role,
}

impl Voter {
    pub fn new(id: Option<&str>, name: &str, role: Role) -> Voter {
        Voter {
            id: id.filter(|s| !s.is_empty()).map(|s| s.to_string()),
            name: name.to_string(),
            role,
        }
    }
}

/// All the possible choices on a ballot, for both groups of voters.
///
/// Which of them is acceptable depends on the role of the voter: only
/// rapporteurs and reviewers may follow another vote, and only council
/// members may abstain, be absent or barred.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub enum BallotChoice {
    Approved,
    Denied,
    Partial,
    /// Adopts the resolved position of the named voter.
    Follows(String),
    Abstain,
    Absent,
    /// The member is impeded from voting on this case.
    Barred,
}

impl BallotChoice {
    pub fn is_substantive(&self) -> bool {
        matches!(
            self,
            BallotChoice::Approved | BallotChoice::Denied | BallotChoice::Partial
        )
    }

    /// The choices a voter with the given role may cast.
    pub fn allowed_for(&self, role: Role) -> bool {
        if self.is_substantive() {
            return true;
        }
        match self {
            BallotChoice::Approved | BallotChoice::Denied | BallotChoice::Partial => true,
            BallotChoice::Follows(_) => role.is_rapporteur_group(),
            BallotChoice::Abstain | BallotChoice::Absent | BallotChoice::Barred => {
                role == Role::CouncilMember
            }
        }
    }
}

impl From<Outcome> for BallotChoice {
    fn from(o: Outcome) -> Self {
        match o {
            Outcome::Approved => BallotChoice::Approved,
            Outcome::Denied => BallotChoice::Denied,
            Outcome::Partial => BallotChoice::Partial,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub voter: String,
    pub choice: BallotChoice,
}

impl Ballot {
    pub fn new(voter: &str, choice: BallotChoice) -> Ballot {
        Ballot {
            voter: voter.to_string(),
            choice,
        }
    }
}

// ******** Output data structures *********

/// A substantive position, the only kind that counts towards a decision.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Outcome {
    Approved,
    Denied,
    Partial,
}

impl Outcome {
    /// All the outcomes, in canonical order.
    pub const ALL: [Outcome; 3] = [Outcome::Approved, Outcome::Denied, Outcome::Partial];
}

/// A status recorded for council members that never counts as a vote.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Standing {
    Abstain,
    Absent,
    Barred,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum ResolvedPosition {
    Cast(Outcome),
    Withheld(Standing),
}

/// A ballot after its follow chain has been collapsed.
///
/// It is recomputed on every evaluation and never stored on its own.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResolvedBallot {
    pub voter: String,
    pub role: Role,
    pub position: ResolvedPosition,
    /// The voter directly followed, if the ballot was a follow.
    pub follows: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct Tally {
    pub approved: u64,
    pub denied: u64,
    pub partial: u64,
    pub abstain: u64,
    pub absent: u64,
    pub barred: u64,
}

impl Tally {
    pub fn count(&self, outcome: Outcome) -> u64 {
        match outcome {
            Outcome::Approved => self.approved,
            Outcome::Denied => self.denied,
            Outcome::Partial => self.partial,
        }
    }

    pub fn add(&mut self, position: ResolvedPosition) {
        match position {
            ResolvedPosition::Cast(Outcome::Approved) => self.approved += 1,
            ResolvedPosition::Cast(Outcome::Denied) => self.denied += 1,
            ResolvedPosition::Cast(Outcome::Partial) => self.partial += 1,
            ResolvedPosition::Withheld(Standing::Abstain) => self.abstain += 1,
            ResolvedPosition::Withheld(Standing::Absent) => self.absent += 1,
            ResolvedPosition::Withheld(Standing::Barred) => self.barred += 1,
        }
    }

    /// A copy of this tally with one more vote for the given outcome.
    pub fn with_tie_break(&self, outcome: Outcome) -> Tally {
        let mut t = *self;
        t.add(ResolvedPosition::Cast(outcome));
        t
    }

    pub fn substantive_total(&self) -> u64 {
        self.approved + self.denied + self.partial
    }
}

/// The outcome of ranking the substantive counts of a tally.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ruling {
    pub is_tie: bool,
    /// The outcome with the strict plurality. Never set when tied.
    pub decision: Option<Outcome>,
    /// The outcomes sharing the highest count, in canonical order. Only filled
    /// when tied.
    pub tied: Vec<Outcome>,
}

/// What the session can do next with the result of an evaluation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Verdict {
    Decided {
        outcome: Outcome,
        /// The presiding ballot, if one was needed.
        tie_break: Option<Outcome>,
    },
    /// The presiding voter must break the tie between these outcomes.
    UnresolvedTie { tied: Vec<Outcome> },
    /// These voters have not cast a ballot yet.
    IncompleteRoster { missing: Vec<String> },
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SessionResult {
    pub resolved_ballots: Vec<ResolvedBallot>,
    /// The final tally, including the presiding ballot when it was folded in.
    pub tally: Tally,
    /// Whether the votes of the members were tied, before any tie-break.
    pub is_tie: bool,
    pub verdict: Verdict,
}

impl SessionResult {
    pub fn decision(&self) -> Option<Outcome> {
        match self.verdict {
            Verdict::Decided { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}

/// Errors that make the ballots of a round unusable.
///
/// They are never recovered from by the engine: the input has to be fixed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    /// A follow chain loops. The path ends with the name seen twice.
    CycleDetected(Vec<String>),
    /// A follow points to a name outside the rapporteur group.
    UnknownReference(String),
    /// A ballot was cast by someone outside the roster.
    UnknownVoter(String),
    DuplicateVoter(String),
    DuplicateBallot(String),
    InvalidChoice {
        voter: String,
        choice: BallotChoice,
    },
    MissingRapporteur,
    /// The presiding ballot does not pick one of the tied outcomes.
    InvalidTieBreak {
        outcome: Outcome,
        tied: Vec<Outcome>,
    },
    NoSubstantiveVotes,
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::CycleDetected(path) => {
                write!(f, "follow cycle detected: {}", path.join(" -> "))
            }
            VotingErrors::UnknownReference(name) => {
                write!(f, "ballot follows {:?}, who is not a rapporteur or reviewer", name)
            }
            VotingErrors::UnknownVoter(name) => write!(f, "{:?} is not in the roster", name),
            VotingErrors::DuplicateVoter(name) => {
                write!(f, "{:?} appears more than once in the roster", name)
            }
            VotingErrors::DuplicateBallot(name) => {
                write!(f, "{:?} cast more than one ballot", name)
            }
            VotingErrors::InvalidChoice { voter, choice } => {
                write!(f, "{:?} cannot cast {}", voter, choice)
            }
            VotingErrors::MissingRapporteur => {
                write!(f, "the roster has no rapporteur or reviewer")
            }
            VotingErrors::InvalidTieBreak { outcome, tied } => {
                let names: Vec<String> = tied.iter().map(|o| o.to_string()).collect();
                write!(
                    f,
                    "presiding ballot {} is not one of the tied outcomes ({})",
                    outcome,
                    names.join(", ")
                )
            }
            VotingErrors::NoSubstantiveVotes => write!(f, "no substantive vote was cast"),
        }
    }
}

// ********* Labels **********

// The canonical labels are upper case English. The labels of the case management
// application are accepted as aliases.

/// Error returned when a label cannot be parsed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct UnknownLabel(pub String);

impl Error for UnknownLabel {}

impl Display for UnknownLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown label {:?}", self.0)
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_uppercase().replace([' ', '-'], "_")
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::Rapporteur => "RAPPORTEUR",
            Role::Reviewer => "REVIEWER",
            Role::CouncilMember => "COUNCIL_MEMBER",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Role {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "RAPPORTEUR" | "RELATOR" => Ok(Role::Rapporteur),
            "REVIEWER" | "REVISOR" => Ok(Role::Reviewer),
            "COUNCIL_MEMBER" | "CONSELHEIRO" => Ok(Role::CouncilMember),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Outcome::Approved => "APPROVED",
            Outcome::Denied => "DENIED",
            Outcome::Partial => "PARTIAL",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Outcome {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "APPROVED" | "PROVIDO" => Ok(Outcome::Approved),
            "DENIED" | "NEGADO" => Ok(Outcome::Denied),
            "PARTIAL" | "PARCIAL" => Ok(Outcome::Partial),
            _ => Err(UnknownLabel(s.to_string())),
        }
    }
}

impl Display for Standing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Standing::Abstain => "ABSTAIN",
            Standing::Absent => "ABSENT",
            Standing::Barred => "BARRED",
        };
        write!(f, "{}", s)
    }
}

impl Display for ResolvedPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedPosition::Cast(o) => o.fmt(f),
            ResolvedPosition::Withheld(s) => s.fmt(f),
        }
    }
}

impl Display for BallotChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BallotChoice::Approved => write!(f, "APPROVED"),
            BallotChoice::Denied => write!(f, "DENIED"),
            BallotChoice::Partial => write!(f, "PARTIAL"),
            BallotChoice::Follows(name) => write!(f, "FOLLOWS {}", name),
            BallotChoice::Abstain => write!(f, "ABSTAIN"),
            BallotChoice::Absent => write!(f, "ABSENT"),
            BallotChoice::Barred => write!(f, "BARRED"),
        }
    }
}

impl BallotChoice {
    /// Parses a position label. A follow needs the name of the followed voter,
    /// which is provided separately.
    pub fn parse(label: &str, follows: Option<&str>) -> Result<BallotChoice, UnknownLabel> {
        if let Ok(o) = label.parse::<Outcome>() {
            return Ok(o.into());
        }
        match (normalize(label).as_str(), follows.map(str::trim)) {
            ("FOLLOWS" | "ACOMPANHA", Some(name)) if !name.is_empty() => {
                Ok(BallotChoice::Follows(name.to_string()))
            }
            ("ABSTAIN" | "ABSTENCAO" | "ABSTENÇÃO", _) => Ok(BallotChoice::Abstain),
            ("ABSENT" | "AUSENTE", _) => Ok(BallotChoice::Absent),
            ("BARRED" | "IMPEDIDO", _) => Ok(BallotChoice::Barred),
            _ => Err(UnknownLabel(label.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_accept_aliases() {
        assert_eq!("relator".parse::<Role>(), Ok(Role::Rapporteur));
        assert_eq!("Council member".parse::<Role>(), Ok(Role::CouncilMember));
        assert_eq!(" provido ".parse::<Outcome>(), Ok(Outcome::Approved));
        assert_eq!(
            BallotChoice::parse("acompanha", Some("Ana")),
            Ok(BallotChoice::Follows("Ana".to_string()))
        );
        assert_eq!(BallotChoice::parse("IMPEDIDO", None), Ok(BallotChoice::Barred));
    }

    #[test]
    fn follows_needs_a_name() {
        assert!(BallotChoice::parse("FOLLOWS", None).is_err());
        assert!(BallotChoice::parse("FOLLOWS", Some("  ")).is_err());
        assert!(BallotChoice::parse("MAYBE", None).is_err());
    }

    #[test]
    fn choices_by_role() {
        let follows = BallotChoice::Follows("Ana".to_string());
        assert!(follows.allowed_for(Role::Reviewer));
        assert!(!follows.allowed_for(Role::CouncilMember));
        assert!(!BallotChoice::Abstain.allowed_for(Role::Rapporteur));
        assert!(BallotChoice::Barred.allowed_for(Role::CouncilMember));
        assert!(BallotChoice::Partial.allowed_for(Role::Rapporteur));
    }

    #[test]
    fn tally_counts() {
        let mut t = Tally::default();
        t.add(ResolvedPosition::Cast(Outcome::Denied));
        t.add(ResolvedPosition::Withheld(Standing::Absent));
        let t2 = t.with_tie_break(Outcome::Denied);
        assert_eq!(t.denied, 1);
        assert_eq!(t2.denied, 2);
        assert_eq!(t2.absent, 1);
        assert_eq!(t2.substantive_total(), 2);
    }
}
