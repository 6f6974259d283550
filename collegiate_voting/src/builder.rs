pub use crate::config::*;
use crate::roster::Roster;

/// A builder for assembling a round: the voters, their ballots and the
/// presiding ballot.
///
/// ```
/// use collegiate_voting::builder::Builder;
/// use collegiate_voting::{Outcome, VotingErrors};
///
/// let mut builder = Builder::new()
///     .rapporteur("Ana")?
///     .reviewer("Rui")?
///     .council_member("c1", "Bruno")?
///     .presiding("p1", "Paulo")?;
///
/// builder.vote("Ana", Outcome::Denied)?;
/// builder.follows("Rui", "Ana")?;
/// builder.vote("Bruno", Outcome::Approved)?;
///
/// let result = builder.evaluate()?;
/// assert_eq!(result.decision(), Some(Outcome::Denied));
///
/// # Ok::<(), VotingErrors>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    pub(crate) _voters: Vec<Voter>,
    pub(crate) _presiding: Option<Voter>,
    pub(crate) _promoted: Vec<String>,
    pub(crate) _ballots: Vec<Ballot>,
    pub(crate) _tie_break: Option<Outcome>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    pub fn rapporteur(self, name: &str) -> Result<Builder, VotingErrors> {
        self.voter(Voter::new(None, name, Role::Rapporteur))
    }

    pub fn reviewer(self, name: &str) -> Result<Builder, VotingErrors> {
        self.voter(Voter::new(None, name, Role::Reviewer))
    }

    pub fn council_member(self, id: &str, name: &str) -> Result<Builder, VotingErrors> {
        self.voter(Voter::new(Some(id), name, Role::CouncilMember))
    }

    pub fn presiding(mut self, id: &str, name: &str) -> Result<Builder, VotingErrors> {
        self.check_new_name(name)?;
        self._presiding = Some(Voter::new(Some(id), name, Role::CouncilMember));
        Ok(self)
    }

    pub fn voter(mut self, voter: Voter) -> Result<Builder, VotingErrors> {
        self.check_new_name(&voter.name)?;
        self._voters.push(voter);
        Ok(self)
    }

    /// Seats a council member with the reviewers for this round.
    pub fn promote_to_reviewer(mut self, name: &str) -> Result<Builder, VotingErrors> {
        self._promoted.push(name.to_string());
        Ok(self)
    }

    /// Adds a substantive vote.
    pub fn vote(&mut self, voter: &str, outcome: Outcome) -> Result<(), VotingErrors> {
        self.add_ballot(Ballot::new(voter, outcome.into()))
    }

    /// Adds a vote that adopts the position of another rapporteur or reviewer.
    pub fn follows(&mut self, voter: &str, followed: &str) -> Result<(), VotingErrors> {
        self.add_ballot(Ballot::new(
            voter,
            BallotChoice::Follows(followed.to_string()),
        ))
    }

    /// Adds any kind of ballot.
    pub fn add_ballot(&mut self, ballot: Ballot) -> Result<(), VotingErrors> {
        if self._ballots.iter().any(|b| b.voter == ballot.voter) {
            return Err(VotingErrors::DuplicateBallot(ballot.voter));
        }
        self._ballots.push(ballot);
        Ok(())
    }

    pub fn tie_break(&mut self, outcome: Outcome) {
        self._tie_break = Some(outcome);
    }

    /// The roster of the round, with the promotions applied.
    pub fn roster(&self) -> Result<Roster, VotingErrors> {
        let promoted: Vec<&str> = self._promoted.iter().map(|s| s.as_str()).collect();
        Roster::with_promotions(self._voters.clone(), self._presiding.clone(), &promoted)
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self._ballots
    }

    pub fn evaluate(&self) -> Result<SessionResult, VotingErrors> {
        let roster = self.roster()?;
        crate::evaluate_session(&roster, &self._ballots, self._tie_break)
    }

    fn check_new_name(&self, name: &str) -> Result<(), VotingErrors> {
        let taken = self
            ._voters
            .iter()
            .chain(self._presiding.iter())
            .any(|v| v.name == name);
        if taken {
            Err(VotingErrors::DuplicateVoter(name.to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promoted_member_votes_as_reviewer() {
        let mut b = Builder::new()
            .rapporteur("Ana")
            .unwrap()
            .council_member("c1", "Bruno")
            .unwrap()
            .council_member("c2", "Carla")
            .unwrap()
            .promote_to_reviewer("Bruno")
            .unwrap();
        b.vote("Ana", Outcome::Partial).unwrap();
        // Only possible for a reviewer.
        b.follows("Bruno", "Ana").unwrap();
        b.add_ballot(Ballot::new("Carla", BallotChoice::Absent))
            .unwrap();

        let roster = b.roster().unwrap();
        assert_eq!(roster.get("Bruno").unwrap().role, Role::Reviewer);
        let res = b.evaluate().unwrap();
        assert_eq!(res.tally.partial, 2);
        assert_eq!(res.tally.absent, 1);
        assert_eq!(res.decision(), Some(Outcome::Partial));
    }

    #[test]
    fn promotion_stands_in_for_the_rapporteur_group() {
        let mut b = Builder::new()
            .council_member("c1", "Bruno")
            .unwrap()
            .council_member("c2", "Carla")
            .unwrap()
            .promote_to_reviewer("Bruno")
            .unwrap();
        b.vote("Bruno", Outcome::Denied).unwrap();
        b.vote("Carla", Outcome::Denied).unwrap();
        assert_eq!(b.ballots().len(), 2);
        assert_eq!(b.ballots()[0].voter, "Bruno");

        let roster = b.roster().unwrap();
        assert_eq!(roster.rapporteur_group().count(), 1);
        assert_eq!(b.evaluate().unwrap().decision(), Some(Outcome::Denied));
    }

    #[test]
    fn names_are_unique() {
        let res = Builder::new()
            .rapporteur("Ana")
            .unwrap()
            .presiding("p1", "Ana");
        assert_eq!(
            res.err(),
            Some(VotingErrors::DuplicateVoter("Ana".to_string()))
        );

        let mut b = Builder::new().rapporteur("Ana").unwrap();
        b.vote("Ana", Outcome::Approved).unwrap();
        assert_eq!(
            b.vote("Ana", Outcome::Denied),
            Err(VotingErrors::DuplicateBallot("Ana".to_string()))
        );
    }

    #[test]
    fn tie_break_is_folded() {
        let mut b = Builder::new()
            .rapporteur("Ana")
            .unwrap()
            .council_member("c1", "Bruno")
            .unwrap()
            .presiding("p1", "Paulo")
            .unwrap();
        b.vote("Ana", Outcome::Approved).unwrap();
        b.vote("Bruno", Outcome::Denied).unwrap();
        assert!(matches!(
            b.evaluate().unwrap().verdict,
            Verdict::UnresolvedTie { .. }
        ));
        b.tie_break(Outcome::Approved);
        let res = b.evaluate().unwrap();
        assert!(res.is_tie);
        assert_eq!(res.decision(), Some(Outcome::Approved));
        assert_eq!(res.tally.approved, 2);
    }
}
