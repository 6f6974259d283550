use log::debug;
use std::collections::{HashMap, HashSet};

use crate::config::*;

/// The closed set of voters eligible in one judgment round.
///
/// Invariant: no voter appears twice, whether by name or by identifier. The
/// presiding voter counts as a member of the roster for this purpose.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Roster {
    voters: Vec<Voter>,
    presiding: Option<Voter>,
    // Council members moved into the reviewer group for this round.
    promoted: Vec<String>,
}

impl Roster {
    pub fn new(voters: Vec<Voter>, presiding: Option<Voter>) -> Result<Roster, VotingErrors> {
        Roster::with_promotions(voters, presiding, &[])
    }

    /// Builds a roster and seats the given council members with the reviewers.
    ///
    /// The rapporteur group is checked once the promotions are applied: a round
    /// may have no rapporteur or reviewer by role, as long as a council member
    /// is promoted.
    pub fn with_promotions(
        voters: Vec<Voter>,
        presiding: Option<Voter>,
        promoted: &[&str],
    ) -> Result<Roster, VotingErrors> {
        let mut names: HashSet<&str> = HashSet::new();
        let mut ids: HashSet<&str> = HashSet::new();
        for v in voters.iter().chain(presiding.iter()) {
            if !names.insert(v.name.as_str()) {
                return Err(VotingErrors::DuplicateVoter(v.name.clone()));
            }
            if let Some(id) = v.id.as_deref() {
                if !ids.insert(id) {
                    return Err(VotingErrors::DuplicateVoter(v.name.clone()));
                }
            }
        }
        let mut roster = Roster {
            voters,
            presiding,
            promoted: Vec::new(),
        };
        for name in promoted.iter() {
            roster.promote_to_reviewer(name)?;
        }
        if roster.rapporteur_group().next().is_none() {
            return Err(VotingErrors::MissingRapporteur);
        }
        Ok(roster)
    }

    pub fn voters(&self) -> &[Voter] {
        &self.voters
    }

    pub fn presiding(&self) -> Option<&Voter> {
        self.presiding.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&Voter> {
        self.voters.iter().find(|v| v.name == name)
    }

    pub fn rapporteur_group(&self) -> impl Iterator<Item = &Voter> {
        self.voters.iter().filter(|v| v.role.is_rapporteur_group())
    }

    pub fn council(&self) -> impl Iterator<Item = &Voter> {
        self.voters.iter().filter(|v| v.role == Role::CouncilMember)
    }

    pub fn is_promoted(&self, name: &str) -> bool {
        self.promoted.iter().any(|n| n == name)
    }

    /// Moves a council member into the reviewer group for this round.
    pub fn promote_to_reviewer(&mut self, name: &str) -> Result<(), VotingErrors> {
        let voter = self
            .voters
            .iter_mut()
            .find(|v| v.name == name && v.role == Role::CouncilMember)
            .ok_or_else(|| VotingErrors::UnknownVoter(name.to_string()))?;
        voter.role = Role::Reviewer;
        self.promoted.push(name.to_string());
        debug!("promote_to_reviewer: {:?}", name);
        Ok(())
    }

    /// Undoes a promotion. The roster is left as it was before the promotion.
    ///
    /// Fails with `MissingRapporteur` if the promoted voter is the only member
    /// of the rapporteur group.
    pub fn revert_promotion(&mut self, name: &str) -> Result<(), VotingErrors> {
        let idx = self
            .promoted
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| VotingErrors::UnknownVoter(name.to_string()))?;
        if self.rapporteur_group().all(|v| v.name == name) {
            return Err(VotingErrors::MissingRapporteur);
        }
        self.promoted.remove(idx);
        if let Some(v) = self.voters.iter_mut().find(|v| v.name == name) {
            v.role = Role::CouncilMember;
        }
        debug!("revert_promotion: {:?}", name);
        Ok(())
    }
}

/// The ballots of a round, matched against the roster.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Reconciled {
    /// Rapporteur and reviewer ballots, in roster order.
    pub rapporteur_ballots: Vec<(Role, Ballot)>,
    /// Council member ballots, in roster order.
    pub council_ballots: Vec<Ballot>,
    /// Voters of the roster without a ballot, in roster order.
    pub missing: Vec<String>,
}

/// Matches the ballots with the voters of the roster.
///
/// Ballots are joined to voters by name. Every ballot must come from the roster,
/// at most one per voter, with a choice allowed for the role of the voter.
pub fn reconcile(roster: &Roster, ballots: &[Ballot]) -> Result<Reconciled, VotingErrors> {
    let mut by_name: HashMap<&str, &Ballot> = HashMap::new();
    for b in ballots.iter() {
        let voter = roster
            .get(&b.voter)
            .ok_or_else(|| VotingErrors::UnknownVoter(b.voter.clone()))?;
        if !b.choice.allowed_for(voter.role) {
            return Err(VotingErrors::InvalidChoice {
                voter: b.voter.clone(),
                choice: b.choice.clone(),
            });
        }
        if by_name.insert(b.voter.as_str(), b).is_some() {
            return Err(VotingErrors::DuplicateBallot(b.voter.clone()));
        }
    }

    let mut res = Reconciled {
        rapporteur_ballots: Vec::new(),
        council_ballots: Vec::new(),
        missing: Vec::new(),
    };
    for v in roster.voters() {
        match by_name.get(v.name.as_str()) {
            None => res.missing.push(v.name.clone()),
            Some(b) if v.role.is_rapporteur_group() => {
                res.rapporteur_ballots.push((v.role, (*b).clone()))
            }
            Some(b) => res.council_ballots.push((*b).clone()),
        }
    }
    debug!(
        "reconcile: {} rapporteur ballots, {} council ballots, missing: {:?}",
        res.rapporteur_ballots.len(),
        res.council_ballots.len(),
        res.missing
    );
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Roster {
        Roster::new(
            vec![
                Voter::new(None, "Ana", Role::Rapporteur),
                Voter::new(Some("c1"), "Bruno", Role::CouncilMember),
                Voter::new(Some("c2"), "Carla", Role::CouncilMember),
            ],
            Some(Voter::new(Some("p1"), "Paulo", Role::CouncilMember)),
        )
        .unwrap()
    }

    #[test]
    fn duplicates_are_rejected() {
        let res = Roster::new(
            vec![
                Voter::new(None, "Ana", Role::Rapporteur),
                Voter::new(None, "Ana", Role::CouncilMember),
            ],
            None,
        );
        assert_eq!(res, Err(VotingErrors::DuplicateVoter("Ana".to_string())));

        let res = Roster::new(
            vec![
                Voter::new(None, "Ana", Role::Rapporteur),
                Voter::new(Some("c1"), "Bruno", Role::CouncilMember),
            ],
            Some(Voter::new(Some("c1"), "Paulo", Role::CouncilMember)),
        );
        assert_eq!(res, Err(VotingErrors::DuplicateVoter("Paulo".to_string())));
    }

    #[test]
    fn empty_ids_are_not_duplicates() {
        let res = Roster::new(
            vec![
                Voter::new(Some(""), "Ana", Role::Rapporteur),
                Voter::new(Some(""), "Rui", Role::Reviewer),
            ],
            None,
        );
        assert!(res.is_ok());
    }

    #[test]
    fn roster_needs_a_rapporteur() {
        let res = Roster::new(vec![Voter::new(None, "Bruno", Role::CouncilMember)], None);
        assert_eq!(res, Err(VotingErrors::MissingRapporteur));
    }

    #[test]
    fn promotion_can_seat_the_only_reviewer() {
        let voters = vec![
            Voter::new(Some("c1"), "Bruno", Role::CouncilMember),
            Voter::new(Some("c2"), "Carla", Role::CouncilMember),
        ];
        assert_eq!(
            Roster::new(voters.clone(), None),
            Err(VotingErrors::MissingRapporteur)
        );
        let mut r = Roster::with_promotions(voters, None, &["Bruno"]).unwrap();
        assert_eq!(r.get("Bruno").unwrap().role, Role::Reviewer);
        assert!(r.is_promoted("Bruno"));

        // The round would lose its only reviewer.
        let before = r.clone();
        assert_eq!(
            r.revert_promotion("Bruno"),
            Err(VotingErrors::MissingRapporteur)
        );
        assert_eq!(r, before);
    }

    #[test]
    fn promotion_is_reversible() {
        let original = roster();
        let mut r = original.clone();
        r.promote_to_reviewer("Bruno").unwrap();
        assert_eq!(r.get("Bruno").unwrap().role, Role::Reviewer);
        assert!(r.is_promoted("Bruno"));
        assert_eq!(r.rapporteur_group().count(), 2);
        assert_eq!(r.council().count(), 1);

        r.revert_promotion("Bruno").unwrap();
        assert_eq!(r, original);
    }

    #[test]
    fn only_council_members_are_promoted() {
        let mut r = roster();
        assert!(r.promote_to_reviewer("Ana").is_err());
        assert!(r.promote_to_reviewer("Zoe").is_err());
        assert!(r.revert_promotion("Carla").is_err());
    }

    #[test]
    fn reconcile_lists_missing_voters() {
        let r = roster();
        let ballots = vec![
            Ballot::new("Carla", BallotChoice::Abstain),
            Ballot::new("Ana", BallotChoice::Approved),
        ];
        let rec = reconcile(&r, &ballots).unwrap();
        assert_eq!(rec.missing, vec!["Bruno".to_string()]);
        assert_eq!(rec.rapporteur_ballots.len(), 1);
        assert_eq!(rec.council_ballots, vec![ballots[0].clone()]);
    }

    #[test]
    fn reconcile_rejects_bad_ballots() {
        let r = roster();
        assert_eq!(
            reconcile(&r, &[Ballot::new("Zoe", BallotChoice::Approved)]),
            Err(VotingErrors::UnknownVoter("Zoe".to_string()))
        );
        // The presiding voter does not vote with the council.
        assert_eq!(
            reconcile(&r, &[Ballot::new("Paulo", BallotChoice::Approved)]),
            Err(VotingErrors::UnknownVoter("Paulo".to_string()))
        );
        assert_eq!(
            reconcile(
                &r,
                &[
                    Ballot::new("Bruno", BallotChoice::Approved),
                    Ballot::new("Bruno", BallotChoice::Denied)
                ]
            ),
            Err(VotingErrors::DuplicateBallot("Bruno".to_string()))
        );
        assert!(matches!(
            reconcile(&r, &[Ballot::new("Ana", BallotChoice::Abstain)]),
            Err(VotingErrors::InvalidChoice { .. })
        ));
        assert!(matches!(
            reconcile(
                &r,
                &[Ballot::new("Bruno", BallotChoice::Follows("Ana".to_string()))]
            ),
            Err(VotingErrors::InvalidChoice { .. })
        ));
    }
}
