use std::fmt::{Debug, Formatter};
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::session::{PlayerId, Session};

#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum Action {
    Gather(PlayerId),
    Tax(PlayerId),
    Bribe(PlayerId),
    Sanction(PlayerId, PlayerId),
    Coup(PlayerId, PlayerId),
    ConcedeCoup(PlayerId),
    Arrest(PlayerId, PlayerId),
    Invest(PlayerId),
    SpyOn(PlayerId, PlayerId),
    PreventCoup(PlayerId, PlayerId),
    GeneralBlockCoup(PlayerId, PlayerId), // general, attacker
    JudgeBribe(PlayerId, PlayerId),
    BlockTax(PlayerId, PlayerId),
    SkipTurn(PlayerId),
    EndTurn(PlayerId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Applied,
    // what a spy saw
    Revealed { target: PlayerId, coins: u32 },
}

impl Action {
    /// The player performing the action.
    pub fn actor(&self) -> PlayerId {
        match *self {
            Action::Gather(p)
            | Action::Tax(p)
            | Action::Bribe(p)
            | Action::Sanction(p, _)
            | Action::Coup(p, _)
            | Action::ConcedeCoup(p)
            | Action::Arrest(p, _)
            | Action::Invest(p)
            | Action::SpyOn(p, _)
            | Action::PreventCoup(p, _)
            | Action::GeneralBlockCoup(p, _)
            | Action::JudgeBribe(p, _)
            | Action::BlockTax(p, _)
            | Action::SkipTurn(p)
            | Action::EndTurn(p) => p,
        }
    }

    /// Actions answered out of turn, by someone other than the turn holder.
    pub fn is_reaction(&self) -> bool {
        matches!(
            self,
            Action::ConcedeCoup(_)
                | Action::SpyOn(_, _)
                | Action::PreventCoup(_, _)
                | Action::GeneralBlockCoup(_, _)
                | Action::JudgeBribe(_, _)
                | Action::BlockTax(_, _)
        )
    }
}

impl Debug for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Gather(p) => {
                f.write_fmt(format_args!("Player {p} gathers"))
            }
            Action::Tax(p) => {
                f.write_fmt(format_args!("Player {p} taxes"))
            }
            Action::Bribe(p) => {
                f.write_fmt(format_args!("Player {p} bribes"))
            }
            Action::Sanction(p, target) => {
                f.write_fmt(format_args!("Player {p} sanctions {target}"))
            }
            Action::Coup(p, target) => {
                f.write_fmt(format_args!("Player {p} coups {target}"))
            }
            Action::ConcedeCoup(p) => {
                f.write_fmt(format_args!("Player {p} concedes the coup"))
            }
            Action::Arrest(p, target) => {
                f.write_fmt(format_args!("Player {p} arrests {target}"))
            }
            Action::Invest(p) => {
                f.write_fmt(format_args!("Player {p} invests"))
            }
            Action::SpyOn(p, target) => {
                f.write_fmt(format_args!("Player {p} spies on {target}"))
            }
            Action::PreventCoup(p, target) => {
                f.write_fmt(format_args!("Player {p} prevents coups on {target}"))
            }
            Action::GeneralBlockCoup(p, attacker) => {
                f.write_fmt(format_args!("Player {p} blocks the coup by {attacker}"))
            }
            Action::JudgeBribe(p, target) => {
                f.write_fmt(format_args!("Player {p} cancels the bribe of {target}"))
            }
            Action::BlockTax(p, target) => {
                f.write_fmt(format_args!("Player {p} blocks the tax of {target}"))
            }
            Action::SkipTurn(p) => {
                f.write_fmt(format_args!("Player {p} skips"))
            }
            Action::EndTurn(p) => {
                f.write_fmt(format_args!("Player {p} ends their turn"))
            }
        }
    }
}

impl Session {
    /// Runs the same validation as applying the action, without applying it.
    pub fn check(&self, action: &Action) -> Result<()> {
        match *action {
            Action::Gather(p) => self.check_gather(p),
            Action::Tax(p) => self.check_tax(p),
            Action::Bribe(p) => self.check_bribe(p),
            Action::Sanction(p, target) => self.check_sanction(p, target),
            Action::Coup(p, target) => self.check_coup(p, target),
            Action::ConcedeCoup(p) => self.check_concede_coup(p).map(|_| ()),
            Action::Arrest(p, target) => self.check_arrest(p, target),
            Action::Invest(p) => self.check_invest(p),
            Action::SpyOn(p, target) => self.check_spy_on(p, target),
            Action::PreventCoup(p, target) => self.check_prevent_coup(p, target),
            Action::GeneralBlockCoup(p, attacker) => self.check_general_block_coup(p, attacker),
            Action::JudgeBribe(p, target) => self.check_judge_bribe(p, target),
            Action::BlockTax(p, target) => self.check_block_tax(p, target),
            Action::SkipTurn(p) | Action::EndTurn(p) => self.check_end_turn(p),
        }
    }

    pub fn apply(&mut self, action: &Action) -> Result<Outcome> {
        match *action {
            Action::Gather(p) => self.gather(p)?,
            Action::Tax(p) => self.tax(p)?,
            Action::Bribe(p) => self.bribe(p)?,
            Action::Sanction(p, target) => self.sanction(p, target)?,
            Action::Coup(p, target) => self.coup(p, target)?,
            Action::ConcedeCoup(p) => self.concede_coup(p)?,
            Action::Arrest(p, target) => self.arrest(p, target)?,
            Action::Invest(p) => self.invest(p)?,
            Action::SpyOn(p, target) => {
                let coins = self.spy_on(p, target)?;
                return Ok(Outcome::Revealed { target, coins });
            }
            Action::PreventCoup(p, target) => self.prevent_coup(p, target)?,
            Action::GeneralBlockCoup(p, attacker) => self.general_block_coup(p, attacker)?,
            Action::JudgeBribe(p, target) => self.judge_bribe(p, target)?,
            Action::BlockTax(p, target) => self.block_tax(p, target)?,
            Action::SkipTurn(p) => self.skip_turn(p)?,
            Action::EndTurn(p) => self.end_turn(p)?,
        }

        Ok(Outcome::Applied)
    }

    /// Every action that would currently succeed: the turn holder's moves
    /// first, then the reactions open to each living player in seat order.
    pub fn actions(&self) -> Vec<Action> {
        let mut actions = Vec::with_capacity(self.len() * 4);

        if let Ok(current) = self.current_player() {
            actions.push(Action::Gather(current));
            actions.push(Action::Tax(current));
            actions.push(Action::Bribe(current));
            actions.push(Action::Invest(current));

            for opponent in self.other_player_indexes(current) {
                actions.push(Action::Sanction(current, opponent));
                actions.push(Action::Coup(current, opponent));
                actions.push(Action::Arrest(current, opponent));
            }

            actions.push(Action::SkipTurn(current));
        }

        for reactor in self.players_indexes() {
            actions.push(Action::ConcedeCoup(reactor));
            for other in self.other_player_indexes(reactor) {
                actions.push(Action::SpyOn(reactor, other));
                actions.push(Action::PreventCoup(reactor, other));
                actions.push(Action::GeneralBlockCoup(reactor, other));
                actions.push(Action::JudgeBribe(reactor, other));
                actions.push(Action::BlockTax(reactor, other));
            }
        }

        actions.retain(|action| self.check(action).is_ok());
        actions
    }

    /// Living players other than `exclude`, in seat order after them.
    pub fn other_player_indexes(&self, exclude: PlayerId) -> Vec<PlayerId> {
        (1..self.len())
            .map(|n| PlayerId((exclude.0 + n) % self.len()))
            .filter(|id| self.player(*id).map_or(false, |p| p.is_alive()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::action::{Action, Outcome};
    use crate::error::GameError;
    use crate::session::{PlayerId, Session};
    use crate::Role::{Baron, General, Governor, Judge, Merchant, Spy};

    fn find_action(session: &Session, f: Box<dyn Fn(&Action) -> bool>) -> Action {
        let actions = session.actions();
        match actions.iter().find(|a| f(a)) {
            None => panic!("action was not found in {:?}", actions),
            Some(action) => *action,
        }
    }

    #[test]
    fn opening_moves() {
        let mut session = Session::new();
        let g = session.add_player("G", Governor).unwrap();
        let s = session.add_player("S", Spy).unwrap();

        let actions = session.actions();
        assert!(actions.contains(&Action::Gather(g)));
        assert!(actions.contains(&Action::Tax(g)));
        assert!(actions.contains(&Action::SkipTurn(g)));
        // nobody can afford anything, but the spy can always look
        assert!(actions.contains(&Action::SpyOn(s, g)));
        assert!(actions.contains(&Action::Arrest(g, s)));
        assert!(!actions.contains(&Action::Bribe(g)));
        assert!(!actions.contains(&Action::Coup(g, s)));
        assert!(!actions.contains(&Action::Gather(s)));
        assert_eq!(actions.len(), 5);
    }

    #[test]
    fn other_players() {
        let mut session = Session::new();
        for (name, role) in [("A", Governor), ("B", Spy), ("C", Baron), ("D", Judge)] {
            session.add_player(name, role).unwrap();
        }
        assert_eq!(session.other_player_indexes(PlayerId(0)), [PlayerId(1), PlayerId(2), PlayerId(3)]);
        assert_eq!(session.other_player_indexes(PlayerId(1)), [PlayerId(2), PlayerId(3), PlayerId(0)]);

        session.eliminate(PlayerId(2)).unwrap();
        assert_eq!(session.other_player_indexes(PlayerId(1)), [PlayerId(3), PlayerId(0)]);
    }

    #[test]
    fn coup_in_flight_leaves_only_responses() {
        let mut session = Session::new();
        let b = session.add_player("B", Baron).unwrap();
        let g = session.add_player("G", General).unwrap();
        let m = session.add_player("M", Merchant).unwrap();
        session.add_coins(b, 7).unwrap();
        session.add_coins(g, 5).unwrap();

        let coup = find_action(&session, Box::new(move |a| *a == Action::Coup(b, g)));
        session.apply(&coup).unwrap();

        let actions = session.actions();
        assert!(actions.contains(&Action::GeneralBlockCoup(g, b)));
        assert!(actions.contains(&Action::ConcedeCoup(g)));
        assert!(!actions.iter().any(|a| a.actor() == b));
        assert!(!actions.iter().any(|a| a.actor() == m));
        assert!(actions.iter().all(|a| a.is_reaction()));
    }

    #[test]
    fn apply_reports_spy_findings() {
        let mut session = Session::new();
        let s = session.add_player("S", Spy).unwrap();
        let j = session.add_player("J", Judge).unwrap();
        session.add_coins(j, 3).unwrap();

        assert_eq!(
            session.apply(&Action::SpyOn(s, j)),
            Ok(Outcome::Revealed { target: j, coins: 3 })
        );
        assert_eq!(session.apply(&Action::Gather(s)), Ok(Outcome::Applied));
        assert_eq!(session.apply(&Action::Gather(s)), Err(GameError::NotYourTurn));
    }

    #[test]
    fn every_listed_action_applies() {
        let mut session = Session::new();
        for (name, role) in [("G", Governor), ("S", Spy), ("B", Baron), ("J", Judge), ("M", Merchant), ("X", General)] {
            let id = session.add_player(name, role).unwrap();
            session.add_coins(id, 8).unwrap();
        }

        for action in session.actions() {
            let mut copy = session.clone();
            assert!(copy.apply(&action).is_ok(), "{:?}", action);
        }
    }

    #[test]
    fn serde_round_trip_of_commands() {
        let action = Action::GeneralBlockCoup(PlayerId(1), PlayerId(0));
        let json = serde_json::to_string(&action).unwrap();
        assert_eq!(json, r#"{"GeneralBlockCoup":[1,0]}"#);
        assert_eq!(serde_json::from_str::<Action>(&json).unwrap(), action);
        assert_eq!(format!("{:?}", action), "Player #1 blocks the coup by #0");
    }
}
