//! Turn authority and the time-scoped relation tables.
//!
//! The session records facts (who sanctioned whom, which turn a bribe was
//! paid in, which coup is in flight). It does not judge whether an action is
//! legal; that happens in the actor operations before anything is recorded.

use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use crate::actor::{PendingAction, Player};
use crate::config::Rules;
use crate::error::{GameError, Result};
use crate::Role;

/// Stable handle to a player: its seat in the roster.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

impl Display for PlayerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub struct Session {
    // incremented on every advance, used to stamp the tables
    turn: usize,
    current_player_idx: usize,
    bank: u32,
    rules: Rules,
    players: Vec<Player>,

    sanctions: HashMap<PlayerId, usize>,
    arrest_blocks: HashMap<PlayerId, usize>,
    coup_blocks: HashMap<PlayerId, usize>,
    // target -> attacker
    coup_attempts: HashMap<PlayerId, PlayerId>,
    recent_coup_targets: HashSet<PlayerId>,
    // attacker -> last target
    arrest_log: HashMap<PlayerId, PlayerId>,
    bribe_log: HashMap<PlayerId, usize>,
    tax_log: HashMap<PlayerId, usize>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_rules(Rules::default())
    }

    pub fn with_rules(rules: Rules) -> Self {
        Self {
            turn: 0,
            current_player_idx: 0,
            bank: rules.starting_bank,
            rules,
            players: Vec::new(),
            sanctions: HashMap::new(),
            arrest_blocks: HashMap::new(),
            coup_blocks: HashMap::new(),
            coup_attempts: HashMap::new(),
            recent_coup_targets: HashSet::new(),
            arrest_log: HashMap::new(),
            bribe_log: HashMap::new(),
            tax_log: HashMap::new(),
        }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Seats a new player at the end of the turn order. The first player
    /// seated holds the first turn.
    pub fn add_player(&mut self, name: impl Into<String>, role: Role) -> Result<PlayerId> {
        let name = name.into();
        if self.players.iter().any(|p| p.name() == name) {
            return Err(GameError::DuplicateIdentity(name));
        }

        let id = PlayerId(self.players.len());
        debug!(player = %name, %role, seat = id.0, "player seated");
        self.players.push(Player::new(name, role));
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn players_indexes(&self) -> impl Iterator<Item=PlayerId> {
        (0..self.players.len()).map(PlayerId)
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player> {
        self.players.get(id.0).ok_or_else(|| GameError::ActorNotFound(id.to_string()))
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        self.players.get_mut(id.0).ok_or_else(|| GameError::ActorNotFound(id.to_string()))
    }

    pub fn player_id(&self, name: &str) -> Result<PlayerId> {
        self.players
            .iter()
            .position(|p| p.name() == name)
            .map(PlayerId)
            .ok_or_else(|| GameError::ActorNotFound(name.to_string()))
    }

    pub fn player_by_name(&self, name: &str) -> Result<&Player> {
        self.player(self.player_id(name)?)
    }

    /// Names of the players still in the game, in turn order.
    pub fn players_names(&self) -> Vec<&str> {
        self.players
            .iter()
            .filter(|p| p.is_alive())
            .map(|p| p.name())
            .collect()
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_alive()).count()
    }

    pub fn bank(&self) -> u32 {
        self.bank
    }

    pub fn turn(&self) -> usize {
        self.turn
    }

    pub fn current_player(&self) -> Result<PlayerId> {
        if self.players.is_empty() {
            return Err(GameError::EmptyRoster);
        }

        (0..self.players.len())
            .map(|n| (self.current_player_idx + n) % self.players.len())
            .find(|&idx| self.players[idx].is_alive())
            .map(PlayerId)
            .ok_or(GameError::NoActivePlayers)
    }

    pub fn turn_of(&self) -> Result<&str> {
        let id = self.current_player()?;
        Ok(self.player(id)?.name())
    }

    pub fn is_player_turn(&self, id: PlayerId) -> bool {
        self.current_player() == Ok(id)
    }

    fn next_living_player(&self, from: usize) -> Option<usize> {
        (1..=self.players.len())
            .map(|n| (from + n) % self.players.len())
            .find(|&idx| self.players[idx].is_alive())
    }

    /// Hands the turn to the next living player and expires the effects
    /// scoped to the turn boundary.
    pub fn advance_turn(&mut self) {
        if self.players.is_empty() {
            return;
        }

        let outgoing = self.current_player().map_or(self.current_player_idx, |id| id.0);
        if let Some(idx) = self.next_living_player(outgoing) {
            self.current_player_idx = idx;
        }
        self.turn += 1;

        let outgoing = PlayerId(outgoing);
        let incoming = PlayerId(self.current_player_idx);

        // a sanction covers the target's whole next turn
        self.sanctions.remove(&outgoing);

        self.arrest_blocks.remove(&incoming);
        self.coup_blocks.remove(&incoming);
        self.bribe_log.remove(&incoming);
        self.tax_log.remove(&incoming);
        self.clear_coup_marks();

        let player = &mut self.players[incoming.0];
        player.extra_action = false;
        player.pending = PendingAction::None;

        debug!(turn = self.turn, player = %player.name(), "turn begins");
    }

    pub fn eliminate(&mut self, id: PlayerId) -> Result<()> {
        if !self.player(id)?.is_alive() {
            return Err(GameError::DeadActor);
        }

        // move the turn pointer off the player while they still count as alive
        if self.is_player_turn(id) {
            self.advance_turn();
        }

        let player = self.player_mut(id)?;
        player.alive = false;
        player.extra_action = false;
        player.pending = PendingAction::None;
        warn!(player = %player.name(), "eliminated");

        // a coup left waiting on this player lands now and closes the attacker's turn
        let attacker = self.coup_attempts.remove(&id);
        self.purge(id);

        match attacker {
            Some(attacker) if self.is_player_turn(attacker) => self.finish_turn(attacker),
            _ => Ok(()),
        }
    }

    fn purge(&mut self, id: PlayerId) {
        self.sanctions.remove(&id);
        self.arrest_blocks.remove(&id);
        self.coup_blocks.remove(&id);
        self.recent_coup_targets.remove(&id);
        self.bribe_log.remove(&id);
        self.tax_log.remove(&id);
        self.coup_attempts.retain(|target, attacker| *target != id && *attacker != id);
        self.arrest_log.retain(|attacker, target| *attacker != id && *target != id);
    }

    pub fn winner(&self) -> Result<&str> {
        let mut alive = self.players.iter().filter(|p| p.is_alive());
        match (alive.next(), alive.next()) {
            (Some(winner), None) => Ok(winner.name()),
            (None, _) => Err(GameError::NoWinner),
            (Some(_), Some(_)) => Err(GameError::GameNotOver),
        }
    }

    /// Coin adjustment outside the action rules, e.g. a refund owed to a
    /// player or a house-rule starting purse.
    pub fn add_coins(&mut self, id: PlayerId, amount: u32) -> Result<()> {
        self.player_mut(id)?.add_coins(amount);
        Ok(())
    }

    pub fn remove_coins(&mut self, id: PlayerId, amount: u32) -> Result<()> {
        self.player_mut(id)?.remove_coins(amount)
    }

    pub fn add_coins_to_bank(&mut self, amount: u32) {
        self.bank = self.bank.saturating_add(amount);
    }

    pub fn apply_sanction(&mut self, target: PlayerId) {
        self.sanctions.insert(target, self.turn);
    }

    pub fn is_sanctioned(&self, id: PlayerId) -> bool {
        self.sanctions.contains_key(&id)
    }

    pub fn block_arrest(&mut self, target: PlayerId) {
        self.arrest_blocks.insert(target, self.turn);
    }

    pub fn is_arrest_blocked(&self, target: PlayerId) -> bool {
        self.arrest_blocks.contains_key(&target)
    }

    pub fn block_coup(&mut self, target: PlayerId) {
        self.coup_blocks.insert(target, self.turn);
    }

    pub fn is_coup_blocked(&self, target: PlayerId) -> bool {
        self.coup_blocks.contains_key(&target)
    }

    pub fn mark_bribe(&mut self, id: PlayerId) {
        self.bribe_log.insert(id, self.turn);
    }

    /// Only a bribe paid during the current turn counts.
    pub fn was_bribe_used_by(&self, id: PlayerId) -> bool {
        self.bribe_log.get(&id) == Some(&self.turn)
    }

    /// Undoes a bribe: the stamp goes, the bonus action goes, the coins come back.
    pub fn cancel_bribe(&mut self, id: PlayerId) -> Result<()> {
        if self.bribe_log.remove(&id).is_none() {
            return Err(GameError::NoActiveEffectToCancel);
        }

        let refund = self.rules.bribe_cost;
        let player = self.player_mut(id)?;
        player.extra_action = false;
        player.pending = PendingAction::None;
        player.add_coins(refund);
        debug!(player = %player.name(), refund, "bribe cancelled");
        Ok(())
    }

    pub fn mark_tax(&mut self, id: PlayerId) {
        self.tax_log.insert(id, self.turn);
    }

    /// A tax stays on record until the taxer's next turn begins.
    pub fn was_tax_used_by(&self, id: PlayerId) -> bool {
        self.tax_log.contains_key(&id)
    }

    /// Undoes a tax by clawing back exactly what the tax granted.
    pub fn cancel_tax(&mut self, id: PlayerId) -> Result<()> {
        if !self.was_tax_used_by(id) {
            return Err(GameError::NoActiveEffectToCancel);
        }

        let amount = self.player(id)?.role().tax_amount(&self.rules);
        let player = self.player_mut(id)?;
        player.remove_coins(amount)?;
        player.extra_action = false;
        player.pending = PendingAction::None;
        debug!(player = %player.name(), amount, "tax cancelled");

        self.tax_log.remove(&id);
        Ok(())
    }

    pub fn mark_coup_target(&mut self, target: PlayerId) {
        self.recent_coup_targets.insert(target);
    }

    pub fn was_coup_targeted(&self, target: PlayerId) -> bool {
        self.recent_coup_targets.contains(&target)
    }

    pub fn clear_coup_marks(&mut self) {
        self.recent_coup_targets.clear();
    }

    pub fn register_coup_attempt(&mut self, attacker: PlayerId, target: PlayerId) {
        self.coup_attempts.insert(target, attacker);
    }

    /// The attacker of the coup currently in flight against `target`.
    pub fn coup_attempt_against(&self, target: PlayerId) -> Option<PlayerId> {
        self.coup_attempts.get(&target).copied()
    }

    pub fn has_coup_in_flight(&self) -> bool {
        !self.coup_attempts.is_empty()
    }

    pub fn cancel_coup(&mut self, target: PlayerId) -> Option<PlayerId> {
        self.coup_attempts.remove(&target)
    }

    pub fn mark_arrest(&mut self, from: PlayerId, target: PlayerId) {
        self.arrest_log.insert(from, target);
    }

    pub fn was_arrested_by_me_last_turn(&self, source: PlayerId, target: PlayerId) -> bool {
        self.arrest_log.get(&source) == Some(&target)
    }

    pub fn snapshot(&self) -> SessionView {
        SessionView {
            turn: self.turn,
            current: self.turn_of().ok().map(str::to_string),
            bank: self.bank,
            players: self.players
                .iter()
                .map(|p| PlayerView {
                    name: p.name().to_string(),
                    role: p.role(),
                    coins: p.coins(),
                    alive: p.is_alive(),
                    pending: p.pending_action(),
                    extra_action: p.has_extra_action(),
                })
                .collect(),
        }
    }
}

/// Read-only picture of a session for front ends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub turn: usize,
    pub current: Option<String>,
    pub bank: u32,
    pub players: Vec<PlayerView>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub name: String,
    pub role: Role,
    pub coins: u32,
    pub alive: bool,
    pub pending: PendingAction,
    pub extra_action: bool,
}

#[cfg(test)]
mod tests {
    use crate::error::GameError;
    use crate::session::{PlayerId, Session};
    use crate::Role::{Baron, Governor, Judge, Merchant, Spy};

    fn three_players() -> (Session, PlayerId, PlayerId, PlayerId) {
        let mut session = Session::new();
        let a = session.add_player("A", Governor).unwrap();
        let b = session.add_player("B", Spy).unwrap();
        let c = session.add_player("C", Baron).unwrap();
        (session, a, b, c)
    }

    #[test]
    fn empty_roster() {
        let mut session = Session::new();
        assert_eq!(session.turn_of(), Err(GameError::EmptyRoster));
        assert_eq!(session.winner(), Err(GameError::NoWinner));

        // no-op
        session.advance_turn();
        assert_eq!(session.turn(), 0);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut session = Session::new();
        session.add_player("A", Governor).unwrap();
        assert_eq!(
            session.add_player("A", Judge),
            Err(GameError::DuplicateIdentity("A".to_string()))
        );
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn first_seated_player_starts() {
        let (session, a, _, _) = three_players();
        assert_eq!(session.turn_of(), Ok("A"));
        assert!(session.is_player_turn(a));
        assert_eq!(session.bank(), 50);
    }

    #[test]
    fn rotation_wraps() {
        let (mut session, _, _, _) = three_players();
        let mut order = Vec::new();
        for _ in 0..4 {
            session.advance_turn();
            order.push(session.turn_of().unwrap().to_string());
        }
        assert_eq!(order, ["B", "C", "A", "B"]);
        assert_eq!(session.turn(), 4);
    }

    #[test]
    fn rotation_skips_eliminated() {
        let (mut session, _, b, _) = three_players();
        session.eliminate(b).unwrap();
        session.advance_turn();
        assert_eq!(session.turn_of(), Ok("C"));
        assert_eq!(session.players_names(), ["A", "C"]);
    }

    #[test]
    fn eliminating_turn_holder_moves_turn_to_successor() {
        let (mut session, a, _, _) = three_players();
        session.eliminate(a).unwrap();
        assert_eq!(session.turn_of(), Ok("B"));
        assert!(!session.player(a).unwrap().is_alive());
    }

    #[test]
    fn elimination_is_not_repeatable() {
        let (mut session, _, b, _) = three_players();
        session.eliminate(b).unwrap();
        assert_eq!(session.eliminate(b), Err(GameError::DeadActor));
        assert_eq!(session.alive_count(), 2);
        assert!(matches!(session.eliminate(PlayerId(9)), Err(GameError::ActorNotFound(_))));
    }

    #[test]
    fn no_active_players() {
        let (mut session, a, b, c) = three_players();
        for id in [a, b, c] {
            session.eliminate(id).unwrap();
        }
        assert_eq!(session.turn_of(), Err(GameError::NoActivePlayers));
        assert_eq!(session.winner(), Err(GameError::NoWinner));
    }

    #[test]
    fn winner_needs_exactly_one_survivor() {
        let (mut session, a, b, _) = three_players();
        assert_eq!(session.winner(), Err(GameError::GameNotOver));
        session.eliminate(a).unwrap();
        session.eliminate(b).unwrap();
        assert_eq!(session.winner(), Ok("C"));
    }

    #[test]
    fn lookup_by_name() {
        let (session, _, b, _) = three_players();
        assert_eq!(session.player_id("B"), Ok(b));
        assert_eq!(session.player_by_name("B").unwrap().role(), Spy);
        assert_eq!(session.player_id("Z"), Err(GameError::ActorNotFound("Z".to_string())));
    }

    #[test]
    fn incoming_player_effects_expire() {
        let (mut session, a, b, _) = three_players();
        session.block_arrest(b);
        session.block_coup(b);
        session.mark_tax(b);
        session.mark_coup_target(a);

        session.advance_turn();

        assert!(!session.is_arrest_blocked(b));
        assert!(!session.is_coup_blocked(b));
        assert!(!session.was_tax_used_by(b));
        assert!(!session.was_coup_targeted(a));
    }

    #[test]
    fn sanction_survives_the_targets_turn() {
        let (mut session, _, b, _) = three_players();
        session.apply_sanction(b);

        // B's turn: still sanctioned
        session.advance_turn();
        assert!(session.is_sanctioned(b));

        // B's turn ended
        session.advance_turn();
        assert!(!session.is_sanctioned(b));
    }

    #[test]
    fn bribe_stamp_is_scoped_to_the_turn() {
        let (mut session, a, _, _) = three_players();
        session.mark_bribe(a);
        assert!(session.was_bribe_used_by(a));
        session.advance_turn();
        assert!(!session.was_bribe_used_by(a));
    }

    #[test]
    fn cancel_tax_claws_back_role_amount() {
        let mut session = Session::new();
        let g = session.add_player("G", Governor).unwrap();
        let m = session.add_player("M", Merchant).unwrap();

        session.add_coins(g, 3).unwrap();
        session.mark_tax(g);
        session.cancel_tax(g).unwrap();
        assert_eq!(session.player(g).unwrap().coins(), 0);

        session.add_coins(m, 1).unwrap();
        session.mark_tax(m);
        assert_eq!(
            session.cancel_tax(m),
            Err(GameError::InsufficientFunds { needed: 2, held: 1 })
        );
        // nothing changed
        assert!(session.was_tax_used_by(m));
        assert_eq!(session.player(m).unwrap().coins(), 1);

        assert_eq!(session.cancel_tax(g), Err(GameError::NoActiveEffectToCancel));
    }

    #[test]
    fn elimination_purges_every_table() {
        let (mut session, a, b, c) = three_players();
        session.apply_sanction(b);
        session.block_arrest(b);
        session.register_coup_attempt(b, c);
        session.register_coup_attempt(a, b);
        session.mark_arrest(a, b);
        session.mark_arrest(b, c);
        session.mark_coup_target(b);

        session.eliminate(b).unwrap();

        assert!(!session.is_sanctioned(b));
        assert!(!session.is_arrest_blocked(b));
        assert_eq!(session.coup_attempt_against(c), None);
        assert_eq!(session.coup_attempt_against(b), None);
        assert!(!session.was_arrested_by_me_last_turn(a, b));
        assert!(!session.was_arrested_by_me_last_turn(b, c));
        assert!(!session.was_coup_targeted(b));
    }

    #[test]
    fn bank_only_grows() {
        let (mut session, _, _, _) = three_players();
        session.add_coins_to_bank(3);
        assert_eq!(session.bank(), 53);
        session.add_coins_to_bank(u32::MAX);
        assert_eq!(session.bank(), u32::MAX);
    }

    #[test]
    fn snapshot_serializes() {
        let (mut session, _, b, _) = three_players();
        session.add_coins(b, 4).unwrap();
        session.advance_turn();

        let view = session.snapshot();
        assert_eq!(view.current.as_deref(), Some("B"));
        assert_eq!(view.players[1].coins, 4);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["players"][1]["role"], "Spy");
        assert_eq!(json["players"][1]["pending"], "None");
        assert_eq!(json["bank"], 50);
    }
}
