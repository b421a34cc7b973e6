//! Players and the role-gated actions they take.
//!
//! Every operation runs its checks first and only then touches state, so a
//! rejected action leaves the session exactly as it was. The `check_*`
//! functions are also what `Session::check` uses to enumerate legal actions.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use crate::error::{GameError, Result};
use crate::session::{PlayerId, Session};
use crate::{Ability, Role};

/// A tax or bribe that another player may still reverse.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingAction {
    #[default]
    None,
    Tax,
    Bribe,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Player {
    name: String,
    role: Role,
    pub(crate) coins: u32,
    pub(crate) alive: bool,
    // granted by a bribe, spent by the next turn-ending action
    pub(crate) extra_action: bool,
    pub(crate) pending: PendingAction,
}

impl Player {
    pub(crate) fn new(name: String, role: Role) -> Self {
        Self {
            name,
            role,
            coins: 0,
            alive: true,
            extra_action: false,
            pending: PendingAction::None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn has_extra_action(&self) -> bool {
        self.extra_action
    }

    pub fn pending_action(&self) -> PendingAction {
        self.pending
    }

    pub(crate) fn add_coins(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }

    pub(crate) fn remove_coins(&mut self, amount: u32) -> Result<()> {
        self.can_afford(amount)?;
        self.coins -= amount;
        Ok(())
    }

    fn can_afford(&self, amount: u32) -> Result<()> {
        if self.coins < amount {
            return Err(GameError::InsufficientFunds { needed: amount, held: self.coins });
        }
        Ok(())
    }

    fn require(&self, ability: Ability, action: &'static str) -> Result<()> {
        if !self.role.has_ability(ability) {
            return Err(GameError::RoleNotPermitted { role: self.role, action });
        }
        Ok(())
    }
}

// checks
impl Session {
    fn check_alive(&self, id: PlayerId) -> Result<&Player> {
        let player = self.player(id)?;
        if !player.is_alive() {
            return Err(GameError::DeadActor);
        }
        Ok(player)
    }

    /// Alive, holding the turn, and no coup waiting on a response.
    fn check_turn(&self, id: PlayerId) -> Result<&Player> {
        let player = self.check_alive(id)?;
        if !self.is_player_turn(id) {
            return Err(GameError::NotYourTurn);
        }
        if self.has_coup_in_flight() {
            return Err(GameError::AwaitingCoupResponse);
        }
        Ok(player)
    }

    fn check_target(&self, actor: PlayerId, target: PlayerId) -> Result<&Player> {
        if actor == target {
            return Err(GameError::SelfTargetNotAllowed);
        }
        self.check_alive(target)
    }

    pub(crate) fn check_gather(&self, id: PlayerId) -> Result<()> {
        self.check_turn(id)?;
        if self.is_sanctioned(id) {
            return Err(GameError::Sanctioned);
        }
        Ok(())
    }

    pub(crate) fn check_tax(&self, id: PlayerId) -> Result<()> {
        let player = self.check_turn(id)?;
        if self.is_sanctioned(id) {
            return Err(GameError::Sanctioned);
        }
        if player.pending != PendingAction::None {
            return Err(GameError::PendingActionUnresolved);
        }
        Ok(())
    }

    pub(crate) fn check_bribe(&self, id: PlayerId) -> Result<()> {
        let player = self.check_turn(id)?;
        player.can_afford(self.rules().bribe_cost)?;
        if self.was_bribe_used_by(id) {
            return Err(GameError::AlreadyBribed);
        }
        if player.pending != PendingAction::None {
            return Err(GameError::PendingActionUnresolved);
        }
        Ok(())
    }

    pub(crate) fn check_sanction(&self, id: PlayerId, target: PlayerId) -> Result<()> {
        let player = self.check_turn(id)?;
        self.check_target(id, target)?;
        player.can_afford(self.rules().sanction_cost)
    }

    pub(crate) fn check_coup(&self, id: PlayerId, target: PlayerId) -> Result<()> {
        let player = self.check_turn(id)?;
        self.check_target(id, target)?;
        player.can_afford(self.rules().coup_cost)
    }

    pub(crate) fn check_concede_coup(&self, target: PlayerId) -> Result<PlayerId> {
        self.check_alive(target)?;
        self.coup_attempt_against(target).ok_or(GameError::NoActiveEffectToCancel)
    }

    pub(crate) fn check_arrest(&self, id: PlayerId, target: PlayerId) -> Result<()> {
        self.check_turn(id)?;
        let victim = self.check_target(id, target)?;
        if self.is_arrest_blocked(target) {
            return Err(GameError::ArrestBlocked);
        }
        if self.was_arrested_by_me_last_turn(id, target) {
            return Err(GameError::RepeatedArrestTarget);
        }
        if victim.role() == Role::Merchant {
            victim.can_afford(self.rules().merchant_arrest_penalty)?;
        }
        Ok(())
    }

    pub(crate) fn check_invest(&self, id: PlayerId) -> Result<()> {
        let player = self.check_turn(id)?;
        player.require(Ability::Invest, "invest")?;
        player.can_afford(self.rules().invest_cost)
    }

    pub(crate) fn check_spy_on(&self, id: PlayerId, target: PlayerId) -> Result<()> {
        let player = self.check_alive(id)?;
        player.require(Ability::SpyOn, "spy on")?;
        self.check_target(id, target)?;
        Ok(())
    }

    pub(crate) fn check_prevent_coup(&self, id: PlayerId, target: PlayerId) -> Result<()> {
        let player = self.check_alive(id)?;
        player.require(Ability::BlockCoup, "prevent a coup")?;
        self.check_target(id, target)?;
        if self.coup_attempt_against(target) == Some(id) {
            return Err(GameError::OwnCoup);
        }
        player.can_afford(self.rules().block_coup_cost)
    }

    pub(crate) fn check_general_block_coup(&self, id: PlayerId, attacker: PlayerId) -> Result<()> {
        let player = self.check_alive(id)?;
        player.require(Ability::BlockCoup, "block a coup")?;
        if self.coup_attempt_against(id) != Some(attacker) {
            return Err(GameError::NoActiveEffectToCancel);
        }
        player.can_afford(self.rules().block_coup_cost)
    }

    pub(crate) fn check_judge_bribe(&self, id: PlayerId, target: PlayerId) -> Result<()> {
        self.check_alive(id)?.require(Ability::CancelBribe, "cancel a bribe")?;
        let briber = self.check_target(id, target)?;
        if !self.was_bribe_used_by(target) || briber.pending != PendingAction::Bribe {
            return Err(GameError::NoActiveEffectToCancel);
        }
        Ok(())
    }

    pub(crate) fn check_block_tax(&self, id: PlayerId, target: PlayerId) -> Result<()> {
        self.check_alive(id)?.require(Ability::BlockTax, "block tax")?;
        let taxer = self.check_target(id, target)?;
        if !self.was_tax_used_by(target) || taxer.pending != PendingAction::Tax {
            return Err(GameError::NoActiveEffectToCancel);
        }
        taxer.can_afford(taxer.role().tax_amount(self.rules()))
    }

    pub(crate) fn check_end_turn(&self, id: PlayerId) -> Result<()> {
        self.check_turn(id)?;
        Ok(())
    }
}

// actions
impl Session {
    /// Takes 1 coin, plus the Merchant bonus. Replaces any pending tax/bribe.
    pub fn gather(&mut self, id: PlayerId) -> Result<()> {
        self.check_gather(id)?;

        let gather_amount = self.rules().gather_amount;
        let bonus = self.player(id)?.role().gather_bonus(self.player(id)?.coins(), self.rules());
        let player = self.player_mut(id)?;
        player.pending = PendingAction::None;
        player.add_coins(gather_amount.saturating_add(bonus));
        info!(actor = %player.name(), bonus, coins = player.coins(), "gathered");

        self.finish_turn(id)
    }

    /// Takes 2 coins (3 for a Governor), plus the Merchant bonus. The tax
    /// stays contestable until the taxer's next turn begins.
    pub fn tax(&mut self, id: PlayerId) -> Result<()> {
        self.check_tax(id)?;

        let player = self.player(id)?;
        let amount = player.role().tax_amount(self.rules()).saturating_add(player.role().gather_bonus(player.coins(), self.rules()));
        let player = self.player_mut(id)?;
        player.add_coins(amount);
        player.pending = PendingAction::Tax;
        info!(actor = %player.name(), amount, coins = player.coins(), "taxed");
        self.mark_tax(id);

        self.finish_turn(id)
    }

    /// Pays for one extra action this turn. The turn is kept.
    pub fn bribe(&mut self, id: PlayerId) -> Result<()> {
        self.check_bribe(id)?;

        let cost = self.rules().bribe_cost;
        let player = self.player_mut(id)?;
        player.remove_coins(cost)?;
        player.extra_action = true;
        player.pending = PendingAction::Bribe;
        info!(actor = %player.name(), coins = player.coins(), "bribed for an extra action");
        self.mark_bribe(id);
        Ok(())
    }

    /// Stops the target from gathering or taxing through their next turn.
    pub fn sanction(&mut self, id: PlayerId, target: PlayerId) -> Result<()> {
        self.check_sanction(id, target)?;

        let cost = self.rules().sanction_cost;
        let player = self.player_mut(id)?;
        player.pending = PendingAction::None;
        player.remove_coins(cost)?;

        if self.player(target)?.role() == Role::Judge {
            self.add_coins_to_bank(self.rules().judge_sanction_fee);
        }
        self.apply_sanction(target);
        info!(actor = %self.player(id)?.name(), target = %self.player(target)?.name(), "sanctioned");

        self.finish_turn(id)
    }

    /// Pays 7 coins to eliminate the target. A coup-blocked target survives
    /// and the coins are still spent. A General who can afford a block gets
    /// to answer before the coup lands.
    pub fn coup(&mut self, id: PlayerId, target: PlayerId) -> Result<()> {
        self.check_coup(id, target)?;

        let cost = self.rules().coup_cost;
        let player = self.player_mut(id)?;
        player.pending = PendingAction::None;
        player.remove_coins(cost)?;

        self.register_coup_attempt(id, target);
        self.mark_coup_target(target);

        let victim = self.player(target)?;
        if self.is_coup_blocked(target) {
            info!(actor = %self.player(id)?.name(), target = %victim.name(), "coup blocked, coins lost");
            self.cancel_coup(target);
        } else if victim.role() == Role::General && victim.coins() >= self.rules().block_coup_cost {
            info!(actor = %self.player(id)?.name(), target = %victim.name(), "coup awaiting response");
            return Ok(());
        } else {
            info!(actor = %self.player(id)?.name(), target = %victim.name(), "coup");
            self.cancel_coup(target);
            self.eliminate(target)?;
        }

        self.finish_turn(id)
    }

    /// The target of a coup in flight accepts it.
    pub fn concede_coup(&mut self, target: PlayerId) -> Result<()> {
        let attacker = self.check_concede_coup(target)?;

        self.cancel_coup(target);
        self.eliminate(target)?;
        self.finish_turn(attacker)
    }

    pub fn arrest(&mut self, id: PlayerId, target: PlayerId) -> Result<()> {
        self.check_arrest(id, target)?;

        self.player_mut(id)?.pending = PendingAction::None;
        self.mark_arrest(id, target);

        match self.player(target)?.role() {
            Role::General => {
                debug!(target = %self.player(target)?.name(), "arrest negated");
            }
            Role::Merchant => {
                let penalty = self.rules().merchant_arrest_penalty;
                self.player_mut(target)?.remove_coins(penalty)?;
                self.add_coins_to_bank(penalty);
            }
            _ => {
                if self.player(target)?.coins() > 0 {
                    self.player_mut(target)?.remove_coins(1)?;
                    self.player_mut(id)?.add_coins(1);
                }
            }
        }
        info!(actor = %self.player(id)?.name(), target = %self.player(target)?.name(), "arrested");

        self.finish_turn(id)
    }

    pub fn invest(&mut self, id: PlayerId) -> Result<()> {
        self.check_invest(id)?;

        let (cost, gain) = (self.rules().invest_cost, self.rules().invest_return);
        let player = self.player_mut(id)?;
        player.pending = PendingAction::None;
        player.remove_coins(cost)?;
        player.add_coins(gain);
        info!(actor = %player.name(), coins = player.coins(), "invested");

        self.finish_turn(id)
    }

    /// Reveals the target's coins and shields the target from arrest until
    /// their next turn. Free: needs no turn and spends none.
    pub fn spy_on(&mut self, id: PlayerId, target: PlayerId) -> Result<u32> {
        self.check_spy_on(id, target)?;

        self.block_arrest(target);
        let coins = self.player(target)?.coins();
        info!(actor = %self.player(id)?.name(), target = %self.player(target)?.name(), coins, "spied");
        Ok(coins)
    }

    /// General protects another player from coups until that player's next
    /// turn, voiding one already in flight.
    pub fn prevent_coup(&mut self, id: PlayerId, target: PlayerId) -> Result<()> {
        self.check_prevent_coup(id, target)?;

        let cost = self.rules().block_coup_cost;
        self.player_mut(id)?.remove_coins(cost)?;
        self.block_coup(target);
        info!(actor = %self.player(id)?.name(), target = %self.player(target)?.name(), "coup prevented");

        match self.coup_attempt_against(target) {
            Some(attacker) => self.repel_coup(target, attacker),
            None => Ok(()),
        }
    }

    /// General answers a coup aimed at themselves.
    pub fn general_block_coup(&mut self, id: PlayerId, attacker: PlayerId) -> Result<()> {
        self.check_general_block_coup(id, attacker)?;

        let cost = self.rules().block_coup_cost;
        self.player_mut(id)?.remove_coins(cost)?;
        info!(actor = %self.player(id)?.name(), attacker = %self.player(attacker)?.name(), "blocked coup");

        self.repel_coup(id, attacker)
    }

    /// Voids the coup on `target`, refunds the attacker up to the coup cost,
    /// and closes the attacker's turn.
    fn repel_coup(&mut self, target: PlayerId, attacker: PlayerId) -> Result<()> {
        self.cancel_coup(target);

        let coup_cost = self.rules().coup_cost;
        let player = self.player_mut(attacker)?;
        if player.coins < coup_cost {
            let refund = coup_cost - player.coins;
            player.add_coins(refund);
        }

        if self.is_player_turn(attacker) {
            self.finish_turn(attacker)?;
        }
        Ok(())
    }

    /// Judge reverses a bribe paid this turn: coins refunded, extra action
    /// gone, and the briber's turn ends.
    pub fn judge_bribe(&mut self, id: PlayerId, target: PlayerId) -> Result<()> {
        self.check_judge_bribe(id, target)?;

        self.cancel_bribe(target)?;
        info!(actor = %self.player(id)?.name(), target = %self.player(target)?.name(), "bribe cancelled");

        if self.is_player_turn(target) {
            self.finish_turn(target)?;
        }
        Ok(())
    }

    /// Governor reverses a tax that is still on record.
    pub fn block_tax(&mut self, id: PlayerId, target: PlayerId) -> Result<()> {
        self.check_block_tax(id, target)?;

        self.cancel_tax(target)?;
        info!(actor = %self.player(id)?.name(), target = %self.player(target)?.name(), "tax blocked");

        if self.is_player_turn(target) {
            self.finish_turn(target)?;
        }
        Ok(())
    }

    /// Passes without acting, e.g. a sanctioned player with nothing affordable.
    pub fn skip_turn(&mut self, id: PlayerId) -> Result<()> {
        self.check_end_turn(id)?;
        debug!(actor = %self.player(id)?.name(), "skipped");
        self.finish_turn(id)
    }

    pub fn end_turn(&mut self, id: PlayerId) -> Result<()> {
        self.check_end_turn(id)?;
        self.finish_turn(id)
    }

    /// Spends the bribe's extra action if there is one, otherwise hands the
    /// turn on.
    pub(crate) fn finish_turn(&mut self, id: PlayerId) -> Result<()> {
        let player = self.player_mut(id)?;
        if player.extra_action {
            player.extra_action = false;
            debug!(actor = %player.name(), "extra action spent");
            return Ok(());
        }

        self.clear_coup_marks();
        self.advance_turn();
        Ok(())
    }
}
