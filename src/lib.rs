pub mod action;
pub mod actor;
pub mod config;
pub mod error;
pub mod session;

pub use action::{Action, Outcome};
pub use actor::{PendingAction, Player};
pub use config::{Rules, RulesError};
pub use error::{GameError, Result};
pub use session::{PlayerId, PlayerView, Session, SessionView};

use std::fmt::{Display, Formatter};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use crate::Role::{Baron, General, Governor, Judge, Merchant, Spy};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Governor,
    Spy,
    Baron,
    General,
    Judge,
    Merchant,
}

pub static ROLE_VARIANTS: [Role; 6] = [
    Governor,
    Spy,
    Baron,
    General,
    Judge,
    Merchant,
];

/// Role-gated special moves. Everything else is open to every role.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ability {
    Invest,
    SpyOn,
    BlockCoup,
    CancelBribe,
    BlockTax,
}

impl Role {
    /// Uniform role assignment for front ends building a roster.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Role {
        // the variant table is never empty
        *ROLE_VARIANTS.choose(rng).unwrap_or(&Governor)
    }

    pub fn has_ability(self, ability: Ability) -> bool {
        matches!(
            (self, ability),
            (Baron, Ability::Invest)
                | (Spy, Ability::SpyOn)
                | (General, Ability::BlockCoup)
                | (Judge, Ability::CancelBribe)
                | (Governor, Ability::BlockTax)
        )
    }

    pub fn tax_amount(self, rules: &Rules) -> u32 {
        match self {
            Governor => rules.governor_tax_amount,
            _ => rules.tax_amount,
        }
    }

    /// Extra coins granted on top of a gather or tax, judged on the balance
    /// before the gain.
    pub fn gather_bonus(self, coins_before: u32, rules: &Rules) -> u32 {
        match self {
            Merchant if coins_before >= rules.merchant_bonus_threshold => 1,
            _ => 0,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Governor => "Governor",
            Spy => "Spy",
            Baron => "Baron",
            General => "General",
            Judge => "Judge",
            Merchant => "Merchant",
        };
        f.write_str(name)
    }
}
