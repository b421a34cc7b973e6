use thiserror::Error;
use crate::Role;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("not your turn")]
    NotYourTurn,

    #[error("player is not alive")]
    DeadActor,

    #[error("sanctioned players cannot gather or tax")]
    Sanctioned,

    #[error("cannot target yourself")]
    SelfTargetNotAllowed,

    #[error("not enough coins: need {needed}, hold {held}")]
    InsufficientFunds { needed: u32, held: u32 },

    #[error("{role} cannot {action}")]
    RoleNotPermitted { role: Role, action: &'static str },

    #[error("no active effect to cancel")]
    NoActiveEffectToCancel,

    #[error("cannot arrest the same player twice in a row")]
    RepeatedArrestTarget,

    #[error("target is protected from arrest this round")]
    ArrestBlocked,

    #[error("already bribed this turn")]
    AlreadyBribed,

    #[error("previous tax/bribe must be resolved first")]
    PendingActionUnresolved,

    #[error("a coup is waiting for the target's response")]
    AwaitingCoupResponse,

    #[error("cannot block your own coup")]
    OwnCoup,

    #[error("player not found: {0}")]
    ActorNotFound(String),

    #[error("player name already taken: {0}")]
    DuplicateIdentity(String),

    #[error("no active players")]
    NoActivePlayers,

    #[error("no players in game")]
    EmptyRoster,

    #[error("game is not over yet")]
    GameNotOver,

    #[error("no winner")]
    NoWinner,
}

pub type Result<T> = std::result::Result<T, GameError>;
