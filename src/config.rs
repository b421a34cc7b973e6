use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("failed to parse rules: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid rules: {0}")]
    Invalid(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub starting_bank: u32,
    pub gather_amount: u32,
    pub tax_amount: u32,
    pub governor_tax_amount: u32,
    pub merchant_bonus_threshold: u32,
    pub bribe_cost: u32,
    pub sanction_cost: u32,
    // paid to the bank when a Judge is sanctioned
    pub judge_sanction_fee: u32,
    pub coup_cost: u32,
    pub block_coup_cost: u32,
    pub invest_cost: u32,
    pub invest_return: u32,
    pub merchant_arrest_penalty: u32,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            starting_bank: 50,
            gather_amount: 1,
            tax_amount: 2,
            governor_tax_amount: 3,
            merchant_bonus_threshold: 3,
            bribe_cost: 4,
            sanction_cost: 3,
            judge_sanction_fee: 1,
            coup_cost: 7,
            block_coup_cost: 5,
            invest_cost: 3,
            invest_return: 6,
            merchant_arrest_penalty: 2,
        }
    }
}

impl Rules {
    pub fn from_json(json: &str) -> Result<Rules, RulesError> {
        let rules: Rules = serde_json::from_str(json)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        if self.coup_cost == 0 {
            return Err(RulesError::Invalid("coup_cost must be positive"));
        }
        if self.tax_amount == 0 || self.governor_tax_amount == 0 {
            return Err(RulesError::Invalid("tax amounts must be positive"));
        }
        if self.invest_return < self.invest_cost {
            return Err(RulesError::Invalid("invest_return must cover invest_cost"));
        }
        Ok(())
    }
}
