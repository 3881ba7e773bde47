// Raffle Draw Engine - Prizes
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Prize {
    pub name: String,
    pub description: Option<String>,
}

impl Prize {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// How prizes map onto winner positions
#[derive(BorshSerialize, BorshDeserialize, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "mode", content = "value", rename_all = "lowercase")]
pub enum PrizeConfig {
    /// Every winner receives the same prize
    Same(Prize),
    /// Prizes by position; positions past the end get the last prize
    Sequential(Vec<Prize>),
}

/// Prize for the winner at 0-based `position`.
pub fn prize_for(config: Option<&PrizeConfig>, position: usize) -> Option<&Prize> {
    match config? {
        PrizeConfig::Same(prize) => Some(prize),
        PrizeConfig::Sequential(prizes) => {
            let last = prizes.len().checked_sub(1)?;
            prizes.get(position.min(last))
        }
    }
}
