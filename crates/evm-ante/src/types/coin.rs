//! Coin amounts.

use core::{cmp::Ordering, fmt};

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{AnteError, Dec};

/// An integer amount of a single denomination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    /// The denomination.
    pub denom: String,
    /// The amount.
    pub amount: U256,
}

impl Coin {
    /// Creates a new coin.
    pub fn new(denom: impl Into<String>, amount: impl Into<U256>) -> Self {
        Self { denom: denom.into(), amount: amount.into() }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A list of coins, at most one per denomination.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Deref,
    derive_more::From,
)]
pub struct Coins(Vec<Coin>);

impl Coins {
    /// Creates a new coin list.
    pub const fn new(coins: Vec<Coin>) -> Self {
        Self(coins)
    }

    /// Creates a coin list holding a single coin.
    pub fn single(denom: impl Into<String>, amount: impl Into<U256>) -> Self {
        Self(vec![Coin::new(denom, amount)])
    }

    /// Returns the amount of the given denomination, or zero if absent.
    pub fn amount_of(&self, denom: &str) -> U256 {
        self.0.iter().find(|coin| coin.denom == denom).map_or(U256::ZERO, |coin| coin.amount)
    }

    /// Returns `true` if every amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|coin| coin.amount.is_zero())
    }

    /// Checks that denominations are non-empty and strictly ascending, so that each appears once.
    pub fn validate(&self) -> Result<(), AnteError> {
        if self.0.iter().any(|coin| coin.denom.is_empty()) {
            return Err(AnteError::InvalidCoins(format!("empty denomination in {self}")));
        }
        for pair in self.0.windows(2) {
            match pair[0].denom.cmp(&pair[1].denom) {
                Ordering::Less => {}
                Ordering::Equal => {
                    return Err(AnteError::InvalidCoins(format!(
                        "duplicate denomination {}",
                        pair[0].denom
                    )))
                }
                Ordering::Greater => {
                    return Err(AnteError::InvalidCoins(format!("{self} is not sorted")))
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, coin) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{coin}")?;
        }
        Ok(())
    }
}

/// A decimal amount of a single denomination, used for gas prices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecCoin {
    /// The denomination.
    pub denom: String,
    /// The amount.
    pub amount: Dec,
}

impl DecCoin {
    /// Creates a new decimal coin.
    pub fn new(denom: impl Into<String>, amount: Dec) -> Self {
        Self { denom: denom.into(), amount }
    }
}

/// A list of decimal coins, at most one per denomination.
#[derive(
    Debug,
    Clone,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Deref,
    derive_more::From,
)]
pub struct DecCoins(Vec<DecCoin>);

impl DecCoins {
    /// Creates a new decimal coin list.
    pub const fn new(coins: Vec<DecCoin>) -> Self {
        Self(coins)
    }

    /// Returns the amount of the given denomination, or zero if absent.
    pub fn amount_of(&self, denom: &str) -> Dec {
        self.0.iter().find(|coin| coin.denom == denom).map_or(Dec::ZERO, |coin| coin.amount)
    }

    /// Returns `true` if every amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|coin| coin.amount.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_of() {
        let coins = Coins::new(vec![Coin::new("aevm", U256::from(10u64)), Coin::new("stake", U256::from(3u64))]);
        assert_eq!(coins.amount_of("stake"), U256::from(3));
        assert_eq!(coins.amount_of("atom"), U256::ZERO);
        assert_eq!(coins.to_string(), "10aevm,3stake");
        assert!(!coins.is_zero());
        assert!(Coins::default().is_zero());
    }

    #[test]
    fn test_validate() {
        assert_eq!(Coins::default().validate(), Ok(()));
        let sorted = Coins::new(vec![Coin::new("aevm", U256::from(10u64)), Coin::new("stake", U256::from(3u64))]);
        assert_eq!(sorted.validate(), Ok(()));

        let duplicate = Coins::new(vec![Coin::new("aevm", U256::from(10u64)), Coin::new("aevm", U256::from(3u64))]);
        assert_eq!(
            duplicate.validate(),
            Err(AnteError::InvalidCoins("duplicate denomination aevm".to_string()))
        );
        let unsorted = Coins::new(vec![Coin::new("stake", U256::from(3u64)), Coin::new("aevm", U256::from(10u64))]);
        assert!(matches!(unsorted.validate(), Err(AnteError::InvalidCoins(_))));
        assert!(Coins::single("", U256::from(1u64)).validate().is_err());
    }
}
