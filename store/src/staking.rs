//! Validator set membership, as consumed by the bridge.

use peggy_types::{AccAddress, ValAddress};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A bonded validator, its voting power and the orchestrator key that
/// submits bridge messages on its behalf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorRecord {
    pub validator: ValAddress,
    pub orchestrator: AccAddress,
    pub power: u64,
}

pub trait StakingKeeper: Send + Sync {
    /// Bonded validators with non-zero power, ordered by identity.
    fn bonded_validators(&self) -> Vec<(ValAddress, u64)>;

    /// `None` when the validator is not bonded.
    fn validator_power(&self, validator: &ValAddress) -> Option<u64>;

    /// Resolve the orchestrator registry.
    fn validator_for_orchestrator(&self, orchestrator: &AccAddress) -> Option<ValAddress>;

    fn total_power(&self) -> u128 {
        self.bonded_validators()
            .iter()
            .map(|(_, power)| *power as u128)
            .sum()
    }
}

/// A fixed validator set, e.g. loaded from genesis configuration.
#[derive(Clone, Debug, Default)]
pub struct StaticStaking {
    validators: BTreeMap<ValAddress, ValidatorRecord>,
    orchestrators: BTreeMap<AccAddress, ValAddress>,
}

impl StaticStaking {
    /// Later records for the same validator replace earlier ones.
    pub fn new(records: impl IntoIterator<Item = ValidatorRecord>) -> Self {
        let mut staking = Self::default();
        for record in records {
            if let Some(old) = staking.validators.get(&record.validator) {
                staking.orchestrators.remove(&old.orchestrator);
            }
            staking
                .orchestrators
                .insert(record.orchestrator.clone(), record.validator.clone());
            staking.validators.insert(record.validator.clone(), record);
        }
        staking
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }
}

impl StakingKeeper for StaticStaking {
    fn bonded_validators(&self) -> Vec<(ValAddress, u64)> {
        self.validators
            .values()
            .filter(|r| r.power > 0)
            .map(|r| (r.validator.clone(), r.power))
            .collect()
    }

    fn validator_power(&self, validator: &ValAddress) -> Option<u64> {
        self.validators
            .get(validator)
            .map(|r| r.power)
            .filter(|p| *p > 0)
    }

    fn validator_for_orchestrator(&self, orchestrator: &AccAddress) -> Option<ValAddress> {
        self.orchestrators.get(orchestrator).cloned()
    }
}
