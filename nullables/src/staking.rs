//! Nullable staking: a validator set tests can change between messages.

use peggy_store::{StakingKeeper, ValidatorRecord};
use peggy_types::{AccAddress, ValAddress};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct NullStaking {
    validators: Mutex<BTreeMap<ValAddress, ValidatorRecord>>,
}

impl NullStaking {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(validator, orchestrator, power)` triples.
    pub fn with_validators(validators: &[(&str, &str, u64)]) -> Self {
        let staking = Self::new();
        for (validator, orchestrator, power) in validators {
            staking.set_validator(validator, orchestrator, *power);
        }
        staking
    }

    /// Add or replace a validator.
    pub fn set_validator(&self, validator: &str, orchestrator: &str, power: u64) {
        let record = ValidatorRecord {
            validator: ValAddress::new(validator),
            orchestrator: AccAddress::new(orchestrator),
            power,
        };
        self.validators
            .lock()
            .unwrap()
            .insert(record.validator.clone(), record);
    }

    pub fn set_power(&self, validator: &str, power: u64) {
        if let Some(record) = self
            .validators
            .lock()
            .unwrap()
            .get_mut(&ValAddress::new(validator))
        {
            record.power = power;
        }
    }

    /// Unbond and forget a validator.
    pub fn remove_validator(&self, validator: &str) {
        self.validators
            .lock()
            .unwrap()
            .remove(&ValAddress::new(validator));
    }
}

impl StakingKeeper for NullStaking {
    fn bonded_validators(&self) -> Vec<(ValAddress, u64)> {
        self.validators
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.power > 0)
            .map(|r| (r.validator.clone(), r.power))
            .collect()
    }

    fn validator_power(&self, validator: &ValAddress) -> Option<u64> {
        self.validators
            .lock()
            .unwrap()
            .get(validator)
            .map(|r| r.power)
            .filter(|p| *p > 0)
    }

    fn validator_for_orchestrator(&self, orchestrator: &AccAddress) -> Option<ValAddress> {
        self.validators
            .lock()
            .unwrap()
            .values()
            .find(|r| &r.orchestrator == orchestrator)
            .map(|r| r.validator.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn powers_can_change() {
        let staking =
            NullStaking::with_validators(&[("val-1", "orch-1", 10), ("val-2", "orch-2", 20)]);
        assert_eq!(staking.total_power(), 30);
        staking.set_power("val-1", 0);
        assert_eq!(staking.bonded_validators().len(), 1);
        assert_eq!(staking.validator_power(&ValAddress::new("val-1")), None);
        staking.remove_validator("val-2");
        assert_eq!(staking.total_power(), 0);
    }

    #[test]
    fn orchestrator_lookup() {
        let staking = NullStaking::with_validators(&[("val-1", "orch-1", 10)]);
        assert_eq!(
            staking.validator_for_orchestrator(&AccAddress::new("orch-1")),
            Some(ValAddress::new("val-1"))
        );
        assert_eq!(staking.validator_for_orchestrator(&AccAddress::new("val-1")), None);
    }
}
