use proptest::prelude::*;

use peggy_types::{
    attestation_key, BridgeValidator, BridgedDenominator, ClaimDetails, EthAddress, Hash256, Valset,
};

proptest! {
    /// EthAddress display -> parse produces the identical address.
    #[test]
    fn eth_address_string_roundtrip(bytes in prop::array::uniform20(0u8..)) {
        let addr = EthAddress::new(bytes);
        let parsed: EthAddress = addr.to_string().parse().unwrap();
        prop_assert_eq!(parsed, addr);
    }

    /// Parsing ignores hex case.
    #[test]
    fn eth_address_parse_case_insensitive(bytes in prop::array::uniform20(0u8..)) {
        let upper = hex_upper(&bytes);
        let parsed: EthAddress = upper.parse().unwrap();
        prop_assert_eq!(parsed.as_bytes(), &bytes);
    }

    /// EthAddress bincode serialization roundtrip.
    #[test]
    fn eth_address_bincode_roundtrip(bytes in prop::array::uniform20(0u8..)) {
        let addr = EthAddress::new(bytes);
        let encoded = bincode::serialize(&addr).unwrap();
        let decoded: EthAddress = bincode::deserialize(&encoded).unwrap();
        prop_assert_eq!(decoded, addr);
    }

    /// Hash256::is_zero is true only for all-zero bytes.
    #[test]
    fn hash_is_zero_correct(bytes in prop::array::uniform32(0u8..)) {
        let hash = Hash256::new(bytes);
        prop_assert_eq!(hash.is_zero(), bytes == [0u8; 32]);
    }

    /// Valset member order is canonical regardless of input order.
    #[test]
    fn valset_order_is_canonical(
        mut members in prop::collection::vec((prop::array::uniform20(0u8..), 0u64..1_000), 0..12)
    ) {
        let as_validators = |m: &[([u8; 20], u64)]| -> Vec<BridgeValidator> {
            m.iter().map(|(a, p)| BridgeValidator::new(EthAddress::new(*a), *p)).collect()
        };
        let a = Valset::new(1, as_validators(&members));
        members.reverse();
        let b = Valset::new(1, as_validators(&members));
        prop_assert_eq!(&a, &b);
        for pair in a.members.windows(2) {
            let (x, y) = (&pair[0], &pair[1]);
            let tie_ordered = x.power == y.power && x.eth_address <= y.eth_address;
            prop_assert!(x.power > y.power || tie_ordered);
        }
    }

    /// Voucher denominations are always well formed and stable.
    #[test]
    fn voucher_denom_well_formed(
        bytes in prop::array::uniform20(0u8..),
        symbol in "[A-Za-z]{1,12}",
    ) {
        let d1 = BridgedDenominator::new(EthAddress::new(bytes), symbol.clone());
        let d2 = BridgedDenominator::new(EthAddress::new(bytes), symbol);
        prop_assert!(d1.voucher_denom.is_valid());
        prop_assert_eq!(d1.voucher_denom, d2.voucher_denom);
    }

    /// Distinct event nonces never share an attestation key for equal details.
    #[test]
    fn attestation_key_separates_nonces(
        a in 0u64..u64::MAX,
        b in 0u64..u64::MAX,
        batch in 0u64..100,
    ) {
        let details = ClaimDetails::WithdrawalBatch {
            token_contract: EthAddress::new([1; 20]),
            batch_nonce: batch,
        };
        prop_assert_eq!(attestation_key(a, &details) == attestation_key(b, &details), a == b);
    }
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}
