//! Property-based tests for canonicalization and signing
//!
//! These tests use proptest to verify protocol invariants across a wide range of inputs.

#[cfg(test)]
mod canonical_properties {
    use proptest::prelude::*;
    use vnpay_lib::canonical::{canonicalize, canonicalize_for_signing, encode_component};
    use vnpay_lib::params::fields;
    use vnpay_lib::ParameterSet;

    fn field_pairs() -> impl Strategy<Value = Vec<(String, String)>> {
        prop::collection::vec(("vnp_[a-z]{1,12}", "\\PC{1,24}"), 1..10)
    }

    proptest! {
        /// Insertion order never changes the canonical bytes
        #[test]
        fn canonicalize_is_order_independent(pairs in field_pairs()) {
            let forward: ParameterSet = pairs.iter().cloned().collect();
            let backward: ParameterSet = pairs.iter().rev().cloned().collect();

            // Duplicate names resolve differently by direction; compare only unique sets
            let unique: std::collections::HashSet<&String> = pairs.iter().map(|(k, _)| k).collect();
            prop_assume!(unique.len() == pairs.len());

            prop_assert_eq!(
                canonicalize_for_signing(&forward),
                canonicalize_for_signing(&backward)
            );
        }

        /// Percent-decoding an encoded component gives back the original
        #[test]
        fn encoding_round_trips(raw in "\\PC*") {
            let encoded = encode_component(&raw);
            let decoded = urlencoding::decode(&encoded).unwrap();
            prop_assert_eq!(decoded.as_ref(), raw.as_str());
        }

        /// Encoded output only contains unreserved characters and escapes
        #[test]
        fn encoding_is_strict(raw in "\\PC*") {
            let encoded = encode_component(&raw);
            prop_assert!(encoded
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || "-_.~%".contains(c)));
        }

        /// Pairs come out sorted by name and the signature fields never appear
        #[test]
        fn canonical_pairs_are_sorted(pairs in field_pairs(), hash in "[0-9a-f]{128}") {
            let mut params: ParameterSet = pairs.into_iter().collect();
            params.insert(fields::SECURE_HASH, hash);
            params.insert(fields::SECURE_HASH_TYPE, "HmacSHA512");

            let canonical = canonicalize(&params, &[fields::SECURE_HASH, fields::SECURE_HASH_TYPE]);
            let names: Vec<&str> = canonical
                .as_str()
                .split('&')
                .filter_map(|pair| pair.split_once('=').map(|(name, _)| name))
                .collect();

            let mut sorted = names.clone();
            sorted.sort_unstable();
            prop_assert_eq!(&names, &sorted);
            prop_assert!(!names.contains(&fields::SECURE_HASH));
            prop_assert!(!names.contains(&fields::SECURE_HASH_TYPE));
        }
    }
}

#[cfg(test)]
mod signature_properties {
    use proptest::prelude::*;
    use vnpay_lib::canonical::canonicalize_for_signing;
    use vnpay_lib::params::fields;
    use vnpay_lib::signing::{sign, verify, SIGNATURE_HEX_LEN};
    use vnpay_lib::{GatewayConfig, ParameterSet, PaymentOutcome, ReturnVerifier};

    proptest! {
        /// verify(k, c, sign(k, c)) holds for every key and message
        #[test]
        fn sign_then_verify(secret in "[ -~]{1,64}", message in "\\PC*") {
            let signature = sign(secret.as_bytes(), message.as_bytes()).unwrap();
            prop_assert_eq!(signature.as_str().len(), SIGNATURE_HEX_LEN);
            prop_assert!(signature.as_str().chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
            prop_assert!(verify(secret.as_bytes(), message.as_bytes(), signature.as_str()).unwrap());
        }

        /// A different key never verifies
        #[test]
        fn wrong_key_rejected(secret in "[a-z]{8,32}", message in "\\PC{1,64}") {
            let signature = sign(secret.as_bytes(), message.as_bytes()).unwrap();
            let other = format!("{}x", secret);
            prop_assert!(!verify(other.as_bytes(), message.as_bytes(), signature.as_str()).unwrap());
        }

        /// Changing any signed field turns a valid callback into InvalidSignature
        #[test]
        fn tampering_is_detected(
            pairs in prop::collection::btree_map("vnp_[a-z]{1,12}", "\\PC{1,24}", 1..10),
            pick in any::<prop::sample::Index>(),
        ) {
            let secret = "testkey";
            let config = GatewayConfig::new("DEMO0001", secret, "https://pay.test", "https://shop.test");
            let verifier = ReturnVerifier::new(&config);

            let mut params: ParameterSet = pairs.clone().into_iter().collect();
            params.insert(fields::RESPONSE_CODE, "00");
            params.insert(fields::AMOUNT, "100");
            let canonical = canonicalize_for_signing(&params);
            let signature = sign(secret.as_bytes(), canonical.as_bytes()).unwrap();
            params.insert(fields::SECURE_HASH, signature.into_string());

            prop_assert!(verifier.verify(&params).unwrap().signature_valid);

            let names: Vec<String> = params
                .iter()
                .filter(|(name, _)| *name != fields::SECURE_HASH)
                .map(|(name, _)| name.to_string())
                .collect();
            let target = pick.get(&names);
            let tampered_value = format!("{}x", params.get(target).unwrap());
            params.insert(target.clone(), tampered_value);

            let result = verifier.verify(&params).unwrap();
            prop_assert_eq!(result.outcome, PaymentOutcome::InvalidSignature);
        }
    }
}
