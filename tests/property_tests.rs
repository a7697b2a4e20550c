/// Property-based tests using proptest
/// Tests invariants of normalization and response interpretation for all inputs
use proptest::prelude::*;
use rust_pix_proxy::config::ChargeConfig;
use rust_pix_proxy::services::interpret_pix_response;
use rust_pix_proxy::validation::{digits_only, normalize_phone, NormalizedCpf};

// Property: formatting never changes the digit sequence
proptest! {
    #[test]
    fn formatted_cpf_normalizes_to_its_digits(cpf in "[0-9]{11}") {
        let formatted = format!("{}.{}.{}-{}",
            &cpf[0..3], &cpf[3..6], &cpf[6..9], &cpf[9..11]);

        let normalized = NormalizedCpf::parse(&formatted).unwrap();
        prop_assert_eq!(normalized.as_str(), cpf.as_str());
    }

    #[test]
    fn digits_only_keeps_order_and_drops_everything_else(raw in "\\PC*") {
        let digits = digits_only(&raw);
        prop_assert!(digits.chars().all(|c| c.is_ascii_digit()));
        let expected: String = raw.chars().filter(char::is_ascii_digit).collect();
        prop_assert_eq!(digits, expected);
    }

    #[test]
    fn cpf_accepted_iff_exactly_11_digits(raw in "[0-9 .\\-a-z]{0,24}") {
        let count = digits_only(&raw).len();
        prop_assert_eq!(NormalizedCpf::parse(&raw).is_ok(), count == 11);
    }
}

// Property: phone needs at least 10 digits
proptest! {
    #[test]
    fn phone_accepted_iff_at_least_10_digits(raw in "[0-9 ()\\-+]{0,20}") {
        let count = digits_only(&raw).len();
        match normalize_phone(&raw) {
            Ok(phone) => {
                prop_assert!(count >= 10);
                prop_assert_eq!(phone.len(), count);
            }
            Err(_) => prop_assert!(count < 10),
        }
    }
}

// Property: response interpretation never panics and never leaks a QR code on refusal
proptest! {
    #[test]
    fn pix_interpretation_never_panics(status in 100u16..600, raw in "\\PC*") {
        let _ = interpret_pix_response(status, &raw, &ChargeConfig::default());
    }

    #[test]
    fn refused_never_succeeds(qrcode in "[0-9A-Za-z]{0,40}", id in "[a-z0-9_]{1,12}") {
        let raw = serde_json::json!({
            "status": "refused",
            "id": id,
            "pix": {"qrcode": qrcode}
        })
        .to_string();

        let err = interpret_pix_response(200, &raw, &ChargeConfig::default()).unwrap_err();
        let body = err.to_body();
        prop_assert_eq!(&body["refused"], &serde_json::json!(true));
        prop_assert!(body.get("qrcode").is_none());
    }

    #[test]
    fn success_echoes_transaction_id(qrcode in "[0-9A-Za-z]{1,40}", id in "[a-z0-9_]{1,12}") {
        let raw = serde_json::json!({
            "status": "waiting_payment",
            "id": id.clone(),
            "pix": {"qrcode": qrcode.clone()}
        })
        .to_string();

        let result = interpret_pix_response(200, &raw, &ChargeConfig::default()).unwrap();
        prop_assert_eq!(result.transaction_id, Some(serde_json::json!(id)));
        prop_assert_eq!(result.qrcode, qrcode);
    }
}
