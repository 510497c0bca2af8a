#![no_main]

use libfuzzer_sys::fuzz_target;
use skinweight_data::{validate_data, validate_value, SkinWeightData};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(value) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };

    let accepted = validate_value(&value).is_ok();
    match SkinWeightData::from_value(value) {
        Ok(decoded) => {
            assert!(accepted);
            let _ = validate_data(&decoded);
            if let Ok(json) = decoded.to_json() {
                assert_eq!(SkinWeightData::from_json(&json).unwrap(), decoded);
            }
        }
        Err(_) => assert!(!accepted),
    }
});
