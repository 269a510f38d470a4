#![no_main]

use extpub_policy::StepDecision;
use libfuzzer_sys::fuzz_target;

// Decisions are wire data for diagnostics: any decision that parses must
// round-trip unchanged.
fuzz_target!(|data: &[u8]| {
    let Ok(decision) = serde_json::from_slice::<StepDecision>(data) else {
        return;
    };

    let json = serde_json::to_vec(&decision).expect("serializing a parsed decision");
    let back: StepDecision = serde_json::from_slice(&json).expect("round-trip");
    assert_eq!(decision, back);
});
