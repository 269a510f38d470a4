#![no_main]

use extpub_credentials::GpgSigningKey;
use extpub_env::{EnvSource, GPG_SIGNING_KEY, GPG_SIGNING_KEY_ID, GPG_SIGNING_KEY_PASSWORD};
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes as the transported key: assembly must either produce a key
// or a typed error, never panic.
fuzz_target!(|data: &[u8]| {
    let Ok(base64_key) = std::str::from_utf8(data) else {
        return;
    };

    let env = EnvSource::testing([
        (GPG_SIGNING_KEY_ID, "FUZZ"),
        (GPG_SIGNING_KEY, base64_key),
        (GPG_SIGNING_KEY_PASSWORD, "fuzz"),
    ]);

    let _ = GpgSigningKey::from_env(&env);
});
