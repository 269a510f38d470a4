#![no_main]

use extpub_env::EnvSource;
use extpub_policy::BuildContext;
use libfuzzer_sys::fuzz_target;

// Lookups are total over arbitrary names and values; context detection must
// never panic.
fuzz_target!(|data: (Vec<(String, String)>, String)| {
    let (vars, probe) = data;

    let env = EnvSource::testing(vars);
    let _ = env.lookup(&probe);
    let _ = BuildContext::detect(&env);
});
