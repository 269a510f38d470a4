//! Build-environment resolution for extpub.
//!
//! This crate answers one question for the rest of the toolkit: what does the
//! CI environment look like right now? It resolves named variables from an
//! explicit source (the real process environment, or a fixed mapping used by
//! test harnesses to simulate CI runs) and derives the build-context flags
//! that gate publishing.
//!
//! # Example
//!
//! ```
//! use extpub_env::{CIRCLE_TAG, EnvSource};
//!
//! // Read the real process environment.
//! let env = EnvSource::Process;
//! let tag = env.lookup(CIRCLE_TAG);
//!
//! // Simulate a tag build deterministically.
//! let env = EnvSource::testing([(CIRCLE_TAG, "1.2.3")]);
//! assert!(env.is_tag_build());
//! ```

use std::collections::BTreeMap;
use std::env;

/// Set by CI to the git tag that triggered the build, when there is one.
pub const CIRCLE_TAG: &str = "CIRCLE_TAG";

/// Set by CI (to any value, possibly empty) when the build comes from an
/// external contributor's fork.
pub const CIRCLE_PR_USERNAME: &str = "CIRCLE_PR_USERNAME";

/// Set by CI providers on every build.
pub const CI: &str = "CI";

/// GPG key id used to sign release artifacts.
pub const GPG_SIGNING_KEY_ID: &str = "GPG_SIGNING_KEY_ID";

/// Base64-encoded ASCII-armored GPG secret key.
pub const GPG_SIGNING_KEY: &str = "GPG_SIGNING_KEY";

/// Passphrase for the GPG secret key.
pub const GPG_SIGNING_KEY_PASSWORD: &str = "GPG_SIGNING_KEY_PASSWORD";

/// Username for the Maven Central staging repository.
pub const SONATYPE_USERNAME: &str = "SONATYPE_USERNAME";

/// Password for the Maven Central staging repository.
pub const SONATYPE_PASSWORD: &str = "SONATYPE_PASSWORD";

/// API key for the Gradle Plugin Portal.
pub const GRADLE_KEY: &str = "GRADLE_KEY";

/// API secret for the Gradle Plugin Portal.
pub const GRADLE_SECRET: &str = "GRADLE_SECRET";

/// Upload token for the JetBrains plugin marketplace.
pub const JETBRAINS_PLUGIN_REPO_TOKEN: &str = "JETBRAINS_PLUGIN_REPO_TOKEN";

/// Key prefix under which a testing source stores its simulated variables.
pub const TESTING_PREFIX: &str = "__TESTING_";

/// Where variable lookups are resolved from.
///
/// The source is an explicit value passed to everything that reads the
/// environment, so a test harness selects `Testing` instead of flipping a
/// hidden process-wide switch. A `Testing` source never consults the real
/// process environment: a variable absent from its mapping is absent, full
/// stop.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EnvSource {
    /// Resolve from the real process environment.
    #[default]
    Process,
    /// Resolve variable `X` from the mapping under key `__TESTING_X`.
    Testing(BTreeMap<String, String>),
}

impl EnvSource {
    /// Build a testing source from unprefixed `(name, value)` pairs.
    pub fn testing<K, V>(vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        EnvSource::Testing(
            vars.into_iter()
                .map(|(name, value)| (format!("{TESTING_PREFIX}{}", name.into()), value.into()))
                .collect(),
        )
    }

    /// Resolve a variable's current value, or `None` if it is unset.
    ///
    /// Re-reads the source on every call; nothing is cached. Absence is a
    /// normal outcome, never an error.
    pub fn lookup(&self, name: &str) -> Option<String> {
        match self {
            EnvSource::Process => env::var(name).ok(),
            EnvSource::Testing(vars) => vars.get(&format!("{TESTING_PREFIX}{name}")).cloned(),
        }
    }

    /// Whether this build was triggered by a version-control tag push.
    ///
    /// True iff `CIRCLE_TAG` is present and non-empty. Production publish
    /// steps only run on tag builds.
    pub fn is_tag_build(&self) -> bool {
        self.lookup(CIRCLE_TAG).is_some_and(|tag| !tag.is_empty())
    }

    /// Whether this build comes from an external contributor's fork.
    ///
    /// True iff `CIRCLE_PR_USERNAME` is present; an empty value still counts.
    /// Fork builds are denied access to publishing secrets.
    pub fn is_fork(&self) -> bool {
        self.lookup(CIRCLE_PR_USERNAME).is_some()
    }

    /// Whether we appear to be running on a CI provider at all.
    pub fn is_ci(&self) -> bool {
        self.lookup(CI).is_some()
    }
}
