//! Publish gating decisions for extpub.
//!
//! Every credential-dependent step in the release workflow is gated on the
//! build context: production publishes only happen on tag builds, fork
//! builds never touch secrets, and signing is skipped (not failed) when no
//! key is available. The gates here are pure functions from context to a
//! [`StepDecision`], so the engine can act on them and the CLI can print
//! them.

use serde::{Deserialize, Serialize};

use extpub_env::EnvSource;

/// The build-context flags publishing decisions hang off.
///
/// Derived fresh from the environment source at detection time; nothing is
/// cached, so two detections against different sources give independent
/// answers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildContext {
    /// The build was triggered by a version-control tag push.
    pub tag_build: bool,
    /// The build originates from an external contributor's fork.
    pub fork: bool,
    /// Running under a CI provider.
    pub ci: bool,
}

impl BuildContext {
    /// Derive the flags from an environment source.
    pub fn detect(env: &EnvSource) -> Self {
        Self {
            tag_build: env.is_tag_build(),
            fork: env.is_fork(),
            ci: env.is_ci(),
        }
    }
}

/// Whether a gated step should run, and if not, why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepDecision {
    /// Run the step.
    Run,
    /// Skip the step; skipping is normal, not a failure.
    Skip { reason: String },
}

impl StepDecision {
    /// Build a skip decision with a reason.
    pub fn skip(reason: impl Into<String>) -> Self {
        StepDecision::Skip { reason: reason.into() }
    }

    /// Whether the step should run.
    pub fn is_run(&self) -> bool {
        matches!(self, StepDecision::Run)
    }
}

impl std::fmt::Display for StepDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepDecision::Run => write!(f, "run"),
            StepDecision::Skip { reason } => write!(f, "skip ({reason})"),
        }
    }
}

/// Gate for production publish steps: Sonatype staging release, plugin
/// portal upload, marketplace upload.
pub fn release_publish(ctx: &BuildContext) -> StepDecision {
    if ctx.fork {
        return StepDecision::skip("fork builds are denied publishing secrets");
    }
    if !ctx.tag_build {
        return StepDecision::skip("production publish only runs for tag builds");
    }
    StepDecision::Run
}

/// Gate for artifact signing.
///
/// No key means no signatures, not a failed build; the hard failure on tag
/// builds comes from the signing-key preflight gate, not from here.
pub fn signing(has_key: bool) -> StepDecision {
    if has_key {
        StepDecision::Run
    } else {
        StepDecision::skip("no complete GPG signing key in the environment")
    }
}

/// Gate for credential-dependent preflight on non-release builds.
///
/// Publishable artifacts are exercised at PR time so failures surface before
/// merge, but fork PRs skip this: they have no secrets to preflight with.
pub fn staging_preflight(ctx: &BuildContext) -> StepDecision {
    if ctx.fork {
        return StepDecision::skip("fork builds are denied publishing secrets");
    }
    StepDecision::Run
}

#[cfg(test)]
mod tests {
    use super::*;
    use extpub_env::{CI, CIRCLE_PR_USERNAME, CIRCLE_TAG};

    #[test]
    fn detect_reads_all_three_flags() {
        let env = EnvSource::testing([
            (CIRCLE_TAG, "1.2.3"),
            (CIRCLE_PR_USERNAME, ""),
            (CI, "true"),
        ]);
        assert_eq!(
            BuildContext::detect(&env),
            BuildContext { tag_build: true, fork: true, ci: true }
        );

        assert_eq!(
            BuildContext::detect(&EnvSource::Testing(Default::default())),
            BuildContext::default()
        );
    }

    #[test]
    fn release_runs_only_on_tag_builds() {
        let tag = BuildContext { tag_build: true, fork: false, ci: true };
        assert!(release_publish(&tag).is_run());

        let branch = BuildContext { tag_build: false, fork: false, ci: true };
        let decision = release_publish(&branch);
        assert!(!decision.is_run());
        assert!(decision.to_string().contains("tag builds"));
    }

    #[test]
    fn release_never_runs_for_forks() {
        let fork = BuildContext { tag_build: true, fork: true, ci: true };
        let decision = release_publish(&fork);
        assert_eq!(
            decision,
            StepDecision::skip("fork builds are denied publishing secrets")
        );
    }

    #[test]
    fn signing_skips_without_a_key() {
        assert!(signing(true).is_run());
        assert!(!signing(false).is_run());
    }

    #[test]
    fn preflight_skips_forks_only() {
        let fork = BuildContext { tag_build: false, fork: true, ci: true };
        assert!(!staging_preflight(&fork).is_run());

        let pr = BuildContext { tag_build: false, fork: false, ci: true };
        assert!(staging_preflight(&pr).is_run());

        let local = BuildContext::default();
        assert!(staging_preflight(&local).is_run());
    }

    #[test]
    fn decisions_serialize_as_plain_data() {
        let json = serde_json::to_string(&StepDecision::Run).expect("serialize");
        assert_eq!(json, "\"run\"");

        let json = serde_json::to_string(&StepDecision::skip("not a tag build"))
            .expect("serialize");
        assert_eq!(json, "{\"skip\":{\"reason\":\"not a tag build\"}}");

        let back: StepDecision = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, StepDecision::skip("not a tag build"));
    }
}
