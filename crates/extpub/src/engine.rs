//! Readiness assessment and the gated step runner.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use extpub_credentials::{
    GpgSigningKey, JetBrainsToken, PortalCredentials, SonatypeCredentials, missing_gpg_vars,
};
use extpub_env::EnvSource;
use extpub_heartbeat::with_heartbeat;
use extpub_policy::{BuildContext, StepDecision};

pub trait Reporter {
    fn info(&mut self, msg: &str);
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);
}

/// Which credential bundles could be assembled. Presence only — the secret
/// values themselves never appear in a readiness report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialPresence {
    /// Complete GPG signing key (id, key material, passphrase).
    pub gpg_signing_key: bool,
    /// Maven Central staging username and password.
    pub sonatype: bool,
    /// Gradle Plugin Portal key and secret.
    pub gradle_portal: bool,
    /// JetBrains marketplace token.
    pub jetbrains: bool,
}

/// Gating decisions for each release step family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDecisions {
    /// Production publishes (staging release, portal/marketplace uploads).
    pub release_publish: StepDecision,
    /// Artifact signing.
    pub signing: StepDecision,
    /// Credential-dependent preflight on non-release builds.
    pub staging_preflight: StepDecision,
}

/// Everything the environment says about this build's ability to release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseReadiness {
    pub context: BuildContext,
    pub credentials: CredentialPresence,
    pub decisions: StepDecisions,
}

impl ReleaseReadiness {
    /// Assess the build context and credential presence in one pass.
    ///
    /// On CI, each missing GPG variable is warned about individually before
    /// signing is decided — matching what an operator staring at a silent
    /// unsigned release needs to see. A present-but-malformed signing key is
    /// a hard error, not a skip.
    pub fn assess(env: &EnvSource, reporter: &mut dyn Reporter) -> Result<Self> {
        let context = BuildContext::detect(env);

        if context.ci {
            for var in missing_gpg_vars(env) {
                reporter.warn(&format!(
                    "could not find environment variable {var}, signing will be disabled"
                ));
            }
        }

        let signing_key = GpgSigningKey::from_env(env)
            .context("failed to assemble the GPG signing key from the environment")?;

        let credentials = CredentialPresence {
            gpg_signing_key: signing_key.is_some(),
            sonatype: SonatypeCredentials::from_env(env).is_some(),
            gradle_portal: PortalCredentials::from_env(env).is_some(),
            jetbrains: JetBrainsToken::from_env(env).is_some(),
        };

        let decisions = StepDecisions {
            release_publish: extpub_policy::release_publish(&context),
            signing: extpub_policy::signing(credentials.gpg_signing_key),
            staging_preflight: extpub_policy::staging_preflight(&context),
        };

        Ok(Self { context, credentials, decisions })
    }
}

/// Run a gated step, bracketed by a heartbeat while it is in flight.
///
/// On `Run`, executes `op` with a keep-alive timer emitting through `tick`
/// every `period` and returns `Some` of its result; the timer is cancelled
/// when `op` ends, success or failure. On `Skip`, logs the reason and
/// returns `None` — callers treat a skipped step as completed-with-nothing,
/// the same way the original build wiring disabled tasks instead of failing
/// them.
pub fn run_gated<T>(
    name: &str,
    decision: &StepDecision,
    period: Duration,
    tick: impl Fn() + Send + 'static,
    reporter: &mut dyn Reporter,
    op: impl FnOnce() -> Result<T>,
) -> Result<Option<T>> {
    match decision {
        StepDecision::Run => {
            reporter.info(&format!("running {name}..."));
            let result = with_heartbeat(period, tick, op)
                .with_context(|| format!("step {name} failed"))?;
            Ok(Some(result))
        }
        StepDecision::Skip { reason } => {
            reporter.info(&format!("skipping {name}: {reason}"));
            Ok(None)
        }
    }
}
