//! # extpub
//!
//! CI gating for external artifact publishing.
//!
//! extpub decides, from the CI environment alone, which credential-dependent
//! release steps should run on this particular build and keeps long silent
//! steps alive under CI inactivity timeouts. It does not talk to any
//! repository itself — the actual signing, staging, and uploading are
//! opaque operations supplied by the caller; extpub brackets and gates them.
//!
//! ## How a build is classified
//!
//! - **Tag build** (`CIRCLE_TAG` non-empty): the only kind of build that
//!   publishes to production destinations.
//! - **Fork build** (`CIRCLE_PR_USERNAME` present): denied all secrets;
//!   every credential-dependent step is skipped.
//! - Anything else: credential-dependent preflight runs so publish failures
//!   surface at PR time, but nothing is released.
//!
//! ## Pieces
//!
//! - [`env`] — explicit-source environment resolution (real process
//!   environment, or a fixed mapping for deterministic CI simulation).
//! - [`credentials`] — optional credential bundles assembled from the
//!   environment, plus the hard signing-key preflight gate.
//! - [`policy`] — pure gating decisions over the build context.
//! - [`heartbeat`] — periodic keep-alive output around long silent steps.
//! - [`engine`] — ties the above together: readiness assessment and the
//!   gated, heartbeat-bracketed step runner.
//!
//! ## Example
//!
//! ```
//! use extpub::engine::{self, Reporter};
//! use extpub::env::EnvSource;
//!
//! struct Stderr;
//! impl Reporter for Stderr {
//!     fn info(&mut self, msg: &str) { eprintln!("[info] {msg}"); }
//!     fn warn(&mut self, msg: &str) { eprintln!("[warn] {msg}"); }
//!     fn error(&mut self, msg: &str) { eprintln!("[error] {msg}"); }
//! }
//!
//! let readiness = engine::ReleaseReadiness::assess(&EnvSource::Process, &mut Stderr)?;
//! if readiness.decisions.release_publish.is_run() {
//!     // close and release the staging repository, upload plugins, ...
//! }
//! # anyhow::Ok(())
//! ```

pub use extpub_credentials as credentials;
pub use extpub_env as env;
pub use extpub_heartbeat as heartbeat;
pub use extpub_policy as policy;

pub mod engine;
