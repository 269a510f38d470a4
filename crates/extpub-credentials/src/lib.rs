//! Publishing credential assembly for extpub.
//!
//! Each external publishing destination (Maven Central staging, the Gradle
//! Plugin Portal, the JetBrains marketplace) and the GPG signing step has a
//! credential bundle that is assembled from the environment only when every
//! variable it needs is present. A missing variable is not an error — the
//! owning step is simply skipped — but a malformed signing key fails fast.
//!
//! # Example
//!
//! ```
//! use extpub_credentials::GpgSigningKey;
//! use extpub_env::EnvSource;
//!
//! let env = EnvSource::testing([
//!     ("GPG_SIGNING_KEY_ID", "ABCD1234"),
//!     ("GPG_SIGNING_KEY", "aGVsbG8ta2V5"),
//!     ("GPG_SIGNING_KEY_PASSWORD", "passphrase"),
//! ]);
//!
//! let key = GpgSigningKey::from_env(&env).unwrap().unwrap();
//! assert_eq!(key.key(), "hello-key");
//! ```

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use thiserror::Error;

use extpub_env::{
    EnvSource, GPG_SIGNING_KEY, GPG_SIGNING_KEY_ID, GPG_SIGNING_KEY_PASSWORD, GRADLE_KEY,
    GRADLE_SECRET, JETBRAINS_PLUGIN_REPO_TOKEN, SONATYPE_PASSWORD, SONATYPE_USERNAME,
};

/// Errors from credential assembly.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The signing-key variable was present but not valid base64.
    #[error("{var} is not valid base64: {source}")]
    InvalidKeyEncoding {
        var: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    /// The signing-key variable decoded to bytes that are not UTF-8 text.
    #[error("{var} did not decode to UTF-8 text")]
    InvalidKeyText { var: &'static str },

    /// The hard gate: release preflight found no complete signing key.
    #[error(
        "the required environment variables to sign the release could not be found; \
         check the logs above to find out which ones are missing"
    )]
    SigningKeyMissing,
}

/// An in-memory GPG signing key assembled from the environment.
///
/// `GPG_SIGNING_KEY` carries the ASCII-armored secret key base64-encoded for
/// transport; it is decoded once here and the plaintext lives in memory for
/// the rest of the process. There is no zeroing on drop — the key outlives
/// every use of it anyway, and the original system accepted the same risk.
#[derive(Clone)]
pub struct GpgSigningKey {
    key_id: String,
    key: String,
    password: String,
}

impl GpgSigningKey {
    /// Assemble a signing key from the environment.
    ///
    /// Returns `Ok(None)` unless all of `GPG_SIGNING_KEY_ID`,
    /// `GPG_SIGNING_KEY` and `GPG_SIGNING_KEY_PASSWORD` are present. A
    /// present but malformed key fails with a decoding error.
    pub fn from_env(env: &EnvSource) -> Result<Option<Self>, CredentialError> {
        let (Some(key_id), Some(base64_key), Some(password)) = (
            env.lookup(GPG_SIGNING_KEY_ID),
            env.lookup(GPG_SIGNING_KEY),
            env.lookup(GPG_SIGNING_KEY_PASSWORD),
        ) else {
            return Ok(None);
        };

        let decoded = BASE64
            .decode(base64_key.as_bytes())
            .map_err(|source| CredentialError::InvalidKeyEncoding {
                var: GPG_SIGNING_KEY,
                source,
            })?;
        let key = String::from_utf8(decoded)
            .map_err(|_| CredentialError::InvalidKeyText { var: GPG_SIGNING_KEY })?;

        Ok(Some(Self { key_id, key, password }))
    }

    /// The GPG key id.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// The decoded ASCII-armored secret key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The key passphrase.
    pub fn password(&self) -> &str {
        &self.password
    }
}

// Keeps the secret material out of debug output and error chains.
impl fmt::Debug for GpgSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpgSigningKey")
            .field("key_id", &self.key_id)
            .field("key", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The names of the GPG variables currently missing from the environment.
///
/// On CI the caller warns about each of these before disabling signing; off
/// CI absence is normal and silent.
pub fn missing_gpg_vars(env: &EnvSource) -> Vec<&'static str> {
    [GPG_SIGNING_KEY_ID, GPG_SIGNING_KEY, GPG_SIGNING_KEY_PASSWORD]
        .into_iter()
        .filter(|var| env.lookup(var).is_none())
        .collect()
}

/// Fail unless a complete, well-formed signing key is present.
///
/// This is the release-preflight gate: unlike every other credential check
/// it errors instead of skipping, so a tag build without signing material
/// stops before anything is staged.
pub fn check_signing_key(env: &EnvSource) -> Result<(), CredentialError> {
    match GpgSigningKey::from_env(env)? {
        Some(_) => Ok(()),
        None => Err(CredentialError::SigningKeyMissing),
    }
}

/// Credentials for the Maven Central (Sonatype) staging repository.
#[derive(Clone)]
pub struct SonatypeCredentials {
    pub username: String,
    pub password: String,
}

impl SonatypeCredentials {
    /// Present only when both `SONATYPE_USERNAME` and `SONATYPE_PASSWORD`
    /// are set.
    pub fn from_env(env: &EnvSource) -> Option<Self> {
        Some(Self {
            username: env.lookup(SONATYPE_USERNAME)?,
            password: env.lookup(SONATYPE_PASSWORD)?,
        })
    }
}

impl fmt::Debug for SonatypeCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SonatypeCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// API key pair for the Gradle Plugin Portal.
#[derive(Clone)]
pub struct PortalCredentials {
    pub key: String,
    pub secret: String,
}

impl PortalCredentials {
    /// Present only when both `GRADLE_KEY` and `GRADLE_SECRET` are set.
    pub fn from_env(env: &EnvSource) -> Option<Self> {
        Some(Self {
            key: env.lookup(GRADLE_KEY)?,
            secret: env.lookup(GRADLE_SECRET)?,
        })
    }
}

impl fmt::Debug for PortalCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalCredentials")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Upload token for the JetBrains plugin marketplace.
#[derive(Clone)]
pub struct JetBrainsToken(String);

impl JetBrainsToken {
    /// Present only when `JETBRAINS_PLUGIN_REPO_TOKEN` is set.
    pub fn from_env(env: &EnvSource) -> Option<Self> {
        env.lookup(JETBRAINS_PLUGIN_REPO_TOKEN).map(Self)
    }

    /// The raw token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for JetBrainsToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JetBrainsToken").field(&"<redacted>").finish()
    }
}
