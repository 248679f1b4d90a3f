//! Bootstrap
//!
//! Configures the backend connection once at process entry and hands back a
//! [`Tally`] handle. The handle is passed explicitly to whatever needs the
//! backend; nothing is configured as a side effect of loading a module.
//!
//! A missing or malformed outputs document is fatal: `configure` returns an
//! error and the caller is expected to stop before mounting the view.

mod outputs;

pub use outputs::{
    AuthOutputs, BackendOutputs, DataOutputs, OutputsError, DEFAULT_MODEL,
    USER_POOL_AUTHORIZATION,
};

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

use crate::auth::{AuthError, Authenticator, LocalAuthenticator, RemoteAuthenticator, SessionStore};
use crate::backend::{BackendError, ExpenseBackend, MemoryBackend, RemoteBackend};
use crate::config::BackendConfig;

static CONFIGURED: AtomicBool = AtomicBool::new(false);

/// How data requests are authorized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Signed-in user pool session (bearer token)
    UserPool,
    ApiKey,
    Iam,
}

/// Errors raised while configuring the backend connection
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Backend already configured")]
    AlreadyConfigured,

    #[error("Unsupported auth mode: {0:?}")]
    UnsupportedAuthMode(AuthMode),

    #[error(transparent)]
    Outputs(#[from] OutputsError),

    #[error("Failed to build data client: {0}")]
    Backend(#[from] BackendError),

    #[error("Failed to build auth client: {0}")]
    Auth(#[from] AuthError),
}

/// Configured backend connection.
///
/// Cheap to clone; all clones share the same session and clients.
#[derive(Clone)]
pub struct Tally {
    outputs: Option<Arc<BackendOutputs>>,
    sessions: SessionStore,
    backend: Arc<dyn ExpenseBackend>,
    authenticator: Arc<dyn Authenticator>,
}

impl Tally {
    /// Outputs the connection was configured from (`None` when offline)
    pub fn outputs(&self) -> Option<&BackendOutputs> {
        self.outputs.as_deref()
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn backend(&self) -> Arc<dyn ExpenseBackend> {
        Arc::clone(&self.backend)
    }

    pub fn authenticator(&self) -> Arc<dyn Authenticator> {
        Arc::clone(&self.authenticator)
    }

    pub fn is_offline(&self) -> bool {
        self.outputs.is_none()
    }
}

/// Configure the backend connection for this process.
///
/// Succeeds at most once per process; later calls fail with
/// [`BootstrapError::AlreadyConfigured`].
pub fn configure(
    outputs: BackendOutputs,
    mode: AuthMode,
    settings: &BackendConfig,
) -> Result<Tally, BootstrapError> {
    if CONFIGURED.swap(true, Ordering::SeqCst) {
        return Err(BootstrapError::AlreadyConfigured);
    }

    let result = connect(outputs, mode, settings);
    if result.is_err() {
        CONFIGURED.store(false, Ordering::SeqCst);
    }
    result
}

/// Load the outputs document at `path` and [`configure`] from it
pub fn configure_from_path(
    path: &Path,
    mode: AuthMode,
    settings: &BackendConfig,
) -> Result<Tally, BootstrapError> {
    let outputs = BackendOutputs::load(path)?;
    tracing::info!(path = ?path, "Loaded backend outputs");
    configure(outputs, mode, settings)
}

/// Build a connection without the once-per-process guard
pub fn connect(
    outputs: BackendOutputs,
    mode: AuthMode,
    settings: &BackendConfig,
) -> Result<Tally, BootstrapError> {
    if mode != AuthMode::UserPool {
        return Err(BootstrapError::UnsupportedAuthMode(mode));
    }
    outputs.validate()?;

    let sessions = SessionStore::new();
    let timeout = settings.request_timeout();
    let data = outputs.data_endpoints();

    tracing::info!(
        url = %data.url,
        realtime_url = %data.realtime_url,
        model = %data.model,
        "Configuring backend client"
    );

    let backend = RemoteBackend::new(data, sessions.clone(), timeout)?;
    let authenticator = RemoteAuthenticator::new(outputs.auth_endpoints(), timeout)?;

    Ok(Tally {
        outputs: Some(Arc::new(outputs)),
        sessions,
        backend: Arc::new(backend),
        authenticator: Arc::new(authenticator),
    })
}

/// Connection backed by in-process doubles instead of the hosted backend
pub fn offline(backend: MemoryBackend, authenticator: LocalAuthenticator) -> Tally {
    tracing::info!("Using in-memory backend");
    Tally {
        outputs: None,
        sessions: SessionStore::new(),
        backend: Arc::new(backend),
        authenticator: Arc::new(authenticator),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> BackendOutputs {
        BackendOutputs::from_json(&outputs::tests::sample_json()).unwrap()
    }

    #[test]
    fn test_connect_builds_online_handle() {
        let tally = connect(sample(), AuthMode::UserPool, &BackendConfig::default()).unwrap();
        assert!(!tally.is_offline());
        assert_eq!(tally.outputs().unwrap().auth.user_pool_client_id, "client-abc");
        assert!(!tally.sessions().is_signed_in());
    }

    #[test]
    fn test_only_user_pool_mode_supported() {
        let result = connect(sample(), AuthMode::ApiKey, &BackendConfig::default());
        assert!(matches!(
            result,
            Err(BootstrapError::UnsupportedAuthMode(AuthMode::ApiKey))
        ));
    }

    #[test]
    fn test_configure_runs_once() {
        let first = configure(sample(), AuthMode::UserPool, &BackendConfig::default());
        assert!(first.is_ok());

        let second = configure(sample(), AuthMode::UserPool, &BackendConfig::default());
        assert!(matches!(second, Err(BootstrapError::AlreadyConfigured)));
    }

    #[test]
    fn test_malformed_outputs_file_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let result = configure_from_path(file.path(), AuthMode::UserPool, &BackendConfig::default());
        assert!(matches!(result, Err(BootstrapError::Outputs(OutputsError::Parse(_)))));
    }

    #[test]
    fn test_offline_handle() {
        let tally = offline(MemoryBackend::new(), LocalAuthenticator::accept_any());
        assert!(tally.is_offline());
        assert!(tally.outputs().is_none());
    }
}
