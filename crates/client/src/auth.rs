//! Sign-in and password-reset flows.
//!
//! Both flows share one state machine:
//!
//! ```text
//! Idle --submit--> Submitting --ok--> Succeeded(redirect)
//!                       \------err--> Idle (with error)
//! ```
//!
//! A submit while `Submitting` is rejected without a request. Validation
//! failures keep the flow `Idle` and send nothing. Dropping a submit future
//! mid-request returns the flow to `Idle`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use musicly_core::error::CoreError;
use musicly_core::error_codes::INVALID_CREDENTIALS_MESSAGE;
use musicly_core::forms::{check, LoginForm, ResetPasswordForm};
use tokio::sync::Mutex;
use validator::Validate;

use crate::api::CatalogApi;
use crate::error::{ClientError, ClientResult};
use crate::notice::Notice;
use crate::routes::Route;
use crate::session::Session;
use crate::storage::DurableStorage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormState {
    Idle,
    Submitting,
    Succeeded { redirect: Route },
}

#[derive(Debug)]
struct FormInner {
    state: FormState,
    error: Option<String>,
    notice: Option<Notice>,
}

/// Shared submit bookkeeping for both flows.
///
/// `in_flight` is owned by the [`InFlight`] returned from [`SubmitGuard::begin`],
/// so a submission whose future is dropped still releases the form.
#[derive(Debug)]
struct SubmitGuard {
    inner: Mutex<FormInner>,
    in_flight: AtomicBool,
}

/// Marks a submission as running until dropped.
#[must_use]
#[derive(Debug)]
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SubmitGuard {
    fn new() -> Self {
        Self {
            inner: Mutex::new(FormInner {
                state: FormState::Idle,
                error: None,
                notice: None,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Start a submission if the form is valid and nothing is in flight.
    async fn begin<T: Validate>(&self, form: &T) -> ClientResult<InFlight<'_>> {
        let mut inner = self.inner.lock().await;
        if self.in_flight.load(Ordering::SeqCst) {
            return Err(CoreError::Conflict("A submission is already in progress".into()).into());
        }
        if let Err(err) = check(form) {
            let err = ClientError::from(err);
            inner.state = FormState::Idle;
            inner.error = Some(err.user_message());
            return Err(err);
        }
        self.in_flight.store(true, Ordering::SeqCst);
        inner.state = FormState::Idle;
        inner.error = None;
        Ok(InFlight(&self.in_flight))
    }

    async fn succeed(&self, notice: Option<Notice>) {
        let mut inner = self.inner.lock().await;
        inner.state = FormState::Succeeded {
            redirect: Route::HOME,
        };
        inner.notice = notice;
    }

    async fn fail(&self, err: &ClientError) {
        let mut inner = self.inner.lock().await;
        inner.state = FormState::Idle;
        inner.error = Some(err.user_message());
        inner.notice = Some(Notice::from(err));
    }

    async fn state(&self) -> FormState {
        let inner = self.inner.lock().await;
        if self.in_flight.load(Ordering::SeqCst) {
            FormState::Submitting
        } else {
            inner.state.clone()
        }
    }

    async fn error(&self) -> Option<String> {
        self.inner.lock().await.error.clone()
    }

    async fn notice(&self) -> Option<Notice> {
        self.inner.lock().await.notice.clone()
    }
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

pub struct LoginFlow {
    api: CatalogApi,
    storage: Arc<dyn DurableStorage>,
    guard: SubmitGuard,
}

impl LoginFlow {
    pub fn new(api: CatalogApi, storage: Arc<dyn DurableStorage>) -> Self {
        Self {
            api,
            storage,
            guard: SubmitGuard::new(),
        }
    }

    pub async fn state(&self) -> FormState {
        self.guard.state().await
    }

    /// Message shown under the form after a failed submit.
    pub async fn error(&self) -> Option<String> {
        self.guard.error().await
    }

    /// Sign in and persist the session. Storage is written only on success.
    pub async fn submit(&self, form: LoginForm) -> ClientResult<Session> {
        let _in_flight = self.guard.begin(&form).await?;

        let result = match self.sign_in(&form).await {
            Ok(session) => session
                .persist(self.storage.as_ref())
                .map(|()| session)
                .map_err(ClientError::from),
            Err(err) => Err(err),
        };

        match result {
            Ok(session) => {
                tracing::info!(email = %form.email, "Signed in");
                self.guard.succeed(None).await;
                Ok(session)
            }
            Err(err) => {
                tracing::warn!(email = %form.email, error = %err, "Sign-in failed");
                self.guard.fail(&err).await;
                Err(err)
            }
        }
    }

    async fn sign_in(&self, form: &LoginForm) -> ClientResult<Session> {
        let data = self.api.sign_in(form).await?.unwrap_or_default();
        match data.token.filter(|token| !token.is_empty()) {
            Some(token) => Ok(Session::new(token, data.user.unwrap_or_default())),
            None => Err(CoreError::Unauthorized(INVALID_CREDENTIALS_MESSAGE.to_string()).into()),
        }
    }
}

/// Forget the persisted session.
pub fn logout(storage: &dyn DurableStorage) -> ClientResult<()> {
    Session::clear(storage)?;
    tracing::info!("Signed out");
    Ok(())
}

// ---------------------------------------------------------------------------
// Reset password
// ---------------------------------------------------------------------------

/// Password reset keyed by the token embedded in the reset link.
pub struct ResetPasswordFlow {
    api: CatalogApi,
    token: String,
    guard: SubmitGuard,
}

impl ResetPasswordFlow {
    pub fn new(api: CatalogApi, token: impl Into<String>) -> Self {
        Self {
            api,
            token: token.into(),
            guard: SubmitGuard::new(),
        }
    }

    pub async fn state(&self) -> FormState {
        self.guard.state().await
    }

    pub async fn error(&self) -> Option<String> {
        self.guard.error().await
    }

    pub async fn notice(&self) -> Option<Notice> {
        self.guard.notice().await
    }

    pub async fn submit(&self, form: ResetPasswordForm) -> ClientResult<()> {
        let _in_flight = self.guard.begin(&form).await?;

        match self.api.reset_password(&self.token, &form.password).await {
            Ok(()) => {
                tracing::info!("Password changed");
                self.guard
                    .succeed(Some(Notice::success("Successfully Changed Password")))
                    .await;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "Password reset failed");
                self.guard.fail(&err).await;
                Err(err)
            }
        }
    }
}
