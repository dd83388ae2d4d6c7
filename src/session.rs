//! Session identity and the vocabulary capability seam.
//!
//! Authentication itself lives in the hosted provider; the core only needs
//! "who is signed in" to gate and attribute the save action. Both concerns
//! are injected as dependencies rather than read from ambient state so the
//! coordinator and presenter stay independently testable.

use std::fmt;
use std::future::Future;
use parking_lot::RwLock;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub email: String,
}

impl UserIdentity {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }
}

/// Supplies the current signed-in identity and a sign-out operation.
pub trait SessionProvider: Send + Sync {
    fn current_user(&self) -> Option<UserIdentity>;
    fn sign_out(&self);
}

/// Process-local session holding a configured identity.
#[derive(Default)]
pub struct StaticSession {
    user: RwLock<Option<UserIdentity>>,
}

impl StaticSession {
    pub fn signed_in(email: impl Into<String>) -> Self {
        Self {
            user: RwLock::new(Some(UserIdentity::new(email))),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl SessionProvider for StaticSession {
    fn current_user(&self) -> Option<UserIdentity> {
        self.user.read().clone()
    }

    fn sign_out(&self) {
        let mut user = self.user.write();
        if let Some(previous) = user.take() {
            info!(user = %previous.email, "signed out");
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VocabularyError {
    /// The backend has no vocabulary table yet.
    NotAvailable,
    Rejected(String),
}

impl fmt::Display for VocabularyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VocabularyError::NotAvailable => {
                f.write_str("saving words is not available yet")
            }
            VocabularyError::Rejected(msg) => write!(f, "save rejected: {msg}"),
        }
    }
}

impl std::error::Error for VocabularyError {}

/// Capability for saving a word to a personal vocabulary. The core calls it
/// but ships no persistent implementation; the contract is the extension
/// point.
pub trait Vocabulary: Send + Sync {
    fn add_to_vocabulary(
        &self,
        user: &UserIdentity,
        root_word_id: i64,
    ) -> impl Future<Output = Result<(), VocabularyError>> + Send;
}

/// Placeholder until the hosted schema grows a vocabulary table: records the
/// attempt in the log and reports the feature as unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct VocabularyStub;

impl Vocabulary for VocabularyStub {
    async fn add_to_vocabulary(
        &self,
        user: &UserIdentity,
        root_word_id: i64,
    ) -> Result<(), VocabularyError> {
        info!(user = %user.email, root_word_id, "vocabulary save requested");
        Err(VocabularyError::NotAvailable)
    }
}
