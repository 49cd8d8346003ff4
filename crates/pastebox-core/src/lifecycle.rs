use std::sync::Arc;

use chrono::SubsecRound;
use pastebox_crypto::CredentialGuard;
use pastebox_db::{PasteStore, StoreError};
use pastebox_types::models::{OwnedPaste, Paste, Privacy};
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::PasteError;
use crate::expiration;
use crate::ids::{IdAllocator, IdSource};

/// How many ids are tried before `create` gives up.
pub const MAX_ID_ATTEMPTS: u32 = 5;

/// Input for [`PasteService::create`].
#[derive(Debug, Clone, Default)]
pub struct PasteForm {
    pub title: String,
    pub body: String,
    /// Expiration expression, see [`crate::expiration`].
    pub expires: String,
    pub delete_after_read: bool,
    pub privacy: Privacy,
    pub password: Option<String>,
    pub syntax: String,
    /// Resolved by the caller from an identity token.
    pub owner_id: Option<i64>,
}

impl PasteForm {
    fn validate(&self) -> Result<(), PasteError> {
        if self.title.trim().is_empty() && self.body.trim().is_empty() {
            return Err(PasteError::InvalidForm("title and body cannot both be empty"));
        }
        if self.privacy == Privacy::Private && self.owner_id.is_none() {
            return Err(PasteError::InvalidForm("private pastes need an owner"));
        }
        Ok(())
    }
}

/// Create, read and delete pastes.
///
/// Blocking: every call hits the store and `create`/`get` may run Argon2.
/// Async callers should go through `spawn_blocking`.
pub struct PasteService {
    store: Arc<dyn PasteStore>,
    ids: Arc<dyn IdSource>,
    credentials: CredentialGuard,
    clock: Arc<dyn Clock>,
}

impl PasteService {
    pub fn new(store: Arc<dyn PasteStore>) -> Self {
        Self {
            store,
            ids: Arc::new(IdAllocator::from_os_rng()),
            credentials: CredentialGuard::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdSource>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_credentials(mut self, credentials: CredentialGuard) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn create(&self, form: PasteForm) -> Result<Paste, PasteError> {
        form.validate()?;

        // Stored as unix milliseconds.
        let created_at = self.clock.now().trunc_subsecs(3);
        let expires_at = expiration::compute(&form.expires, created_at)?.instant();

        let password_hash = match form.password.as_deref() {
            Some(p) if !p.is_empty() => Some(self.credentials.hash(p)?),
            _ => None,
        };

        let mut paste = Paste {
            id: 0,
            title: form.title,
            body: form.body,
            created_at,
            expires_at,
            delete_after_read: form.delete_after_read,
            privacy: form.privacy,
            password_hash,
            syntax: form.syntax,
            owner_id: form.owner_id,
        };

        for attempt in 1..=MAX_ID_ATTEMPTS {
            paste.id = self.ids.next_id();
            match self.store.insert_paste(&paste) {
                Ok(()) => {
                    info!(
                        "Created paste {} (owner: {:?}, expires: {:?}, burn: {})",
                        paste.id, paste.owner_id, paste.expires_at, paste.delete_after_read
                    );
                    return Ok(paste);
                }
                Err(StoreError::DuplicateIdentifier(id)) => {
                    warn!(
                        "Paste id {} already taken (attempt {}/{})",
                        id, attempt, MAX_ID_ATTEMPTS
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(PasteError::IdentifierExhausted(MAX_ID_ATTEMPTS))
    }

    /// Read a paste, checking its password.
    ///
    /// Burn-after-read pastes are deleted once the result has been built.
    /// The delete is best effort: a failure is logged and the read still
    /// succeeds. Fetch and delete are two separate store calls, so two
    /// concurrent readers may both see the paste before it is gone.
    pub fn get(&self, id: i64, password: Option<&str>) -> Result<OwnedPaste, PasteError> {
        let owned = self.peek(id)?;

        if let Some(hash) = owned.paste.password_hash.as_deref() {
            if !self.credentials.verify(password.unwrap_or(""), hash) {
                debug!("Wrong password for paste {}", id);
                return Err(PasteError::Unauthorized);
            }
        }

        if owned.paste.delete_after_read {
            self.burn(id);
        }

        Ok(owned)
    }

    /// Fetch without the password check and without burning. For callers
    /// that need to inspect ownership or privacy first.
    pub fn peek(&self, id: i64) -> Result<OwnedPaste, PasteError> {
        self.store
            .fetch_paste(id, self.clock.now())?
            .ok_or(PasteError::NotFound)
    }

    /// Delete a live paste. Authorization is the caller's job.
    pub fn delete(&self, id: i64) -> Result<(), PasteError> {
        if self.store.fetch_paste(id, self.clock.now())?.is_none() {
            return Err(PasteError::NotFound);
        }
        self.store.delete_paste(id)?;
        info!("Deleted paste {}", id);
        Ok(())
    }

    /// Live pastes of `owner`, or anonymous pastes for `None`.
    pub fn list(&self, owner: Option<i64>) -> Result<Vec<Paste>, PasteError> {
        Ok(self.store.list_pastes(owner, self.clock.now())?)
    }

    pub fn purge_expired(&self) -> Result<usize, PasteError> {
        Ok(self.store.purge_expired(self.clock.now())?)
    }

    fn burn(&self, id: i64) {
        match self.store.delete_paste(id) {
            Ok(_) => debug!("Burned paste {} after read", id),
            Err(e) => warn!("Failed to burn paste {} after read: {}", id, e),
        }
    }
}
