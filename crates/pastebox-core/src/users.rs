use std::sync::Arc;

use pastebox_crypto::{CredentialGuard, IssuedToken, TokenService};
use pastebox_db::models::NewUser;
use pastebox_db::{UserLookup, UserStore};
use pastebox_types::api::Claims;
use pastebox_types::models::User;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::AuthError;

#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub repassword: String,
}

/// Account registration, login and token validation.
pub struct UserService {
    store: Arc<dyn UserStore>,
    credentials: CredentialGuard,
    tokens: TokenService,
    clock: Arc<dyn Clock>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, tokens: TokenService) -> Self {
        Self {
            store,
            credentials: CredentialGuard::default(),
            tokens,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_credentials(mut self, credentials: CredentialGuard) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Usernames are matched case-sensitively; emails are lowercased.
    /// Uniqueness of both is enforced by the store, not by a prior lookup.
    pub fn register(&self, reg: Registration) -> Result<User, AuthError> {
        let username = reg.username.trim();
        let email = reg.email.trim().to_lowercase();

        if username.is_empty() {
            return Err(AuthError::InvalidRegistration("username is required"));
        }
        if email.is_empty() || !email.contains('@') {
            return Err(AuthError::InvalidRegistration("a valid email is required"));
        }
        if reg.password.is_empty() {
            return Err(AuthError::InvalidRegistration("password is required"));
        }
        if reg.password != reg.repassword {
            return Err(AuthError::InvalidRegistration("passwords do not match"));
        }

        let user = self.store.insert_user(&NewUser {
            username: username.to_string(),
            email,
            password_hash: self.credentials.hash(&reg.password)?,
            created_at: self.clock.now(),
        })?;

        info!("Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    pub fn authenticate(
        &self,
        username: &str,
        password: &str,
        secret: &[u8],
    ) -> Result<(User, IssuedToken), AuthError> {
        let row = self
            .store
            .find_user(UserLookup::Username(username))?
            .ok_or(AuthError::InvalidCredentials)?;

        // An empty hash would verify anything.
        if row.password.is_empty() || !self.credentials.verify(password, &row.password) {
            debug!("Failed login for {}", username);
            return Err(AuthError::InvalidCredentials);
        }

        let user = row.into_user()?;
        let token = self.tokens.issue_at(&user, secret, self.clock.now())?;
        Ok((user, token))
    }

    pub fn issue(&self, user: &User, secret: &[u8]) -> Result<IssuedToken, AuthError> {
        Ok(self.tokens.issue_at(user, secret, self.clock.now())?)
    }

    pub fn validate(&self, token: &str, secret: &[u8]) -> Result<Claims, AuthError> {
        Ok(self.tokens.validate(token, secret)?)
    }

    pub fn find(&self, lookup: UserLookup<'_>) -> Result<Option<User>, AuthError> {
        match self.store.find_user(lookup)? {
            Some(row) => Ok(Some(row.into_user()?)),
            None => Ok(None),
        }
    }
}
