//! Mock sign-in and the active user identity.
//!
//! There is no real authentication: any well-formed email signs in. The
//! signed-in profile is stored under [`CURRENT_USER_KEY`] so it survives a
//! restart, and identity changes are published on a
//! [`tokio::sync::watch`] channel. Consumers (the board shell) observe the
//! channel and reload the board explicitly; the session never touches board
//! state itself.

use tokio::sync::watch;

use taskboard_proto::codec::{decode_profile, encode_profile};
use taskboard_proto::user::{UserId, UserProfile};

use crate::storage::{CURRENT_USER_KEY, KeyValueStore, StorageError};

/// Errors that can occur during session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Email is empty or whitespace.
    #[error("email cannot be empty")]
    EmailEmpty,
    /// Email is not of the form `local@domain`.
    #[error("invalid email: {0}")]
    InvalidEmail(String),
    /// The operation needs a signed-in user.
    #[error("not logged in")]
    NotLoggedIn,
    /// The user record could not be stored.
    #[error("could not save user record: {0}")]
    Storage(#[from] StorageError),
    /// The user record could not be encoded.
    #[error("could not encode user record: {0}")]
    Codec(#[from] taskboard_proto::codec::CodecError),
}

/// The signed-in user and the channel announcing identity changes.
pub struct Session<S: KeyValueStore> {
    storage: S,
    current: Option<UserProfile>,
    identity: watch::Sender<Option<UserId>>,
}

impl<S: KeyValueStore> Session<S> {
    /// Restores the signed-in user from storage.
    ///
    /// A missing record means nobody is signed in. An unreadable or
    /// malformed record is logged and also treated as signed out.
    pub fn restore(storage: S) -> Self {
        let current = match storage.read(CURRENT_USER_KEY) {
            Ok(Some(text)) => match decode_profile(&text) {
                Ok(profile) => Some(profile),
                Err(error) => {
                    tracing::error!(%error, "stored user record is invalid, signing out");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                tracing::error!(%error, "could not read stored user record");
                None
            }
        };
        let (identity, _) = watch::channel(current.as_ref().map(UserProfile::user_id));
        if let Some(profile) = &current {
            tracing::info!(user = %profile.email, "session restored");
        }
        Self {
            storage,
            current,
            identity,
        }
    }

    /// The signed-in profile, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&UserProfile> {
        self.current.as_ref()
    }

    /// The signed-in identity, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<UserId> {
        self.current.as_ref().map(UserProfile::user_id)
    }

    /// Subscribes to identity changes.
    ///
    /// The receiver starts with the current identity marked as seen.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.identity.subscribe()
    }

    /// Signs in with just an email.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmailEmpty`], [`SessionError::InvalidEmail`],
    /// or a storage error if the record could not be saved.
    pub fn login(&mut self, email: &str) -> Result<&UserProfile, SessionError> {
        let email = validate_email(email)?;
        self.establish(UserProfile { email, name: None })
    }

    /// Signs up with a display name and email, and signs in.
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login).
    pub fn signup(&mut self, name: &str, email: &str) -> Result<&UserProfile, SessionError> {
        let email = validate_email(email)?;
        self.establish(UserProfile {
            email,
            name: normalize_name(name),
        })
    }

    /// Changes the signed-in user's name and email.
    ///
    /// `None` keeps the current name; a blank name clears it. Changing the email changes the identity, so the board switches to the
    /// lists stored under the new email. Lists are not carried over.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotLoggedIn`], an email validation error, or a
    /// storage error if the record could not be saved.
    pub fn update_profile(
        &mut self,
        name: Option<&str>,
        email: &str,
    ) -> Result<&UserProfile, SessionError> {
        let Some(current) = &self.current else {
            return Err(SessionError::NotLoggedIn);
        };
        let name = name.map_or_else(|| current.name.clone(), normalize_name);
        let email = validate_email(email)?;
        self.establish(UserProfile { email, name })
    }

    /// Signs out, removing the stored user record.
    ///
    /// Signing out while signed out is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the record could not be removed; the user
    /// then stays signed in.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        let Some(profile) = &self.current else {
            return Ok(());
        };
        self.storage.remove(CURRENT_USER_KEY)?;
        tracing::info!(user = %profile.email, "logged out");
        self.current = None;
        self.publish();
        Ok(())
    }

    fn establish(&mut self, profile: UserProfile) -> Result<&UserProfile, SessionError> {
        let text = encode_profile(&profile)?;
        self.storage.write(CURRENT_USER_KEY, &text)?;
        tracing::info!(user = %profile.email, "signed in");
        let profile = self.current.insert(profile);
        let id = profile.user_id();
        self.identity.send_if_modified(|current| {
            if current.as_ref() == Some(&id) {
                false
            } else {
                *current = Some(id);
                true
            }
        });
        Ok(&*profile)
    }

    fn publish(&self) {
        let id = self.user_id();
        self.identity.send_if_modified(|current| {
            if *current == id {
                false
            } else {
                *current = id;
                true
            }
        });
    }
}

/// Trims an email and checks it has a non-empty local part and domain.
fn validate_email(email: &str) -> Result<String, SessionError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(SessionError::EmailEmpty);
    }
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        })
        && !email.chars().any(char::is_whitespace);
    if !well_formed {
        return Err(SessionError::InvalidEmail(email.to_string()));
    }
    Ok(email.to_string())
}

fn normalize_name(name: &str) -> Option<String> {
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
