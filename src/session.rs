//! Credential persistence and the session guard.

use crate::config::{OTP_EMAIL_KEY, TOKEN_KEY};

/// Where the bearer token (and the pending signup email) live between page loads.
pub trait CredentialStore {
    fn token(&self) -> Option<String>;
    fn set_token(&self, token: &str);
    fn clear_token(&self);

    fn otp_email(&self) -> Option<String>;
    fn set_otp_email(&self, email: &str);
    fn clear_otp_email(&self);
}

/// `localStorage` for the token, `sessionStorage` for the signup email.
#[derive(Clone, Copy, Default, PartialEq)]
pub struct BrowserStore;

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

fn session_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.session_storage().ok().flatten())
}

impl CredentialStore for BrowserStore {
    fn token(&self) -> Option<String> {
        local_storage().and_then(|s| s.get_item(TOKEN_KEY).ok().flatten())
    }

    fn set_token(&self, token: &str) {
        if let Some(storage) = local_storage() {
            if storage.set_item(TOKEN_KEY, token).is_err() {
                log::warn!("could not persist the access token");
            }
        }
    }

    fn clear_token(&self) {
        if let Some(storage) = local_storage() {
            let _ = storage.remove_item(TOKEN_KEY);
        }
    }

    fn otp_email(&self) -> Option<String> {
        session_storage().and_then(|s| s.get_item(OTP_EMAIL_KEY).ok().flatten())
    }

    fn set_otp_email(&self, email: &str) {
        if let Some(storage) = session_storage() {
            let _ = storage.set_item(OTP_EMAIL_KEY, email);
        }
    }

    fn clear_otp_email(&self) {
        if let Some(storage) = session_storage() {
            let _ = storage.remove_item(OTP_EMAIL_KEY);
        }
    }
}

/// Returns the token a guarded page may use, or `None` when the page must go
/// straight to login without doing anything else.
pub fn guard(store: &dyn CredentialStore) -> Option<String> {
    store.token().filter(|t| !t.trim().is_empty())
}

pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please log in again.";

#[cfg(test)]
pub mod memory {
    use super::CredentialStore;
    use std::cell::RefCell;

    #[derive(Default)]
    pub struct MemoryStore {
        pub token: RefCell<Option<String>>,
        pub otp_email: RefCell<Option<String>>,
    }

    impl MemoryStore {
        pub fn with_token(token: &str) -> Self {
            let store = Self::default();
            store.set_token(token);
            store
        }
    }

    impl CredentialStore for MemoryStore {
        fn token(&self) -> Option<String> {
            self.token.borrow().clone()
        }
        fn set_token(&self, token: &str) {
            *self.token.borrow_mut() = Some(token.to_string());
        }
        fn clear_token(&self) {
            *self.token.borrow_mut() = None;
        }
        fn otp_email(&self) -> Option<String> {
            self.otp_email.borrow().clone()
        }
        fn set_otp_email(&self, email: &str) {
            *self.otp_email.borrow_mut() = Some(email.to_string());
        }
        fn clear_otp_email(&self) {
            *self.otp_email.borrow_mut() = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;

    #[test]
    fn test_guard_requires_token() {
        let store = MemoryStore::default();
        assert_eq!(guard(&store), None);

        store.set_token("   ");
        assert_eq!(guard(&store), None);

        store.set_token("abc");
        assert_eq!(guard(&store).as_deref(), Some("abc"));
    }

    #[test]
    fn test_clear_token() {
        let store = MemoryStore::with_token("abc");
        store.clear_token();
        assert!(guard(&store).is_none());
    }
}
