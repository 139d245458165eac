use std::cell::Cell;
use std::rc::Rc;

use yew::Callback;

use crate::session::{BrowserStore, CredentialStore, SESSION_EXPIRED_NOTICE};

/// What a page controller needs from the surface it is mounted in.
pub trait PageHost {
    /// Re-render after state changed.
    fn refresh(&self);
    /// One-off message to the user.
    fn notify(&self, message: &str);
    /// A request came back 401: drop the credential and leave the page.
    fn session_expired(&self);
}

#[derive(Clone)]
pub struct BrowserHost {
    refresh: Callback<()>,
    on_expired: Callback<()>,
    expired: Rc<Cell<bool>>,
}

impl BrowserHost {
    pub fn new(refresh: Callback<()>, on_expired: Callback<()>) -> Self {
        Self {
            refresh,
            on_expired,
            expired: Rc::new(Cell::new(false)),
        }
    }
}

pub fn alert(message: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.alert_with_message(message);
    }
}

impl PageHost for BrowserHost {
    fn refresh(&self) {
        self.refresh.emit(());
    }

    fn notify(&self, message: &str) {
        alert(message);
    }

    fn session_expired(&self) {
        BrowserStore.clear_token();
        if self.expired.replace(true) {
            return;
        }
        log::warn!("session expired, returning to login");
        alert(SESSION_EXPIRED_NOTICE);
        self.on_expired.emit(());
    }
}
