/// Active-profile session
///
/// Tracks which profile is signed in on this device and persists that
/// choice in its own Local Store slot. Purely device-local; the
/// reconciliation engine knows nothing about it.

use thiserror::Error;

use super::data::{Profile, SESSION_KEY};
use super::local::LocalStore;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("wrong PIN")]
    WrongPin,
}

#[derive(Debug, Default)]
pub struct Session {
    current: Option<Profile>,
}

impl Session {
    /// Restore the previously selected profile from the Local Store.
    /// Absent or unreadable bytes mean signed out.
    pub fn restore(store: &LocalStore) -> Self {
        let current = store
            .get(SESSION_KEY)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    eprintln!("⚠️  Saved session is unreadable ({}), signing out", e);
                    None
                }
            });
        Session { current }
    }

    /// Sign a profile in after checking its PIN, and remember the
    /// selection across restarts. The PIN is compared in plaintext.
    pub fn sign_in(
        &mut self,
        store: &LocalStore,
        profile: &Profile,
        pin: &str,
    ) -> Result<(), SessionError> {
        if pin != profile.pin {
            return Err(SessionError::WrongPin);
        }

        self.current = Some(profile.clone());
        self.persist(store);
        println!("👤 Signed in: {}", profile.name);
        Ok(())
    }

    /// Sign out and clear the persisted selection
    pub fn sign_out(&mut self, store: &LocalStore) {
        self.current = None;
        if let Err(e) = store.remove(SESSION_KEY) {
            eprintln!("⚠️  Failed to clear the saved session: {}", e);
        }
    }

    /// Re-persist the snapshot after the active profile edited
    /// themselves (name, avatar or PIN changed). Other profiles are
    /// ignored.
    pub fn refresh(&mut self, store: &LocalStore, profile: &Profile) {
        let is_current = self
            .current
            .as_ref()
            .is_some_and(|current| current.id == profile.id);
        if is_current {
            self.current = Some(profile.clone());
            self.persist(store);
        }
    }

    pub fn current(&self) -> Option<&Profile> {
        self.current.as_ref()
    }

    fn persist(&self, store: &LocalStore) {
        if let Some(profile) = &self.current {
            let json = serde_json::to_string(profile).expect("profile serializes to JSON");
            if let Err(e) = store.set(SESSION_KEY, &json) {
                eprintln!("⚠️  Failed to save the session: {}", e);
            }
        }
    }
}
