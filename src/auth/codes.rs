//! One-time verification code storage for the password-change flow

use std::collections::HashMap;
use std::sync::Mutex;

/// Outstanding password-change codes, keyed by email. At most one code per
/// email: `put` replaces any prior entry. The store is injected behind this
/// trait so a durable or distributed backend can take over without touching
/// the flow handlers.
pub trait CodeStore: Send + Sync {
    fn put(&self, email: &str, code: &str);

    fn get(&self, email: &str) -> Option<String>;

    fn remove(&self, email: &str);

    /// Remove the entry iff it exactly matches `code`, returning whether it
    /// did. Atomic per key: of two concurrent confirms with the same code,
    /// only one can succeed.
    fn take_if_matches(&self, email: &str, code: &str) -> bool;
}

/// Process-lifetime store. Codes have no expiry beyond being consumed or
/// overwritten, and are lost on restart; both are deliberate defaults.
#[derive(Default)]
pub struct InMemoryCodeStore {
    codes: Mutex<HashMap<String, String>>,
}

impl InMemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CodeStore for InMemoryCodeStore {
    fn put(&self, email: &str, code: &str) {
        self.codes
            .lock()
            .unwrap()
            .insert(email.to_string(), code.to_string());
    }

    fn get(&self, email: &str) -> Option<String> {
        self.codes.lock().unwrap().get(email).cloned()
    }

    fn remove(&self, email: &str) {
        self.codes.lock().unwrap().remove(email);
    }

    fn take_if_matches(&self, email: &str, code: &str) -> bool {
        let mut codes = self.codes.lock().unwrap();
        if codes.get(email).is_some_and(|stored| stored == code) {
            codes.remove(email);
            true
        } else {
            false
        }
    }
}

/// Generate a 6-character lowercase hex code
pub fn generate_code() -> String {
    let mut bytes = [0u8; 3];
    getrandom::getrandom(&mut bytes).expect("Failed to generate random bytes");
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
