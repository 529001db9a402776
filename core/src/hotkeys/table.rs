//! In-process registration table standing in for the OS in tests.
//!
//! At most one owner per combination; combinations reserved for another
//! application are refused the way the OS refuses them.

use std::sync::{Arc, Mutex};

use hashbrown::HashMap;

use super::backend::{HotkeyBackend, HotkeyId};
use super::combo::KeyCombo;
use super::error::RegistrationError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Owner {
    Local(HotkeyId),
    Foreign(String),
}

#[derive(Debug, Default)]
struct TableInner {
    next_id: HotkeyId,
    owners: HashMap<KeyCombo, Owner>,
}

#[derive(Debug, Clone, Default)]
pub struct HotkeyTable {
    inner: Arc<Mutex<TableInner>>,
}

impl HotkeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `combo` as held by another application.
    pub fn reserve_foreign(&self, combo: KeyCombo, app: impl Into<String>) {
        self.inner
            .lock()
            .unwrap()
            .owners
            .insert(combo, Owner::Foreign(app.into()));
    }

    pub fn registered_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .owners
            .values()
            .filter(|o| matches!(o, Owner::Local(_)))
            .count()
    }
}

impl HotkeyBackend for HotkeyTable {
    fn register(&self, combo: KeyCombo) -> Result<HotkeyId, RegistrationError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(owner) = inner.owners.get(&combo) {
            let owner = match owner {
                Owner::Local(id) => format!("hotkey #{id}"),
                Owner::Foreign(app) => app.clone(),
            };
            return Err(RegistrationError::AlreadyOwned { combo, owner });
        }

        inner.next_id += 1;
        let id = inner.next_id;
        inner.owners.insert(combo, Owner::Local(id));
        Ok(id)
    }

    fn unregister(&self, id: HotkeyId) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.owners.len();
        inner.owners.retain(|_, owner| *owner != Owner::Local(id));
        before != inner.owners.len()
    }

    fn lookup(&self, combo: &KeyCombo) -> Option<HotkeyId> {
        match self.inner.lock().unwrap().owners.get(combo) {
            Some(Owner::Local(id)) => Some(*id),
            _ => None,
        }
    }

    fn combo(&self, id: HotkeyId) -> Option<KeyCombo> {
        self.inner
            .lock()
            .unwrap()
            .owners
            .iter()
            .find(|(_, owner)| **owner == Owner::Local(id))
            .map(|(combo, _)| *combo)
    }
}

#[test]
fn test_single_owner_per_combo() {
    let table = HotkeyTable::new();
    let combo: KeyCombo = "Ctrl+A".parse().unwrap();
    let id = table.register(combo).unwrap();
    assert!(matches!(
        table.register(combo),
        Err(RegistrationError::AlreadyOwned { .. })
    ));
    assert_eq!(table.combo(id), Some(combo));
    assert!(table.unregister(id));
    assert!(!table.unregister(id));
    assert!(table.register(combo).is_ok());
}

#[test]
fn test_foreign_owner_refused() {
    let table = HotkeyTable::new();
    let combo: KeyCombo = "Ctrl+B".parse().unwrap();
    table.reserve_foreign(combo, "OtherApp");
    match table.register(combo) {
        Err(RegistrationError::AlreadyOwned { owner, .. }) => assert_eq!(owner, "OtherApp"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(table.lookup(&combo), None);
}
