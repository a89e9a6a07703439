use crate::account::{Account, AccountFields, AccountId, seed_accounts};
use log::{debug, warn};

/// Callback run with the whole collection after every mutation that changed it.
pub type Observer = Box<dyn FnMut(&[Account]) + Send>;

/// Canonical in-memory account collection.
///
/// The store is the only thing allowed to mutate accounts. Records are kept
/// newest first; ids are handed out from the wall clock but never go
/// backwards, so an id is never reused while the process lives.
pub struct AccountStore {
    accounts: Vec<Account>,
    last_id: u64,
    observers: Vec<Observer>,
}

impl Default for AccountStore {
    fn default() -> Self {
        Self::with_seed()
    }
}

impl AccountStore {
    /// A store holding the built-in seed accounts.
    pub fn with_seed() -> Self {
        let mut store = Self::empty();
        store.load(seed_accounts());
        store
    }

    pub fn empty() -> Self {
        AccountStore {
            accounts: Vec::new(),
            last_id: 0,
            observers: Vec::new(),
        }
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn get(&self, id: AccountId) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn contains(&self, id: AccountId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Register a callback that sees the collection after each change.
    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    /// Add a new record at the front of the collection and return its id.
    ///
    /// No validation happens here; callers validate before creating.
    ///
    /// # Arguments
    /// * `fields` - Everything but the id, which the store assigns
    ///
    /// # Returns
    /// * `AccountId` - The fresh id, never shared with a live record
    pub fn create(&mut self, fields: AccountFields) -> AccountId {
        let id = self.next_id();
        self.accounts.insert(0, Account::new(id, fields));
        debug!("Created account {id}");
        self.notify();
        id
    }

    /// Replace the record with `id` wholesale. Unknown ids are ignored.
    pub fn replace(&mut self, id: AccountId, fields: AccountFields) -> bool {
        let Some(slot) = self.accounts.iter_mut().find(|a| a.id == id) else {
            debug!("Replace skipped, account {id} not found");
            return false;
        };
        *slot = Account::new(id, fields);
        debug!("Replaced account {id}");
        self.notify();
        true
    }

    /// Remove the record with `id`. Unknown ids are ignored.
    pub fn delete(&mut self, id: AccountId) -> bool {
        let before = self.accounts.len();
        self.accounts.retain(|a| a.id != id);
        if self.accounts.len() == before {
            debug!("Delete skipped, account {id} not found");
            return false;
        }
        debug!("Deleted account {id}");
        self.notify();
        true
    }

    /// Throw away every record and go back to the seed accounts.
    pub fn reset_to_seed(&mut self) {
        self.load(seed_accounts());
        debug!("Reset store to {} seed accounts", self.accounts.len());
        self.notify();
    }

    /// Install a restored snapshot. Observers are not told: replaying
    /// persisted state must not write it straight back.
    pub fn hydrate(&mut self, accounts: Vec<Account>) {
        self.load(accounts);
        debug!("Hydrated store with {} accounts", self.accounts.len());
    }

    fn load(&mut self, accounts: Vec<Account>) {
        let highest = accounts.iter().map(|a| a.id.0).max().unwrap_or(0);
        self.last_id = self.last_id.max(highest);
        self.accounts = accounts;
    }

    fn next_id(&mut self) -> AccountId {
        let now = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0);
        let Some(after_last) = self.last_id.checked_add(1) else {
            let id = self.lowest_free_id();
            warn!("Account id space exhausted, reusing free id {id}");
            return id;
        };
        let id = now.max(after_last);
        self.last_id = id;
        AccountId(id)
    }

    fn lowest_free_id(&self) -> AccountId {
        let mut used: Vec<u64> = self.accounts.iter().map(|a| a.id.0).collect();
        used.sort_unstable();
        let mut candidate = 1;
        for id in used {
            if id == candidate {
                candidate += 1;
            } else if id > candidate {
                break;
            }
        }
        AccountId(candidate)
    }

    fn notify(&mut self) {
        for observer in self.observers.iter_mut() {
            observer(&self.accounts);
        }
    }
}
