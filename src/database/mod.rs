//! Embedded object store
//!
//! Records live in typed in-memory collections. Reads hand out owned snapshots,
//! writes go through a scoped [`WriteTransaction`] that is committed wholesale or
//! discarded, and every committed change is announced to registered listeners.

pub mod errors;
pub mod factory;
pub mod results;
pub mod seed;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::models::{Name, RecordId, RecordType, Transaction, TransactionItem, User};

pub use errors::DatabaseError;
pub use factory::create_supplier_invoice;
pub use results::Results;
pub use seed::seed_demo_data;

/// Kind of change carried by a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Create,
    Update,
    Delete,
}

/// Handle returned by [`Database::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<RefCell<Box<dyn FnMut(ChangeType, RecordType)>>>;

/// All collections of the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Store {
    pub names: BTreeMap<RecordId, Name>,
    pub users: BTreeMap<RecordId, User>,
    pub transactions: BTreeMap<RecordId, Transaction>,
    pub transaction_items: BTreeMap<RecordId, TransactionItem>,
}

impl Store {
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
            && self.users.is_empty()
            && self.transactions.is_empty()
            && self.transaction_items.is_empty()
    }
}

/// A record type stored in its own collection
pub trait Object: Clone + Serialize + DeserializeOwned + 'static {
    const RECORD_TYPE: RecordType;

    fn id(&self) -> &RecordId;

    fn collection(store: &Store) -> &BTreeMap<RecordId, Self>;

    fn collection_mut(store: &mut Store) -> &mut BTreeMap<RecordId, Self>;
}

macro_rules! impl_object {
    ($ty:ty, $record_type:expr, $field:ident) => {
        impl Object for $ty {
            const RECORD_TYPE: RecordType = $record_type;

            fn id(&self) -> &RecordId {
                &self.id
            }

            fn collection(store: &Store) -> &BTreeMap<RecordId, Self> {
                &store.$field
            }

            fn collection_mut(store: &mut Store) -> &mut BTreeMap<RecordId, Self> {
                &mut store.$field
            }
        }
    };
}

impl_object!(Name, RecordType::Name, names);
impl_object!(User, RecordType::User, users);
impl_object!(Transaction, RecordType::Transaction, transactions);
impl_object!(TransactionItem, RecordType::TransactionItem, transaction_items);

struct DatabaseInner {
    store: RefCell<Store>,
    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_listener_id: Cell<u64>,
    in_write: Cell<bool>,
    generation: Cell<u64>,
}

/// Shared handle to the object store. Cloning is cheap and every clone sees the same data.
#[derive(Clone)]
pub struct Database {
    inner: Rc<DatabaseInner>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Self::from_store(Store::default())
    }

    pub fn from_store(store: Store) -> Self {
        Self {
            inner: Rc::new(DatabaseInner {
                store: RefCell::new(store),
                listeners: RefCell::new(Vec::new()),
                next_listener_id: Cell::new(0),
                in_write: Cell::new(false),
                generation: Cell::new(0),
            }),
        }
    }

    /// Snapshot of every record of type `T`
    pub fn objects<T: Object>(&self) -> Results<T> {
        let store = self.inner.store.borrow();
        Results::new(T::collection(&store).values().cloned().collect())
    }

    pub fn get<T: Object>(&self, id: &RecordId) -> Option<T> {
        T::collection(&self.inner.store.borrow()).get(id).cloned()
    }

    /// Copy of the whole store, used by persistence
    pub fn snapshot(&self) -> Store {
        self.inner.store.borrow().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.borrow().is_empty()
    }

    /// Number of committed write transactions since this handle was created
    pub fn generation(&self) -> u64 {
        self.inner.generation.get()
    }

    /// Run `f` inside a write transaction.
    ///
    /// The closure works on a staged copy of the store. Returning `Ok` commits the copy
    /// and then notifies listeners once per changed record; returning `Err` (or
    /// panicking) leaves the store untouched and sends no notification.
    pub fn write<T, F>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&mut WriteTransaction) -> Result<T, DatabaseError>,
    {
        if self.inner.in_write.get() {
            return Err(DatabaseError::NestedWrite);
        }

        let (value, changes) = {
            let _guard = WriteGuard::acquire(&self.inner.in_write);
            let mut tx = WriteTransaction {
                store: self.inner.store.borrow().clone(),
                changes: Vec::new(),
            };

            let value = match f(&mut tx) {
                Ok(value) => value,
                Err(e) => {
                    debug!("Write transaction rolled back: {}", e);
                    return Err(e);
                }
            };

            *self.inner.store.borrow_mut() = tx.store;
            self.inner.generation.set(self.inner.generation.get() + 1);
            (value, tx.changes)
        };

        debug!("Write transaction committed with {} change(s)", changes.len());
        for (change_type, record_type) in changes {
            self.notify(change_type, record_type);
        }
        Ok(value)
    }

    /// Register a callback invoked after every committed change
    pub fn add_listener<F>(&self, callback: F) -> ListenerId
    where
        F: FnMut(ChangeType, RecordType) + 'static,
    {
        let id = ListenerId(self.inner.next_listener_id.get());
        self.inner.next_listener_id.set(id.0 + 1);
        let listener: Listener = Rc::new(RefCell::new(Box::new(callback)));
        self.inner.listeners.borrow_mut().push((id, listener));
        id
    }

    pub fn remove_listener(&self, id: ListenerId) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|(listener_id, _)| *listener_id != id);
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    fn notify(&self, change_type: ChangeType, record_type: RecordType) {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in listeners {
            match listener.try_borrow_mut() {
                Ok(mut callback) => (*callback)(change_type, record_type),
                Err(_) => warn!("Skipping re-entrant notification for {}", record_type.as_str()),
            }
        }
    }
}

/// Clears the in-write flag on every exit path, including unwinding.
struct WriteGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> WriteGuard<'a> {
    fn acquire(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self { flag }
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}

/// Staged view of the store handed to [`Database::write`] closures
pub struct WriteTransaction {
    store: Store,
    changes: Vec<(ChangeType, RecordType)>,
}

impl WriteTransaction {
    pub fn get<T: Object>(&self, id: &RecordId) -> Option<&T> {
        T::collection(&self.store).get(id)
    }

    pub fn objects<T: Object>(&self) -> impl Iterator<Item = &T> {
        T::collection(&self.store).values()
    }

    /// Insert a new record; fails if the id is taken
    pub fn create<T: Object>(&mut self, record: T) -> Result<T, DatabaseError> {
        let collection = T::collection_mut(&mut self.store);
        if collection.contains_key(record.id()) {
            return Err(DatabaseError::DuplicateId {
                record_type: T::RECORD_TYPE,
                id: record.id().clone(),
            });
        }
        collection.insert(record.id().clone(), record.clone());
        self.changes.push((ChangeType::Create, T::RECORD_TYPE));
        Ok(record)
    }

    /// Insert or replace a record
    pub fn save<T: Object>(&mut self, record: T) -> T {
        let previous = T::collection_mut(&mut self.store).insert(record.id().clone(), record.clone());
        let change_type = if previous.is_some() {
            ChangeType::Update
        } else {
            ChangeType::Create
        };
        self.changes.push((change_type, T::RECORD_TYPE));
        record
    }

    pub fn delete<T: Object>(&mut self, id: &RecordId) -> Result<T, DatabaseError> {
        let removed = T::collection_mut(&mut self.store)
            .remove(id)
            .ok_or_else(|| DatabaseError::NotFound {
                record_type: T::RECORD_TYPE,
                id: id.clone(),
            })?;
        self.changes.push((ChangeType::Delete, T::RECORD_TYPE));
        Ok(removed)
    }
}
