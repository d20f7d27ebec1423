//! メモリ上のキーバリューストア
//!
//! localStorageが使えない環境（プライベートモード等）のフォールバック。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::KeyValueStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: RefCell<HashMap<String, String>>,
    /// trueの間は書き込み・削除を失敗させる
    reject_writes: Cell<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.set(reject);
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        if self.reject_writes.get() {
            return Err("QuotaExceededError: storage is full".to_string());
        }
        self.items.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        if self.reject_writes.get() {
            return Err("SecurityError: storage is read-only".to_string());
        }
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore> KeyValueStore for std::rc::Rc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), String> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), String> {
        (**self).remove(key)
    }
}
