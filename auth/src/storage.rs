use std::sync::RwLock;

use ahash::{HashMap, HashMapExt};

/// Key-value store holding session keys. `set` and `delete` report
/// whether the store could be reached.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> bool;

    fn delete(&self, key: &str) -> bool;
}

/// Process-local storage; sessions are lost on restart.
#[derive(Default)]
pub struct LocalMemStorage {
    values: RwLock<HashMap<String, String>>,
}

impl LocalMemStorage {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }
}

impl SessionStorage for LocalMemStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> bool {
        match self.values.write() {
            Ok(mut values) => {
                values.insert(key.to_owned(), value.to_owned());
                true
            }
            Err(_) => false,
        }
    }

    fn delete(&self, key: &str) -> bool {
        match self.values.write() {
            Ok(mut values) => {
                values.remove(key);
                true
            }
            Err(_) => false,
        }
    }
}
