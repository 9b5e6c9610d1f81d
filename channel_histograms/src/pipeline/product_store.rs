use std::{
    any::Any,
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

use crate::error::CycleError;

struct Product {
    tags: Vec<String>,
    object: RwLock<Box<dyn Any + Send + Sync>>,
}

/// Named, type-erased data products shared between pipeline stages.
///
/// Each product sits behind its own lock: readers share it, a writer has it alone.
/// Access is scoped to a callback so that no lock outlives the work done under it.
#[derive(Default)]
pub struct ProductStore {
    products: RwLock<HashMap<String, Arc<Product>>>,
}

impl std::fmt::Debug for ProductStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductStore")
            .field("labels", &self.labels())
            .finish()
    }
}

impl ProductStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// True if a product is registered under this label
    pub fn has_product(&self, label: &str) -> bool {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(label)
    }

    /// Run `read` with shared access to a product.
    ///
    /// Fails with `InputMissing` if nothing is registered under the label, and with
    /// `TypeMismatch` if the product is not a `T`; `read` is not called in either case.
    pub fn checkout_read<T, R>(
        &self,
        label: &str,
        read: impl FnOnce(&T) -> R,
    ) -> Result<R, CycleError>
    where
        T: Any,
    {
        let product = self.product(label)?;
        let guard = product.object.read().map_err(|_| CycleError::Poisoned {
            label: label.to_string(),
        })?;
        let object: &(dyn Any + Send + Sync) = &**guard;
        let typed = object
            .downcast_ref::<T>()
            .ok_or_else(|| type_mismatch::<T>(label))?;
        Ok(read(typed))
    }

    /// Run `write` with exclusive access to a product.
    ///
    /// Never creates the product; register it with [`ProductStore::add_or_update`]
    /// first. Failures are the same as for [`ProductStore::checkout_read`].
    pub fn checkout_write<T, R>(
        &self,
        label: &str,
        write: impl FnOnce(&mut T) -> R,
    ) -> Result<R, CycleError>
    where
        T: Any,
    {
        let product = self.product(label)?;
        let mut guard = product.object.write().map_err(|_| CycleError::Poisoned {
            label: label.to_string(),
        })?;
        let object: &mut (dyn Any + Send + Sync) = &mut **guard;
        let typed = object
            .downcast_mut::<T>()
            .ok_or_else(|| type_mismatch::<T>(label))?;
        Ok(write(typed))
    }

    /// Register a product, replacing anything already under the label.
    pub fn add_or_update<T>(
        &self,
        label: impl Into<String>,
        object: T,
        tags: impl IntoIterator<Item = impl Into<String>>,
    ) where
        T: Any + Send + Sync,
    {
        let label = label.into();
        let object: Box<dyn Any + Send + Sync> = Box::new(object);
        let product = Arc::new(Product {
            tags: tags.into_iter().map(Into::into).collect(),
            object: RwLock::new(object),
        });
        log::trace!("registering product '{label}'");
        self.products
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(label, product);
    }

    /// Tags a product was registered with
    pub fn tags(&self, label: &str) -> Option<Vec<String>> {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(label)
            .map(|product| product.tags.clone())
    }

    /// Every registered label, sorted
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = self
            .products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        labels.sort();
        labels
    }

    fn product(&self, label: &str) -> Result<Arc<Product>, CycleError> {
        self.products
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(label)
            .cloned()
            .ok_or_else(|| CycleError::InputMissing {
                label: label.to_string(),
            })
    }
}

fn type_mismatch<T>(label: &str) -> CycleError {
    CycleError::TypeMismatch {
        label: label.to_string(),
        expected: std::any::type_name::<T>(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use crate::error::CycleError;

    use super::ProductStore;

    #[test_log::test]
    fn test_read_and_write() {
        let store = ProductStore::new();
        assert!(!store.has_product("numbers"));

        store.add_or_update("numbers", vec![1_u32, 2, 3], ["list"]);
        assert!(store.has_product("numbers"));
        assert_eq!(Some(vec!["list".to_string()]), store.tags("numbers"));

        store
            .checkout_write("numbers", |numbers: &mut Vec<u32>| numbers.push(4))
            .unwrap();
        let sum = store
            .checkout_read("numbers", |numbers: &Vec<u32>| numbers.iter().sum::<u32>())
            .unwrap();
        assert_eq!(10, sum);
    }

    #[test_log::test]
    fn test_missing_and_mismatched() {
        let store = ProductStore::new();
        assert_eq!(
            Err(CycleError::InputMissing {
                label: "absent".to_string()
            }),
            store.checkout_read("absent", |_: &String| ())
        );

        store.add_or_update("text", "hello".to_string(), Vec::<String>::new());
        let mut called = false;
        let result = store.checkout_write("text", |_: &mut Vec<u32>| called = true);
        assert!(matches!(result, Err(CycleError::TypeMismatch { .. })));
        assert!(!called);
    }

    #[test_log::test]
    fn test_add_or_update_replaces() {
        let store = ProductStore::new();
        store.add_or_update("value", 1_u64, ["first"]);
        store.add_or_update("value", "now a string".to_string(), ["second"]);

        assert_eq!(Some(vec!["second".to_string()]), store.tags("value"));
        assert!(store.checkout_read("value", |_: &u64| ()).is_err());
        assert_eq!(
            "now a string",
            store.checkout_read("value", |s: &String| s.clone()).unwrap()
        );
        assert_eq!(vec!["value".to_string()], store.labels());
    }
}
