//! Shared plumbing for the domain stores
//!
//! Each store keeps its data behind a lock together with a loading counter and
//! the message of the last failure. Locks are never held across an `.await`.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::error::Result;

pub(crate) struct StoreState<T> {
    data: RwLock<T>,
    in_flight: AtomicUsize,
    error: RwLock<Option<String>>,
}

/// Decrements the in-flight counter however the action ends
struct LoadingGuard<'a>(&'a AtomicUsize);

impl<'a> LoadingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<T: Default> Default for StoreState<T> {
    fn default() -> Self {
        Self {
            data: RwLock::new(T::default()),
            in_flight: AtomicUsize::new(0),
            error: RwLock::new(None),
        }
    }
}

impl<T> StoreState<T> {
    pub(crate) fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.data.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn write<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.data.write().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub(crate) fn error(&self) -> Option<String> {
        self.error
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_error(&self, message: Option<String>) {
        *self.error.write().unwrap_or_else(PoisonError::into_inner) = message;
    }

    /// Run a store action: clear the error, count it as loading, record its failure
    pub(crate) async fn track<R, F>(&self, action: F) -> Result<R>
    where
        F: Future<Output = Result<R>>,
    {
        self.set_error(None);
        let _loading = LoadingGuard::enter(&self.in_flight);

        action.await.map_err(|err| {
            self.set_error(Some(err.to_string()));
            err
        })
    }

    /// Run a lookup where 404 means "nothing there yet".
    ///
    /// Lookups leave the loading flag alone. Absence is not a failure and
    /// leaves the error untouched; anything else is recorded.
    pub(crate) async fn lookup<R, F>(&self, action: F) -> Result<Option<R>>
    where
        F: Future<Output = Result<R>>,
    {
        match action.await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => {
                self.set_error(Some(err.to_string()));
                Err(err)
            }
        }
    }
}
