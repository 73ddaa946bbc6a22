use std::future::Future;

use crate::db::postgres::PostgresDriver;
use crate::db::DatabaseDriver;
use crate::storage::ConfigStore;

pub type DriverFactory = Box<dyn Fn() -> Box<dyn DatabaseDriver>>;

/// Everything menu actions share. Lives on the UI thread; actions borrow it through an `Rc`.
pub struct AppState {
    pub store: ConfigStore,
    runtime: tokio::runtime::Runtime,
    driver_factory: DriverFactory,
}

impl AppState {
    pub fn new(store: ConfigStore) -> std::io::Result<Self> {
        Self::with_driver(
            store,
            Box::new(|| Box::new(PostgresDriver::new()) as Box<dyn DatabaseDriver>),
        )
    }

    pub fn with_driver(store: ConfigStore, driver_factory: DriverFactory) -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            store,
            runtime,
            driver_factory,
        })
    }

    /// A fresh, unconnected driver. Connections are never reused across actions.
    pub fn new_driver(&self) -> Box<dyn DatabaseDriver> {
        (self.driver_factory)()
    }

    /// Runs driver work to completion on the UI thread.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
