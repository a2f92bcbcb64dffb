//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Once};

use trellis::{MemoryStore, Runtime, RuntimeConfig};

static INIT: Once = Once::new();

/// Routes `tracing` output to the test harness. Set `RUST_LOG=trellis=debug`
/// to see it.
pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// A runtime with a memory store the test can inspect.
pub fn runtime_with_store(config: RuntimeConfig) -> (Arc<Runtime>, Arc<MemoryStore>) {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let runtime = Runtime::builder()
        .config(config)
        .cache_store(store.clone())
        .build();
    (runtime, store)
}

pub fn write_template(dir: &Path, name: &str, source: &str) {
    std::fs::write(dir.join(name), source).unwrap();
}
