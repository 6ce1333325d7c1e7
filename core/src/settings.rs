//! Process-wide defaults with scoped overrides.
//!
//! Defaults live behind a global lock and are changed with the `set_*`
//! functions. The `with_*` functions run a closure under a temporary value that
//! is visible only to the current thread's call chain, so concurrent callers
//! never observe each other's overrides.
//!
//! ```rust
//! use tessera_core::Settings;
//!
//! let inside = Settings::with_chunk_size(Some(256), Settings::chunk_size);
//! assert_eq!(inside, Some(256));
//! ```

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::callbacks::CallbackManager;
use crate::tokenizer::{Cl100kTokenizer, Tokenizer};

/// Default token budget per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
/// Default token overlap between consecutive chunks.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

struct Defaults {
    chunk_size: Option<usize>,
    chunk_overlap: usize,
    tokenizer: Arc<dyn Tokenizer>,
    callback_manager: CallbackManager,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            chunk_size: Some(DEFAULT_CHUNK_SIZE),
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            tokenizer: Arc::new(Cl100kTokenizer::new()),
            callback_manager: CallbackManager::new(),
        }
    }
}

#[derive(Clone)]
enum Override {
    ChunkSize(Option<usize>),
    ChunkOverlap(usize),
    Tokenizer(Arc<dyn Tokenizer>),
    CallbackManager(CallbackManager),
}

thread_local! {
    static SCOPES: RefCell<Vec<Override>> = const { RefCell::new(Vec::new()) };
}

fn defaults() -> &'static RwLock<Defaults> {
    static DEFAULTS: OnceLock<RwLock<Defaults>> = OnceLock::new();
    DEFAULTS.get_or_init(|| RwLock::new(Defaults::default()))
}

fn scoped<T>(pick: impl Fn(&Override) -> Option<T>) -> Option<T> {
    SCOPES.with(|scopes| scopes.borrow().iter().rev().find_map(&pick))
}

struct ScopeGuard;

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SCOPES.with(|scopes| {
            scopes.borrow_mut().pop();
        });
    }
}

fn with_override<R>(value: Override, f: impl FnOnce() -> R) -> R {
    SCOPES.with(|scopes| scopes.borrow_mut().push(value));
    let _guard = ScopeGuard;
    f()
}

/// Accessors for the process-wide defaults.
#[derive(Debug, Clone, Copy)]
pub struct Settings;

impl Settings {
    /// Current chunk size; `None` disables size-based checks.
    #[must_use]
    pub fn chunk_size() -> Option<usize> {
        scoped(|value| match value {
            Override::ChunkSize(size) => Some(*size),
            _ => None,
        })
        .unwrap_or_else(|| defaults().read().chunk_size)
    }

    /// Sets the global chunk size.
    pub fn set_chunk_size(chunk_size: Option<usize>) {
        defaults().write().chunk_size = chunk_size;
    }

    /// Runs `f` with a chunk size visible only to this call chain.
    pub fn with_chunk_size<R>(chunk_size: Option<usize>, f: impl FnOnce() -> R) -> R {
        with_override(Override::ChunkSize(chunk_size), f)
    }

    /// Current chunk overlap.
    #[must_use]
    pub fn chunk_overlap() -> usize {
        scoped(|value| match value {
            Override::ChunkOverlap(overlap) => Some(*overlap),
            _ => None,
        })
        .unwrap_or_else(|| defaults().read().chunk_overlap)
    }

    /// Sets the global chunk overlap.
    pub fn set_chunk_overlap(chunk_overlap: usize) {
        defaults().write().chunk_overlap = chunk_overlap;
    }

    /// Runs `f` with a chunk overlap visible only to this call chain.
    pub fn with_chunk_overlap<R>(chunk_overlap: usize, f: impl FnOnce() -> R) -> R {
        with_override(Override::ChunkOverlap(chunk_overlap), f)
    }

    /// Current tokenizer.
    #[must_use]
    pub fn tokenizer() -> Arc<dyn Tokenizer> {
        scoped(|value| match value {
            Override::Tokenizer(tokenizer) => Some(Arc::clone(tokenizer)),
            _ => None,
        })
        .unwrap_or_else(|| Arc::clone(&defaults().read().tokenizer))
    }

    /// Sets the global tokenizer.
    pub fn set_tokenizer(tokenizer: Arc<dyn Tokenizer>) {
        defaults().write().tokenizer = tokenizer;
    }

    /// Runs `f` with a tokenizer visible only to this call chain.
    pub fn with_tokenizer<R>(tokenizer: Arc<dyn Tokenizer>, f: impl FnOnce() -> R) -> R {
        with_override(Override::Tokenizer(tokenizer), f)
    }

    /// Current callback manager.
    #[must_use]
    pub fn callback_manager() -> CallbackManager {
        scoped(|value| match value {
            Override::CallbackManager(manager) => Some(manager.clone()),
            _ => None,
        })
        .unwrap_or_else(|| defaults().read().callback_manager.clone())
    }

    /// Sets the global callback manager.
    pub fn set_callback_manager(manager: CallbackManager) {
        defaults().write().callback_manager = manager;
    }

    /// Runs `f` with a callback manager visible only to this call chain.
    pub fn with_callback_manager<R>(manager: CallbackManager, f: impl FnOnce() -> R) -> R {
        with_override(Override::CallbackManager(manager), f)
    }
}
