//! The scope stack.
//!
//! A scope frame carries local bindings that shadow its parent's and the
//! singleton slots of everything built from those bindings. Frames form a
//! chain up to the container's root frame. Which frame is "current" is
//! execution-context local: a thread-local stack for synchronous code and,
//! with the `tokio` feature, a task-local chain for async tasks.

use std::cell::RefCell;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::binding::{Binding, Definition};
use crate::core::{Key, Value};
use crate::error::BoxError;
use crate::signature::Finalizer;

/// Name of the root scope of every container.
pub const ROOT_SCOPE: &str = "root";

thread_local! {
  static SCOPE_STACK: RefCell<Vec<(ExecutionId, Arc<ScopeFrame>)>> = const { RefCell::new(Vec::new()) };
}

/// Which logical execution pushed a thread-local frame. Tasks polled on a
/// thread only see frames pushed by themselves.
#[cfg(feature = "tokio")]
type ExecutionId = Option<tokio::task::Id>;
#[cfg(not(feature = "tokio"))]
type ExecutionId = ();

#[cfg(feature = "tokio")]
fn execution_id() -> ExecutionId {
  tokio::task::try_id()
}

#[cfg(not(feature = "tokio"))]
fn execution_id() -> ExecutionId {}

#[cfg(feature = "tokio")]
tokio::task_local! {
  static TASK_SCOPES: Vec<Arc<ScopeFrame>>;
}

pub(crate) type Slot = Arc<OnceCell<Value>>;

pub(crate) struct ScopeFrame {
  pub(crate) container: u64,
  pub(crate) name: Option<String>,
  pub(crate) parent: Option<Arc<ScopeFrame>>,
  pub(crate) depth: usize,
  pub(crate) bindings: DashMap<Key, Binding>,
  singletons: DashMap<Key, Slot>,
  finalizers: Mutex<Vec<Finalizer>>,
}

impl ScopeFrame {
  pub(crate) fn root(container: u64) -> Arc<Self> {
    Arc::new(Self {
      container,
      name: Some(ROOT_SCOPE.to_owned()),
      parent: None,
      depth: 0,
      bindings: DashMap::new(),
      singletons: DashMap::new(),
      finalizers: Mutex::new(Vec::new()),
    })
  }

  pub(crate) fn child(parent: &Arc<ScopeFrame>, name: Option<String>) -> Arc<Self> {
    Arc::new(Self {
      container: parent.container,
      name,
      parent: Some(parent.clone()),
      depth: parent.depth + 1,
      bindings: DashMap::new(),
      singletons: DashMap::new(),
      finalizers: Mutex::new(Vec::new()),
    })
  }

  /// This frame followed by its parents, up to the root.
  pub(crate) fn ancestors(&self) -> Ancestors<'_> {
    Ancestors { next: Some(self) }
  }

  pub(crate) fn find_named(&self, name: &str) -> Option<&ScopeFrame> {
    self
      .ancestors()
      .find(|frame| frame.name.as_deref() == Some(name))
  }

  pub(crate) fn chain_names(&self) -> Vec<String> {
    self
      .ancestors()
      .map(|frame| frame.display_name().to_owned())
      .collect()
  }

  pub(crate) fn display_name(&self) -> &str {
    self.name.as_deref().unwrap_or("<anonymous>")
  }

  /// The memoization slot for `key`, created on first use.
  ///
  /// The map guard is released before the slot is returned, so constructing
  /// the value never holds a shard lock.
  pub(crate) fn slot(&self, key: &Key) -> Slot {
    if let Some(slot) = self.singletons.get(key) {
      return slot.clone();
    }
    self
      .singletons
      .entry(key.clone())
      .or_insert_with(|| Arc::new(OnceCell::new()))
      .clone()
  }

  /// An already constructed singleton, without forcing construction.
  pub(crate) fn cached(&self, key: &Key) -> Option<Value> {
    self
      .singletons
      .get(key)
      .and_then(|slot| slot.get().cloned())
  }

  pub(crate) fn has_constructed(&self, key: &Key) -> bool {
    self
      .singletons
      .get(key)
      .map(|slot| slot.get().is_some())
      .unwrap_or(false)
  }

  pub(crate) fn seed(&self, key: Key, value: Value) {
    self
      .singletons
      .insert(key, Arc::new(OnceCell::with_value(value)));
  }

  pub(crate) fn forget(&self, key: &Key) {
    self.singletons.remove(key);
  }

  pub(crate) fn push_finalizer(&self, finalizer: Finalizer) {
    self.finalizers.lock().push(finalizer);
  }

  /// Runs the registered finalizers, newest first, collecting failures.
  pub(crate) fn finalize(&self) -> Vec<BoxError> {
    let finalizers = std::mem::take(&mut *self.finalizers.lock());
    if !finalizers.is_empty() {
      tracing::debug!(
        scope = self.display_name(),
        count = finalizers.len(),
        "running scope finalizers"
      );
    }
    finalizers
      .into_iter()
      .rev()
      .filter_map(|finalize| finalize().err())
      .collect()
  }
}

pub(crate) struct Ancestors<'a> {
  next: Option<&'a ScopeFrame>,
}

impl<'a> Iterator for Ancestors<'a> {
  type Item = &'a ScopeFrame;

  fn next(&mut self) -> Option<Self::Item> {
    let current = self.next?;
    self.next = current.parent.as_deref();
    Some(current)
  }
}

/// Description of a scope to open with `Container::run_scope`.
///
/// Bindings added here live only for the duration of that call and shadow
/// everything declared further up the chain.
#[derive(Clone, Debug, Default)]
pub struct Scope {
  name: Option<String>,
  bindings: Vec<(Key, Binding)>,
}

impl Scope {
  /// An anonymous scope.
  pub fn new() -> Self {
    Self::default()
  }

  pub fn named(name: impl Into<String>) -> Self {
    Self {
      name: Some(name.into()),
      bindings: Vec::new(),
    }
  }

  pub fn bind(mut self, id: impl Into<Key>, definition: impl Into<Definition>) -> Self {
    self
      .bindings
      .push((id.into(), Binding::new(definition.into(), false)));
    self
  }

  pub fn bind_singleton(mut self, id: impl Into<Key>, definition: impl Into<Definition>) -> Self {
    self
      .bindings
      .push((id.into(), Binding::new(definition.into(), true)));
    self
  }

  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  pub(crate) fn into_parts(self) -> (Option<String>, Vec<(Key, Binding)>) {
    (self.name, self.bindings)
  }
}

/// A snapshot of the current position in the scope chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScopeInfo {
  name: Option<String>,
  depth: usize,
  chain: Vec<String>,
}

impl ScopeInfo {
  pub(crate) fn of(frame: &ScopeFrame) -> Self {
    Self {
      name: frame.name.clone(),
      depth: frame.depth,
      chain: frame.chain_names(),
    }
  }

  /// Name of the current scope; `None` for anonymous scopes.
  pub fn name(&self) -> Option<&str> {
    self.name.as_deref()
  }

  /// Distance from the root scope, which has depth 0.
  pub fn depth(&self) -> usize {
    self.depth
  }

  pub fn is_root(&self) -> bool {
    self.depth == 0
  }

  /// Scope names from the current scope up to the root.
  pub fn chain(&self) -> &[String] {
    &self.chain
  }
}

/// Returns the innermost frame of `root`'s container for the current
/// execution context.
pub(crate) fn current_frame(root: &Arc<ScopeFrame>) -> Arc<ScopeFrame> {
  let container = root.container;
  let execution = execution_id();
  let local = SCOPE_STACK
    .try_with(|stack| {
      stack
        .borrow()
        .iter()
        .rev()
        .find(|(owner, frame)| *owner == execution && frame.container == container)
        .map(|(_, frame)| frame.clone())
    })
    .ok()
    .flatten();

  #[cfg(feature = "tokio")]
  let local = {
    let task = task_frame(container);
    match (local, task) {
      (Some(l), Some(t)) => Some(if t.depth > l.depth { t } else { l }),
      (l, t) => l.or(t),
    }
  };

  local.unwrap_or_else(|| root.clone())
}

#[cfg(feature = "tokio")]
fn task_frame(container: u64) -> Option<Arc<ScopeFrame>> {
  TASK_SCOPES
    .try_with(|frames| {
      frames
        .iter()
        .rev()
        .find(|frame| frame.container == container)
        .cloned()
    })
    .ok()
    .flatten()
}

/// Runs `future` with `frame` as the task's innermost scope.
#[cfg(feature = "tokio")]
pub(crate) async fn with_task_frame<F: std::future::Future>(
  frame: Arc<ScopeFrame>,
  future: F,
) -> F::Output {
  let mut frames = TASK_SCOPES.try_with(|frames| frames.clone()).unwrap_or_default();
  frames.push(frame);
  TASK_SCOPES.scope(frames, future).await
}

/// Keeps a frame on the thread-local stack.
///
/// Dropping the guard pops the frame, which restores the previous current
/// scope on every exit path, unwinding included. Finalizers that were not
/// run by [`ScopeGuard::close`] are run on drop and their errors discarded.
pub(crate) struct ScopeGuard {
  frame: Arc<ScopeFrame>,
  closed: bool,
}

impl ScopeGuard {
  pub(crate) fn push(frame: Arc<ScopeFrame>) -> Self {
    SCOPE_STACK.with(|stack| stack.borrow_mut().push((execution_id(), frame.clone())));
    tracing::trace!(scope = frame.display_name(), depth = frame.depth, "scope entered");
    Self {
      frame,
      closed: false,
    }
  }

  /// Pops the frame and runs its finalizers.
  pub(crate) fn close(mut self) -> Vec<BoxError> {
    self.pop();
    self.closed = true;
    self.frame.finalize()
  }

  fn pop(&self) {
    let _ = SCOPE_STACK.try_with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(position) = stack.iter().rposition(|(_, frame)| Arc::ptr_eq(frame, &self.frame)) {
        stack.remove(position);
      }
    });
    tracing::trace!(scope = self.frame.display_name(), "scope exited");
  }
}

impl Drop for ScopeGuard {
  fn drop(&mut self) {
    if !self.closed {
      self.pop();
      let _ = self.frame.finalize();
    }
  }
}
