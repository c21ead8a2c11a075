use std::fmt;
use std::sync::Arc;

use weave_ioc::Value;

use crate::context::CallContext;
use crate::error::Result;
use crate::interceptor::{Handler, Interceptor};

/// An immutable, ordered list of interceptors.
///
/// Adding interceptors returns a new builder; builders already handed out,
/// and pipelines already built from them, keep their own list.
#[derive(Clone)]
pub struct PipelineBuilder {
  interceptors: Arc<[Arc<dyn Interceptor>]>,
}

impl Default for PipelineBuilder {
  fn default() -> Self {
    Self {
      interceptors: Arc::from(Vec::new()),
    }
  }
}

impl PipelineBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_interceptor(&self, interceptor: impl Interceptor + 'static) -> Self {
    self.with_interceptors([Arc::new(interceptor) as Arc<dyn Interceptor>])
  }

  /// A new builder with `interceptors` appended, in order.
  pub fn with_interceptors<I>(&self, interceptors: I) -> Self
  where
    I: IntoIterator<Item = Arc<dyn Interceptor>>,
  {
    Self {
      interceptors: self
        .interceptors
        .iter()
        .cloned()
        .chain(interceptors)
        .collect(),
    }
  }

  pub fn len(&self) -> usize {
    self.interceptors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.interceptors.is_empty()
  }

  /// Composes the interceptors around `terminal`.
  ///
  /// The first interceptor added is the outermost: on entry interceptors run
  /// in the order they were added, on exit in reverse. Nothing runs until the
  /// returned pipeline is handled.
  pub fn build(&self, terminal: impl Handler + 'static) -> Pipeline {
    let head = self
      .interceptors
      .iter()
      .rev()
      .fold(Arc::new(terminal) as Arc<dyn Handler>, |next, interceptor| {
        Arc::new(Link {
          interceptor: interceptor.clone(),
          next,
        }) as Arc<dyn Handler>
      });
    tracing::debug!(interceptors = self.interceptors.len(), "pipeline built");
    Pipeline {
      head,
      depth: self.interceptors.len(),
    }
  }
}

impl fmt::Debug for PipelineBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PipelineBuilder")
      .field("interceptors", &self.interceptors.len())
      .finish()
  }
}

struct Link {
  interceptor: Arc<dyn Interceptor>,
  next: Arc<dyn Handler>,
}

impl Handler for Link {
  fn handle(&self, context: CallContext) -> Result<Value> {
    self.interceptor.intercept(context, &*self.next)
  }
}

/// A composed handler. Cloning shares the composition.
#[derive(Clone)]
pub struct Pipeline {
  head: Arc<dyn Handler>,
  depth: usize,
}

impl Pipeline {
  /// Number of interceptors wrapped around the terminal handler.
  pub fn depth(&self) -> usize {
    self.depth
  }
}

impl Handler for Pipeline {
  fn handle(&self, context: CallContext) -> Result<Value> {
    self.head.handle(context)
  }
}

impl fmt::Debug for Pipeline {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Pipeline").field("depth", &self.depth).finish()
  }
}
