//! Cancellable wrapper around one projection run, with completion and error callbacks.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use narwhal_graph::GraphAccess;

use crate::error::{Error, Result};
use crate::options::ProjectionOptions;
use crate::projection::Projection;

/// Shared flag observed between phases of a run.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }
}

/// Phase boundaries reported to [`ProjectionTask::on_progress`].
///
/// Every phase except [`Phase::TreeBuilt`] has just committed coordinates to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    TreeBuilt,
    Placed,
    Refined { iteration: usize },
}

type Completion<'a> = Box<dyn FnMut(&Projection) + Send + 'a>;
type Failure<'a> = Box<dyn FnMut(&Error) + Send + 'a>;
type Progress<'a> = Box<dyn FnMut(Phase) + Send + 'a>;

/// One projection invocation over a borrowed graph.
///
/// The task holds the graph exclusively for its lifetime, so two tasks can never write the same
/// vertices concurrently.
pub struct ProjectionTask<'a, G: GraphAccess + ?Sized> {
    graph: &'a mut G,
    options: ProjectionOptions,
    cancel: CancellationToken,
    on_completion: Option<Completion<'a>>,
    on_error: Option<Failure<'a>>,
    on_progress: Option<Progress<'a>>,
}

impl<'a, G: GraphAccess + ?Sized> ProjectionTask<'a, G> {
    pub fn new(graph: &'a mut G, options: ProjectionOptions) -> Self {
        Self {
            graph,
            options,
            cancel: CancellationToken::new(),
            on_completion: None,
            on_error: None,
            on_progress: None,
        }
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that cancels this task from another thread or from a callback.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn on_completion(mut self, f: impl FnMut(&Projection) + Send + 'a) -> Self {
        self.on_completion = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&Error) + Send + 'a) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_progress(mut self, f: impl FnMut(Phase) + Send + 'a) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn options(&self) -> &ProjectionOptions {
        &self.options
    }

    /// Runs to completion on the current thread, then fires the matching callback.
    pub fn run(mut self) -> Result<Projection> {
        let mut progress = self.on_progress.take();
        let mut report = |phase: Phase| {
            if let Some(f) = progress.as_mut() {
                f(phase);
            }
        };
        let result = crate::dispatch(&mut *self.graph, &self.options, &self.cancel, &mut report);

        match &result {
            Ok(projection) => {
                if let Some(f) = self.on_completion.as_mut() {
                    f(projection);
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "projection failed");
                if let Some(f) = self.on_error.as_mut() {
                    f(err);
                }
            }
        }
        result
    }

    /// Async form of [`ProjectionTask::run`], usable from any executor.
    pub async fn run_async(self) -> Result<Projection> {
        self.run()
    }
}
