//! Typed sequential pipeline with per-step retry.

use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde_json::json;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, error, warn, Instrument};
use uuid::Uuid;

use super::retry::{with_retry, RetryConfig, RetryExhausted};
use super::state::WaterfallState;
use crate::errors::WaterfallError;
use crate::events::{self, EventSink, NoOpEventSink};
use crate::observability::SpanTimer;

type Carried = Box<dyn Any + Send>;

/// A step with its input and output types erased, so a chain of
/// differently typed steps is a flat list walked in a loop.
type ErasedStep<E> = Box<
    dyn Fn(Arc<Invocation>, usize, Carried) -> BoxFuture<'static, Result<Carried, WaterfallError<E>>>
        + Send
        + Sync,
>;

/// A type-erased step mapping `T` to `T`, for homogeneous chains.
pub type BoxedStep<T, E> = Box<dyn Fn(T) -> BoxFuture<'static, Result<T, E>> + Send + Sync>;

/// Boxes a step function so steps of different closure types fit in one `Vec`.
pub fn boxed_step<T, E, F, Fut>(step: F) -> BoxedStep<T, E>
where
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    Box::new(move |input| step(input).boxed())
}

/// Per-run bookkeeping shared by every step of one invocation.
struct Invocation {
    run_id: Uuid,
    config: RetryConfig,
    sink: Arc<dyn EventSink>,
    total_steps: usize,
    state: Mutex<WaterfallState>,
}

impl Invocation {
    fn new(config: RetryConfig, sink: Arc<dyn EventSink>, total_steps: usize) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            config,
            sink,
            total_steps,
            state: Mutex::new(WaterfallState::initial()),
        }
    }

    fn state(&self) -> WaterfallState {
        *self.state.lock()
    }

    fn transition(&self, apply: impl FnOnce(WaterfallState) -> WaterfallState) -> WaterfallState {
        let mut state = self.state.lock();
        *state = apply(*state);
        *state
    }

    fn emit(&self, event_type: &str, mut data: serde_json::Value) {
        if let Some(obj) = data.as_object_mut() {
            obj.insert("run_id".to_string(), json!(self.run_id.to_string()));
            obj.insert("timestamp".to_string(), json!(events::iso_timestamp()));
            obj.insert(
                "state".to_string(),
                serde_json::to_value(self.state()).unwrap_or(serde_json::Value::Null),
            );
        }
        self.sink.try_emit(event_type, Some(data));
    }

    async fn run_step<I, O, E, F, Fut>(
        &self,
        index: usize,
        step: &F,
        input: I,
    ) -> Result<O, WaterfallError<E>>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<O, E>>,
        E: fmt::Display,
    {
        debug!(step = index, "Step started");
        self.emit(events::STEP_STARTED, json!({ "step": index }));
        let timer = SpanTimer::start(format!("waterfall.step.{index}"));

        let result = with_retry(
            &self.config,
            || step(input.clone()),
            |attempt, delay, err: &E| {
                self.transition(|s| s.on_failure(self.config.max_attempts));
                let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
                warn!(step = index, attempt, delay_ms, error = %err, "Step failed, retrying");
                self.emit(
                    events::STEP_RETRYING,
                    json!({
                        "step": index,
                        "attempt": attempt,
                        "delay_ms": delay_ms,
                        "error": err.to_string(),
                    }),
                );
            },
        )
        .await;

        match result {
            Ok(value) => {
                self.transition(|s| s.on_success(self.total_steps));
                self.emit(
                    events::STEP_SUCCEEDED,
                    json!({ "step": index, "duration_ms": timer.finish() }),
                );
                Ok(value)
            }
            Err(RetryExhausted { attempts, error }) => {
                self.transition(|s| s.on_failure(self.config.max_attempts));
                error!(step = index, attempts, error = %error, "Step exhausted retries");
                self.emit(
                    events::WATERFALL_FAILED,
                    json!({
                        "step": index,
                        "attempts": attempts,
                        "error": error.to_string(),
                        "duration_ms": timer.finish(),
                    }),
                );
                Err(WaterfallError::StepFailed {
                    step: index,
                    attempts,
                    error,
                })
            }
        }
    }
}

fn erase<I, O, E, F, Fut>(step: F) -> ErasedStep<E>
where
    I: Clone + Send + Sync + 'static,
    O: Send + 'static,
    E: fmt::Display + Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<O, E>> + Send + 'static,
{
    let step = Arc::new(step);
    Box::new(move |invocation: Arc<Invocation>, index: usize, carried: Carried| {
        let step = Arc::clone(&step);
        async move {
            let input = unbox::<I>(carried);
            let output = invocation.run_step(index, step.as_ref(), input).await?;
            Ok::<Carried, WaterfallError<E>>(Box::new(output))
        }
        .boxed()
    })
}

fn unbox<T: 'static>(carried: Carried) -> T {
    match carried.downcast::<T>() {
        Ok(value) => *value,
        // `then` only appends steps taking the previous step's output type.
        Err(_) => unreachable!("waterfall step received a value of another type"),
    }
}

/// A chain of async steps run one after another, each fed the previous
/// step's output.
///
/// Each step is retried according to the pipeline's [`RetryConfig`]
/// (three attempts, two seconds apart, by default) before the whole run
/// fails. Steps never run concurrently. A waterfall can be run any number
/// of times; every run is independent.
///
/// ```rust,ignore
/// let doubled = Waterfall::new(|| async { Ok::<_, String>(5) })
///     .then(|x| async move { Ok(x * 2) })
///     .run()
///     .await?;
/// assert_eq!(doubled, 10);
/// ```
pub struct Waterfall<T, E> {
    steps: Vec<ErasedStep<E>>,
    config: RetryConfig,
    sink: Arc<dyn EventSink>,
    output: PhantomData<fn() -> T>,
}

impl<T, E> Waterfall<T, E>
where
    T: Send + 'static,
    E: fmt::Display + Send + 'static,
{
    /// Starts a pipeline with a step that takes no input.
    pub fn new<F, Fut>(first: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self {
            steps: vec![erase(move |(): ()| first())],
            config: RetryConfig::default(),
            sink: Arc::new(NoOpEventSink),
            output: PhantomData,
        }
    }

    /// Appends a step consuming this pipeline's output.
    ///
    /// The input is cloned for every attempt, so a retried step sees exactly
    /// the value the previous step produced.
    pub fn then<U, F, Fut>(self, step: F) -> Waterfall<U, E>
    where
        T: Clone + Sync,
        U: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<U, E>> + Send + 'static,
    {
        let mut steps = self.steps;
        steps.push(erase(step));

        Waterfall {
            steps,
            config: self.config,
            sink: self.sink,
            output: PhantomData,
        }
    }

    /// Runs every step in order and returns the last step's output.
    pub async fn run(&self) -> Result<T, WaterfallError<E>> {
        self.run_with_state().await.0
    }

    /// Like [`Waterfall::run`], also returning the final state of the run.
    pub async fn run_with_state(&self) -> (Result<T, WaterfallError<E>>, WaterfallState) {
        let steps = self.steps.len();
        let invocation = Arc::new(Invocation::new(
            self.config.clone(),
            Arc::clone(&self.sink),
            steps,
        ));
        let span = tracing::info_span!("waterfall", run_id = %invocation.run_id, steps);

        async {
            debug!(max_attempts = self.config.max_attempts, "Waterfall started");
            invocation.emit(events::WATERFALL_STARTED, json!({ "steps": steps }));
            let timer = SpanTimer::start("waterfall");

            let result = self.drive(&invocation).await;

            if result.is_ok() {
                debug!("Waterfall succeeded");
                invocation.emit(
                    events::WATERFALL_SUCCEEDED,
                    json!({ "steps": steps, "duration_ms": timer.finish() }),
                );
            }
            (result, invocation.state())
        }
        .instrument(span)
        .await
    }

    async fn drive(&self, invocation: &Arc<Invocation>) -> Result<T, WaterfallError<E>> {
        let mut carried: Carried = Box::new(());
        for (index, step) in self.steps.iter().enumerate() {
            carried = step(Arc::clone(invocation), index, carried).await?;
        }
        Ok(unbox(carried))
    }
}

impl<T, E> Waterfall<T, E> {
    /// Replaces the retry policy applied to every step.
    #[must_use]
    pub fn with_config(mut self, config: RetryConfig) -> Self {
        self.config = config;
        self
    }

    /// Sends state transitions to `sink`.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Returns the number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always false: a waterfall has at least its first step.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

impl<T, E> fmt::Debug for Waterfall<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waterfall")
            .field("len", &self.steps.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Runs `first` followed by each of `rest` with the default retry policy.
pub async fn run_waterfall<T, E, F, Fut>(
    first: F,
    rest: Vec<BoxedStep<T, E>>,
) -> Result<T, WaterfallError<E>>
where
    T: Clone + Send + Sync + 'static,
    E: fmt::Display + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    run_waterfall_with(RetryConfig::default(), first, rest).await
}

/// Runs `first` followed by each of `rest` with the given retry policy.
pub async fn run_waterfall_with<T, E, F, Fut>(
    config: RetryConfig,
    first: F,
    rest: Vec<BoxedStep<T, E>>,
) -> Result<T, WaterfallError<E>>
where
    T: Clone + Send + Sync + 'static,
    E: fmt::Display + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
{
    let mut waterfall = Waterfall::new(first).with_config(config);
    for step in rest {
        waterfall = waterfall.then(step);
    }
    waterfall.run().await
}
