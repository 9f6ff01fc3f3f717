use {
    super::{BoxFuture, ExecutableSchema, ExecutionContext, GraphQLRequest, GraphQLResponse},
    std::{
        any::Any,
        backtrace::Backtrace,
        cell::{Cell, RefCell},
        future::Future,
        panic::{self, AssertUnwindSafe},
        pin::Pin,
        sync::{Arc, Once},
        task::{Context, Poll},
    },
};

/// The only thing a client learns about a resolver panic.
pub const PANIC_MESSAGE: &str = "Panic message seen when processing request";

thread_local! {
    static ISOLATION_DEPTH: Cell<usize> = const { Cell::new(0) };
    static CAPTURED: RefCell<Option<Backtrace>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Decorates a schema so that a panic during execution becomes a logged
/// error with a backtrace and a generic GraphQL error for the client.
///
/// Execution stays on the request's task, so the error log carries the
/// request span (and its request id). This boundary is independent from the
/// chain-level panic recovery, which never sees these panics.
#[derive(Clone)]
pub struct PanicIsolated {
    inner: Arc<dyn ExecutableSchema>,
}

impl PanicIsolated {
    pub fn new(inner: Arc<dyn ExecutableSchema>) -> Self {
        install_panic_hook();
        PanicIsolated { inner }
    }
}

impl ExecutableSchema for PanicIsolated {
    fn execute(
        &self,
        request: GraphQLRequest,
        context: ExecutionContext,
    ) -> BoxFuture<'_, GraphQLResponse> {
        let future = match isolate(|| self.inner.execute(request, context)) {
            Ok(future) => future,
            Err(panicked) => return Box::pin(std::future::ready(recover(panicked))),
        };
        Box::pin(async move { CatchUnwind { inner: future }.await.unwrap_or_else(recover) })
    }
}

struct Panicked {
    message: String,
    backtrace: Option<Backtrace>,
}

struct CatchUnwind<'a> {
    inner: BoxFuture<'a, GraphQLResponse>,
}

impl Future for CatchUnwind<'_> {
    type Output = Result<GraphQLResponse, Panicked>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let inner = &mut self.inner;
        match isolate(|| inner.as_mut().poll(cx)) {
            Ok(Poll::Ready(response)) => Poll::Ready(Ok(response)),
            Ok(Poll::Pending) => Poll::Pending,
            Err(panicked) => Poll::Ready(Err(panicked)),
        }
    }
}

fn recover(panicked: Panicked) -> GraphQLResponse {
    let backtrace = panicked
        .backtrace
        .map(|bt| bt.to_string())
        .unwrap_or_else(|| "unavailable".to_owned());
    tracing::error!(
        panic = %panicked.message,
        backtrace = %backtrace,
        "GraphQL execution panicked"
    );
    GraphQLResponse::error(PANIC_MESSAGE)
}

/// Runs `f`, turning a panic into [`Panicked`]. The backtrace is recorded
/// at the panic site by the hook.
fn isolate<R>(f: impl FnOnce() -> R) -> Result<R, Panicked> {
    CAPTURED.with(|slot| slot.borrow_mut().take());
    ISOLATION_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let outcome = panic::catch_unwind(AssertUnwindSafe(f));
    ISOLATION_DEPTH.with(|depth| depth.set(depth.get() - 1));

    let backtrace = CAPTURED.with(|slot| slot.borrow_mut().take());
    outcome.map_err(|payload| Panicked {
        message: panic_message(payload.as_ref()),
        backtrace,
    })
}

/// Panics inside [`isolate`] are recorded instead of printed; every other
/// panic goes to the hook that was installed before.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if ISOLATION_DEPTH.try_with(Cell::get).unwrap_or(0) > 0 {
                let _ = CAPTURED
                    .try_with(|slot| *slot.borrow_mut() = Some(Backtrace::force_capture()));
            } else {
                previous(info);
            }
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else {
        "non-string panic payload".to_owned()
    }
}
