//! Listener handlers.
//!
//! A handler is any async closure taking a [`Response`]. Its output may be
//! `()` or `Result<(), E>` for any error convertible into [`BoxError`], so
//! both plain errors and `anyhow::Error` work with `?`:
//!
//! ```rust,ignore
//! robot.hear("ping", |res: Response| async move {
//!     res.send("pong").await?;
//!     Ok::<_, anyhow::Error>(())
//! })?;
//! ```

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::BoxError;
use crate::response::Response;

/// The normalized return value of every handler.
pub type HandlerResult = Result<(), BoxError>;

/// Converts handler return values into a [`HandlerResult`].
pub trait IntoHandlerResult {
    /// Performs the conversion.
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E> IntoHandlerResult for Result<(), E>
where
    E: Into<BoxError>,
{
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(Into::into)
    }
}

/// A type-erased listener handler.
pub type BoxedHandler = Arc<dyn Fn(Response) -> BoxFuture<'static, HandlerResult> + Send + Sync>;

/// Boxes an async closure into a [`BoxedHandler`].
pub fn into_handler<F, Fut, R>(f: F) -> BoxedHandler
where
    F: Fn(Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoHandlerResult + 'static,
{
    Arc::new(move |response: Response| {
        let fut = f(response);
        async move { fut.await.into_handler_result() }.boxed()
    })
}

/// Renders a panic payload for logging.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
