//! Construction of new pooled objects

use crate::context::Context;

use async_trait::async_trait;

/// Builds a new object whenever the pool has nothing idle to hand out.
///
/// The pool calls the factory outside of its internal lock and forwards
/// the caller's [`Context`] unchanged. Whatever error the factory returns
/// reaches the caller of [`Pool::get`](crate::Pool::get) as-is.
///
/// Any `Fn(&Context) -> Result<T, E>` closure is a factory:
///
/// ```
/// use recycle_pool::{Context, Factory};
/// use std::convert::Infallible;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let factory = |_: &Context| Ok::<_, Infallible>(String::with_capacity(64));
/// let buffer = factory.create(&Context::background()).await.unwrap();
/// assert!(buffer.capacity() >= 64);
/// # }
/// ```
///
/// Asynchronous construction, such as opening a connection, implements
/// the trait directly and can race the work against [`Context::done`].
#[async_trait]
pub trait Factory<T>: Send + Sync {
    /// Error surfaced when construction fails
    type Error: Send;

    /// Construct a fresh object
    async fn create(&self, ctx: &Context) -> Result<T, Self::Error>;
}

#[async_trait]
impl<T, E, F> Factory<T> for F
where
    F: Fn(&Context) -> Result<T, E> + Send + Sync,
    T: Send + 'static,
    E: Send + 'static,
{
    type Error = E;

    async fn create(&self, ctx: &Context) -> Result<T, E> {
        (self)(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ContextError;
    use std::time::Duration;

    struct SlowFactory {
        delay: Duration,
    }

    #[async_trait]
    impl Factory<u32> for SlowFactory {
        type Error = ContextError;

        async fn create(&self, ctx: &Context) -> Result<u32, ContextError> {
            tokio::select! {
                _ = tokio::time::sleep(self.delay) => Ok(7),
                err = ctx.done() => Err(err),
            }
        }
    }

    #[tokio::test]
    async fn test_closure_factory() {
        let factory = |_: &Context| Ok::<_, String>(42);
        assert_eq!(factory.create(&Context::background()).await, Ok(42));
    }

    #[tokio::test]
    async fn test_closure_factory_error() {
        let factory = |_: &Context| Err::<u8, _>("refused".to_string());
        assert_eq!(
            factory.create(&Context::background()).await,
            Err("refused".to_string())
        );
    }

    #[tokio::test]
    async fn test_factory_observes_context() {
        let factory = SlowFactory {
            delay: Duration::from_secs(30),
        };
        let ctx = Context::with_timeout(Duration::from_millis(20));

        assert_eq!(
            factory.create(&ctx).await,
            Err(ContextError::DeadlineExceeded)
        );
    }

    #[tokio::test]
    async fn test_factory_completes_before_deadline() {
        let factory = SlowFactory {
            delay: Duration::from_millis(1),
        };
        let ctx = Context::with_timeout(Duration::from_secs(30));

        assert_eq!(factory.create(&ctx).await, Ok(7));
    }
}
