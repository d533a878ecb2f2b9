//! Named operations a resource offers on top of delete

use crate::error::Result;
use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

type ActionFn<C> = Box<dyn Fn(Arc<C>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// A named side effect on the remote system and the index, run against a
/// provider-specific context `C`.
pub struct Action<C> {
    name: String,
    run: ActionFn<C>,
}

impl<C> Action<C> {
    pub fn new<F, Fut>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(Arc<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            run: Box::new(move |ctx| Box::pin(run(ctx))),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn run(&self, ctx: Arc<C>) -> Result<()> {
        (self.run)(ctx).await
    }
}

impl<C> fmt::Debug for Action<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("name", &self.name).finish()
    }
}

/// Case-insensitive lookup by name.
pub fn find_action<'a, C>(actions: &'a [Action<C>], name: &str) -> Option<&'a Action<C>> {
    actions.iter().find(|a| a.name.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_run_named_action() {
        let actions = vec![
            Action::new("Start", |ctx: Arc<AtomicUsize>| async move {
                ctx.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
            Action::new("Cancel", |_ctx: Arc<AtomicUsize>| async move { Ok(()) }),
        ];
        let ctx = Arc::new(AtomicUsize::new(0));

        let start = find_action(&actions, "start").unwrap();
        assert_eq!(start.name(), "Start");
        start.run(Arc::clone(&ctx)).await.unwrap();
        assert_eq!(ctx.load(Ordering::SeqCst), 1);

        assert!(find_action(&actions, "Delete").is_none());
    }
}
