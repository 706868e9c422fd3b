//! # View Registry
//!
//! Closed map from a view identifier (normally an enum) to a factory. Views
//! are resolved by key at registration time, never by name lookup at
//! navigation time.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use till_core::RouteParams;
use tracing::debug;

use crate::error::{ViewError, ViewResult};
use crate::view::{View, ViewInstance};

/// Builds a view from an application context and route parameters.
pub type ViewFactory<C> = Arc<dyn Fn(&C, RouteParams) -> Box<dyn View> + Send + Sync>;

/// Registry of view factories keyed by `K`, built against context `C`.
pub struct ViewRegistry<K, C> {
    factories: HashMap<K, ViewFactory<C>>,
}

impl<K, C> ViewRegistry<K, C>
where
    K: Eq + Hash + Copy + Debug,
{
    pub fn new() -> Self {
        ViewRegistry {
            factories: HashMap::new(),
        }
    }

    /// Registers (or replaces) the factory for `kind`.
    pub fn register<F, V>(&mut self, kind: K, factory: F) -> &mut Self
    where
        F: Fn(&C, RouteParams) -> V + Send + Sync + 'static,
        V: View + 'static,
    {
        let factory: ViewFactory<C> = Arc::new(move |ctx: &C, params: RouteParams| -> Box<dyn View> {
            Box::new(factory(ctx, params))
        });
        self.factories.insert(kind, factory);
        self
    }

    pub fn contains(&self, kind: K) -> bool {
        self.factories.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Creates a fresh, uninitialized instance of `kind`.
    pub fn create(&self, kind: K, ctx: &C, params: RouteParams) -> ViewResult<ViewInstance> {
        let factory = self
            .factories
            .get(&kind)
            .ok_or_else(|| ViewError::UnknownView(format!("{kind:?}")))?;
        debug!(view = ?kind, "Creating view");
        Ok(ViewInstance::from_arc(Arc::from(factory(ctx, params))))
    }
}

impl<K, C> Default for ViewRegistry<K, C>
where
    K: Eq + Hash + Copy + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::BaseView;
    use crate::mount::MemoryMount;
    use async_trait::async_trait;
    use till_core::NoopChrome;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Screen {
        Home,
        Missing,
    }

    struct Home {
        base: BaseView,
    }

    #[async_trait]
    impl View for Home {
        fn base(&self) -> &BaseView {
            &self.base
        }

        async fn render(&self) -> ViewResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_create_registered_and_unknown_views() {
        let mut registry: ViewRegistry<Screen, Arc<MemoryMount>> = ViewRegistry::new();
        registry.register(Screen::Home, |mount: &Arc<MemoryMount>, params| Home {
            base: BaseView::new("home", mount.clone(), Arc::new(NoopChrome), params),
        });

        let mount = Arc::new(MemoryMount::new());
        let view = registry.create(Screen::Home, &mount, RouteParams::new()).unwrap();
        assert_eq!(view.name(), "home");

        assert!(registry.contains(Screen::Home));
        let err = registry.create(Screen::Missing, &mount, RouteParams::new()).unwrap_err();
        assert!(matches!(err, ViewError::UnknownView(name) if name == "Missing"));
    }
}
