//! Resource sources and the registry that holds them.

use chrono::{DateTime, Utc};

use crate::entry::{ChangeFrequency, Priority};
use crate::error::{EnumerationError, PatternError};
use crate::route::{PatternRouter, RouteHandle, Router};

/// One resource instance produced by a [`BindingEnumerator`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceInstance {
    bindings: Vec<(String, String)>,
    last_modified: Option<DateTime<Utc>>,
    change_frequency: Option<ChangeFrequency>,
}

impl ResourceInstance {
    /// Create an instance from ordered variable-name/value pairs.
    pub fn new<I, K, V>(bindings: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            bindings: bindings
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            last_modified: None,
            change_frequency: None,
        }
    }

    #[must_use]
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    #[must_use]
    pub fn with_change_frequency(mut self, change_frequency: ChangeFrequency) -> Self {
        self.change_frequency = Some(change_frequency);
        self
    }

    #[must_use]
    pub fn bindings(&self) -> &[(String, String)] {
        &self.bindings
    }

    #[must_use]
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    #[must_use]
    pub fn change_frequency(&self) -> Option<ChangeFrequency> {
        self.change_frequency
    }
}

/// Sequence of resource instances yielded during one generation.
pub type Instances<'a> = Box<dyn Iterator<Item = Result<ResourceInstance, EnumerationError>> + 'a>;

/// Supplies the variable bindings of a parameterized route.
///
/// [`instances`](Self::instances) is called once per generation and the
/// returned sequence is consumed at most once. The first `Err` aborts the
/// generation; later items are never pulled.
///
/// Closures returning an iterable of results implement this trait:
///
/// ```
/// use smap_sitemap::{BindingEnumerator, EnumerationError, ResourceInstance};
///
/// let ids = vec!["A".to_owned(), "B".to_owned()];
/// let enumerator = move || {
///     ids.clone()
///         .into_iter()
///         .map(|id| Ok::<_, EnumerationError>(ResourceInstance::new([("id", id)])))
///         .collect::<Vec<_>>()
/// };
/// assert_eq!(enumerator.instances().count(), 2);
/// ```
pub trait BindingEnumerator: Send + Sync {
    fn instances(&self) -> Instances<'_>;
}

impl<F, I> BindingEnumerator for F
where
    F: Fn() -> I + Send + Sync,
    I: IntoIterator<Item = Result<ResourceInstance, EnumerationError>>,
    I::IntoIter: 'static,
{
    fn instances(&self) -> Instances<'_> {
        Box::new(self().into_iter())
    }
}

/// A route with a fixed location.
pub(crate) struct StaticSource {
    pub(crate) location: String,
    pub(crate) priority: Priority,
}

/// A route whose instances come from an enumerator.
pub(crate) struct ParameterizedSource {
    pub(crate) route: RouteHandle,
    pub(crate) pattern: String,
    pub(crate) priority: Priority,
    pub(crate) enumerator: Box<dyn BindingEnumerator>,
}

/// Registry of resource sources that belong to the sitemap.
///
/// Routes are registered with the wrapped [`Router`]; the registry only
/// remembers what the sitemap needs to enumerate them. Static sources are
/// emitted before parameterized ones, each group in registration order.
pub struct SitemapRegistry<R = PatternRouter> {
    router: R,
    default_priority: Priority,
    static_sources: Vec<StaticSource>,
    parameterized_sources: Vec<ParameterizedSource>,
}

impl SitemapRegistry<PatternRouter> {
    /// Create a registry backed by a [`PatternRouter`].
    #[must_use]
    pub fn new(default_priority: Priority) -> Self {
        Self::with_router(PatternRouter::new(), default_priority)
    }
}

impl<R: Router> SitemapRegistry<R> {
    /// Create a registry on top of an existing router.
    pub fn with_router(router: R, default_priority: Priority) -> Self {
        Self {
            router,
            default_priority,
            static_sources: Vec::new(),
            parameterized_sources: Vec::new(),
        }
    }

    /// Register a route without variables.
    pub fn register_static(
        &mut self,
        pattern: &str,
        priority: Priority,
    ) -> Result<RouteHandle, PatternError> {
        let route = self.router.register_route(pattern)?;
        if !self.router.variables(route).is_empty() {
            return Err(PatternError::StaticWithVariables(pattern.to_owned()));
        }
        self.static_sources.push(StaticSource {
            location: pattern.to_owned(),
            priority,
        });
        Ok(route)
    }

    /// Register a parameterized route using the registry's default priority.
    pub fn register_parameterized(
        &mut self,
        pattern: &str,
        enumerator: impl BindingEnumerator + 'static,
    ) -> Result<RouteHandle, PatternError> {
        self.register_parameterized_with_priority(pattern, self.default_priority, enumerator)
    }

    /// Register a parameterized route with an explicit priority.
    pub fn register_parameterized_with_priority(
        &mut self,
        pattern: &str,
        priority: Priority,
        enumerator: impl BindingEnumerator + 'static,
    ) -> Result<RouteHandle, PatternError> {
        let route = self.router.register_route(pattern)?;
        self.parameterized_sources.push(ParameterizedSource {
            route,
            pattern: pattern.to_owned(),
            priority,
            enumerator: Box::new(enumerator),
        });
        Ok(route)
    }

    #[must_use]
    pub fn router(&self) -> &R {
        &self.router
    }

    #[must_use]
    pub fn default_priority(&self) -> Priority {
        self.default_priority
    }

    /// Number of registered sources of both kinds.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.static_sources.len() + self.parameterized_sources.len()
    }

    pub(crate) fn static_sources(&self) -> &[StaticSource] {
        &self.static_sources
    }

    pub(crate) fn parameterized_sources(&self) -> &[ParameterizedSource] {
        &self.parameterized_sources
    }
}
