use axum::extract::FromRef;
use fieldguard_database::MemoryStore;
use fieldguard_domain::config::ApiConfig;
use fieldguard_event_bus::EventBus;
use fieldguard_vault::KeyProvider;
use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

#[fieldguard_derive::fieldguard_error]
pub enum ApiStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

pub struct ApiStateInner {
    pub config: ApiConfig,
    pub store: MemoryStore,
    pub events: EventBus,
    pub keys: Arc<dyn KeyProvider>,
}

impl fmt::Debug for ApiStateInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiStateInner")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

/// Cheaply cloneable state shared by every HTTP handler.
#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<ApiState> for ApiConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.config.clone()
    }
}

impl FromRef<ApiState> for MemoryStore {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.store.clone()
    }
}

impl FromRef<ApiState> for EventBus {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.events.clone()
    }
}

#[derive(Default)]
pub struct ApiStateBuilder {
    config: Option<ApiConfig>,
    store: Option<MemoryStore>,
    events: Option<EventBus>,
    keys: Option<Arc<dyn KeyProvider>>,
}

impl fmt::Debug for ApiStateBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiStateBuilder")
            .field("config", &self.config.is_some())
            .field("store", &self.store.is_some())
            .field("events", &self.events.is_some())
            .field("keys", &self.keys.is_some())
            .finish()
    }
}

impl ApiStateBuilder {
    #[must_use]
    pub fn config(mut self, config: ApiConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn store(mut self, store: MemoryStore) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub fn keys(mut self, keys: Arc<dyn KeyProvider>) -> Self {
        self.keys = Some(keys);
        self
    }

    /// Builds the state. A missing store is created on the configured event bus.
    ///
    /// # Errors
    /// Returns [`ApiStateError::Validation`] if the config or key provider is missing.
    pub fn build(self) -> Result<ApiState, ApiStateError> {
        let config = self.config.ok_or_else(|| ApiStateError::Validation {
            message: "ApiConfig not provided".into(),
            context: None,
        })?;
        let keys = self.keys.ok_or_else(|| ApiStateError::Validation {
            message: "Key provider not provided".into(),
            context: None,
        })?;
        let events = self.events.unwrap_or_default();
        let store = self.store.unwrap_or_else(|| MemoryStore::new(events.clone()));

        Ok(ApiState { inner: Arc::new(ApiStateInner { config, store, events, keys }) })
    }
}
