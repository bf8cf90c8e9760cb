use std::sync::Arc;

use crate::auth::AuthService;
use crate::config::Config;
use crate::publisher::EventPublisher;
use crate::store::Store;
use crate::variants::VariantNamer;

/// Shared request context handed to every handler through axum `State`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    store: Arc<dyn Store>,
    auth: AuthService,
    events: EventPublisher,
    variants: VariantNamer,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>, events: EventPublisher) -> Self {
        let auth = AuthService::new(&config, store.clone(), events.clone());
        let variants = VariantNamer::default();
        Self { inner: Arc::new(Inner { config, store, auth, events, variants }) }
    }

    pub fn config(&self) -> &Config { &self.inner.config }
    pub fn store(&self) -> &dyn Store { self.inner.store.as_ref() }
    pub fn auth(&self) -> &AuthService { &self.inner.auth }
    pub fn events(&self) -> &EventPublisher { &self.inner.events }
    pub fn variants(&self) -> &VariantNamer { &self.inner.variants }
}
