//! A single template chip and its lifecycle.
//!
//! The host drives a [`TemplateChip`] through four hooks:
//!
//! - [`TemplateChip::set_config`] whenever the dashboard hands over a config
//! - [`TemplateChip::set_backend`] when a template backend becomes available
//! - [`TemplateChip::mount`] / [`TemplateChip::unmount`] as the chip enters
//!   and leaves the screen
//!
//! and reads [`TemplateChip::render`] to draw it.

use std::sync::Arc;

use chipdeck_types::{
    ActionConfig, ActionKind, BadgeView, ChipConfig, ChipField, ChipView, UserContext,
    is_template,
};
use tracing::{debug, error};

use crate::cache::ResultCache;
use crate::error::BackendError;
use crate::hash::ConfigHash;
use crate::markup::parse_inline_icons;
use crate::template::{TemplateBackend, TemplateSubscriptions, UpdateSender};
use crate::{Error, Result};

const GESTURES: [ActionKind; 3] = [ActionKind::Tap, ActionKind::Hold, ActionKind::DoubleTap];

pub struct TemplateChip {
    config: Option<ChipConfig>,
    hash: Option<ConfigHash>,
    backend: Option<Arc<dyn TemplateBackend>>,
    user: Option<UserContext>,
    subscriptions: TemplateSubscriptions,
    cache: ResultCache,
    mounted: bool,
}

impl TemplateChip {
    /// Create an unconfigured, unmounted chip sharing `cache`.
    #[must_use]
    pub fn new(cache: ResultCache) -> Self {
        Self::with_subscriptions(cache, TemplateSubscriptions::new())
    }

    /// Like [`TemplateChip::new`], reporting every result change on `updates`.
    #[must_use]
    pub fn with_updates(cache: ResultCache, updates: UpdateSender) -> Self {
        Self::with_subscriptions(cache, TemplateSubscriptions::with_updates(updates))
    }

    fn with_subscriptions(cache: ResultCache, subscriptions: TemplateSubscriptions) -> Self {
        Self {
            config: None,
            hash: None,
            backend: None,
            user: None,
            subscriptions,
            cache,
            mounted: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> Option<&ChipConfig> {
        self.config.as_ref()
    }

    #[must_use]
    pub fn config_hash(&self) -> Option<&ConfigHash> {
        self.hash.as_ref()
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    #[must_use]
    pub fn subscriptions(&self) -> &TemplateSubscriptions {
        &self.subscriptions
    }

    /// Apply a new configuration.
    ///
    /// Subscriptions of fields whose template text changed, or of every
    /// field when the bound entity changed, are torn down first and their
    /// last results dropped. The new config is applied even if a teardown
    /// fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be hashed or a teardown fails
    /// with an unexpected backend error.
    pub async fn set_config(&mut self, config: ChipConfig) -> Result<()> {
        let hash = ConfigHash::of(&config)?;
        let mut teardown_error: Option<BackendError> = None;

        if let Some(previous) = &self.config {
            let entity_changed = previous.entity != config.entity;
            for field in ChipField::ALL {
                if !entity_changed && previous.field(field) == config.field(field) {
                    continue;
                }
                debug!("Chip field {} changed, dropping its subscription", field);
                if let Err(e) = self.subscriptions.disconnect_field(field).await {
                    error!("Failed to unsubscribe template for {}: {}", field, e);
                    teardown_error.get_or_insert(e);
                }
                self.subscriptions.forget_result(field);
            }
        }

        self.config = Some(config);
        self.hash = Some(hash);
        self.refresh();

        teardown_error.map_or(Ok(()), |e| Err(Error::Backend(e)))
    }

    /// Provide the template backend and the user templates render for.
    pub fn set_backend(&mut self, backend: Arc<dyn TemplateBackend>, user: Option<UserContext>) {
        self.backend = Some(backend);
        self.user = user;
        self.refresh();
    }

    /// Start showing the chip: restore cached results and subscribe.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime while a backend and a
    /// template config are set.
    pub fn mount(&mut self) {
        self.mounted = true;
        self.refresh();
    }

    /// Stop showing the chip: tear down every subscription and remember the
    /// last results for the next chip with the same configuration.
    ///
    /// # Errors
    ///
    /// Returns the first unexpected backend error hit during teardown. The
    /// results are cached regardless.
    pub async fn unmount(&mut self) -> Result<()> {
        self.mounted = false;
        let outcome = self.subscriptions.disconnect().await;
        self.store_in_cache();
        outcome.map_err(Error::Backend)
    }

    /// Post-update hook: fill empty results from the cache, then open any
    /// missing subscriptions. Safe to call at any time.
    pub fn refresh(&mut self) {
        self.restore_from_cache();
        if self.mounted {
            self.subscriptions.connect(
                self.backend.as_ref(),
                self.config.as_ref(),
                self.user.as_ref(),
            );
        }
    }

    fn restore_from_cache(&self) {
        if self.subscriptions.has_results() {
            return;
        }
        let Some(hash) = &self.hash else {
            return;
        };
        if let Some(cached) = self.cache.get(hash) {
            debug!("Restored {} cached template result(s) for {}", cached.len(), hash);
            self.subscriptions.restore(cached);
        }
    }

    fn store_in_cache(&self) {
        let Some(hash) = &self.hash else {
            return;
        };
        if !self.subscriptions.has_results() {
            return;
        }
        if let Some(evicted) = self.cache.put(hash.clone(), self.subscriptions.results()) {
            debug!("Cache full, evicted results for {}", evicted);
        }
    }

    /// Whether a field's configured text is a template.
    #[must_use]
    pub fn is_template(&self, field: ChipField) -> bool {
        self.config
            .as_ref()
            .is_some_and(|config| config.is_template(field))
    }

    /// Current display value of a field.
    ///
    /// Literal text is returned as configured. A template field yields its
    /// last rendered result, or `None` before the first one arrives.
    #[must_use]
    pub fn value(&self, field: ChipField) -> Option<String> {
        let text = self.config.as_ref()?.field(field)?;
        if is_template(text) {
            self.subscriptions.result(field).map(|result| result.result)
        } else {
            Some(text.to_string())
        }
    }

    /// Action to dispatch for a gesture; `None` when unbound or `none`.
    #[must_use]
    pub fn action(&self, kind: ActionKind) -> Option<&ActionConfig> {
        self.config
            .as_ref()?
            .action(kind)
            .filter(|action| action.is_active())
    }

    /// Resolve the chip for drawing.
    ///
    /// Returns `None` while there is no configuration or no backend.
    #[must_use]
    pub fn render(&self) -> Option<ChipView> {
        let config = self.config.as_ref()?;
        self.backend.as_ref()?;

        let shown = |field| self.value(field).filter(|value| !value.trim().is_empty());
        let segments = |field| {
            shown(field)
                .map(|text| parse_inline_icons(&text))
                .unwrap_or_default()
        };

        Some(ChipView {
            icon: shown(ChipField::Icon),
            icon_color: shown(ChipField::IconColor),
            icon_background: shown(ChipField::IconBackground),
            picture: shown(ChipField::Picture),
            badge: shown(ChipField::BadgeIcon).map(|icon| BadgeView {
                icon,
                color: shown(ChipField::BadgeColor),
            }),
            primary: segments(ChipField::Primary),
            secondary: segments(ChipField::Secondary),
            max_width: shown(ChipField::MaxWidth),
            clickable: GESTURES
                .into_iter()
                .any(|kind| config.action(kind).is_some_and(ActionConfig::is_active)),
        })
    }
}

impl std::fmt::Debug for TemplateChip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateChip")
            .field("config", &self.config)
            .field("hash", &self.hash)
            .field("has_backend", &self.backend.is_some())
            .field("mounted", &self.mounted)
            .finish_non_exhaustive()
    }
}
