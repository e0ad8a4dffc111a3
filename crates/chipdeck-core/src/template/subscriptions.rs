//! Per-field live template subscriptions.
//!
//! Each template-bearing field of a chip gets at most one subscription. The
//! handle for a field is recorded before the backend answers, so calling
//! [`TemplateSubscriptions::connect`] again while an open is still in flight
//! does not start a second one.

use std::sync::{Arc, Mutex};

use chipdeck_types::{ChipConfig, ChipField, FieldMap, TemplateResult, UserContext, is_template};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use super::backend::{ResultCallback, TemplateBackend, TemplateRequest, Unsubscribe};
use crate::error::BackendError;
use crate::utils::lock;

/// Receives the field whose result just changed.
pub type UpdateSender = mpsc::UnboundedSender<ChipField>;

struct PendingSubscription {
    /// Distinguishes this open from any later open of the same field
    generation: u64,
    /// Resolves to the cancel action, or `None` if the open failed
    task: JoinHandle<Option<Unsubscribe>>,
}

/// Subscription handles and last results for the fields of one chip.
#[derive(Default)]
pub struct TemplateSubscriptions {
    results: Arc<Mutex<FieldMap<TemplateResult>>>,
    pending: Arc<Mutex<FieldMap<PendingSubscription>>>,
    generation: u64,
    updates: Option<UpdateSender>,
}

impl TemplateSubscriptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify `updates` whenever a field's result changes.
    #[must_use]
    pub fn with_updates(updates: UpdateSender) -> Self {
        let mut subscriptions = Self::default();
        subscriptions.updates = Some(updates);
        subscriptions
    }

    /// Open subscriptions for every template field that lacks one.
    ///
    /// Does nothing for a field that is already subscribed, when there is no
    /// backend or configuration, or when the field is not a template.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn connect(
        &mut self,
        backend: Option<&Arc<dyn TemplateBackend>>,
        config: Option<&ChipConfig>,
        user: Option<&UserContext>,
    ) {
        let (Some(backend), Some(config)) = (backend, config) else {
            return;
        };
        for field in ChipField::ALL {
            self.connect_field(backend, config, user, field);
        }
    }

    fn connect_field(
        &mut self,
        backend: &Arc<dyn TemplateBackend>,
        config: &ChipConfig,
        user: Option<&UserContext>,
        field: ChipField,
    ) {
        let Some(template) = config.field(field).filter(|text| is_template(text)) else {
            return;
        };

        // Held until the handle is recorded so a fast failure cannot clear
        // the slot before it is filled.
        let mut pending = lock(&self.pending);
        if pending.contains(field) {
            return;
        }

        let request = match TemplateRequest::for_field(config, field, user) {
            Ok(Some(request)) => request,
            Ok(None) => return,
            Err(e) => {
                warn!("Cannot build template request for {}: {}", field, e);
                self.store_result(field, TemplateResult::literal(template));
                return;
            }
        };

        self.generation += 1;
        let generation = self.generation;
        let raw = template.to_string();
        let backend = Arc::clone(backend);
        let on_result = self.result_callback(field);
        let results = Arc::clone(&self.results);
        let slots = Arc::clone(&self.pending);
        let updates = self.updates.clone();

        debug!("Subscribing template for {} (generation {})", field, generation);

        let task = tokio::spawn(async move {
            match backend.subscribe(request, on_result).await {
                Ok(unsubscribe) => Some(unsubscribe),
                Err(e) => {
                    warn!(
                        "Template subscription for {} failed, showing raw text: {}",
                        field, e
                    );
                    lock(&results).insert(field, TemplateResult::literal(raw));
                    if let Some(updates) = &updates {
                        let _ = updates.send(field);
                    }

                    let mut slots = lock(&slots);
                    if slots
                        .get(field)
                        .is_some_and(|slot| slot.generation == generation)
                    {
                        slots.remove(field);
                    }
                    None
                }
            }
        });

        pending.insert(field, PendingSubscription { generation, task });
    }

    fn result_callback(&self, field: ChipField) -> ResultCallback {
        let results = Arc::clone(&self.results);
        let updates = self.updates.clone();
        Arc::new(move |result| {
            lock(&results).insert(field, result);
            if let Some(updates) = &updates {
                let _ = updates.send(field);
            }
        })
    }

    fn store_result(&self, field: ChipField, result: TemplateResult) {
        lock(&self.results).insert(field, result);
        if let Some(updates) = &self.updates {
            let _ = updates.send(field);
        }
    }

    fn take_pending(&self, field: ChipField) -> Option<PendingSubscription> {
        lock(&self.pending).remove(field)
    }

    /// Tear down every subscription.
    ///
    /// All fields are torn down even when one fails; the first unexpected
    /// failure is returned.
    ///
    /// # Errors
    ///
    /// Returns a backend error whose kind is neither `not_found` nor
    /// `template_error`.
    pub async fn disconnect(&mut self) -> Result<(), BackendError> {
        let mut first_error = None;
        for field in ChipField::ALL {
            if let Err(e) = self.disconnect_field(field).await {
                error!("Failed to unsubscribe template for {}: {}", field, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Tear down one field's subscription, waiting for a pending open first.
    ///
    /// # Errors
    ///
    /// Returns a backend error whose kind is neither `not_found` nor
    /// `template_error`.
    pub async fn disconnect_field(&mut self, field: ChipField) -> Result<(), BackendError> {
        let Some(pending) = self.take_pending(field) else {
            return Ok(());
        };

        let unsubscribe = match pending.task.await {
            Ok(Some(unsubscribe)) => unsubscribe,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!("Subscription task for {} did not finish: {}", field, e);
                return Ok(());
            }
        };

        match unsubscribe.call().await {
            Ok(()) => {
                debug!("Unsubscribed template for {}", field);
                Ok(())
            }
            Err(e) if e.is_already_gone() => {
                debug!("Template subscription for {} already gone: {}", field, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Whether a field has a live or in-flight subscription.
    #[must_use]
    pub fn is_subscribed(&self, field: ChipField) -> bool {
        lock(&self.pending).contains(field)
    }

    /// Fields with a live or in-flight subscription.
    #[must_use]
    pub fn subscribed_fields(&self) -> Vec<ChipField> {
        lock(&self.pending).fields().collect()
    }

    #[must_use]
    pub fn result(&self, field: ChipField) -> Option<TemplateResult> {
        lock(&self.results).get(field).cloned()
    }

    /// Snapshot of every field's last result.
    #[must_use]
    pub fn results(&self) -> FieldMap<TemplateResult> {
        lock(&self.results).clone()
    }

    #[must_use]
    pub fn has_results(&self) -> bool {
        !lock(&self.results).is_empty()
    }

    /// Replace the results, e.g. with a cached snapshot.
    pub fn restore(&self, results: FieldMap<TemplateResult>) {
        *lock(&self.results) = results;
    }

    /// Drop one field's last result, e.g. after its template changed.
    pub fn forget_result(&self, field: ChipField) {
        lock(&self.results).remove(field);
    }

    pub fn clear_results(&self) {
        lock(&self.results).clear();
    }
}

impl Drop for TemplateSubscriptions {
    /// Opens still in flight are aborted. Subscriptions that already opened
    /// stay live on the backend until it drops them.
    fn drop(&mut self) {
        let pending = lock(&self.pending);
        if pending.is_empty() {
            return;
        }
        warn!(
            "Dropping {} template subscription(s) without disconnecting",
            pending.len()
        );
        for (_, slot) in pending.iter() {
            slot.task.abort();
        }
    }
}
