//! Application state for the watch view.

use chipdeck_core::{ActionKind, TemplateChip};
use tracing::{debug, error};

pub struct App {
    pub chips: Vec<TemplateChip>,
    pub selected: usize,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(chips: Vec<TemplateChip>) -> Self {
        Self {
            chips,
            selected: 0,
            status: None,
            should_quit: false,
        }
    }

    pub fn mount_all(&mut self) {
        for chip in &mut self.chips {
            chip.mount();
        }
    }

    pub async fn unmount_all(&mut self) {
        for (index, chip) in self.chips.iter_mut().enumerate() {
            if let Err(e) = chip.unmount().await {
                error!("Failed to unmount chip {}: {}", index, e);
            }
        }
    }

    pub fn select_next(&mut self) {
        if !self.chips.is_empty() {
            self.selected = (self.selected + 1) % self.chips.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.chips.is_empty() {
            self.selected = self
                .selected
                .checked_sub(1)
                .unwrap_or(self.chips.len() - 1);
        }
    }

    /// Resolve the selected chip's action for a gesture into the status line.
    pub fn trigger(&mut self, kind: ActionKind) {
        let Some(chip) = self.chips.get(self.selected) else {
            return;
        };
        let entity = chip
            .config()
            .and_then(|config| config.entity.as_deref())
            .unwrap_or("-");

        let status = match chip.action(kind) {
            Some(action) => format!("{}: {} ({})", kind.as_str(), action, entity),
            None => format!("{}: no action", kind.as_str()),
        };
        debug!("Chip {} {}", self.selected, status);
        self.status = Some(status);
    }

    /// Unmount the selected chip, forget what it showed and mount it again.
    /// Its values come back from the shared cache before the backend
    /// delivers fresh ones.
    pub async fn remount_selected(&mut self) {
        let index = self.selected;
        let Some(chip) = self.chips.get_mut(index) else {
            return;
        };
        let outcome = chip.unmount().await;
        chip.subscriptions().clear_results();
        chip.mount();

        self.status = Some(match outcome {
            Ok(()) if chip.subscriptions().has_results() => {
                format!("remounted chip {} from cache", index + 1)
            }
            Ok(()) => format!("remounted chip {}", index + 1),
            Err(e) => {
                error!("Failed to unmount chip {}: {}", index, e);
                format!("remount: {e}")
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chipdeck_core::{
        ActionConfig, ChipConfig, ChipField, ConfigHash, FieldMap, ResultCache, TemplateResult,
    };

    async fn chip(config: ChipConfig) -> TemplateChip {
        let mut chip = TemplateChip::new(ResultCache::default());
        chip.set_config(config).await.unwrap();
        chip
    }

    fn light() -> ChipConfig {
        ChipConfig {
            entity: Some("light.kitchen".to_string()),
            tap_action: Some(ActionConfig::Toggle),
            hold_action: Some(ActionConfig::None),
            ..Default::default()
        }
        .with_field(ChipField::Primary, "Kitchen")
    }

    #[tokio::test]
    async fn test_selection_wraps() {
        let mut app = App::new(vec![chip(light()).await, chip(light()).await]);

        app.select_previous();
        assert_eq!(app.selected, 1);
        app.select_next();
        assert_eq!(app.selected, 0);
        app.select_next();
        assert_eq!(app.selected, 1);
    }

    #[test]
    fn test_selection_without_chips() {
        let mut app = App::new(Vec::new());
        app.select_next();
        app.select_previous();
        app.trigger(ActionKind::Tap);
        assert_eq!(app.selected, 0);
        assert!(app.status.is_none());
    }

    #[tokio::test]
    async fn test_trigger_shows_action() {
        let mut app = App::new(vec![chip(light()).await]);

        app.trigger(ActionKind::Tap);
        assert_eq!(app.status.as_deref(), Some("tap: toggle (light.kitchen)"));

        app.trigger(ActionKind::Hold);
        assert_eq!(app.status.as_deref(), Some("hold: no action"));

        app.trigger(ActionKind::DoubleTap);
        assert_eq!(app.status.as_deref(), Some("double_tap: no action"));
    }

    #[tokio::test]
    async fn test_remount_keeps_chip_mounted() {
        let mut app = App::new(vec![chip(light()).await]);
        app.mount_all();

        app.remount_selected().await;

        assert!(app.chips[0].is_mounted());
        assert_eq!(app.status.as_deref(), Some("remounted chip 1"));

        app.unmount_all().await;
        assert!(!app.chips[0].is_mounted());
    }

    fn outside() -> ChipConfig {
        ChipConfig {
            entity: Some("sensor.outside".to_string()),
            ..Default::default()
        }
        .with_field(ChipField::Primary, "{{ states(entity) }}")
    }

    async fn app_showing(cache: &ResultCache, value: &str) -> App {
        let mut chip = TemplateChip::new(cache.clone());
        chip.set_config(outside()).await.unwrap();
        let shown: FieldMap<TemplateResult> = [(ChipField::Primary, TemplateResult::literal(value))]
            .into_iter()
            .collect();
        chip.subscriptions().restore(shown);

        let mut app = App::new(vec![chip]);
        app.mount_all();
        app
    }

    #[tokio::test]
    async fn test_remount_restores_from_shared_cache() {
        let cache = ResultCache::default();
        let mut app = app_showing(&cache, "21.5").await;

        app.remount_selected().await;

        assert!(cache.contains(&ConfigHash::of(&outside()).unwrap()));
        assert_eq!(app.chips[0].value(ChipField::Primary).as_deref(), Some("21.5"));
        assert_eq!(app.status.as_deref(), Some("remounted chip 1 from cache"));
    }

    #[tokio::test]
    async fn test_remount_without_cache_starts_empty() {
        let cache = ResultCache::new(0);
        let mut app = app_showing(&cache, "21.5").await;

        app.remount_selected().await;

        assert_eq!(app.chips[0].value(ChipField::Primary), None);
        assert_eq!(app.status.as_deref(), Some("remounted chip 1"));
    }
}
