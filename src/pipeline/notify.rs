// src/pipeline/notify.rs

//! Bulletin notification pipeline.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Config, EventRecord, Notification};
use crate::services::{
    AssetSource, BulletinFetcher, BulletinSource, CardComposer, CardContent, ChangeGate, FontBook,
    GateDecision, GateGuard, HttpAssetSource, parse_record, require_country_code, resolve_location,
};
use crate::services::composer::{Stage, advance};
use crate::storage::{ImageStorage, LocalImageStorage};

/// Result of one pipeline invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// A new event was found and its card saved
    Rendered {
        event: EventRecord,
        notification: Notification,
    },
    /// The latest event already has a card
    Duplicate { event: EventRecord },
}

/// Fetch, parse and render the latest bulletin event.
pub struct NotificationPipeline {
    source: Arc<dyn BulletinSource>,
    assets: Arc<dyn AssetSource>,
    composer: CardComposer,
    storage: Arc<dyn ImageStorage>,
    gate: Arc<ChangeGate>,
    attribution: String,
}

impl NotificationPipeline {
    pub fn new(
        source: Arc<dyn BulletinSource>,
        assets: Arc<dyn AssetSource>,
        composer: CardComposer,
        storage: Arc<dyn ImageStorage>,
    ) -> Self {
        Self {
            source,
            assets,
            composer,
            storage,
            gate: Arc::new(ChangeGate::new()),
            attribution: String::new(),
        }
    }

    /// Build the production pipeline: live bulletin, HTTP providers, TTF
    /// fonts and the local output directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = BulletinFetcher::new(&config.source)?;
        let assets = HttpAssetSource::new(config.assets.clone(), &config.source.user_agent)?;
        let fonts = FontBook::load(&config.render.fonts)?;
        let storage = LocalImageStorage::new(&config.render.output_dir);

        Ok(Self::new(
            Arc::new(source),
            Arc::new(assets),
            CardComposer::new(Arc::new(fonts)),
            Arc::new(storage),
        )
        .with_attribution(&config.render.attribution))
    }

    /// Share a gate with other pipelines.
    pub fn with_gate(mut self, gate: Arc<ChangeGate>) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_attribution(mut self, attribution: impl Into<String>) -> Self {
        self.attribution = attribution.into();
        self
    }

    pub fn gate(&self) -> &ChangeGate {
        &self.gate
    }

    /// Run once against the configured bulletin source.
    pub async fn run(&self) -> Result<PipelineOutcome> {
        let mut gate = self.gate.lock().await;
        let line = self.source.latest_line().await?;
        self.process(&mut gate, line).await
    }

    /// Run once with an already fetched bulletin line.
    pub async fn run_line(&self, line: impl Into<String>) -> Result<PipelineOutcome> {
        let mut gate = self.gate.lock().await;
        self.process(&mut gate, line.into()).await
    }

    async fn process(&self, gate: &mut GateGuard<'_>, line: String) -> Result<PipelineOutcome> {
        let event = parse_record(&line)?;

        if gate.check(&event.raw_line) == GateDecision::Duplicate {
            log::info!("No new event detected, skipping card ({})", event.timestamp);
            return Ok(PipelineOutcome::Duplicate { event });
        }

        log::info!(
            "New event {}: M{} at {} km, {}",
            event.timestamp,
            event.magnitude,
            event.depth,
            event.location
        );
        event.validate_for_display()?;

        let resolved = resolve_location(&event.location);
        let country_code = require_country_code(&resolved)?;
        log::debug!("Country '{}' resolved to {}", resolved.country_name, country_code);

        let (map, flag) = futures::try_join!(
            self.assets.map_tile(event.latitude, event.longitude),
            self.assets.flag(country_code),
        )?;

        let content = CardContent {
            country: resolved.country_name.clone(),
            location: resolved.cleaned_location.clone(),
            depth: event.depth,
            magnitude: event.magnitude,
            attribution: self.attribution.clone(),
        };
        let composer = self.composer.clone();
        let png = tokio::task::spawn_blocking(move || composer.render_png(&content, &map, &flag))
            .await
            .map_err(|e| AppError::render(format!("render task failed: {e}")))??;

        let image = self.storage.save(&png).await?;
        let stage = advance(Stage::Encoded, Stage::Saved);
        let replaced = gate.commit(event.raw_line.clone(), image.path.clone());

        if let Some(previous) = replaced.filter(|p| *p != image.path) {
            if let Err(e) = self.storage.remove(&previous).await {
                log::warn!("Failed to delete previous card {}: {}", previous.display(), e);
            }
        }

        let notification = Notification::new(&event, &resolved, country_code, &image);
        advance(stage, Stage::Complete);
        Ok(PipelineOutcome::Rendered {
            event,
            notification,
        })
    }
}

/// Fetch and parse the latest bulletin event without rendering anything.
pub async fn run_latest(source: &dyn BulletinSource) -> Result<EventRecord> {
    let line = source.latest_line().await?;
    log::debug!("Latest bulletin line: {line}");
    parse_record(&line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    use crate::services::{GateState, TextRenderer, TextSpec};
    use crate::services::composer::encode_png;

    const SAMPLE: &str =
        "25/08/02 19:46:37 14.020 -89.780 5 2.2 C 13 Km al noreste de Ahuachapan, El Salvador";
    const LATER: &str =
        "25/08/02 21:10:05 11.870 -86.540 12 3.4 C 20 Km al suroeste de Masachapa, Nicaragua";

    struct FixedLine(Mutex<String>);

    impl FixedLine {
        fn new(line: &str) -> Self {
            Self(Mutex::new(line.to_string()))
        }

        fn set(&self, line: &str) {
            *self.0.lock().unwrap() = line.to_string();
        }
    }

    #[async_trait]
    impl BulletinSource for FixedLine {
        async fn latest_line(&self) -> Result<String> {
            Ok(self.0.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct FakeAssets {
        fail_flag: bool,
        flags: Mutex<Vec<String>>,
        maps: AtomicUsize,
    }

    #[async_trait]
    impl AssetSource for FakeAssets {
        async fn map_tile(&self, _latitude: f64, _longitude: f64) -> Result<Vec<u8>> {
            self.maps.fetch_add(1, Ordering::SeqCst);
            encode_png(&RgbaImage::from_pixel(16, 8, Rgba([10, 120, 10, 255])))
        }

        async fn flag(&self, country_code: &str) -> Result<Vec<u8>> {
            self.flags.lock().unwrap().push(country_code.to_string());
            if self.fail_flag {
                return Err(AppError::fetch(format!("flag {country_code}"), "status 404"));
            }
            encode_png(&RgbaImage::from_pixel(8, 8, Rgba([0, 0, 200, 255])))
        }
    }

    struct NoText;

    impl TextRenderer for NoText {
        fn draw_text(&self, _canvas: &mut RgbaImage, _text: &TextSpec) -> Result<()> {
            Ok(())
        }
    }

    struct Harness {
        _tmp: TempDir,
        dir: PathBuf,
        source: Arc<FixedLine>,
        assets: Arc<FakeAssets>,
        pipeline: NotificationPipeline,
    }

    fn harness(line: &str, assets: FakeAssets) -> Harness {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("public");
        let source = Arc::new(FixedLine::new(line));
        let assets = Arc::new(assets);
        let pipeline = NotificationPipeline::new(
            source.clone(),
            assets.clone(),
            CardComposer::new(Arc::new(NoText)),
            Arc::new(LocalImageStorage::new(&dir)),
        )
        .with_attribution("Hecho por Cheskodev");

        Harness {
            _tmp: tmp,
            dir,
            source,
            assets,
            pipeline,
        }
    }

    fn cards_in(dir: &Path) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_new_event_renders_card() {
        let h = harness(SAMPLE, FakeAssets::default());

        let outcome = h.pipeline.run().await.unwrap();
        let PipelineOutcome::Rendered {
            event,
            notification,
        } = outcome
        else {
            panic!("expected a rendered card");
        };

        assert_eq!(event.raw_line, SAMPLE);
        assert_eq!(notification.country_code, "SV");
        assert_eq!(notification.country_name, "El Salvador");
        assert_eq!(notification.date, "25/08/02 19:46:37");
        assert_eq!(notification.depth, 5.0);
        assert_eq!(notification.magnitude, 2.2);
        assert_eq!(
            notification.location,
            "13 Km al noreste de Ahuachapan, El Salvador"
        );
        assert_eq!(cards_in(&h.dir), vec![notification.image.clone()]);
        assert_eq!(*h.assets.flags.lock().unwrap(), vec!["SV".to_string()]);

        let bytes = std::fs::read(h.dir.join(&notification.image)).unwrap();
        let card = image::load_from_memory(&bytes).unwrap();
        assert_eq!((card.width(), card.height()), (1200, 675));
    }

    #[tokio::test]
    async fn test_same_record_twice_is_duplicate() {
        let h = harness(SAMPLE, FakeAssets::default());

        let first = h.pipeline.run().await.unwrap();
        assert!(matches!(first, PipelineOutcome::Rendered { .. }));
        let state_after_first = h.pipeline.gate().snapshot().await;

        let second = h.pipeline.run().await.unwrap();
        assert!(matches!(second, PipelineOutcome::Duplicate { .. }));

        assert_eq!(h.pipeline.gate().snapshot().await, state_after_first);
        assert_eq!(cards_in(&h.dir).len(), 1);
        assert_eq!(h.assets.maps.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_duplicate_keeps_previous_card() {
        let h = harness(SAMPLE, FakeAssets::default());
        h.pipeline.run().await.unwrap();
        let before = cards_in(&h.dir);

        h.pipeline.run().await.unwrap();

        assert_eq!(cards_in(&h.dir), before);
        let state = h.pipeline.gate().snapshot().await;
        assert!(state.last_image.unwrap().exists());
    }

    #[tokio::test]
    async fn test_new_event_replaces_previous_card() {
        let h = harness(SAMPLE, FakeAssets::default());
        let PipelineOutcome::Rendered {
            notification: first,
            ..
        } = h.pipeline.run().await.unwrap()
        else {
            panic!("expected a rendered card");
        };

        h.source.set(LATER);
        let PipelineOutcome::Rendered {
            notification: second,
            ..
        } = h.pipeline.run().await.unwrap()
        else {
            panic!("expected a rendered card");
        };

        assert_ne!(first.image, second.image);
        assert_eq!(cards_in(&h.dir), vec![second.image.clone()]);
        assert_eq!(second.country_code, "NI");

        let state = h.pipeline.gate().snapshot().await;
        assert_eq!(state.last_raw_line.as_deref(), Some(LATER));
        assert_eq!(state.last_image, Some(h.dir.join(&second.image)));
    }

    #[tokio::test]
    async fn test_unknown_country_fails_without_side_effects() {
        let line = "25/08/02 19:46:37 14.9 -92.3 40 4.5 C 30 Km al sur de Tapachula, Mexico";
        let h = harness(line, FakeAssets::default());

        let err = h.pipeline.run().await.unwrap_err();

        assert!(matches!(err, AppError::AssetLookup(ref name) if name == "Mexico"));
        assert!(cards_in(&h.dir).is_empty());
        assert!(h.assets.flags.lock().unwrap().is_empty());
        assert_eq!(h.pipeline.gate().snapshot().await, GateState::default());
    }

    #[tokio::test]
    async fn test_asset_failure_leaves_state_untouched() {
        let h = harness(SAMPLE, FakeAssets::default());
        h.pipeline.run().await.unwrap();
        let state = h.pipeline.gate().snapshot().await;
        let cards = cards_in(&h.dir);

        let failing = harness(LATER, FakeAssets {
            fail_flag: true,
            ..FakeAssets::default()
        });
        let failing = NotificationPipeline::new(
            failing.source.clone(),
            failing.assets.clone(),
            CardComposer::new(Arc::new(NoText)),
            Arc::new(LocalImageStorage::new(&h.dir)),
        )
        .with_gate(Arc::new(ChangeGate::with_state(state.clone())));

        let err = failing.run().await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
        assert_eq!(failing.gate().snapshot().await, state);
        assert_eq!(cards_in(&h.dir), cards);
    }

    #[tokio::test]
    async fn test_short_record_is_parse_error() {
        let h = harness("25/08/02 19:46:37 14.020", FakeAssets::default());
        let err = h.pipeline.run().await.unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
        assert_eq!(h.assets.maps.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_numeric_depth_is_rejected_before_render() {
        let line = "25/08/02 19:46:37 14.020 -89.780 ? 2.2 C Cerca de Ahuachapan, El Salvador";
        let h = harness(line, FakeAssets::default());

        let err = h.pipeline.run().await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(cards_in(&h.dir).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overlapping_runs_render_once() {
        let h = harness(SAMPLE, FakeAssets::default());
        let pipeline = Arc::new(h.pipeline);

        let runs: Vec<_> = (0..4)
            .map(|_| {
                let pipeline = Arc::clone(&pipeline);
                tokio::spawn(async move { pipeline.run().await })
            })
            .collect();

        let mut rendered = 0;
        for run in runs {
            if let PipelineOutcome::Rendered { .. } = run.await.unwrap().unwrap() {
                rendered += 1;
            }
        }

        assert_eq!(rendered, 1);
        assert_eq!(cards_in(&h.dir).len(), 1);
    }

    #[tokio::test]
    async fn test_run_latest_parses_without_rendering() {
        let source = FixedLine::new(SAMPLE);
        let event = run_latest(&source).await.unwrap();
        assert_eq!(event.location, "13 Km al noreste de Ahuachapan, El Salvador");
    }
}
