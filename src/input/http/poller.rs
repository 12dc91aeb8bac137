//! Sensor poller: periodic fetch, cached triple, synchronous reads.

use super::source::{HttpReadingSource, ReadingSource};
use crate::config::PollerConfig;
use crate::error::{BridgeError, FetchError};
use crate::host::Accessory;
use crate::reading::{Reading, ReadingCache};
use crate::sensors::{AnalogSensor, Capability, CapabilityKind};
use chrono::{DateTime, Utc};
use log::{debug, error, info};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use strum::IntoEnumIterator;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

/// Fetch counters, for logging and diagnostics only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollerStats {
    pub successes: u64,
    pub failures: u64,
    pub last_success: Option<DateTime<Utc>>,
}

/// Owns the cached reading and keeps it fresh from a [`ReadingSource`].
pub struct SensorPoller {
    name: String,
    config: PollerConfig,
    source: Arc<dyn ReadingSource>,
    cache: Arc<ReadingCache>,
    /// One capability per kind, in service order.
    services: Vec<Arc<AnalogSensor>>,
    stats: Mutex<PollerStats>,
}

impl SensorPoller {
    /// Create a poller with default readings. Nothing is fetched until [`start`](Self::start).
    pub fn new(
        name: impl Into<String>,
        config: PollerConfig,
        source: Arc<dyn ReadingSource>,
    ) -> Self {
        let name = name.into();
        let cache = Arc::new(ReadingCache::default());

        info!(
            "[Poller] {} loaded (url: {}, every {:?})",
            name,
            config.url.as_deref().unwrap_or("<none>"),
            config.poll_interval()
        );

        Self {
            name,
            config,
            source,
            services: CapabilityKind::iter()
                .map(|kind| Arc::new(AnalogSensor::new(kind, cache.clone())))
                .collect(),
            cache,
            stats: Mutex::new(PollerStats::default()),
        }
    }

    /// Create a poller that GETs `config.url` over HTTP.
    pub fn from_config(name: impl Into<String>, config: PollerConfig) -> Result<Self, BridgeError> {
        let source = HttpReadingSource::new(config.url.clone())?;
        Ok(Self::new(name, config, Arc::new(source)))
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn read_temperature(&self) -> f64 {
        self.cache.snapshot().temperature
    }

    pub fn read_humidity(&self) -> f64 {
        self.cache.snapshot().humidity
    }

    pub fn read_ambient_light(&self) -> f64 {
        self.cache.snapshot().ambient_light
    }

    /// All three values from the same fetch.
    pub fn reading(&self) -> Reading {
        self.cache.snapshot()
    }

    pub fn stats(&self) -> PollerStats {
        self.stats.lock().clone()
    }

    /// Fetch once and log any failure. The cache is left untouched on error.
    pub async fn fetch(&self) {
        if let Err(e) = self.refresh().await {
            error!("[Poller] {}: error fetching data: {}", self.name, e);
        }
    }

    /// Fetch once and return the outcome.
    ///
    /// On success the whole triple is replaced and pushed to the host; on
    /// failure nothing changes apart from the failure counter.
    pub async fn refresh(&self) -> Result<Reading, FetchError> {
        let result = self
            .source
            .fetch_body()
            .await
            .and_then(|body| Reading::from_json(&body, &self.config.fields));

        let reading = match result {
            Ok(reading) => reading,
            Err(e) => {
                self.stats.lock().failures += 1;
                return Err(e);
            }
        };

        self.cache.replace(reading);
        {
            let mut stats = self.stats.lock();
            stats.successes += 1;
            stats.last_success = Some(Utc::now());
        }
        debug!(
            "[Poller] {}: {:.1}°C, {:.1}%, {:.0} lx",
            self.name, reading.temperature, reading.humidity, reading.ambient_light
        );

        for service in &self.services {
            service.push_update(reading.get(service.kind()));
        }

        Ok(reading)
    }

    /// Fetch now, then every poll interval until the returned handle is stopped.
    ///
    /// Every tick spawns its own fetch, so a slow endpoint never delays the
    /// schedule and requests may overlap.
    pub fn start(self: &Arc<Self>) -> PollerHandle {
        let token = CancellationToken::new();
        let tracker = TaskTracker::new();
        let period = self.config.poll_interval();

        let timer = tokio::spawn({
            let poller = Arc::clone(self);
            let token = token.clone();
            let tracker = tracker.clone();
            async move {
                // First tick completes immediately
                let mut ticker = interval(period);
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = ticker.tick() => {
                            let poller = Arc::clone(&poller);
                            tracker.spawn(async move { poller.fetch().await });
                        }
                    }
                }
                debug!("[Poller] {}: timer stopped", poller.name);
            }
        });

        info!("[Poller] {}: polling every {:?}", self.name, period);
        PollerHandle {
            token,
            tracker,
            timer,
        }
    }
}

impl Accessory for SensorPoller {
    fn name(&self) -> &str {
        &self.name
    }

    fn services(&self) -> Vec<Arc<dyn Capability>> {
        self.services
            .iter()
            .map(|service| service.clone() as Arc<dyn Capability>)
            .collect()
    }
}

/// Handle of the running poll timer.
pub struct PollerHandle {
    token: CancellationToken,
    tracker: TaskTracker,
    timer: JoinHandle<()>,
}

impl PollerHandle {
    pub fn is_running(&self) -> bool {
        !self.timer.is_finished()
    }

    /// Stop scheduling fetches, then wait for the ones in flight to finish.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.timer.await {
            error!("[Poller] timer task failed: {}", e);
        }
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::Sensor;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    const GOOD_BODY: &str =
        r#"{"temperature_celcius": "23.5", "humidity_percent": "45", "lux": "800"}"#;

    /// Replays scripted outcomes, then keeps returning the fallback body.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<String, FetchError>>>,
        fallback: String,
        calls: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<String, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                fallback: GOOD_BODY.to_string(),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReadingSource for ScriptedSource {
        async fn fetch_body(&self) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok(self.fallback.clone()))
        }
    }

    fn poller_with(source: Arc<ScriptedSource>) -> SensorPoller {
        SensorPoller::new("Test Sensor", PollerConfig::new("http://sensor.test/"), source)
    }

    fn body(t: &str, h: &str, l: &str) -> Result<String, FetchError> {
        Ok(format!(
            r#"{{"temperature_celcius": "{t}", "humidity_percent": "{h}", "lux": "{l}"}}"#
        ))
    }

    #[test]
    fn test_default_readings() {
        let poller = poller_with(ScriptedSource::new(vec![]));
        assert_eq!(poller.read_temperature(), 20.0);
        assert_eq!(poller.read_humidity(), 50.0);
        assert_eq!(poller.read_ambient_light(), 1000.0);
        assert_eq!(poller.stats(), PollerStats::default());
    }

    #[tokio::test]
    async fn test_successful_fetch_updates_all_three() {
        let poller = poller_with(ScriptedSource::new(vec![]));
        poller.fetch().await;

        assert_eq!(poller.read_temperature(), 23.5);
        assert_eq!(poller.read_humidity(), 45.0);
        assert_eq!(poller.read_ambient_light(), 800.0);

        let stats = poller.stats();
        assert_eq!(stats.successes, 1);
        assert_eq!(stats.failures, 0);
        assert!(stats.last_success.is_some());
    }

    #[tokio::test]
    async fn test_server_error_leaves_cache_unchanged() {
        let source = ScriptedSource::new(vec![
            body("18", "60", "300"),
            Err(FetchError::Status(StatusCode::INTERNAL_SERVER_ERROR)),
        ]);
        let poller = poller_with(source);

        assert_ok!(poller.refresh().await);
        let before = poller.reading();

        let err = assert_err!(poller.refresh().await);
        assert!(matches!(err, FetchError::Status(StatusCode::INTERNAL_SERVER_ERROR)));
        assert_eq!(poller.reading(), before);
        assert_eq!(poller.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_malformed_and_non_numeric_bodies_never_reach_cache() {
        let source = ScriptedSource::new(vec![
            Ok("not json".to_string()),
            body("21", "oops", "100"),
            Err(FetchError::MissingUrl),
        ]);
        let poller = poller_with(source);

        for _ in 0..3 {
            poller.fetch().await;
            assert_eq!(poller.reading(), Reading::default());
            assert!(!poller.read_humidity().is_nan());
        }
        let stats = poller.stats();
        assert_eq!(stats.failures, 3);
        assert_eq!(stats.successes, 0);
        assert!(stats.last_success.is_none());
    }

    #[tokio::test]
    async fn test_repeated_identical_fetches_are_stable() {
        let poller = poller_with(ScriptedSource::new(vec![]));
        poller.fetch().await;
        let first = poller.reading();
        for _ in 0..5 {
            poller.fetch().await;
            assert_eq!(poller.reading(), first);
        }
    }

    #[tokio::test]
    async fn test_services_and_pushes() {
        let source = ScriptedSource::new(vec![
            body("19", "55", "640"),
            Err(FetchError::Status(StatusCode::BAD_GATEWAY)),
        ]);
        let poller = poller_with(source);

        let pushed = Arc::new(Mutex::new(Vec::new()));
        let services = poller.services();
        assert_eq!(services.len(), 3);
        for service in &services {
            let sink = pushed.clone();
            let kind = service.kind();
            service.set_value_pusher(Arc::new(move |v: f64| sink.lock().push((kind, v))));
        }

        poller.fetch().await;
        poller.fetch().await;

        assert_eq!(
            *pushed.lock(),
            vec![
                (CapabilityKind::TemperatureSensor, 19.0),
                (CapabilityKind::HumiditySensor, 55.0),
                (CapabilityKind::LightSensor, 640.0),
            ]
        );
        let kinds: Vec<_> = services.iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, CapabilityKind::iter().collect::<Vec<_>>());
        assert_eq!(services[2].read(), 640.0);
        assert!(services.iter().all(|s| s.version() == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_fetches_immediately_then_on_interval() {
        let source = ScriptedSource::new(vec![]);
        let config = PollerConfig::new("http://sensor.test/").with_update_interval_ms(1000);
        let poller = Arc::new(SensorPoller::new("Timer", config, source.clone()));

        let handle = poller.start();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(poller.read_temperature(), 23.5);

        tokio::time::sleep(Duration::from_millis(2000)).await;
        assert_eq!(source.calls(), 3);
        assert!(handle.is_running());

        handle.stop().await;
        let calls = source.calls();
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(source.calls(), calls);
    }

    /// Blocks every fetch on a shared gate so requests pile up.
    struct GatedSource {
        gate: tokio::sync::Semaphore,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReadingSource for GatedSource {
        async fn fetch_body(&self) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let _permit = self.gate.acquire().await.map_err(|_| FetchError::MissingUrl)?;
            Ok(GOOD_BODY.to_string())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fetch_does_not_delay_schedule() {
        let source = Arc::new(GatedSource {
            gate: tokio::sync::Semaphore::new(0),
            calls: AtomicUsize::new(0),
        });
        let config = PollerConfig::new("http://sensor.test/").with_update_interval_ms(100);
        let poller = Arc::new(SensorPoller::new("Slow", config, source.clone()));

        let handle = poller.start();
        tokio::time::sleep(Duration::from_millis(350)).await;

        // Four ticks issued while none of the requests has completed
        assert_eq!(source.calls.load(Ordering::SeqCst), 4);
        assert_eq!(poller.reading(), Reading::default());

        source.gate.add_permits(4);
        handle.stop().await;
        assert_eq!(poller.read_ambient_light(), 800.0);
        assert_eq!(poller.stats().successes, 4);
    }
}
