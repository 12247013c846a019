//! Simulation runtime: validated submission, bounded worker pool, result cache.
use std::sync::Arc;
use std::time::Instant;

use opentelemetry::KeyValue;
use tokio::sync::Semaphore;
use tokio::task::{spawn_blocking, JoinHandle};
use tracing::{debug, field, info, instrument, warn, Span};

use reactorsim_config::ReactorsimConfig;
use reactorsim_core::{run_simulation, Layout, SimulationLimits, SimulationResults};
use reactorsim_telemetry::{EventLogger, MetricsRecorder};

use crate::engine::cache::ResultCache;
use crate::engine::error::RuntimeError;

/// Runs reactor evaluations off the async executor.
///
/// Cloning is cheap and clones share the worker permits, cache and metrics.
#[derive(Clone)]
pub struct SimulationRuntime {
    config: Arc<ReactorsimConfig>,
    pub metrics: Arc<MetricsRecorder>,
    cache: Option<Arc<ResultCache>>,
    permits: Arc<Semaphore>,
}

impl SimulationRuntime {
    pub fn new(config: ReactorsimConfig, metrics: Arc<MetricsRecorder>) -> Self {
        info!(
            workers = config.runtime.workers,
            cache = config.runtime.cache_results,
            "Initializing simulation runtime"
        );
        debug!("Simulation config: {:?}", config.simulation);

        let cache = config
            .runtime
            .cache_results
            .then(|| Arc::new(ResultCache::new(config.runtime.cache_capacity)));
        let permits = Arc::new(Semaphore::new(config.runtime.workers.max(1)));

        Self {
            config: Arc::new(config),
            metrics,
            cache,
            permits,
        }
    }

    pub fn config(&self) -> &ReactorsimConfig {
        &self.config
    }

    pub fn limits(&self) -> SimulationLimits {
        self.config.simulation.limits()
    }

    /// Validates a flat row-major code list and evaluates it.
    #[instrument(skip_all, fields(components = codes.len()))]
    pub async fn run_codes<S: AsRef<str>>(
        &self,
        codes: &[S],
    ) -> Result<SimulationResults, RuntimeError> {
        let layout = match Layout::from_codes(codes) {
            Ok(layout) => layout,
            Err(e) => {
                warn!("Rejected layout: {e}");
                self.metrics.inc_failures();
                return Err(e.into());
            }
        };
        self.run_layout(layout).await
    }

    /// Evaluates `layout` on the blocking pool, or answers from the cache.
    #[instrument(skip_all, fields(fingerprint = field::Empty))]
    pub async fn run_layout(&self, layout: Layout) -> Result<SimulationResults, RuntimeError> {
        let fingerprint = layout.fingerprint();
        Span::current().record("fingerprint", &fingerprint[..12]);

        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&fingerprint)) {
            debug!("Cache hit");
            self.metrics.inc_cache_hits();
            return Ok(hit);
        }

        let _permit = self.permits.acquire().await?;
        let limits = self.limits();
        let start = Instant::now();

        let outcome = spawn_blocking(move || run_simulation(&layout, &limits)).await;
        let results = match outcome {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                self.metrics.inc_failures();
                return Err(e.into());
            }
            Err(e) => {
                self.metrics.inc_failures();
                return Err(e.into());
            }
        };

        let elapsed_ms = start.elapsed().as_secs_f64() * 1_000.0;
        self.metrics.record_simulation(results.mark, elapsed_ms);
        info!(mark = results.mark, elapsed_ms, "Simulation finished");

        if let Some(cache) = &self.cache {
            cache.insert(fingerprint.clone(), results.clone());
        }

        EventLogger::log_event(
            "simulation_complete",
            vec![
                KeyValue::new("fingerprint", fingerprint),
                KeyValue::new("mark", i64::from(results.mark)),
                KeyValue::new("eu_per_tick", results.eu_per_tick),
                KeyValue::new("timed_out", results.timed_out),
            ],
        )
        .await;

        Ok(results)
    }

    /// Evaluates all layouts concurrently, at most `runtime.workers` at a
    /// time. Results are returned in input order.
    #[instrument(skip_all, fields(layouts = layouts.len()))]
    pub async fn run_batch(
        &self,
        layouts: Vec<Layout>,
    ) -> Vec<Result<SimulationResults, RuntimeError>> {
        let handles: Vec<JoinHandle<Result<SimulationResults, RuntimeError>>> = layouts
            .into_iter()
            .map(|layout| {
                let runtime = self.clone();
                tokio::spawn(async move { runtime.run_layout(layout).await })
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            results.push(handle.await.map_err(RuntimeError::from).and_then(|r| r));
        }
        results
    }

    /// Number of cached results, 0 when caching is off.
    pub fn cached(&self) -> usize {
        self.cache.as_ref().map_or(0, |c| c.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactorsim_core::catalog::ComponentKind;
    use reactorsim_core::LayoutError;
    use tracing_test::traced_test;

    fn runtime(cache_results: bool) -> SimulationRuntime {
        let mut config = ReactorsimConfig::default();
        config.runtime.workers = 2;
        config.runtime.cache_results = cache_results;
        SimulationRuntime::new(config, Arc::new(MetricsRecorder::new().unwrap()))
    }

    fn mark_one_codes() -> Vec<&'static str> {
        let mut codes = vec!["XX"; 18];
        codes[0] = "U1";
        codes[1] = "VO";
        codes
    }

    #[tokio::test]
    async fn test_rejects_invalid_component_count() {
        let rt = runtime(true);
        let err = rt.run_codes(&["XX"; 20]).await.unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Layout(LayoutError::InvalidComponentCount(20))
        ));
        assert_eq!(err.to_string(), "Invalid number of components: 20");
    }

    #[tokio::test]
    async fn test_rejects_unknown_code() {
        let rt = runtime(true);
        let mut codes = vec!["XX"; 18];
        codes[4] = "U9";
        let err = rt.run_codes(&codes).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid component code: U9");
        assert!(rt.metrics.gather_metrics().unwrap().contains("reactorsim_simulation_errors_total 1"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_run_codes_evaluates_and_caches() {
        let rt = runtime(true);
        let results = rt.run_codes(&mark_one_codes()).await.unwrap();
        assert_eq!(results.mark, 1);
        assert_eq!(results.eu_per_tick, 5);
        assert_eq!(results.total_cost, 4);
        assert!(logs_contain("Simulation finished"));

        let again = rt.run_codes(&mark_one_codes()).await.unwrap();
        assert_eq!(again, results);
        assert_eq!(rt.cached(), 1);
        let text = rt.metrics.gather_metrics().unwrap();
        assert!(text.contains("reactorsim_cache_hits_total 1"));
        assert!(text.contains("reactorsim_simulations_total 1"));
    }

    #[tokio::test]
    async fn test_cache_can_be_disabled() {
        let rt = runtime(false);
        rt.run_codes(&mark_one_codes()).await.unwrap();
        rt.run_codes(&mark_one_codes()).await.unwrap();
        assert_eq!(rt.cached(), 0);
        assert!(rt
            .metrics
            .gather_metrics()
            .unwrap()
            .contains("reactorsim_simulations_total 2"));
    }

    #[tokio::test]
    async fn test_batch_keeps_input_order() {
        let rt = runtime(false);
        let empty = Layout::empty(1).unwrap();
        let vented = Layout::empty(0)
            .unwrap()
            .with(0, 0, ComponentKind::UraniumCell)
            .with(1, 0, ComponentKind::OverclockedHeatVent);
        let molten = Layout::empty(0)
            .unwrap()
            .with(0, 0, ComponentKind::QuadUraniumCell);

        let results = rt.run_batch(vec![vented, empty, molten]).await;
        let marks: Vec<u8> = results.into_iter().map(|r| r.unwrap().mark).collect();
        assert_eq!(marks, vec![1, 0, 5]);
    }

    #[tokio::test]
    async fn test_custom_limits_reach_the_evaluation() {
        let mut config = ReactorsimConfig::default();
        config.simulation.fuel_ticks = 2_000;
        let rt = SimulationRuntime::new(config, Arc::new(MetricsRecorder::new().unwrap()));
        let results = rt.run_codes(&mark_one_codes()).await.unwrap();
        assert_eq!(results.cycle_ticks, Some(2_000));
        assert_eq!(results.total_eu_per_cycle, 10_000.0);
    }
}
