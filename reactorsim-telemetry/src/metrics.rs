//! ## reactorsim-telemetry::metrics
//! **Prometheus counters and histograms for simulation runs**

use prometheus::{Counter, Histogram, HistogramOpts, IntCounterVec, Opts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub simulations: Counter,
    pub cache_hits: Counter,
    pub failures: Counter,
    pub marks: IntCounterVec,
    pub simulation_duration: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        let simulations = Counter::new("reactorsim_simulations_total", "Completed simulations")?;
        let cache_hits = Counter::new(
            "reactorsim_cache_hits_total",
            "Simulations answered from the result cache",
        )?;
        let failures = Counter::new(
            "reactorsim_simulation_errors_total",
            "Simulations rejected or aborted with an error",
        )?;
        let marks = IntCounterVec::new(
            Opts::new("reactorsim_marks_total", "Evaluated layouts by mark"),
            &["mark"],
        )?;
        let simulation_duration = Histogram::with_opts(
            HistogramOpts::new(
                "reactorsim_simulation_duration_ms",
                "Wall time of a full evaluation",
            )
            .buckets(vec![1.0, 10.0, 100.0, 1_000.0, 10_000.0]),
        )?;

        registry.register(Box::new(simulations.clone()))?;
        registry.register(Box::new(cache_hits.clone()))?;
        registry.register(Box::new(failures.clone()))?;
        registry.register(Box::new(marks.clone()))?;
        registry.register(Box::new(simulation_duration.clone()))?;

        Ok(Self {
            registry,
            simulations,
            cache_hits,
            failures,
            marks,
            simulation_duration,
        })
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn record_simulation(&self, mark: u8, duration_ms: f64) {
        self.simulations.inc();
        self.marks.with_label_values(&[&mark.to_string()]).inc();
        self.simulation_duration.observe(duration_ms);
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.inc();
    }

    pub fn inc_failures(&self) {
        self.failures.inc();
    }
}
