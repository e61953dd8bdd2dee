use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub status_updates_total: IntCounterVec,
    pub status_update_seconds: HistogramVec,
    pub gps_pings_total: IntCounter,
    pub live_drivers: IntGauge,
    pub notifications_recorded_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let status_updates_total = IntCounterVec::new(
            Opts::new("status_updates_total", "Total stop status updates by outcome"),
            &["outcome"],
        )
        .expect("valid status_updates_total metric");

        let status_update_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "status_update_seconds",
                "Latency of stop status updates in seconds",
            ),
            &["outcome"],
        )
        .expect("valid status_update_seconds metric");

        let gps_pings_total = IntCounter::new("gps_pings_total", "Total GPS pings accepted")
            .expect("valid gps_pings_total metric");

        let live_drivers = IntGauge::new("live_drivers", "Drivers with a recorded live position")
            .expect("valid live_drivers metric");

        let notifications_recorded_total = IntCounterVec::new(
            Opts::new(
                "notifications_recorded_total",
                "Notification events appended to the log by kind",
            ),
            &["kind"],
        )
        .expect("valid notifications_recorded_total metric");

        registry
            .register(Box::new(status_updates_total.clone()))
            .expect("register status_updates_total");
        registry
            .register(Box::new(status_update_seconds.clone()))
            .expect("register status_update_seconds");
        registry
            .register(Box::new(gps_pings_total.clone()))
            .expect("register gps_pings_total");
        registry
            .register(Box::new(live_drivers.clone()))
            .expect("register live_drivers");
        registry
            .register(Box::new(notifications_recorded_total.clone()))
            .expect("register notifications_recorded_total");

        Self {
            registry,
            status_updates_total,
            status_update_seconds,
            gps_pings_total,
            live_drivers,
            notifications_recorded_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
