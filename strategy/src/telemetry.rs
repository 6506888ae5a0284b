use metrics::counter;

pub struct Telemetry;

impl Telemetry {
    pub fn record_generation(strategy: &str, selected_by: &str) {
        counter!(
            "strata_generations_total",
            "strategy" => strategy.to_string(),
            "selected_by" => selected_by.to_string()
        )
        .increment(1);
    }

    pub fn record_generation_failure(strategy: &str) {
        counter!("strata_generation_failures_total", "strategy" => strategy.to_string())
            .increment(1);
    }

    pub fn record_provider_fallback(provider: &str) {
        counter!("strata_provider_fallbacks_total", "provider" => provider.to_string())
            .increment(1);
    }
}
