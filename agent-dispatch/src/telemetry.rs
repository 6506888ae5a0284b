use metrics::counter;

pub struct Telemetry;

impl Telemetry {
    pub fn record_relayed(direction: &str) {
        counter!("strata_messages_relayed_total", "direction" => direction.to_string())
            .increment(1);
    }

    pub fn record_handler_failure(kind: &str) {
        counter!("strata_handler_failures_total", "kind" => kind.to_string()).increment(1);
    }

    pub fn record_module_activation(kind: &str, outcome: &str) {
        counter!(
            "strata_module_activations_total",
            "kind" => kind.to_string(),
            "outcome" => outcome.to_string()
        )
        .increment(1);
    }
}
