use metrics::counter;
use st_core::FeedbackType;

pub struct Telemetry;

impl Telemetry {
    pub fn record_feedback(feedback_type: FeedbackType) {
        counter!("strata_feedback_recorded_total", "type" => feedback_type.to_string())
            .increment(1);
    }

    pub fn record_persist_failure() {
        counter!("strata_feedback_persist_failures_total").increment(1);
    }
}
