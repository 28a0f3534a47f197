use lazy_static::lazy_static;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // ==== Recognition Metrics ====
    pub static ref LPR_RECOGNITIONS: IntCounterVec = {
        let metric = IntCounterVec::new(
            Opts::new(
                "lpr_recognitions_total",
                "Total number of recognition invocations",
            ),
            &["status"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref LPR_PLATES_DETECTED: IntCounter = {
        let metric = IntCounter::new(
            "lpr_plates_detected_total",
            "Total number of plates detected across all images",
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref LPR_CHARACTERS_DETECTED: IntCounter = {
        let metric = IntCounter::new(
            "lpr_characters_detected_total",
            "Total number of characters detected across all plates",
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    pub static ref LPR_UNKNOWN_CLASS_IDS: IntCounter = {
        let metric = IntCounter::new(
            "lpr_unknown_class_ids_total",
            "Character detections with class ids outside the plate alphabet",
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };

    // ==== Detector Metrics ====
    pub static ref LPR_INFERENCE_TIME: HistogramVec = {
        let metric = HistogramVec::new(
            HistogramOpts::new(
                "lpr_detector_inference_seconds",
                "Time spent in a single detector inference",
            )
            .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
            &["stage", "provider"],
        )
        .expect("metric can be created");
        REGISTRY.register(Box::new(metric.clone())).ok();
        metric
    };
}
