//! Metrics definitions for the key request creator.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

pub const INPUT_ROWS_SKIPPED: MetricDef = MetricDef {
    name: "input.rows.skipped",
    metric_type: MetricType::Counter,
    description: "Number of malformed input rows that were skipped",
};

pub const SELECTORS_RESOLVED: MetricDef = MetricDef {
    name: "selectors.resolved",
    metric_type: MetricType::Counter,
    description: "Number of entity selectors looked up, tagged by outcome",
};

pub const PLATFORM_REQUEST_DURATION: MetricDef = MetricDef {
    name: "platform.request.duration",
    metric_type: MetricType::Histogram,
    description: "Time taken by a platform API call in seconds, tagged by endpoint",
};

pub const SETTINGS_OBJECTS_BUILT: MetricDef = MetricDef {
    name: "settings.objects.built",
    metric_type: MetricType::Counter,
    description: "Number of settings objects built for submission",
};

pub const ALL_METRICS: &[MetricDef] = &[
    INPUT_ROWS_SKIPPED,
    SELECTORS_RESOLVED,
    PLATFORM_REQUEST_DURATION,
    SETTINGS_OBJECTS_BUILT,
];
