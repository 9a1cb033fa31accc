use std::collections::BTreeMap;

/// Document holding the visitor telemetry fields.
pub const VISITOR_COUNTER: &str = "counter";

/// Field values of one counter document, keyed by field name.
pub type CounterValues = BTreeMap<String, u64>;
