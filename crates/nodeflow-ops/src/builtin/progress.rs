use nodeflow_core::error::Result;
use nodeflow_core::ops::{OpInputs, ProgressOp};
use nodeflow_core::reporter::ProgressReporter;
use serde_json::{json, Value};

/// Double each of `count` items, ticking the reporter once per item.
/// Returns the sum of the doubled values.
pub struct ProcessItemsOp;

impl ProgressOp for ProcessItemsOp {
    fn invoke(&self, inputs: OpInputs, reporter: &ProgressReporter) -> Result<Value> {
        let count = inputs.req_i64("count")?.max(0) as u64;
        let mut sum: i64 = 0;
        for i in 0..count {
            sum += (i as i64) * 2;
            reporter.update(
                i + 1,
                count,
                &format!("Processing item {}/{}", i + 1, count),
            );
        }
        Ok(json!(sum))
    }
}

/// Count down from `from`, reporting percent-form progress each step.
/// Returns the number of steps taken.
pub struct CountdownOp;

impl ProgressOp for CountdownOp {
    fn invoke(&self, inputs: OpInputs, reporter: &ProgressReporter) -> Result<Value> {
        let from = inputs.req_i64("from")?.max(0) as u64;
        for step in 0..from {
            let percent = (step + 1) as f64 / from as f64;
            reporter.update_percent(percent, &format!("{} remaining", from - step - 1));
        }
        Ok(json!(from))
    }
}
