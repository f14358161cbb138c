//! Table header emission.
//!
//! Emits the C source the firmware compiles in: one `PROGMEM` byte array and
//! one length variable per sample, numbered by slot, preceded by a comment
//! block reporting per-table sizes. `PROGMEM` keeps the tables in flash; the
//! ATmega328 has nowhere near enough RAM for them.

use crate::quantize::QuantizedSample;

/// Render `samples` as a table header. Returns the source text and the
/// total byte count of all tables. Pure formatting, cannot fail.
pub fn encode(samples: &[QuantizedSample]) -> (String, usize) {
    let mut report = vec!["#include <Arduino.h>".to_string(), "/*".to_string()];
    let mut code = Vec::with_capacity(samples.len());
    let mut total = 0;

    for (i, sample) in samples.iter().enumerate() {
        let var = format!("table{i}");
        report.push(format!(" * {:<10}{:<20}{:>6}", var, sample.file, sample.size()));

        let values = sample
            .data
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        code.push(format!(
            "const byte {var}[] PROGMEM = {{{values} }};\nuint16_t length{i} = {};\n",
            sample.size()
        ));

        total += sample.size();
    }

    report.push(format!(" * {:>36}", "------"));
    report.push(format!(" * Total{total:>31}"));
    report.push(" */".to_string());

    let text = report.into_iter().chain(code).collect::<Vec<_>>().join("\n");
    (text, total)
}
