use crate::domain::server_timing::timing::Timing;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod timing;

pub const FETCH: &str = "fetch";
pub const DECODE: &str = "dec";
pub const RESIZE: &str = "res";
pub const ENCODE: &str = "enc";
pub const STORE: &str = "store";

/// Per-stage durations summed over a whole batch, in pipeline order.
#[derive(Debug, Clone)]
pub struct ServerTiming {
    timings: Vec<Timing>,
}

impl Display for ServerTiming {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = self
            .timings
            .iter()
            .map(|tim| tim.to_string())
            .reduce(|acc, val| format!("{acc}, {val}"))
            .unwrap_or_default();

        write!(f, "{display}")
    }
}

impl Default for ServerTiming {
    fn default() -> Self {
        let timings = [
            (FETCH, "Download and stage"),
            (DECODE, "Decode sources"),
            (RESIZE, "Resample"),
            (ENCODE, "Encode thumbnails"),
            (STORE, "Upload thumbnails"),
        ]
        .iter()
        .map(|(name, desc)| Timing::new(name, Duration::ZERO, Some(desc.to_string())))
        .collect();
        ServerTiming::new(timings)
    }
}

impl ServerTiming {
    pub fn new(timings: Vec<Timing>) -> ServerTiming {
        ServerTiming { timings }
    }

    pub fn record(&mut self, name: &str, duration: Duration) {
        match self.timings.iter_mut().find(|tim| tim.name == name) {
            Some(timing) => timing.add(duration),
            None => self.timings.push(Timing::new(name, duration, None)),
        }
    }
}
