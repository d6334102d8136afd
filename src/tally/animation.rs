//! Interpolación lineal del contador mostrado tras cada lote.

use std::time::Duration;

pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);
pub const DEFAULT_ANIMATION: Duration = Duration::from_millis(500);

/// Valores intermedios entre `start` y `end`, uno por cuadro.
///
/// Si no hay diferencia produce un único cuadro con `end`; el último cuadro
/// siempre es exactamente `end`.
#[derive(Clone, Debug)]
pub struct CounterAnimation {
    end: u64,
    steps: u64,
    step: u64,
    current: f64,
    increment: f64,
    done: bool,
}

impl CounterAnimation {
    pub fn new(start: u64, end: u64, duration: Duration) -> Self {
        let steps = if start == end {
            1
        } else {
            (duration.as_millis() / FRAME_INTERVAL.as_millis()).max(1) as u64
        };
        let range = end as f64 - start as f64;

        Self {
            end,
            steps,
            step: 0,
            current: start as f64,
            increment: range / steps as f64,
            done: false,
        }
    }
}

impl Iterator for CounterAnimation {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.done {
            return None;
        }

        self.step += 1;
        self.current += self.increment;
        if self.step >= self.steps {
            self.done = true;
            return Some(self.end);
        }

        Some(self.current.floor().max(0.0) as u64)
    }
}
