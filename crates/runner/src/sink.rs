//! Progress sinks: fire-and-forget consumers of generation summaries.

use tokio::sync::mpsc;
use tracing::info;

use natsel_core::GenerationSummary;

/// Receives a summary after every completed generation.
///
/// Implementations must not block: a slow or absent consumer never stalls
/// the generation loop.
pub trait ProgressSink: Send + Sync {
    /// Called once per completed generation, in order.
    fn generation_complete(&self, summary: &GenerationSummary);
}

/// Logs each summary through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn generation_complete(&self, summary: &GenerationSummary) {
        info!(
            generation = summary.generation,
            population = summary.population_size,
            avg_fitness = summary.avg_fitness,
            best_fitness = summary.best_fitness,
            raw_calibration = summary.avg_raw_calibration,
            adjusted_calibration = summary.avg_adjusted_calibration,
            task_accuracy = summary.avg_task_accuracy,
            failure_rate = summary.parse_failure_rate,
            dominant = %summary.dominant_style,
            elapsed_secs = summary.elapsed_secs,
            "generation complete"
        );
    }
}

/// Forwards summaries over an unbounded channel (dashboard/SSE feed).
///
/// Sending never blocks; if the receiver is gone the summary is dropped.
#[derive(Debug)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<GenerationSummary>,
}

impl ChannelSink {
    /// Create a sink and the receiving end for the consumer.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<GenerationSummary>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn generation_complete(&self, summary: &GenerationSummary) {
        let _ = self.tx.send(summary.clone());
    }
}

/// Discards every summary.
#[derive(Debug, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn generation_complete(&self, _summary: &GenerationSummary) {}
}
