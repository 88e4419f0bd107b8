//! Signal graph, audio output and analysis.
//!
//! The graph runs on the device's audio clock; the render loop samples the
//! analysis tap once per display frame.

mod analyser;
mod gain;
mod graph;
mod metrics;
mod output;
mod sampler;

// Re-export public types
pub use analyser::AnalysisTap;
pub use gain::GainParam;
pub use graph::{GraphHandle, GraphSettings, SignalGraph};
pub use metrics::AudioMetrics;
pub use output::{AudioOutput, OutputDevice};
pub use sampler::{blackman_window, AnalysisSampler, AnalysisSnapshot};
