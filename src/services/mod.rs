pub mod change_detector;
pub mod dispatcher;
pub mod ingestion;
pub mod normalizer;
pub mod sampling_loop;
pub mod window_inspector;

pub use dispatcher::Dispatcher;
pub use sampling_loop::SamplingLoop;
pub use window_inspector::create_window_inspector;
