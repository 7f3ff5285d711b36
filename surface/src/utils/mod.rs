pub mod decoder;
pub mod recorder;

mod stream_sink;
pub use stream_sink::StreamSink;

mod logger;
pub use logger::{Logger, Traffic};

mod combine;
pub use combine::Combine;
