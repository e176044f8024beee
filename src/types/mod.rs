mod record;
mod stream_status;

pub use record::{Record, Records};
pub use stream_status::StreamStatus;
