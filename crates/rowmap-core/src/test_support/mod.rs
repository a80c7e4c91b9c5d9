pub(crate) mod fixtures;
pub(crate) mod recording;

pub(crate) use fixtures::{open_recording_session, open_session, schemas};
pub(crate) use recording::{Call, RecordingStore};
