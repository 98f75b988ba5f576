pub mod controller;
pub mod recording_buffer;
