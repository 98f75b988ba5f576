pub mod camera_platform;
pub mod detection_client;
pub mod session_delegate;
