pub mod batch;
pub mod check;
pub mod component;
pub mod firearm;
pub mod init;
pub mod maintenance;
pub mod misc;
pub mod session;
