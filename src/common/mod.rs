pub mod color;
pub mod constants;
pub mod ipc;
