pub mod control;
pub mod detection;
pub mod frame;
pub mod telemetry;
