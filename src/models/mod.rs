// Domain models

mod request;
mod system;

pub use request::{PathStats, RequestMetrics};
pub use system::{
    CpuInfo, DiskInfo, InterfaceInfo, MemoryInfo, NetworkStats, PartitionInfo, ProcessInfo,
    RuntimeInfo, SensorReading, SystemStats, TemperatureInfo,
};
