// System metrics collection via sysinfo, behind a cancellable collector trait.

mod cache;
mod linux;

pub use cache::{DEFAULT_TTL, StatsCache};

use crate::errors::MonitoringError;
use crate::models::*;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use sysinfo::{Components, Disks, Networks, ProcessesToUpdate, System};
use tokio_util::sync::CancellationToken;

/// Seam between the stats cache and the OS. Production uses
/// [`SysinfoCollector`]; tests substitute counting fakes.
#[async_trait]
pub trait SystemCollector: Send + Sync {
    async fn collect(&self, cancel: &CancellationToken) -> Result<SystemStats, MonitoringError>;
}

/// Collects a full [`SystemStats`] snapshot from the OS. Sub-collectors run
/// under `spawn_blocking`; the cancellation token is checked between them,
/// never mid-syscall. A failing sub-collector zero-fills its section and the
/// pass continues; only cancellation aborts the whole snapshot.
pub struct SysinfoCollector {
    sys: Arc<Mutex<System>>,
    disks: Arc<Mutex<Disks>>,
    networks: Arc<Mutex<Networks>>,
    components: Arc<Mutex<Components>>,
    last_cpu_refresh: Arc<Mutex<Option<(Instant, f64)>>>,
    process_started_at: Instant,
}

fn checkpoint(cancel: &CancellationToken, operation: &'static str) -> Result<(), MonitoringError> {
    if cancel.is_cancelled() {
        return Err(MonitoringError::Cancelled { operation });
    }
    Ok(())
}

fn lock_err(operation: &'static str) -> MonitoringError {
    MonitoringError::System {
        operation,
        message: "lock poisoned".into(),
    }
}

fn join_err(operation: &'static str, e: tokio::task::JoinError) -> MonitoringError {
    MonitoringError::System {
        operation,
        message: format!("task join: {e}"),
    }
}

impl SysinfoCollector {
    pub fn new(process_started_at: Instant) -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        Self {
            sys: Arc::new(Mutex::new(sys)),
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
            networks: Arc::new(Mutex::new(Networks::new_with_refreshed_list())),
            components: Arc::new(Mutex::new(Components::new_with_refreshed_list())),
            last_cpu_refresh: Arc::new(Mutex::new(None)),
            process_started_at,
        }
    }

    async fn collect_identity(&self) -> Result<(String, String, String, String, u64), MonitoringError> {
        tokio::task::spawn_blocking(move || {
            let hostname = System::host_name().unwrap_or_default();
            let platform = System::name().unwrap_or_else(|| std::env::consts::OS.into());
            let os_version = System::os_version().unwrap_or_default();
            let kernel_version = System::kernel_version().unwrap_or_default();
            Ok((hostname, platform, os_version, kernel_version, System::uptime()))
        })
        .await
        .map_err(|e| join_err("collect_identity", e))?
    }

    async fn collect_cpu(&self) -> Result<CpuInfo, MonitoringError> {
        let sys = self.sys.clone();
        let last_cpu_refresh = self.last_cpu_refresh.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys.lock().map_err(|_| lock_err("collect_cpu"))?;

            // CPU usage needs two refreshes spaced apart; keep a baseline and
            // reuse the previous reading inside the minimum interval.
            let now = Instant::now();
            let mut guard = last_cpu_refresh.lock().map_err(|_| lock_err("collect_cpu"))?;
            let usage = match *guard {
                Some((prev_ts, prev_usage))
                    if now.duration_since(prev_ts) < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL =>
                {
                    prev_usage
                }
                Some(_) => {
                    sys.refresh_cpu_all();
                    let new_usage = sys.global_cpu_usage() as f64;
                    *guard = Some((now, new_usage));
                    new_usage
                }
                None => {
                    sys.refresh_cpu_all();
                    *guard = Some((now, 0.0));
                    0.0
                }
            };
            drop(guard);

            let model = linux::read_cpu_model()
                .or_else(|| {
                    sys.cpus()
                        .first()
                        .map(|c| c.name().to_string())
                        .filter(|s| !s.is_empty() && s != "cpu0")
                })
                .unwrap_or_else(|| "Unknown".into());

            Ok(CpuInfo {
                model,
                physical_cores: System::physical_core_count().unwrap_or(0) as u32,
                logical_cores: sys.cpus().len() as u32,
                usage_percent: usage.clamp(0.0, 100.0),
                per_core_usage: sys.cpus().iter().map(|c| c.cpu_usage() as f64).collect(),
            })
        })
        .await
        .map_err(|e| join_err("collect_cpu", e))?
    }

    async fn collect_memory(&self) -> Result<MemoryInfo, MonitoringError> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys.lock().map_err(|_| lock_err("collect_memory"))?;
            sys.refresh_memory();
            let total = sys.total_memory();
            let available = sys.available_memory();
            let used = total.saturating_sub(available);
            Ok(MemoryInfo {
                total,
                used,
                available,
                swap_total: sys.total_swap(),
                swap_used: sys.used_swap(),
                usage_percent: if total > 0 {
                    (used as f64 / total as f64) * 100.0
                } else {
                    0.0
                },
            })
        })
        .await
        .map_err(|e| join_err("collect_memory", e))?
    }

    async fn collect_disk(&self) -> Result<DiskInfo, MonitoringError> {
        let disks = self.disks.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks = disks.lock().map_err(|_| lock_err("collect_disk"))?;
            disks.refresh(false);
            let partitions: Vec<PartitionInfo> = disks
                .list()
                .iter()
                .map(|d| {
                    let total = d.total_space();
                    let available = d.available_space();
                    let used = total.saturating_sub(available);
                    PartitionInfo {
                        mount: d.mount_point().to_string_lossy().into_owned(),
                        name: d.name().to_string_lossy().into_owned(),
                        type_: d.file_system().to_string_lossy().into_owned(),
                        total_space: total,
                        used_space: used,
                        available_space: available,
                        usage_percent: if total > 0 {
                            (used as f64 / total as f64) * 100.0
                        } else {
                            0.0
                        },
                    }
                })
                .collect();
            let total_space = partitions.iter().map(|p| p.total_space).sum();
            let used_space = partitions.iter().map(|p| p.used_space).sum();
            Ok(DiskInfo {
                partitions,
                total_space,
                used_space,
            })
        })
        .await
        .map_err(|e| join_err("collect_disk", e))?
    }

    async fn collect_network(&self) -> Result<NetworkStats, MonitoringError> {
        let networks = self.networks.clone();
        tokio::task::spawn_blocking(move || {
            let mut networks = networks
                .lock()
                .map_err(|_| MonitoringError::NetworkStats {
                    operation: "collect_network",
                    message: "lock poisoned".into(),
                })?;
            networks.refresh(true);
            let interfaces: Vec<InterfaceInfo> = networks
                .list()
                .iter()
                .map(|(name, data)| InterfaceInfo {
                    name: name.clone(),
                    mac_address: data.mac_address().to_string(),
                    bytes_sent: data.total_transmitted(),
                    bytes_recv: data.total_received(),
                    packets_sent: data.total_packets_transmitted(),
                    packets_recv: data.total_packets_received(),
                })
                .collect();
            let total_bytes_sent = interfaces.iter().map(|i| i.bytes_sent).sum();
            let total_bytes_recv = interfaces.iter().map(|i| i.bytes_recv).sum();
            Ok(NetworkStats {
                interfaces,
                total_bytes_sent,
                total_bytes_recv,
            })
        })
        .await
        .map_err(|e| join_err("collect_network", e))?
    }

    async fn collect_process(&self) -> Result<ProcessInfo, MonitoringError> {
        let sys = self.sys.clone();
        tokio::task::spawn_blocking(move || {
            let pid = sysinfo::get_current_pid().map_err(|e| MonitoringError::ProcessStats {
                operation: "collect_process",
                message: format!("current pid: {e}"),
            })?;
            let mut sys = sys.lock().map_err(|_| lock_err("collect_process"))?;
            sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            let process = sys.process(pid).ok_or_else(|| MonitoringError::ProcessStats {
                operation: "collect_process",
                message: format!("process {pid} not found"),
            })?;
            Ok(ProcessInfo {
                pid: pid.as_u32(),
                memory_bytes: process.memory(),
                virtual_memory_bytes: process.virtual_memory(),
                cpu_percent: process.cpu_usage() as f64,
                start_time_secs: process.start_time(),
                run_time_secs: process.run_time(),
            })
        })
        .await
        .map_err(|e| join_err("collect_process", e))?
    }

    async fn collect_runtime(&self) -> Result<RuntimeInfo, MonitoringError> {
        let process_uptime_secs = self.process_started_at.elapsed().as_secs();
        tokio::task::spawn_blocking(move || {
            Ok(RuntimeInfo {
                process_uptime_secs,
                thread_count: linux::read_thread_count().unwrap_or(0),
                worker_threads: std::thread::available_parallelism()
                    .map(|n| n.get() as u32)
                    .unwrap_or(0),
            })
        })
        .await
        .map_err(|e| join_err("collect_runtime", e))?
    }

    async fn collect_temperature(&self) -> Result<TemperatureInfo, MonitoringError> {
        let components = self.components.clone();
        tokio::task::spawn_blocking(move || {
            let mut components = components.lock().map_err(|_| MonitoringError::Sensor {
                operation: "collect_temperature",
                message: "lock poisoned".into(),
            })?;
            components.refresh(true);
            let sensors: Vec<SensorReading> = components
                .list()
                .iter()
                .filter_map(|c| {
                    c.temperature().map(|t| SensorReading {
                        label: c.label().to_string(),
                        celsius: t as f64,
                    })
                })
                .collect();
            if sensors.is_empty() {
                // Common on VMs and containers; the cache layer zero-fills.
                return Err(MonitoringError::Sensor {
                    operation: "collect_temperature",
                    message: "no temperature sensors available".into(),
                });
            }
            Ok(TemperatureInfo { sensors })
        })
        .await
        .map_err(|e| join_err("collect_temperature", e))?
    }
}

/// Logs a failed sub-collector at debug and discards the error; the section
/// stays at its zero value.
fn section<T>(result: Result<T, MonitoringError>, operation: &'static str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!(error = %e, operation, "sub-collector failed, section zero-filled");
            None
        }
    }
}

#[async_trait]
impl SystemCollector for SysinfoCollector {
    async fn collect(&self, cancel: &CancellationToken) -> Result<SystemStats, MonitoringError> {
        let mut stats = SystemStats::default();

        checkpoint(cancel, "collect_identity")?;
        if let Some((hostname, platform, os_version, kernel_version, uptime_secs)) =
            section(self.collect_identity().await, "collect_identity")
        {
            stats.hostname = hostname;
            stats.platform = platform;
            stats.os_version = os_version;
            stats.kernel_version = kernel_version;
            stats.uptime_secs = uptime_secs;
        }

        checkpoint(cancel, "collect_cpu")?;
        if let Some(cpu) = section(self.collect_cpu().await, "collect_cpu") {
            stats.cpu = cpu;
        }

        checkpoint(cancel, "collect_memory")?;
        if let Some(memory) = section(self.collect_memory().await, "collect_memory") {
            stats.memory = memory;
        }

        checkpoint(cancel, "collect_disk")?;
        if let Some(disk) = section(self.collect_disk().await, "collect_disk") {
            stats.disk = disk;
        }

        checkpoint(cancel, "collect_network")?;
        if let Some(network) = section(self.collect_network().await, "collect_network") {
            stats.network = network;
        }

        checkpoint(cancel, "collect_process")?;
        if let Some(process) = section(self.collect_process().await, "collect_process") {
            stats.process = process;
        }

        checkpoint(cancel, "collect_runtime")?;
        if let Some(runtime) = section(self.collect_runtime().await, "collect_runtime") {
            stats.runtime = runtime;
        }

        checkpoint(cancel, "collect_temperature")?;
        if let Some(temperature) = section(self.collect_temperature().await, "collect_temperature") {
            stats.temperature = temperature;
        }

        stats.collected_at_ms = chrono::Utc::now().timestamp_millis() as u64;
        Ok(stats)
    }
}
