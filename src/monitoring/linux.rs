// Linux-specific helpers: /proc fallbacks for values sysinfo reports poorly.

/// Read first "model name" from /proc/cpuinfo. Prefer over sysinfo when it
/// returns placeholder names like "cpu0".
pub(super) fn read_cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        for line in content.lines() {
            if line.starts_with("model name") {
                let name = line
                    .find(": ")
                    .map(|i| line[i + 2..].trim())
                    .filter(|s| !s.is_empty() && *s != "cpu0")?;
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Thread count of the current process from /proc/self/status ("Threads:").
pub(super) fn read_thread_count() -> Option<u32> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/self/status").ok()?;
        for line in content.lines() {
            if let Some(rest) = line.strip_prefix("Threads:") {
                return rest.trim().parse().ok();
            }
        }
    }
    None
}
