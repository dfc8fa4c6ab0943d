//! System Diagnostics
//!
//! Logs what the binary is running on and which services the configuration
//! enables, so a field log starts with enough context to triage it.

use sysinfo::System;
use tracing::info;

use crate::config::Config;

/// System information for diagnostics
#[derive(Debug, Clone)]
pub struct SystemInfo {
    /// Operating system name
    pub os_name: String,
    /// Operating system version string
    pub os_version: String,
    /// Kernel version string
    pub kernel_version: String,
    /// Number of logical CPU cores
    pub cpu_count: usize,
    /// Total system memory in megabytes
    pub total_memory_mb: u64,
    /// System hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Gather system information
    pub fn gather() -> Self {
        let mut sys = System::new();
        sys.refresh_memory();
        sys.refresh_cpu();

        Self {
            os_name: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
            cpu_count: sys.cpus().len(),
            total_memory_mb: sys.total_memory() / 1024 / 1024,
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }

    /// Log system information
    pub fn log(&self) {
        info!("=== System Information ===");
        info!("  OS: {} {}", self.os_name, self.os_version);
        info!("  Kernel: {}", self.kernel_version);
        info!("  Hostname: {}", self.hostname);
        info!("  CPUs: {}", self.cpu_count);
        info!("  Memory: {} MB", self.total_memory_mb);
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

/// Log system information and the configured service set
pub fn log_startup_diagnostics(config: &Config) {
    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║          Startup Diagnostics                               ║");
    info!("╚════════════════════════════════════════════════════════════╝");

    SystemInfo::gather().log();

    info!("=== Head Unit ===");
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));
    info!("  Build: {} {} ({})", env!("BUILD_DATE"), env!("BUILD_TIME"), env!("GIT_HASH"));
    info!("  Name: {}", config.head_unit.name);
    info!("  Display area: {}", config.session.display_area);
    info!("  Night mode: {}", config.session.night_mode);

    info!("=== Services ===");
    info!("  Navigation: {}", enabled(config.navigation.enabled));
    info!("  Media status: {}", enabled(config.media_status.enabled));
    info!("  Media audio: {}", enabled(config.audio.media_channel));
    info!("  Speech audio: {}", enabled(config.audio.speech_channel));
    info!(
        "  Video: {:?} @ {} fps, {} dpi",
        config.video.resolution, config.video.fps, config.video.dpi
    );
    info!("  Touchscreen: {}", enabled(config.input.touchscreen));
    info!("  Location sensor: {}", enabled(config.sensor.location));
    match &config.bluetooth.adapter_address {
        Some(address) => info!("  Bluetooth: {}", address),
        None => info!("  Bluetooth: not configured"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_info_gather() {
        let info = SystemInfo::gather();
        assert!(info.cpu_count > 0);
        assert!(!info.os_name.is_empty());
    }

    #[test]
    fn test_enabled_label() {
        assert_eq!(enabled(true), "enabled");
        assert_eq!(enabled(false), "disabled");
    }
}
