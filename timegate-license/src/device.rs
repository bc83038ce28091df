//! Machine fingerprinting for license binding.
//!
//! Derives a stable identifier from the processor identifier and the
//! baseboard serial number. When neither can be read the fingerprint falls
//! back to the host name, which is much weaker and is flagged as such.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use tracing::warn;

/// Prefix of every fingerprint.
pub const MACHINE_ID_PREFIX: &str = "MACHINE-";

/// Placeholder for an identifier that could not be read.
pub const UNKNOWN_COMPONENT: &str = "UNKNOWN";

/// Number of hex characters kept from the hardware digest.
const DIGEST_HEX_LEN: usize = 16;

/// Values firmware vendors ship instead of a real serial number.
const PLACEHOLDER_SERIALS: &[&str] = &[
    "none",
    "default string",
    "to be filled by o.e.m.",
    "not applicable",
    "not specified",
    "system serial number",
    "0",
];

/// Source of the raw identifiers a fingerprint is built from.
pub trait HardwareIdentitySource: Send + Sync {
    /// Processor identifier, if one can be read.
    fn processor_id(&self) -> Option<String>;

    /// Baseboard serial number, if one can be read.
    fn board_serial(&self) -> Option<String>;

    /// Host name, if one can be read.
    fn host_name(&self) -> Option<String>;
}

/// How strongly a fingerprint is tied to the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BindingStrength {
    /// Both processor and board identifiers were read.
    Hardware,
    /// Only one of the two identifiers was read.
    PartialHardware,
    /// No hardware identifier was read; the host name was used.
    HostnameFallback,
}

/// A machine fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineId {
    id: String,
    strength: BindingStrength,
}

impl MachineId {
    /// Returns the fingerprint text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Returns how the fingerprint was derived.
    #[must_use]
    pub fn strength(&self) -> BindingStrength {
        self.strength
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Computes the fingerprint for the identifiers reported by `source`.
pub fn fingerprint(source: &dyn HardwareIdentitySource) -> MachineId {
    let cpu = normalize(source.processor_id());
    let board = normalize(source.board_serial());

    let strength = match (&cpu, &board) {
        (Some(_), Some(_)) => BindingStrength::Hardware,
        (None, None) => {
            let host = normalize(source.host_name()).unwrap_or_else(|| "unknown".to_string());
            warn!("No hardware identifiers available, binding to host name");
            return MachineId {
                id: format!("{MACHINE_ID_PREFIX}{host}"),
                strength: BindingStrength::HostnameFallback,
            };
        }
        _ => BindingStrength::PartialHardware,
    };

    let combined = format!(
        "{}-{}",
        cpu.as_deref().unwrap_or(UNKNOWN_COMPONENT),
        board.as_deref().unwrap_or(UNKNOWN_COMPONENT)
    );
    let digest = hex::encode_upper(Sha256::digest(combined.as_bytes()));

    MachineId {
        id: format!("{MACHINE_ID_PREFIX}{}", &digest[..DIGEST_HEX_LEN]),
        strength,
    }
}

/// Trims an identifier and drops empty or placeholder values.
fn normalize(value: Option<String>) -> Option<String> {
    let value = value?;
    let trimmed = value.trim();
    if trimmed.is_empty() || PLACEHOLDER_SERIALS.contains(&trimmed.to_ascii_lowercase().as_str()) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Reads identifiers from the running system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHardwareIdentity;

impl HardwareIdentitySource for SystemHardwareIdentity {
    fn processor_id(&self) -> Option<String> {
        get_processor_id()
    }

    fn board_serial(&self) -> Option<String> {
        get_board_serial()
    }

    fn host_name(&self) -> Option<String> {
        hostname::get().ok().and_then(|h| h.into_string().ok())
    }
}

/// Gets a processor identifier (platform-specific).
fn get_processor_id() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| processor_id_from_cpuinfo(&content))
    }

    #[cfg(target_os = "macos")]
    {
        command_output("sysctl", &["-n", "machdep.cpu.brand_string"])
    }

    #[cfg(target_os = "windows")]
    {
        command_output("wmic", &["cpu", "get", "ProcessorId"]).and_then(|o| wmic_value(&o))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

/// Gets the baseboard serial number (platform-specific).
fn get_board_serial() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/sys/class/dmi/id/board_serial")
            .ok()
            .map(|s| s.trim().to_string())
    }

    #[cfg(target_os = "macos")]
    {
        command_output("ioreg", &["-rd1", "-c", "IOPlatformExpertDevice"]).and_then(|output| {
            output
                .lines()
                .find(|l| l.contains("IOPlatformSerialNumber"))
                .and_then(|l| l.split('"').nth(3))
                .map(String::from)
        })
    }

    #[cfg(target_os = "windows")]
    {
        command_output("wmic", &["baseboard", "get", "SerialNumber"]).and_then(|o| wmic_value(&o))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}

#[cfg(any(target_os = "macos", target_os = "windows"))]
fn command_output(program: &str, args: &[&str]) -> Option<String> {
    std::process::Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
}

/// `wmic ... get Field` prints a header line followed by the value.
#[cfg(target_os = "windows")]
fn wmic_value(output: &str) -> Option<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .nth(1)
        .map(String::from)
}

/// Builds a processor identifier from `/proc/cpuinfo`.
///
/// Uses the `Serial` line where the kernel exposes one (ARM boards),
/// otherwise the vendor, family, model and stepping of the first processor.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) fn processor_id_from_cpuinfo(content: &str) -> Option<String> {
    let field = |name: &str| {
        content.lines().find_map(|line| {
            let (key, value) = line.split_once(':')?;
            (key.trim() == name)
                .then(|| value.trim().to_string())
                .filter(|v| !v.is_empty())
        })
    };

    if let Some(serial) = field("Serial") {
        return Some(serial);
    }

    let parts: Vec<String> = ["vendor_id", "cpu family", "model", "stepping"]
        .into_iter()
        .filter_map(field)
        .collect();

    (!parts.is_empty()).then(|| parts.join("-"))
}
