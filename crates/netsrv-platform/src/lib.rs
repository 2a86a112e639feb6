// # Linux Platform Adapters
//
// Data sources the network facade needs from the host rather than from the
// network service:
//
// - [`CommandRouteText`]: routing-table text for hybrid devices, read by
//   running `ip -6 route` and `route -n`
// - [`read_device_mode`]: the `DEVICE_TYPE` entry of the device properties file
//
// ## Platform Support
//
// Both adapters assume a Linux userland. On other systems the commands are
// simply missing and the calls fail with an I/O error.

use std::io;
use std::path::Path;
use std::process::Stdio;

use netsrv_core::config::DeviceMode;
use netsrv_core::traits::RouteTextSource;
use netsrv_core::{Error, Result};
use tokio::process::Command;
use tracing::{debug, warn};

/// Default location of the device properties file
pub const DEVICE_PROPERTIES_PATH: &str = "/etc/device.properties";

const DEVICE_TYPE_KEY: &str = "DEVICE_TYPE=";

/// Route text source backed by the `ip` and `route` commands
#[derive(Debug, Clone)]
pub struct CommandRouteText {
    ip_program: String,
    route_program: String,
}

impl CommandRouteText {
    /// Use `ip` and `route` from `PATH`
    pub fn new() -> Self {
        Self::with_programs("ip", "route")
    }

    /// Use specific programs (absolute paths on locked-down systems)
    pub fn with_programs(ip_program: impl Into<String>, route_program: impl Into<String>) -> Self {
        Self {
            ip_program: ip_program.into(),
            route_program: route_program.into(),
        }
    }
}

impl Default for CommandRouteText {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RouteTextSource for CommandRouteText {
    async fn ipv6_default_route(&self) -> Result<String> {
        let output = run(&self.ip_program, &["-6", "route"]).await?;
        Ok(default_route_line(&output).unwrap_or_default().to_string())
    }

    async fn ipv4_route_table(&self) -> Result<String> {
        run(&self.route_program, &["-n"]).await
    }
}

/// First line of `ip route` output describing the default route
pub fn default_route_line(output: &str) -> Option<&str> {
    output.lines().find(|line| line.starts_with("default"))
}

async fn run(program: &str, args: &[&str]) -> Result<String> {
    debug!("Running {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::upstream(format!(
            "{} {} exited with {}",
            program,
            args.join(" "),
            output.status
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Read the device mode from a properties file
///
/// A missing file or a missing `DEVICE_TYPE` entry selects
/// [`DeviceMode::MediaClient`].
pub async fn read_device_mode(path: impl AsRef<Path>) -> Result<DeviceMode> {
    let path = path.as_ref();

    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("{} not found, assuming media client", path.display());
            return Ok(DeviceMode::MediaClient);
        }
        Err(e) => return Err(e.into()),
    };

    let mode = parse_device_type(&contents)
        .map(DeviceMode::from_device_type)
        .unwrap_or_default();
    debug!("Device mode from {}: {:?}", path.display(), mode);

    Ok(mode)
}

/// Value of the `DEVICE_TYPE` entry in properties text
pub fn parse_device_type(contents: &str) -> Option<&str> {
    contents
        .lines()
        .find_map(|line| line.trim().strip_prefix(DEVICE_TYPE_KEY))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn picks_the_default_line() {
        let output = "\
2001:db8::/64 dev eth0 proto kernel metric 256 pref medium
default via fe80::1 dev eth0 proto ra metric 1024 pref medium
default via fe80::2 dev wlan0 proto ra metric 2048 pref medium
";
        assert_eq!(
            default_route_line(output),
            Some("default via fe80::1 dev eth0 proto ra metric 1024 pref medium")
        );
        assert_eq!(default_route_line("fe80::/64 dev eth0"), None);
    }

    #[test]
    fn device_type_entry() {
        let contents = "MODEL_NUM=XYZ\nDEVICE_TYPE=hybrid\nBUILD_TYPE=prod\n";
        assert_eq!(parse_device_type(contents), Some("hybrid"));
        assert_eq!(parse_device_type("MODEL_NUM=XYZ\n"), None);
    }

    #[tokio::test]
    async fn device_mode_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "MODEL_NUM=XYZ").unwrap();
        writeln!(file, "DEVICE_TYPE=hybrid").unwrap();

        assert_eq!(read_device_mode(file.path()).await.unwrap(), DeviceMode::Hybrid);
    }

    #[tokio::test]
    async fn other_device_types_are_media_clients() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "DEVICE_TYPE=mediaclient").unwrap();

        assert_eq!(
            read_device_mode(file.path()).await.unwrap(),
            DeviceMode::MediaClient
        );
    }

    #[tokio::test]
    async fn missing_file_is_a_media_client() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.properties");

        assert_eq!(read_device_mode(&path).await.unwrap(), DeviceMode::MediaClient);
    }

    #[tokio::test]
    async fn missing_program_is_an_io_error() {
        let source = CommandRouteText::with_programs(
            "/nonexistent/netsrv-ip",
            "/nonexistent/netsrv-route",
        );

        assert!(matches!(source.ipv4_route_table().await, Err(Error::Io(_))));
    }
}
