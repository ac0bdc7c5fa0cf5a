//! Delivery of rendered receipt bytes to a physical printer. Runs strictly
//! after the bill transaction commits; a failed print leaves order and bill
//! state untouched.

use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use crate::config::PrinterConfig;
use crate::errors::ServiceError;

/// Sends the byte stream through the configured transport mode.
#[instrument(skip(config, data), fields(mode = %config.mode, bytes = data.len()))]
pub async fn deliver(config: &PrinterConfig, data: &[u8]) -> Result<(), ServiceError> {
    match config.mode.as_str() {
        "network" => {
            print_via_network(
                &config.ip,
                config.port,
                Duration::from_secs(config.connect_timeout_secs),
                data,
            )
            .await
        }
        "device" => print_via_device(&config.device_path, data).await,
        "system" => print_via_system(&config.printer_name, data).await,
        other => Err(ServiceError::InvalidInput(format!(
            "Unknown printer mode: {}",
            other
        ))),
    }
}

async fn print_via_network(
    ip: &str,
    port: u16,
    connect_timeout: Duration,
    data: &[u8],
) -> Result<(), ServiceError> {
    let addr = format!("{}:{}", ip, port);

    let mut stream = timeout(connect_timeout, TcpStream::connect(&addr))
        .await
        .map_err(|_| {
            warn!(addr = %addr, "Printer connection timed out");
            ServiceError::PrinterError(format!("Connection to printer {} timed out", addr))
        })?
        .map_err(|e| {
            warn!(addr = %addr, error = %e, "Printer connection failed");
            ServiceError::PrinterError(format!("Connection to printer {} failed: {}", addr, e))
        })?;

    stream.write_all(data).await.map_err(|e| {
        warn!(addr = %addr, error = %e, "Printer write failed");
        ServiceError::PrinterError(format!("Write to printer {} failed: {}", addr, e))
    })?;

    let _ = stream.shutdown().await;

    info!(addr = %addr, "Receipt sent over network");
    Ok(())
}

async fn print_via_device(path: &str, data: &[u8]) -> Result<(), ServiceError> {
    let mut device = tokio::fs::OpenOptions::new()
        .write(true)
        .open(path)
        .await
        .map_err(|e| {
            warn!(path = %path, error = %e, "Printer device open failed");
            ServiceError::PrinterError(format!("Could not open printer device {}: {}", path, e))
        })?;

    device.write_all(data).await.map_err(|e| {
        warn!(path = %path, error = %e, "Printer device write failed");
        ServiceError::PrinterError(format!("Write to printer device {} failed: {}", path, e))
    })?;

    device.flush().await.map_err(|e| {
        ServiceError::PrinterError(format!("Flush to printer device {} failed: {}", path, e))
    })?;

    info!(path = %path, "Receipt written to device");
    Ok(())
}

async fn print_via_system(printer_name: &str, data: &[u8]) -> Result<(), ServiceError> {
    let mut child = Command::new("lpr")
        .arg("-P")
        .arg(printer_name)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            warn!(printer = %printer_name, error = %e, "Failed to spawn lpr");
            ServiceError::PrinterError(format!("Failed to spawn lpr: {}", e))
        })?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ServiceError::PrinterError("Failed to open lpr stdin".to_string()))?;
    stdin.write_all(data).await.map_err(|e| {
        ServiceError::PrinterError(format!("Failed to pipe receipt to lpr: {}", e))
    })?;
    drop(stdin);

    let output = child.wait_with_output().await.map_err(|e| {
        ServiceError::PrinterError(format!("Failed to wait for lpr: {}", e))
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        warn!(printer = %printer_name, stderr = %stderr, "lpr reported failure");
        return Err(ServiceError::PrinterError(format!(
            "lpr failed for printer {}: {}",
            printer_name,
            stderr.trim()
        )));
    }

    info!(printer = %printer_name, "Receipt queued via system printer");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn network_config(ip: &str, port: u16) -> PrinterConfig {
        PrinterConfig {
            mode: "network".to_string(),
            ip: ip.to_string(),
            port,
            connect_timeout_secs: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn unknown_mode_is_rejected() {
        let config = PrinterConfig {
            mode: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        let result = deliver(&config, b"x").await;
        assert!(matches!(result, Err(ServiceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn unreachable_printer_maps_to_printer_error() {
        // Reserved TEST-NET-1 address; nothing listens there.
        let config = network_config("192.0.2.1", 9100);
        let result = deliver(&config, b"x").await;
        assert!(matches!(result, Err(ServiceError::PrinterError(_))));
    }

    #[tokio::test]
    async fn missing_device_maps_to_printer_error() {
        let config = PrinterConfig {
            mode: "device".to_string(),
            device_path: "/nonexistent/printer0".to_string(),
            ..Default::default()
        };
        let result = deliver(&config, b"x").await;
        assert!(matches!(result, Err(ServiceError::PrinterError(_))));
    }
}
