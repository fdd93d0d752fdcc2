//! Report scan example demonstrating gating and threat alerts.
//!
//! This example shows how to:
//! - Build a ScanGate over a scripted scanning service
//! - Scan every file of a report
//! - Check access and the report's aggregate status
//! - Receive threat alerts and read the recent-threats view
//!
//! Run with: RUST_LOG=info,scangate::audit=info cargo run --example report_scan

use scangate::backends::{MockBehavior, MockScanService};
use scangate::core::StaticReportFiles;
use scangate::prelude::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; audit events go to the same output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("=== Scangate Report Scan Example ===\n");

    // A scanner that flags one attachment and clears the others
    let service = MockScanService::new_clean()
        .with_name("example-scanner")
        .with_behavior(
            "evidence/invoice.pdf",
            MockBehavior::infected(["Doc.Dropper.Agent", "Pdf.Exploit.CVE"]),
        )
        .with_behavior("evidence/clip.mp4", MockBehavior::verdict("quarantined"));

    let reports = StaticReportFiles::new()
        .with_file(FileReference::new("evidence/photo.png", "report-42", FileKind::Image))
        .with_file(FileReference::new("evidence/clip.mp4", "report-42", FileKind::Video))
        .with_file(FileReference::new("evidence/invoice.pdf", "report-42", FileKind::Document));

    let gate = ScanGate::builder()
        .with_service(service)
        .with_report_files(reports)
        .build()?;

    // Subscribe before scanning; alerts are not replayed
    let mut alerts = gate.subscribe_threats();

    println!("Before scanning:");
    let status = gate.aggregate_status("report-42").await?;
    println!("  worst verdict: {}", status.worst_verdict.label());

    let results = gate.scan_report("report-42").await?;

    println!("\n=== Scan Results ===");
    for entry in &results {
        match &entry.result {
            Ok(verdict) => println!(
                "  {:<24} {:<11} threats={:?}",
                entry.file.file_url,
                verdict.verdict.as_str(),
                verdict.detected_threats
            ),
            Err(e) => println!("  {:<24} not scanned: {}", entry.file.file_url, e),
        }
    }

    println!("\n=== Access ===");
    for entry in &results {
        let decision = gate.check_access(&entry.file.file_url).await?;
        let state = decision.state;
        println!(
            "  {:<24} {:<16} view={} download={}{}",
            entry.file.file_url,
            state.label(),
            decision.can_view,
            decision.can_download,
            if state.offers_rescan() { " (rescan available)" } else { "" }
        );
    }

    let status = gate.aggregate_status("report-42").await?;
    println!("\n=== Report Status ===");
    println!("  worst verdict: {}", status.worst_verdict);
    println!("  threats: {}", status.threat_count);
    println!("  files: {}", status.file_count);

    let alert = tokio::time::timeout(Duration::from_secs(1), alerts.recv()).await;
    if let Ok(Some(alert)) = alert {
        println!("\n⚠️  Threat alert for {} in {}", alert.file_url, alert.report_id);
    }

    println!("\n=== Recent Threats ===");
    for row in gate.recent_threats(5).await? {
        println!(
            "  {} worst={} files={} threats={} at {}",
            row.report_id, row.worst_verdict, row.file_count, row.threat_count, row.most_recent
        );
    }

    Ok(())
}
