// src/utils/logging.rs - Uniform log lines for the fusion passes
use log::{error, info, warn};
use std::time::Instant;

use crate::models::FuseReport;

#[derive(Clone)]
pub struct FusionLogger {
    pass_name: &'static str,
    pass_emoji: &'static str,
    start_time: Instant,
}

impl FusionLogger {
    pub fn new(pass_name: &'static str) -> Self {
        let pass_emoji = match pass_name {
            "REGISTRY_NUMBER" => "🏛️",
            "LAU2" => "🏘️",
            "NUTS3" => "🗺️",
            "DISTRICT_CODES" => "📍",
            _ => "⚙️",
        };
        Self {
            pass_name,
            pass_emoji,
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, source: &std::path::Path) {
        info!(
            "[{}] {} 🚀 Starting fusion pass from '{}'",
            self.pass_name,
            self.pass_emoji,
            source.display()
        );
    }

    pub fn log_skipped(&self, existing: usize) {
        info!(
            "[{}] {} ⏭️  {} records already loaded, skipping pass",
            self.pass_name, self.pass_emoji, existing
        );
    }

    pub fn log_data_loaded(&self, rows: usize, malformed: usize, targets: usize) {
        info!(
            "[{}] {} 📊 {} rows read ({} malformed), {} candidate nodes [+{:.1}s]",
            self.pass_name,
            self.pass_emoji,
            rows,
            malformed,
            targets,
            self.start_time.elapsed().as_secs_f32()
        );
    }

    pub fn log_completion(&self, report: &FuseReport) {
        info!(
            "[{}] {} ✅ Matched {} rows, {} records created [{:.2?}]",
            self.pass_name,
            self.pass_emoji,
            report.matched,
            report.records_created,
            self.start_time.elapsed()
        );
        if report.unmatched > 0 {
            let target = report
                .log_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            warn!(
                "[{}] {} ⚠️  {} rows unmatched, details in '{}'",
                self.pass_name, self.pass_emoji, report.unmatched, target
            );
        }
    }

    pub fn log_failure(&self, err: &dyn std::fmt::Display) {
        error!(
            "[{}] {} ❌ Pass failed after {:.2?}: {}",
            self.pass_name,
            self.pass_emoji,
            self.start_time.elapsed(),
            err
        );
    }
}
