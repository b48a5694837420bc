#[cfg(feature = "colored-output")]
use colored::*;
use humansize::{BINARY, format_size};
use imgrab_engine::{BatchReport, DownloadFailure, ExecutionStrategy};
use std::io::Write;
use std::time::Duration;

/// Seconds with two decimals, the format every timing line uses.
pub fn format_seconds(elapsed: Duration) -> String {
    format!("{:.2}", elapsed.as_secs_f64())
}

pub struct OutputManager {
    #[cfg_attr(not(feature = "colored-output"), allow(dead_code))]
    colored: bool,
}

impl OutputManager {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    /// Banner printed before each strategy when several are compared.
    pub fn format_strategy_header(&self, strategy: ExecutionStrategy) -> String {
        match strategy {
            ExecutionStrategy::Thread => "Downloading images with threads...".to_string(),
            ExecutionStrategy::Process => "Downloading images with processes...".to_string(),
            ExecutionStrategy::Async => "Downloading images asynchronously...".to_string(),
        }
    }

    /// One line per stored file, in submission order.
    pub fn format_items(&self, report: &BatchReport) -> String {
        let mut output = String::new();
        for result in report.succeeded() {
            output.push_str(&format!(
                "Downloaded {} ({}) in {} seconds\n",
                result.filename,
                format_size(result.bytes, BINARY),
                format_seconds(result.elapsed)
            ));
        }
        output
    }

    pub fn format_strategy_elapsed(&self, elapsed: Duration) -> String {
        format!("Time elapsed: {} seconds", format_seconds(elapsed))
    }

    pub fn format_total(&self, elapsed: Duration) -> String {
        format!("Total time taken: {} seconds", format_seconds(elapsed))
    }

    pub fn format_failure(&self, failure: &DownloadFailure) -> String {
        format!("{} {}", self.error_prefix(), failure)
    }

    #[cfg(feature = "colored-output")]
    pub fn error_prefix(&self) -> String {
        if self.colored {
            "Error:".red().bold().to_string()
        } else {
            "Error:".to_string()
        }
    }

    #[cfg(not(feature = "colored-output"))]
    pub fn error_prefix(&self) -> String {
        "Error:".to_string()
    }

    /// Print the item lines on stdout and every failure on stderr.
    pub fn print_report(
        &self,
        report: &BatchReport,
        out: &mut impl Write,
        err: &mut impl Write,
    ) -> std::io::Result<()> {
        out.write_all(self.format_items(report).as_bytes())?;
        for failure in report.failed() {
            writeln!(err, "{}", self.format_failure(failure))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgrab_engine::{DownloadResult, ErrorKind, ItemOutcome};
    use std::path::PathBuf;

    fn report() -> BatchReport {
        BatchReport {
            strategy: ExecutionStrategy::Thread,
            outcomes: vec![
                ItemOutcome {
                    index: 0,
                    result: Ok(DownloadResult {
                        url: "http://host/a.png".to_string(),
                        filename: "a.png".to_string(),
                        path: PathBuf::from("a.png"),
                        bytes: 2048,
                        status: 200,
                        elapsed: Duration::from_millis(1234),
                    }),
                },
                ItemOutcome {
                    index: 1,
                    result: Err(DownloadFailure {
                        url: "http://host/b.png".to_string(),
                        kind: ErrorKind::Network,
                        message: "connection refused".to_string(),
                    }),
                },
            ],
            total_elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn seconds_have_two_decimals() {
        assert_eq!(format_seconds(Duration::from_millis(1234)), "1.23");
        assert_eq!(format_seconds(Duration::ZERO), "0.00");
        assert_eq!(format_seconds(Duration::from_secs(2)), "2.00");
    }

    #[test]
    fn timing_lines_use_two_decimals() {
        let output = OutputManager::new(false);
        assert_eq!(
            output.format_total(Duration::from_millis(3456)),
            "Total time taken: 3.46 seconds"
        );
        assert_eq!(
            output.format_strategy_elapsed(Duration::from_millis(10)),
            "Time elapsed: 0.01 seconds"
        );
    }

    #[test]
    fn report_splits_stdout_and_stderr() {
        let output = OutputManager::new(false);
        let mut out = Vec::new();
        let mut err = Vec::new();

        output.print_report(&report(), &mut out, &mut err).unwrap();

        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("Downloaded a.png ("), "{out}");
        assert!(out.ends_with(") in 1.23 seconds\n"), "{out}");
        assert_eq!(out.lines().count(), 1);
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "Error: failed to download http://host/b.png: connection refused\n"
        );
    }
}
