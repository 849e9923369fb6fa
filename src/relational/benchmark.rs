use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkEntry {
    pub name: &'static str,
    /// Absent when the query failed.
    pub elapsed: Option<Duration>,
}

/// Per-query timings of a suite run, in execution order.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkReport {
    entries: Vec<BenchmarkEntry>,
}

impl BenchmarkReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: &'static str, elapsed: Option<Duration>) {
        self.entries.push(BenchmarkEntry { name, elapsed });
    }

    pub fn entries(&self) -> &[BenchmarkEntry] {
        &self.entries
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.elapsed.is_none()).count()
    }

    /// Sum over the queries that succeeded.
    pub fn total(&self) -> Duration {
        self.entries.iter().filter_map(|e| e.elapsed).sum()
    }

    pub fn render(&self) -> String {
        let rule = "=".repeat(80);
        let thin = "-".repeat(80);
        let mut lines = vec![
            String::new(),
            rule.clone(),
            "PERFORMANCE SUMMARY".to_string(),
            rule.clone(),
            format!("{:<40} {:<15}", "Query", "Time (ms)"),
            thin.clone(),
        ];

        for entry in &self.entries {
            match entry.elapsed {
                Some(elapsed) => lines.push(format!("{:<40} {:>10.2} ms", entry.name, as_ms(elapsed))),
                None => lines.push(format!("{:<40} {:>13}", entry.name, "failed")),
            }
        }

        lines.push(thin);
        lines.push(format!("{:<40} {:>10.2} ms", "TOTAL", as_ms(self.total())));
        lines.push(rule);
        lines.join("\n")
    }
}

fn as_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_skips_failed_queries() {
        let mut report = BenchmarkReport::new();
        report.record("query_1", Some(Duration::from_millis(3)));
        report.record("query_2", None);
        report.record("query_3", Some(Duration::from_micros(1500)));

        assert_eq!(report.total(), Duration::from_micros(4500));
        assert_eq!(report.failures(), 1);
        assert_eq!(report.entries().len(), 3);
    }

    #[test]
    fn test_render_lists_every_query_and_total() {
        let mut report = BenchmarkReport::new();
        report.record("query_1", Some(Duration::from_millis(2)));
        report.record("query_2", None);

        let text = report.render();
        assert!(text.contains("PERFORMANCE SUMMARY"));
        assert!(text.contains("query_1"));
        assert!(text.contains("2.00 ms"));
        assert!(text.lines().any(|l| l.starts_with("query_2") && l.ends_with("failed")));
        assert!(text.lines().any(|l| l.starts_with("TOTAL") && l.ends_with("2.00 ms")));
    }

    #[test]
    fn test_empty_report_totals_zero() {
        let report = BenchmarkReport::new();
        assert_eq!(report.total(), Duration::ZERO);
        assert!(report.render().contains("0.00 ms"));
    }
}
