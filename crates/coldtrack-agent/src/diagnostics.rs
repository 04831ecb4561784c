/// End-of-cycle process diagnostics: resident set and thread count. Purely
/// observational; read from `/proc/self/status` where available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticsSample {
    pub rss_kb: Option<u64>,
    pub rss_peak_kb: Option<u64>,
    pub threads: Option<u64>,
}

pub fn sample() -> Option<DiagnosticsSample> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    Some(parse_status(&status))
}

fn parse_status(status: &str) -> DiagnosticsSample {
    let mut sample = DiagnosticsSample::default();
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            sample.rss_kb = parse_kb(rest);
        } else if let Some(rest) = line.strip_prefix("VmHWM:") {
            sample.rss_peak_kb = parse_kb(rest);
        } else if let Some(rest) = line.strip_prefix("Threads:") {
            sample.threads = rest.trim().parse().ok();
        }
    }
    sample
}

fn parse_kb(field: &str) -> Option<u64> {
    field.trim().trim_end_matches("kB").trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_fields() {
        let status = "Name:\tcoldtrack-agent\n\
                      VmHWM:\t    5432 kB\n\
                      VmRSS:\t    4321 kB\n\
                      Threads:\t3\n";
        let sample = parse_status(status);
        assert_eq!(sample.rss_kb, Some(4321));
        assert_eq!(sample.rss_peak_kb, Some(5432));
        assert_eq!(sample.threads, Some(3));
    }

    #[test]
    fn test_parse_status_tolerates_missing_fields() {
        let sample = parse_status("Name:\tagent\n");
        assert_eq!(sample, DiagnosticsSample::default());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_sample_reads_own_process() {
        let sample = sample().expect("proc status readable on linux");
        assert!(sample.threads.is_some());
    }
}
