//! `lsr schedule` – show how long each backoff wait can take.

use anyhow::Result;
use lsr_core::config::LsrConfig;
use lsr_core::retry::BackoffStep;

pub fn run_schedule(cfg: &LsrConfig, max_retries: Option<u32>, json: bool) -> Result<()> {
    let mut policy = cfg.retry_policy()?;
    if let Some(n) = max_retries {
        policy.max_retries = n;
    }
    let steps = policy.schedule();
    if json {
        println!("{}", serde_json::to_string_pretty(&steps)?);
    } else {
        print!("{}", render_table(&steps));
    }
    Ok(())
}

fn render_table(steps: &[BackoffStep]) -> String {
    if steps.is_empty() {
        return "No waits: a single attempt is made.\n".to_string();
    }
    let mut out = format!("{:<8} {:>12} {:>12} {:>12}\n", "AFTER", "BASE_MS", "MIN_MS", "MAX_MS");
    for s in steps {
        out.push_str(&format!(
            "{:<8} {:>12} {:>12} {:>12}\n",
            s.after_attempt, s.base_ms, s.min_ms, s.max_ms
        ));
    }
    let worst: u64 = steps.iter().fold(0u64, |acc, s| acc.saturating_add(s.max_ms));
    out.push_str(&format!("worst case total wait: {} ms\n", worst));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use lsr_core::retry::RetryPolicy;

    #[test]
    fn table_lists_each_wait_and_total() {
        let steps = RetryPolicy::default().with_max_retries(3).schedule();
        let table = render_table(&steps);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[1].contains("1000"));
        assert!(lines[2].contains("2718"));
        assert_eq!(lines[3], "worst case total wait: 5718 ms");
    }

    #[test]
    fn single_attempt_has_no_waits() {
        let steps = RetryPolicy::default().with_max_retries(1).schedule();
        assert_eq!(render_table(&steps), "No waits: a single attempt is made.\n");
    }
}
