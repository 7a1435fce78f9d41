//! Sequential probe execution
//!
//! Relays are probed strictly one after another, in the order given.
//! Relays that stay silent are dropped; the first fatal probe error ends
//! the run with nothing salvaged.

use crate::{
    error::Result,
    logging::Logger,
    models::{ProbeResult, RelayRecord},
    output::Console,
    probe::{ProbeOutcome, Prober},
};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::{Duration, Instant};

/// Summary of one benchmark pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub total_duration: Duration,
    /// Relays probed
    pub attempted: usize,
    /// Relays that answered within the timeout
    pub replied: usize,
    /// Relays dropped for not answering
    pub no_reply: usize,
}

impl ExecutionSummary {
    /// Share of probed relays that answered, in percent
    pub fn reply_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            self.replied as f64 / self.attempted as f64 * 100.0
        }
    }
}

/// Probe results in probe order, plus the summary
#[derive(Debug, Clone, Default)]
pub struct ExecutionResults {
    pub results: Vec<ProbeResult>,
    pub summary: ExecutionSummary,
}

/// Probes relays one at a time and reports progress
pub struct BenchExecutor<'a> {
    prober: &'a dyn Prober,
    timeout: Duration,
    console: Console,
    logger: Logger,
}

impl<'a> BenchExecutor<'a> {
    pub fn new(prober: &'a dyn Prober, timeout: Duration, console: Console, logger: Logger) -> Self {
        Self {
            prober,
            timeout,
            console,
            logger,
        }
    }

    /// Probe every relay in `relays`, writing the progress line to `progress`
    ///
    /// The progress count only includes relays that answered.
    pub async fn execute<W: Write>(&self, relays: &[RelayRecord], progress: &mut W) -> Result<ExecutionResults> {
        let start_time = Instant::now();
        let mut results = Vec::new();
        let mut no_reply = 0;

        for relay in relays {
            match self.prober.probe(relay.ipv4_address, self.timeout).await? {
                ProbeOutcome::Reply(rtt) => {
                    results.push(ProbeResult::new(relay.clone(), rtt));
                }
                ProbeOutcome::NoReply => {
                    no_reply += 1;
                    self.logger
                        .debug("No reply, relay skipped")
                        .field("hostname", &relay.hostname)
                        .field("address", relay.ipv4_address.to_string())
                        .field("timeout_ms", self.timeout.as_millis() as u64)
                        .log();
                }
            }
            self.console.write_progress(progress, results.len())?;
        }

        if !relays.is_empty() {
            writeln!(progress)?;
        }

        let summary = ExecutionSummary {
            total_duration: start_time.elapsed(),
            attempted: relays.len(),
            replied: results.len(),
            no_reply,
        };

        self.logger
            .info("Probing finished")
            .field("attempted", summary.attempted)
            .field("replied", summary.replied)
            .field("no_reply", summary.no_reply)
            .field("elapsed_ms", summary.total_duration.as_millis() as u64)
            .log();

        Ok(ExecutionResults { results, summary })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::error::AppError;
    use std::net::Ipv4Addr;

    fn quiet_logger() -> Logger {
        let mut logger = Logger::new("TEST");
        logger.set_level(crate::logging::LogLevel::Fatal);
        logger
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[tokio::test]
    async fn test_all_relays_answer() {
        let relays = vec![relay("a", "us", 1), relay("b", "de", 2)];
        let prober = ScriptedProber::new()
            .reply(relays[0].ipv4_address, ms(40))
            .reply(relays[1].ipv4_address, ms(20));
        let executor = BenchExecutor::new(&prober, ms(500), Console::new(false), quiet_logger());

        let mut progress = Vec::new();
        let run = executor.execute(&relays, &mut progress).await.unwrap();

        assert_eq!(run.results.len(), 2);
        // probe order, not latency order
        assert_eq!(run.results[0].relay.hostname, "a");
        assert_eq!(run.results[0].ping_duration, ms(40));
        assert_eq!(run.summary.attempted, 2);
        assert_eq!(run.summary.replied, 2);
        assert_eq!(run.summary.no_reply, 0);
        assert_eq!(
            String::from_utf8(progress).unwrap(),
            "\r1 server processed\r2 servers processed\n"
        );
    }

    #[tokio::test]
    async fn test_silent_relay_is_dropped_and_not_counted() {
        let relays = vec![relay("a", "us", 1), relay("b", "de", 2), relay("c", "fr", 3)];
        let prober = ScriptedProber::new()
            .reply(relays[0].ipv4_address, ms(10))
            .silent(relays[1].ipv4_address)
            .reply(relays[2].ipv4_address, ms(30));
        let executor = BenchExecutor::new(&prober, ms(500), Console::new(false), quiet_logger());

        let mut progress = Vec::new();
        let run = executor.execute(&relays, &mut progress).await.unwrap();

        let hostnames: Vec<_> = run.results.iter().map(|r| r.relay.hostname.as_str()).collect();
        assert_eq!(hostnames, vec!["a", "c"]);
        assert_eq!(run.summary.no_reply, 1);
        assert!((run.summary.reply_rate() - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            String::from_utf8(progress).unwrap(),
            "\r1 server processed\r1 server processed\r2 servers processed\n"
        );
    }

    #[tokio::test]
    async fn test_probes_are_sequential_in_order_with_timeout() {
        let relays = vec![relay("a", "us", 3), relay("b", "de", 1), relay("c", "fr", 2)];
        let prober = ScriptedProber::new();
        let executor = BenchExecutor::new(&prober, ms(250), Console::new(false), quiet_logger());

        let run = executor.execute(&relays, &mut Vec::new()).await.unwrap();
        assert!(run.results.is_empty());

        let calls = prober.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                (Ipv4Addr::new(198, 51, 100, 3), ms(250)),
                (Ipv4Addr::new(198, 51, 100, 1), ms(250)),
                (Ipv4Addr::new(198, 51, 100, 2), ms(250)),
            ]
        );
    }

    #[tokio::test]
    async fn test_fatal_error_stops_the_run() {
        let relays = vec![relay("a", "us", 1), relay("b", "de", 2), relay("c", "fr", 3)];
        let prober = ScriptedProber::new()
            .reply(relays[0].ipv4_address, ms(10))
            .fail_on(relays[1].ipv4_address)
            .reply(relays[2].ipv4_address, ms(10));
        let executor = BenchExecutor::new(&prober, ms(500), Console::new(false), quiet_logger());

        let err = executor.execute(&relays, &mut Vec::new()).await.unwrap_err();
        assert!(matches!(err, AppError::Probe(_)));
        assert_eq!(prober.probed().len(), 2, "no probe after the fatal one");
    }

    #[tokio::test]
    async fn test_no_relays_prints_nothing() {
        let prober = ScriptedProber::new();
        let executor = BenchExecutor::new(&prober, ms(500), Console::new(false), quiet_logger());

        let mut progress = Vec::new();
        let run = executor.execute(&[], &mut progress).await.unwrap();
        assert!(progress.is_empty());
        assert_eq!(run.summary.attempted, 0);
        assert_eq!(run.summary.reply_rate(), 0.0);
    }
}
