//! Main application orchestration and execution

use crate::{
    client::{HttpRelayDirectory, RelayDirectory},
    error::{AppError, Result},
    executor::{BenchExecutor, ExecutionResults},
    log_debug, log_warn,
    logging::Logger,
    models::{country_index, Config},
    output::{confirm_overwrite, format_duration, pluralize, sort_by_latency, Console, ReportWriter},
    probe::{icmp_prober_factory, ProberFactory},
};
use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

/// What a completed run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Country table printed, with this many distinct countries
    Listed(usize),
    /// Existing report kept, nothing fetched or probed
    Declined,
    /// Report written with this many relays
    Written { path: PathBuf, relays: usize },
}

/// Main application struct that coordinates all components
pub struct App {
    config: Config,
    logger: Logger,
    console: Console,
    directory: Box<dyn RelayDirectory>,
    prober_factory: ProberFactory,
}

impl App {
    /// Wire up the HTTP directory and the ICMP prober for `config`
    pub fn new(config: Config) -> Result<Self> {
        let logger = Logger::with_config("APP", &config);
        let directory = HttpRelayDirectory::from_config(&config, &logger)?;
        Ok(Self::with_components(
            config,
            logger,
            Box::new(directory),
            icmp_prober_factory(),
        ))
    }

    /// Build an application from explicit parts
    pub fn with_components(
        config: Config,
        logger: Logger,
        directory: Box<dyn RelayDirectory>,
        prober_factory: ProberFactory,
    ) -> Self {
        let console = Console::new(config.enable_color);
        Self {
            config,
            logger,
            console,
            directory,
            prober_factory,
        }
    }

    /// Run against the process's stdin and stdout
    pub async fn run(&self) -> Result<RunOutcome> {
        let mut input = BufReader::new(io::stdin());
        let mut output = io::stdout();
        self.run_with_io(&mut input, &mut output).await
    }

    /// Run the selected mode, reading prompt answers from `input`
    pub async fn run_with_io<R, W>(&self, input: &mut R, output: &mut W) -> Result<RunOutcome>
    where
        R: BufRead,
        W: Write,
    {
        if self.config.list_countries {
            self.list_countries(output).await
        } else {
            self.benchmark(input, output).await
        }
    }

    async fn list_countries<W: Write>(&self, output: &mut W) -> Result<RunOutcome> {
        let countries = country_index(self.directory.fetch_countries().await?);
        write!(output, "{}", self.console.format_country_table(&countries))?;
        output.flush()?;
        Ok(RunOutcome::Listed(countries.len()))
    }

    async fn benchmark<R, W>(&self, input: &mut R, output: &mut W) -> Result<RunOutcome>
    where
        R: BufRead,
        W: Write,
    {
        let scope = &self.config.country_scope;
        if scope.is_unscoped() {
            writeln!(output, "No country specified, searching all servers...")?;
        }
        for position in scope.invalid_positions() {
            log_warn!(self.logger, "Invalid country code at position {}", position);
        }

        let path = &self.config.output_path;
        if path.exists() {
            if !confirm_overwrite(path, input, output)? {
                writeln!(output, "Exiting...")?;
                return Ok(RunOutcome::Declined);
            }
            fs::remove_file(path).map_err(|e| {
                AppError::io(format!("Failed to remove {}: {}", path.display(), e))
            })?;
            writeln!(output, "Removed the existing file")?;
        }

        let relays = scope.select(self.directory.fetch_relays().await?);
        writeln!(output, "Found {} {}", relays.len(), pluralize("server", relays.len()))?;
        output.flush()?;

        // no socket is opened when there is nothing to probe
        let mut run = if relays.is_empty() {
            log_debug!(self.logger, "No relay in scope, skipping probes");
            ExecutionResults::default()
        } else {
            let prober = (self.prober_factory)()?;
            let executor = BenchExecutor::new(
                prober.as_ref(),
                self.config.timeout,
                self.console,
                self.logger.named("PROBE"),
            );
            executor.execute(&relays, output).await?
        };

        sort_by_latency(&mut run.results);
        ReportWriter::write(path, &run.results)?;

        writeln!(output, "{}", self.console.format_summary(path, run.results.len()))?;
        if self.config.verbose {
            if let Some(fastest) = run.results.first() {
                writeln!(
                    output,
                    "Fastest relay: {} ({}, {}) {}",
                    fastest.relay.hostname,
                    fastest.relay.country_name,
                    fastest.relay.city_name,
                    format_duration(fastest.ping_duration)
                )?;
            }
            writeln!(
                output,
                "Answered: {}/{} ({:.1}%) in {}",
                run.summary.replied,
                run.summary.attempted,
                run.summary.reply_rate(),
                format_duration(run.summary.total_duration)
            )?;
        }

        Ok(RunOutcome::Written {
            path: path.clone(),
            relays: run.results.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::test_support::{relay, ScriptedProber};
    use crate::logging::LogLevel;
    use crate::models::{CountryRecord, RelayRecord};
    use crate::probe::Prober;
    use crate::scope::CountryScope;
    use async_trait::async_trait;
    use std::io::Cursor;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    struct StaticDirectory {
        relays: Vec<RelayRecord>,
        fetches: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl RelayDirectory for StaticDirectory {
        async fn fetch_relays(&self) -> Result<Vec<RelayRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.relays.clone())
        }

        async fn fetch_countries(&self) -> Result<Vec<CountryRecord>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .relays
                .iter()
                .map(|r| CountryRecord {
                    country_code: r.country_code.clone(),
                    country_name: r.country_name.clone(),
                })
                .collect())
        }
    }

    struct FailingDirectory;

    #[async_trait]
    impl RelayDirectory for FailingDirectory {
        async fn fetch_relays(&self) -> Result<Vec<RelayRecord>> {
            Err(AppError::network("connection refused"))
        }

        async fn fetch_countries(&self) -> Result<Vec<CountryRecord>> {
            Err(AppError::network("connection refused"))
        }
    }

    type Script = Vec<(Ipv4Addr, Option<Duration>)>;

    fn scripted_factory(script: Script) -> ProberFactory {
        Box::new(move || {
            let prober = script.iter().fold(ScriptedProber::new(), |p, (addr, rtt)| match rtt {
                Some(rtt) => p.reply(*addr, *rtt),
                None => p.silent(*addr),
            });
            Ok(Box::new(prober) as Box<dyn Prober>)
        })
    }

    fn socket_denied_factory() -> ProberFactory {
        Box::new(|| Err(AppError::probe("Failed to open ICMP socket: permission denied")))
    }

    fn quiet_logger() -> Logger {
        let mut logger = Logger::new("TEST");
        logger.set_level(LogLevel::Fatal);
        logger
    }

    /// us, de and fr relays plus a gb relay that is never in scope
    fn directory_relays() -> Vec<RelayRecord> {
        vec![
            relay("us-nyc-wg-301", "us", 1),
            relay("gb-lon-wg-001", "gb", 2),
            relay("de-fra-wg-001", "de", 3),
            relay("fr-par-wg-001", "fr", 4),
        ]
    }

    fn ms(n: u64) -> Option<Duration> {
        Some(Duration::from_millis(n))
    }

    fn app(config: Config, factory: ProberFactory) -> (App, Arc<AtomicUsize>) {
        let fetches = Arc::new(AtomicUsize::new(0));
        let directory = StaticDirectory {
            relays: directory_relays(),
            fetches: fetches.clone(),
        };
        let app = App::with_components(config, quiet_logger(), Box::new(directory), factory);
        (app, fetches)
    }

    fn bench_config(dir: &TempDir, scope: &str) -> Config {
        Config {
            country_scope: CountryScope::parse(scope),
            output_path: dir.path().join("bench_result.csv"),
            enable_color: false,
            timeout: Duration::from_millis(500),
            ..Default::default()
        }
    }

    fn report_rows(path: &std::path::Path) -> Vec<Vec<String>> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect()
    }

    #[tokio::test]
    async fn test_scoped_run_ranks_by_latency() {
        let dir = TempDir::new().unwrap();
        let config = bench_config(&dir, "us,de,fr");
        let (app, _) = app(
            config,
            scripted_factory(vec![
                (Ipv4Addr::new(198, 51, 100, 1), ms(40)),
                (Ipv4Addr::new(198, 51, 100, 2), ms(1)),
                (Ipv4Addr::new(198, 51, 100, 3), ms(15)),
                (Ipv4Addr::new(198, 51, 100, 4), ms(25)),
            ]),
        );

        let mut output = Vec::new();
        let outcome = app.run_with_io(&mut Cursor::new(""), &mut output).await.unwrap();

        let path = dir.path().join("bench_result.csv");
        assert_eq!(outcome, RunOutcome::Written { path: path.clone(), relays: 3 });

        let rows = report_rows(&path);
        let hosts: Vec<_> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(hosts, vec!["de-fra-wg-001", "fr-par-wg-001", "us-nyc-wg-301"]);
        assert_eq!(rows[0][3], "15ms");

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Found 3 servers"));
        assert!(text.contains("\r3 servers processed\n"));
        assert!(text.contains("Results written to"));
        assert!(!text.contains("No country specified"));
    }

    #[tokio::test]
    async fn test_silent_relay_is_left_out() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(
            bench_config(&dir, "us,de,fr"),
            scripted_factory(vec![
                (Ipv4Addr::new(198, 51, 100, 1), ms(40)),
                (Ipv4Addr::new(198, 51, 100, 3), None),
                (Ipv4Addr::new(198, 51, 100, 4), ms(25)),
            ]),
        );

        let outcome = app.run_with_io(&mut Cursor::new(""), &mut Vec::new()).await.unwrap();
        assert!(matches!(outcome, RunOutcome::Written { relays: 2, .. }));

        let rows = report_rows(&dir.path().join("bench_result.csv"));
        let hosts: Vec<_> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(hosts, vec!["fr-par-wg-001", "us-nyc-wg-301"]);
    }

    #[tokio::test]
    async fn test_unscoped_run_probes_everything() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(bench_config(&dir, ""), scripted_factory(vec![]));

        let mut output = Vec::new();
        let outcome = app.run_with_io(&mut Cursor::new(""), &mut output).await.unwrap();
        // nothing answered, the report still gets its header
        assert!(matches!(outcome, RunOutcome::Written { relays: 0, .. }));

        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("No country specified, searching all servers...\n"));
        assert!(text.contains("Found 4 servers"));

        let content = fs::read_to_string(dir.path().join("bench_result.csv")).unwrap();
        assert_eq!(content, "Server,Country,City,Ping\n");
    }

    #[tokio::test]
    async fn test_declined_overwrite_keeps_file_and_skips_fetch() {
        let dir = TempDir::new().unwrap();
        let config = bench_config(&dir, "us");
        fs::write(&config.output_path, "previous results\n").unwrap();

        for answer in ["N\n", "\n", "yes\n", ""] {
            let (app, fetches) = app(config.clone(), socket_denied_factory());
            let mut output = Vec::new();
            let outcome = app
                .run_with_io(&mut Cursor::new(answer), &mut output)
                .await
                .unwrap();

            assert_eq!(outcome, RunOutcome::Declined, "answer {:?}", answer);
            assert_eq!(fetches.load(Ordering::SeqCst), 0);
            let text = String::from_utf8(output).unwrap();
            assert!(text.contains("already exists"));
            assert!(text.ends_with("Exiting...\n"));
        }

        let content = fs::read_to_string(&config.output_path).unwrap();
        assert_eq!(content, "previous results\n");
    }

    #[tokio::test]
    async fn test_confirmed_overwrite_replaces_file() {
        let dir = TempDir::new().unwrap();
        let config = bench_config(&dir, "fr");
        fs::write(&config.output_path, "previous results\n").unwrap();

        let (app, _) = app(
            config.clone(),
            scripted_factory(vec![(Ipv4Addr::new(198, 51, 100, 4), ms(7))]),
        );
        let mut output = Vec::new();
        app.run_with_io(&mut Cursor::new(" y \n"), &mut output).await.unwrap();

        assert!(String::from_utf8(output).unwrap().contains("Removed the existing file"));
        let rows = report_rows(&config.output_path);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][0], "fr-par-wg-001");
    }

    #[tokio::test]
    async fn test_empty_scope_token_matches_nothing() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(
            bench_config(&dir, "us, ,de"),
            scripted_factory(vec![
                (Ipv4Addr::new(198, 51, 100, 1), ms(5)),
                (Ipv4Addr::new(198, 51, 100, 3), ms(6)),
            ]),
        );

        let outcome = app.run_with_io(&mut Cursor::new(""), &mut Vec::new()).await.unwrap();
        assert!(matches!(outcome, RunOutcome::Written { relays: 2, .. }));
    }

    #[tokio::test]
    async fn test_out_of_scope_relay_is_never_probed() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(
            bench_config(&dir, "us,de"),
            scripted_factory(vec![
                (Ipv4Addr::new(198, 51, 100, 1), ms(30)),
                (Ipv4Addr::new(198, 51, 100, 3), ms(20)),
                (Ipv4Addr::new(198, 51, 100, 4), ms(10)),
            ]),
        );

        let outcome = app.run_with_io(&mut Cursor::new(""), &mut Vec::new()).await.unwrap();
        assert!(matches!(outcome, RunOutcome::Written { relays: 2, .. }));

        let rows = report_rows(&dir.path().join("bench_result.csv"));
        let hosts: Vec<_> = rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(hosts, vec!["de-fra-wg-001", "us-nyc-wg-301"]);
        assert!(rows.iter().all(|r| r[1] != "FR"));
    }

    #[tokio::test]
    async fn test_empty_selection_writes_header_without_opening_socket() {
        let dir = TempDir::new().unwrap();
        let (app, _) = app(bench_config(&dir, "zz"), socket_denied_factory());

        let mut output = Vec::new();
        let outcome = app.run_with_io(&mut Cursor::new(""), &mut output).await.unwrap();
        assert!(matches!(outcome, RunOutcome::Written { relays: 0, .. }));

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Found 0 servers"));
        assert!(!text.contains("processed"));

        let content = fs::read_to_string(dir.path().join("bench_result.csv")).unwrap();
        assert_eq!(content, "Server,Country,City,Ping\n");
    }

    #[tokio::test]
    async fn test_socket_failure_is_fatal_and_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let config = bench_config(&dir, "us");
        let (app, _) = app(config.clone(), socket_denied_factory());

        let err = app
            .run_with_io(&mut Cursor::new(""), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Probe(_)));
        assert!(!config.output_path.exists());
    }

    #[tokio::test]
    async fn test_directory_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        let config = bench_config(&dir, "us");
        let app = App::with_components(
            config.clone(),
            quiet_logger(),
            Box::new(FailingDirectory),
            socket_denied_factory(),
        );

        let err = app
            .run_with_io(&mut Cursor::new(""), &mut Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert!(!config.output_path.exists());
    }

    #[tokio::test]
    async fn test_list_countries_prints_sorted_table() {
        let config = Config {
            list_countries: true,
            enable_color: false,
            ..Default::default()
        };
        let fetches = Arc::new(AtomicUsize::new(0));
        let mut relays = directory_relays();
        relays.push(relay("de-ber-wg-001", "de", 5));
        let app = App::with_components(
            config,
            quiet_logger(),
            Box::new(StaticDirectory { relays, fetches }),
            socket_denied_factory(),
        );

        let mut output = Vec::new();
        let outcome = app.run_with_io(&mut Cursor::new(""), &mut output).await.unwrap();
        assert_eq!(outcome, RunOutcome::Listed(4));

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "4 available countries",
                "Code | Name",
                "de   | DE",
                "fr   | FR",
                "gb   | GB",
                "us   | US",
            ]
        );
    }

    #[tokio::test]
    async fn test_verbose_reports_fastest_relay() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            verbose: true,
            ..bench_config(&dir, "us,fr")
        };
        let (app, _) = app(
            config,
            scripted_factory(vec![
                (Ipv4Addr::new(198, 51, 100, 1), ms(40)),
                (Ipv4Addr::new(198, 51, 100, 4), ms(25)),
            ]),
        );

        let mut output = Vec::new();
        app.run_with_io(&mut Cursor::new(""), &mut output).await.unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Fastest relay: fr-par-wg-001 (FR, City) 25ms"));
        assert!(text.contains("Answered: 2/2 (100.0%)"));
    }
}
