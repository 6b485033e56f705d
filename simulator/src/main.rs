use anyhow::{Context, Result};
use clap::Parser;
use commonware_utils::hex;
use fairstake_execution::{demo_session, Entropy, Session};
use fairstake_types::money::to_display;
use fairstake_simulator::{autoplay, step, Config, RunSummary};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn, Level};

#[derive(Parser, Debug)]
#[command(author, version, about = "Run a fairstake dice session")]
struct Args {
    /// YAML config file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Rounds to run (0 = until halted or interrupted).
    #[arg(long)]
    rounds: Option<u64>,

    /// Run one round per interval until interrupted instead of stepping.
    #[arg(long)]
    autoplay: bool,

    #[arg(long)]
    interval_ms: Option<u64>,

    /// Fixed server-seed entropy for replaying a session. Makes every roll predictable.
    #[arg(long)]
    entropy: Option<u64>,

    #[arg(long)]
    client_seed: Option<String>,

    /// Snapshot to load after the demo table is built.
    #[arg(long)]
    restore: Option<PathBuf>,

    /// Where to write the final snapshot.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Where to write the final analytics report (JSON).
    #[arg(long)]
    analytics: Option<PathBuf>,

    #[arg(long)]
    log_level: Option<String>,

    /// Print this many trailing session log lines at exit.
    #[arg(long, default_value_t = 20)]
    tail: usize,
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(rounds) = args.rounds {
        config.rounds = rounds;
    }
    if let Some(interval_ms) = args.interval_ms {
        if interval_ms == 0 {
            anyhow::bail!("interval_ms must be greater than zero");
        }
        config.interval_ms = interval_ms;
    }
    if let Some(entropy) = args.entropy {
        config.entropy = Some(entropy);
    }
    if let Some(seed) = &args.client_seed {
        config.client_seed = Some(seed.clone());
    }
    if let Some(path) = &args.restore {
        config.restore = Some(path.clone());
    }
    if let Some(path) = &args.snapshot {
        config.snapshot = Some(path.clone());
    }
    if let Some(path) = &args.analytics {
        config.analytics = Some(path.clone());
    }
    if let Some(level) = &args.log_level {
        config.log_level = level.clone();
    }
    Ok(config)
}

fn init_tracing(level: Level) {
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn prepare_session(config: &Config) -> Result<Session> {
    let entropy = match config.entropy {
        Some(value) => {
            warn!("fixed entropy configured; rolls are predictable");
            Entropy::Replay(value)
        }
        None => Entropy::Os,
    };
    let mut session =
        demo_session(config.engine.clone(), entropy).context("failed to build demo session")?;
    if let Some(path) = &config.restore {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("could not read snapshot {}", path.display()))?;
        session
            .import_json(&json)
            .with_context(|| format!("could not import snapshot {}", path.display()))?;
        info!(path = %path.display(), round = session.round(), "snapshot restored");
    }
    if let Some(seed) = &config.client_seed {
        if !session.set_client_seed(seed) {
            warn!(seed = %seed, "client seed ignored");
        }
    }
    Ok(session)
}

fn write_snapshot(session: &Session, path: &Path) -> Result<()> {
    let json = session.export_json().context("failed to encode snapshot")?;
    std::fs::write(path, json)
        .with_context(|| format!("could not write snapshot {}", path.display()))?;
    info!(path = %path.display(), round = session.round(), "snapshot written");
    Ok(())
}

fn write_analytics(session: &Session, path: &Path) -> Result<()> {
    let json = session
        .export_analytics()
        .to_json()
        .context("failed to encode analytics")?;
    std::fs::write(path, json)
        .with_context(|| format!("could not write analytics {}", path.display()))?;
    info!(path = %path.display(), round = session.round(), "analytics written");
    Ok(())
}

fn report(session: &Session, summary: &RunSummary, tail: usize) {
    let analytics = session.analytics();
    info!(
        rounds = summary.rounds,
        bets = summary.bets,
        rejections = summary.rejections,
        rebuys = summary.rebuys,
        halt = ?summary.halt,
        interrupted = summary.interrupted,
        liquidity = to_display(session.pool().liquidity()),
        volatility = to_display(session.pool().bank().volatility() as u64),
        house_fees = to_display(session.house().fee_balance),
        realized_edge = analytics.realized_edge(),
        anomalies = analytics.anomalies.len(),
        "run complete"
    );
    let skip = session.log().len().saturating_sub(tail);
    for line in session.log().lines().skip(skip) {
        println!("{line}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = build_config(&args)?;
    init_tracing(config.level()?);

    let mut session = prepare_session(&config)?;
    info!(
        commitment = %hex(&session.commitment()),
        players = session.players().len(),
        "session ready"
    );

    let summary = if args.autoplay {
        let shutdown = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                warn!(?err, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        };
        autoplay(
            &mut session,
            Duration::from_millis(config.interval_ms),
            config.rounds,
            shutdown,
        )
        .await
    } else {
        step(&mut session, config.rounds)
    };

    report(&session, &summary, args.tail);
    if let Some(path) = &config.snapshot {
        write_snapshot(&session, path)?;
    }
    if let Some(path) = &config.analytics {
        write_analytics(&session, path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_config() {
        let args = Args::parse_from([
            "simulator",
            "--rounds",
            "3",
            "--entropy",
            "11",
            "--log-level",
            "debug",
            "--client-seed",
            "mine",
            "--analytics",
            "report.json",
        ]);
        let config = build_config(&args).expect("config should build");
        assert_eq!(config.rounds, 3);
        assert_eq!(config.entropy, Some(11));
        assert_eq!(config.analytics, Some(PathBuf::from("report.json")));
        assert_eq!(config.level().unwrap(), Level::DEBUG);
        assert_eq!(config.client_seed.as_deref(), Some("mine"));
    }

    #[test]
    fn default_sessions_commit_to_different_seeds() {
        let config = build_config(&Args::parse_from(["simulator"])).unwrap();
        assert_eq!(config.entropy, None);
        let a = prepare_session(&config).unwrap();
        let b = prepare_session(&config).unwrap();
        assert_ne!(a.commitment(), b.commitment());

        let replay = Config {
            entropy: Some(5),
            ..config
        };
        assert_eq!(
            prepare_session(&replay).unwrap().commitment(),
            prepare_session(&replay).unwrap().commitment()
        );
    }

    #[test]
    fn analytics_report_is_written() {
        let dir = std::env::temp_dir().join(format!("fairstake-analytics-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("analytics.json");

        let mut session = prepare_session(&Config {
            entropy: Some(6),
            ..Config::default()
        })
        .unwrap();
        step(&mut session, 5);
        write_analytics(&session, &path).unwrap();

        let json = std::fs::read_to_string(&path).unwrap();
        let report: fairstake_types::AnalyticsExport = serde_json::from_str(&json).unwrap();
        assert_eq!(report.round, 5);
        assert_eq!(report.players.len(), session.players().len());
        assert_eq!(report.analytics.total_bets, session.analytics().total_bets);
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn rejects_zero_interval() {
        let args = Args::parse_from(["simulator", "--interval-ms", "0"]);
        let err = build_config(&args).unwrap_err();
        assert!(
            err.to_string().contains("interval_ms"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("fairstake-sim-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("session.json");

        let config = Config {
            entropy: Some(4),
            client_seed: Some("disk".to_string()),
            ..Config::default()
        };
        let mut session = prepare_session(&config).unwrap();
        step(&mut session, 10);
        write_snapshot(&session, &path).unwrap();

        let restored = prepare_session(&Config {
            restore: Some(path.clone()),
            ..config
        })
        .unwrap();
        assert_eq!(restored.round(), 10);
        assert_eq!(restored.total_value(), session.total_value());
        assert_eq!(restored.client_seed(), "disk");
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
