//! `sonic`: inspect, validate, tally, and simulate elections from JSON files.

use anyhow::{bail, Context};
use clap::Parser;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use sonic_election::{tally_ballots, validate_ballot, Ballot, ElectionConfig, TallyOutcome, TallyResult};
use sonic_engine::{init_logging, EngineConfig, LogFormat, SubmissionOutcome, VotingEngine};
use sonic_nullables::{NullClock, NullContentStore, NullLedger};
use sonic_types::{ElectionStatus, Timestamp, VoterAddress};
use sonic_utils::format_countdown;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sonic", about = "Sonic Vote election engine")]
struct Cli {
    /// Path to a TOML engine configuration file. CLI flags and env vars
    /// override its settings.
    #[arg(long, env = "SONIC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "SONIC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "SONIC_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Show an election's effective status and the time to its next change.
    Status {
        /// Election configuration (JSON).
        election: PathBuf,
        /// Evaluate at this Unix time instead of now.
        #[arg(long)]
        now: Option<u64>,
    },
    /// Check a ballot against an election.
    Validate {
        election: PathBuf,
        /// Ballot (JSON, tagged by "method").
        ballot: PathBuf,
    },
    /// Tally a list of accepted ballots.
    Tally {
        election: PathBuf,
        /// JSON array of ballots.
        ballots: PathBuf,
    },
    /// Run votes through the full submission protocol against in-memory stores.
    Simulate {
        election: PathBuf,
        /// JSON array of `{"voter": ..., "ballot": ..., "at": secs}`.
        votes: PathBuf,
        /// Make every receipt write fail.
        #[arg(long)]
        fail_receipts: bool,
    },
}

/// One scripted vote for `simulate`.
#[derive(Debug, Deserialize)]
struct ScriptedVote {
    voter: String,
    ballot: Ballot,
    /// Unix time of the vote; defaults to the previous vote's time, or the
    /// election start for the first vote.
    #[serde(default)]
    at: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => EngineConfig::from_toml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    init_logging(config.log_format, &config.log_level)?;
    if let Some(ref path) = cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    match cli.command {
        Command::Status { election, now } => {
            let election = load_election(&election)?;
            let now = now.map(Timestamp::new).unwrap_or_else(Timestamp::now);
            status(&election, now, cli.json)
        }
        Command::Validate { election, ballot } => {
            let election = load_election(&election)?;
            let ballot: Ballot = read_json(&ballot)?;
            match validate_ballot(&election, &ballot) {
                Ok(()) => {
                    print_line(cli.json, json!({ "valid": true }), "valid");
                    Ok(())
                }
                Err(reason) => {
                    print_line(
                        cli.json,
                        json!({ "valid": false, "reason": reason.to_string() }),
                        &format!("invalid: {reason}"),
                    );
                    bail!("ballot rejected")
                }
            }
        }
        Command::Tally { election, ballots } => {
            let election = load_election(&election)?;
            let ballots: Vec<Ballot> = read_json(&ballots)?;
            let result = tally_ballots(&election, &ballots)?;
            print_result(&election, &result, cli.json)
        }
        Command::Simulate {
            election,
            votes,
            fail_receipts,
        } => {
            let election = load_election(&election)?;
            let votes: Vec<ScriptedVote> = read_json(&votes)?;
            simulate(config, election, votes, fail_receipts, cli.json).await
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Read an election file and check its invariants before use.
fn load_election(path: &Path) -> anyhow::Result<ElectionConfig> {
    let election: ElectionConfig = read_json(path)?;
    election
        .validate()
        .with_context(|| format!("invalid election in {}", path.display()))?;
    Ok(election)
}

fn print_line(as_json: bool, value: serde_json::Value, text: &str) {
    if as_json {
        println!("{value}");
    } else {
        println!("{text}");
    }
}

fn status(election: &ElectionConfig, now: Timestamp, as_json: bool) -> anyhow::Result<()> {
    let status = election.effective_status(now);
    let next = election.next_transition(now);
    if as_json {
        let value = json!({
            "election": election.id,
            "status": status,
            "declared_status": election.declared_status,
            "next_change": next,
            "seconds_until_change": election.time_until_change(now),
            "result_calculation": election.method.result_calculation(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }
    println!("{}: {:?}", election.id, status);
    if status != election.declared_status {
        println!("  (declared {:?}, overridden by the clock)", election.declared_status);
    }
    match (status, next) {
        (ElectionStatus::Upcoming, Some(start)) => {
            println!("  opens in {}", format_countdown(now, start))
        }
        (ElectionStatus::Active, Some(end)) => println!("  closes in {}", format_countdown(now, end)),
        _ => println!("  voting has ended"),
    }
    println!(
        "  method: {} ({})",
        election.method.display_name(),
        election.method.description()
    );
    println!("  counting: {}", election.method.result_calculation());
    Ok(())
}

fn print_result(election: &ElectionConfig, result: &TallyResult, as_json: bool) -> anyhow::Result<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    println!("{} ({} ballots)", election.method.display_name(), result.ballots_counted);
    for score in &result.scores {
        let text = election
            .option(&score.option)
            .map(|o| o.text.as_str())
            .unwrap_or("?");
        println!("  {:>3}  {:<32} {}", score.option, text, score.score);
    }
    match &result.outcome {
        TallyOutcome::NoVotes => println!("no votes cast"),
        TallyOutcome::Winner(key) => println!("winner: {key}"),
        TallyOutcome::Tie(keys) => {
            let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
            println!("tie: {}", keys.join(", "));
        }
    }
    for round in &result.rounds {
        let scores: Vec<String> = round
            .scores
            .iter()
            .map(|s| format!("{}={}", s.option, s.score))
            .collect();
        let eliminated: Vec<String> = round.eliminated.iter().map(ToString::to_string).collect();
        println!(
            "  round {}: {} ({} active){}",
            round.round,
            scores.join(" "),
            round.active_ballots,
            if eliminated.is_empty() {
                String::new()
            } else {
                format!(", eliminated {}", eliminated.join(", "))
            }
        );
    }
    println!("note: {}", result.note);
    println!("counting: {}", election.method.result_calculation());
    Ok(())
}

async fn simulate(
    config: EngineConfig,
    election: ElectionConfig,
    votes: Vec<ScriptedVote>,
    fail_receipts: bool,
    as_json: bool,
) -> anyhow::Result<()> {
    let clock = Arc::new(NullClock::new(election.start_time.as_secs()));
    let ledger = Arc::new(NullLedger::new(clock.clone()));
    ledger.insert(election.clone());
    let content = Arc::new(NullContentStore::new());
    content.fail_writes(fail_receipts);
    let engine = VotingEngine::new(config, ledger, content);

    tracing::info!(election = %election.id, votes = votes.len(), "simulating");
    for vote in votes {
        if let Some(at) = vote.at {
            clock.set(at);
        }
        let voter = VoterAddress::parse(&vote.voter)?;
        let outcome = engine
            .submit_vote(&election, &voter, &vote.ballot, clock.now())
            .await;
        report(&voter, clock.now(), &outcome, as_json);
    }

    clock.set(clock.now().as_secs().max(election.end_time.as_secs()));
    let result = engine.tally(&election.id).await?;
    print_result(&election, &result, as_json)
}

fn report(voter: &VoterAddress, at: Timestamp, outcome: &SubmissionOutcome, as_json: bool) {
    let line = match outcome {
        SubmissionOutcome::Done {
            vote,
            receipt_error,
            ..
        } => json!({
            "voter": voter,
            "at": at,
            "done": true,
            "receipt": vote.receipt_uri,
            "receipt_error": receipt_error.as_ref().map(ToString::to_string),
        }),
        SubmissionOutcome::Aborted { reason, .. } => json!({
            "voter": voter,
            "at": at,
            "done": false,
            "reason": reason.to_string(),
            "retryable": reason.is_retryable(),
        }),
    };
    let text = match outcome {
        SubmissionOutcome::Done { vote, .. } => format!(
            "{voter} @ {at}: accepted (receipt {})",
            vote.receipt_uri.as_deref().unwrap_or("none")
        ),
        SubmissionOutcome::Aborted { reason, .. } => format!("{voter} @ {at}: aborted, {reason}"),
    };
    print_line(as_json, line, &text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_status_with_overrides() {
        let cli = Cli::try_parse_from([
            "sonic",
            "--log-level",
            "debug",
            "--log-format",
            "json",
            "status",
            "election.json",
            "--now",
            "150",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        assert!(matches!(cli.command, Command::Status { now: Some(150), .. }));
    }

    #[test]
    fn scripted_votes_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("votes.json");
        std::fs::write(
            &path,
            r#"[
                {"voter": "0xAA", "ballot": {"method": "simple_majority", "choice": "a"}, "at": 150},
                {"voter": "0xBB", "ballot": {"method": "simple_majority", "choice": "b"}}
            ]"#,
        )
        .unwrap();
        let votes: Vec<ScriptedVote> = read_json(&path).unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].at, Some(150));
        assert_eq!(votes[1].at, None);
    }

    #[test]
    fn malformed_election_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("election.json");
        let write = |start: u64, end: u64| {
            std::fs::write(
                &path,
                format!(
                    r#"{{"id": "0xe1", "method": "simple_majority",
                        "options": [{{"key": "a", "text": "Yes"}}, {{"key": "b", "text": "No"}}],
                        "start_time": {start}, "end_time": {end}}}"#
                ),
            )
            .unwrap();
        };

        write(100, 200);
        let election = load_election(&path).unwrap();
        assert_eq!(election.options.len(), 2);

        write(200, 100);
        let err = load_election(&path).unwrap_err();
        assert!(format!("{err:#}").contains("must be before end time"));
    }

    #[test]
    fn unreadable_file_names_the_path() {
        let err = read_json::<Vec<Ballot>>(Path::new("/nonexistent/ballots.json")).unwrap_err();
        assert!(err.to_string().contains("ballots.json"));
    }
}
