use chrono::TimeZone;
use feedwire_ingest::{SourceOutcome, SourceReport};

use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["feedwire-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["feedwire-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["feedwire-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn fetch_defaults_to_a_real_run() {
    let cli = Cli::try_parse_from(["feedwire-cli", "fetch"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Fetch {
            dry_run: false,
            lookback_minutes: None
        })
    ));
}

#[test]
fn fetch_dry_run_accepts_lookback() {
    let cli = Cli::try_parse_from([
        "feedwire-cli",
        "fetch",
        "--dry-run",
        "--lookback-minutes",
        "180",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Fetch {
            dry_run: true,
            lookback_minutes: Some(180)
        })
    ));
}

#[test]
fn runs_limit_defaults_to_ten() {
    let cli = Cli::try_parse_from(["feedwire-cli", "runs"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Runs { limit: 10 })));

    let cli = Cli::try_parse_from(["feedwire-cli", "runs", "--limit", "3"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Runs { limit: 3 })));
}

#[test]
fn unknown_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["feedwire-cli", "publish"]).is_err());
}

#[test]
fn preview_window_ends_now() {
    let now = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let (after, before) = commands::preview_window(now, 90).expect("window");
    assert_eq!(before, now);
    assert_eq!(after, chrono::Utc.with_ymd_and_hms(2024, 3, 1, 10, 30, 0).unwrap());
}

#[test]
fn preview_window_rejects_unrepresentable_lookback() {
    let now = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    assert!(commands::preview_window(now, i64::MAX).is_err());
    assert!(commands::preview_window(now, 9_000_000_000_000_000).is_err());
    assert!(commands::preview_window(now, -5).is_err());
    assert!(commands::preview_window(now, 0).is_err());
}

#[test]
fn fetch_lookback_outside_range_is_rejected() {
    for value in ["-5", "0", "9000000000000000"] {
        let result = Cli::try_parse_from([
            "feedwire-cli",
            "fetch",
            "--dry-run",
            "--lookback-minutes",
            value,
        ]);
        assert!(result.is_err(), "{value} should be rejected");
    }

    let max = feedwire_core::MAX_LOOKBACK_MINUTES.to_string();
    let cli = Cli::try_parse_from(["feedwire-cli", "fetch", "--lookback-minutes", max.as_str()])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Fetch {
            lookback_minutes: Some(m),
            ..
        }) if m == feedwire_core::MAX_LOOKBACK_MINUTES
    ));
}

#[test]
fn article_line_shows_time_source_and_link() {
    let article = feedwire_core::Article {
        source: "NOS".to_string(),
        title: "Dijken versterkt".to_string(),
        description: String::new(),
        content: String::new(),
        published_at: chrono::Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap(),
        url: "https://nos.nl/artikel/1".to_string(),
        media: None,
        media_type: None,
    };

    let line = commands::article_line(&article);
    assert!(line.starts_with("2024-03-01 09:05  NOS"));
    assert!(line.ends_with("Dijken versterkt  <https://nos.nl/artikel/1>"));
}

#[test]
fn report_line_flags_failed_sources() {
    let failed = SourceReport {
        source: "DutchNews".to_string(),
        outcome: SourceOutcome::Failed {
            attempts: 3,
            error: "timed out".to_string(),
        },
    };
    assert_eq!(
        commands::report_line(&failed),
        "DutchNews: FAILED after 3 attempts: timed out"
    );

    let fetched = SourceReport {
        source: "NOS".to_string(),
        outcome: SourceOutcome::Fetched {
            entries: 20,
            accepted: 4,
        },
    };
    assert_eq!(commands::report_line(&fetched), "NOS: 4/20 entries in window");
}
