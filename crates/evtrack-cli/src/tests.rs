use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["evtrack", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Db {
            command: DbCommands::Ping
        }
    ));
}

#[test]
fn run_places_defaults_to_sync_with_snapshot() {
    let cli = Cli::try_parse_from(["evtrack", "run", "places"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Run {
            strategy: Strategy::Places,
            dry_run: false,
            no_snapshot: false
        }
    ));
}

#[test]
fn run_catalog_with_flags() {
    let cli =
        Cli::try_parse_from(["evtrack", "run", "catalog", "--dry-run", "--no-snapshot"]).unwrap();
    assert!(matches!(
        cli.command,
        Commands::Run {
            strategy: Strategy::Catalog,
            dry_run: true,
            no_snapshot: true
        }
    ));
}

#[test]
fn unknown_strategy_is_rejected() {
    assert!(Cli::try_parse_from(["evtrack", "run", "scrape-everything"]).is_err());
}

#[test]
fn run_requires_a_strategy() {
    assert!(Cli::try_parse_from(["evtrack", "run"]).is_err());
}

#[test]
fn missing_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["evtrack"]).is_err());
}
