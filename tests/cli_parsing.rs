use clap::Parser;
use std::path::PathBuf;
use uuid::Uuid;

use salon_report::cli::commands::report::ReportCommands;
use salon_report::cli::commands::visit::VisitCommands;
use salon_report::cli::{Cli, Commands};

const CUSTOMER: &str = "550e8400-e29b-41d4-a716-446655440000";
const VISIT: &str = "6ba7b810-9dad-11d1-80b4-00c04fd430c8";

#[test]
fn test_parse_report_generate() {
    let cli = Cli::try_parse_from([
        "salon-report",
        "report",
        "generate",
        "--customer",
        CUSTOMER,
        "--fallback",
        "walk-in.json",
        "--offline",
    ])
    .unwrap();

    match cli.command {
        Commands::Report(args) => match args.command {
            ReportCommands::Generate { customer, visit, fallback, offline } => {
                assert_eq!(customer, Some(Uuid::parse_str(CUSTOMER).unwrap()));
                assert_eq!(visit, None);
                assert_eq!(fallback, Some(PathBuf::from("walk-in.json")));
                assert!(offline);
            }
            ReportCommands::Show { .. } => panic!("Wrong report command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_report_show_with_global_json() {
    let cli = Cli::try_parse_from(["salon-report", "report", "show", VISIT, "--json"]).unwrap();

    assert!(cli.json);
    match cli.command {
        Commands::Report(args) => match args.command {
            ReportCommands::Show { visit } => assert_eq!(visit, Uuid::parse_str(VISIT).unwrap()),
            ReportCommands::Generate { .. } => panic!("Wrong report command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_visit_list_default_limit() {
    let cli = Cli::try_parse_from(["salon-report", "visit", "list", "--customer", CUSTOMER]).unwrap();

    match cli.command {
        Commands::Visit(args) => match args.command {
            VisitCommands::List { customer, limit } => {
                assert_eq!(customer, Uuid::parse_str(CUSTOMER).unwrap());
                assert_eq!(limit, 10);
            }
            VisitCommands::Record { .. } => panic!("Wrong visit command"),
        },
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_visit_record_and_config_path() {
    let cli = Cli::try_parse_from([
        "salon-report",
        "--config",
        "/etc/salon/config.yaml",
        "visit",
        "record",
        "--file",
        "visit.json",
    ])
    .unwrap();

    assert_eq!(cli.config, Some(PathBuf::from("/etc/salon/config.yaml")));
    assert!(matches!(
        cli.command,
        Commands::Visit(args) if matches!(&args.command, VisitCommands::Record { file } if file == &PathBuf::from("visit.json"))
    ));
}

#[test]
fn test_invalid_visit_id_is_rejected() {
    assert!(Cli::try_parse_from(["salon-report", "report", "show", "not-a-uuid"]).is_err());
}

#[test]
fn test_init_defaults_to_current_directory() {
    let cli = Cli::try_parse_from(["salon-report", "init"]).unwrap();
    match cli.command {
        Commands::Init(args) => {
            assert_eq!(args.path, PathBuf::from("."));
            assert!(!args.force);
        }
        _ => panic!("Wrong top-level command"),
    }
}
