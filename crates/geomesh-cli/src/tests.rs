use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["geomesh-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
    assert!(cli.dataset.is_none());
}

#[test]
fn parses_nearest_with_negative_longitude() {
    let cli = Cli::try_parse_from(["geomesh-cli", "nearest", "--lat", "40.7", "--lon", "-74.0"])
        .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Nearest { lat, lon }) => {
            assert!((lat - 40.7).abs() < f64::EPSILON);
            assert!((lon + 74.0).abs() < f64::EPSILON);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn nearest_requires_both_coordinates() {
    assert!(Cli::try_parse_from(["geomesh-cli", "nearest", "--lat", "10"]).is_err());
}

#[test]
fn parses_ask_with_multi_word_question() {
    let cli = Cli::try_parse_from([
        "geomesh-cli",
        "ask",
        "--lat",
        "30.3753",
        "--lon",
        "69.3451",
        "What",
        "is",
        "photosynthesis?",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Ask { offline: false, ref question, .. }) if question.join(" ") == "What is photosynthesis?"
    ));
}

#[test]
fn parses_ask_offline() {
    let cli = Cli::try_parse_from([
        "geomesh-cli", "ask", "--lat", "1", "--lon", "2", "--offline", "Hi",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Ask { offline: true, .. })
    ));
}

#[test]
fn ask_requires_question() {
    assert!(Cli::try_parse_from(["geomesh-cli", "ask", "--lat", "1", "--lon", "2"]).is_err());
}

#[test]
fn dataset_flag_is_global() {
    let cli = Cli::try_parse_from(["geomesh-cli", "validate", "--dataset", "/tmp/schools.csv"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Validate)));
    assert_eq!(cli.dataset, Some(PathBuf::from("/tmp/schools.csv")));

    let cli = Cli::try_parse_from(["geomesh-cli", "--dataset", "a.csv", "nodes"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Nodes)));
    assert_eq!(cli.dataset, Some(PathBuf::from("a.csv")));
}
