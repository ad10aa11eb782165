use clap::{
    crate_authors, crate_description, crate_name, crate_version, Arg, ArgAction, ArgMatches,
    Command,
};
use dskit::api::{self, DskitError};

// The CLI layer should only parse inputs and forward them to library code.
fn main() {
    let matches = Command::new(crate_name!())
        .about(crate_description!())
        .author(crate_authors!())
        .version(crate_version!())
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(
            Command::new("init")
                .about("Sets up the standard project layout and environment file")
                .arg(
                    Arg::new("project-root")
                        .short('p')
                        .long("project-root")
                        .help("Path to the root directory of the project"),
                )
                .arg(
                    Arg::new("yes")
                        .short('y')
                        .long("yes")
                        .help("Skip confirmation prompts")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("add-source")
                .about("Adds a new entry to the sources ledger")
                .arg(Arg::new("name").short('n').long("name").help("The name of the source"))
                .arg(
                    Arg::new("description")
                        .short('d')
                        .long("description")
                        .help("The description of the source"),
                )
                .arg(Arg::new("url").short('u').long("url").help("The url of the source"))
                .arg(
                    Arg::new("citation")
                        .short('c')
                        .long("citation")
                        .help("The citation for the source"),
                ),
        )
        .subcommand(
            Command::new("experiment")
                .about("Starts a new experiment with a notebook skeleton")
                .arg(Arg::new("name").short('n').long("name").help("The name of the experiment"))
                .arg(
                    Arg::new("description")
                        .short('d')
                        .long("description")
                        .help("The description of the experiment"),
                ),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    let result = match matches.subcommand() {
        Some(("init", args)) => handle_init(args),
        Some(("add-source", args)) => handle_add_source(args),
        Some(("experiment", args)) => handle_experiment(args),
        _ => {
            eprintln!("No subcommand given. Try `dskit --help`.");
            std::process::exit(1);
        }
    };

    if let Err(error) = result {
        eprintln!("{:?}", miette::Report::new(error));
        std::process::exit(1);
    }
}

fn init_logging(is_verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();

    if is_verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }

    builder.init();
}

fn handle_init(args: &ArgMatches) -> Result<(), DskitError> {
    let project_root = args.get_one::<String>("project-root").map(String::as_str);
    let assume_yes = args.get_flag("yes");

    api::init(project_root, assume_yes)
}

fn handle_add_source(args: &ArgMatches) -> Result<(), DskitError> {
    api::add_source(
        args.get_one::<String>("name").map(String::as_str),
        args.get_one::<String>("description").map(String::as_str),
        args.get_one::<String>("url").map(String::as_str),
        args.get_one::<String>("citation").map(String::as_str),
    )
    .map(|_| ())
}

fn handle_experiment(args: &ArgMatches) -> Result<(), DskitError> {
    api::start_experiment(
        args.get_one::<String>("name").map(String::as_str),
        args.get_one::<String>("description").map(String::as_str),
    )
    .map(|_| ())
}
