use clap::{arg, command, crate_name, value_parser, Arg, ArgMatches, Command};
use client::ClientError;
use kernel::Credentials;

mod cli;

#[tokio::main]
async fn main() {
    let cli = build_cli().get_matches();

    let code = match cli.subcommand() {
        Some((cli::VERSION_SUBCOMMAND, m)) => {
            cli::version::run(m.get_flag("json"));
            0
        }
        Some((cli::BUGREPORT_SUBCOMMAND, _)) => {
            cli::bugreport::run();
            0
        }
        Some((cli::SERVER_SUBCOMMAND, _)) => cli::server::run().await,
        Some((name, m)) => report(run_client(name, m).await),
        None => 0,
    };
    std::process::exit(code);
}

async fn run_client(name: &str, m: &ArgMatches) -> Result<(), ClientError> {
    let uri = string(m, "uri");
    match name {
        cli::REGISTER_SUBCOMMAND => cli::client::register(uri, &credentials(m)).await,
        cli::LOGIN_SUBCOMMAND => cli::client::login(uri, &credentials(m)).await,
        cli::LOGOUT_SUBCOMMAND => cli::client::logout(uri, string(m, "token")).await,
        cli::UPLOAD_SUBCOMMAND => {
            cli::client::upload(uri, string(m, "token"), string(m, "file")).await
        }
        cli::DOWNLOAD_SUBCOMMAND => {
            cli::client::download(
                uri,
                string(m, "token"),
                string(m, "filename"),
                string(m, "output"),
            )
            .await
        }
        cli::RENAME_SUBCOMMAND => {
            cli::client::rename(
                uri,
                string(m, "token"),
                string(m, "filename"),
                string(m, "new"),
            )
            .await
        }
        cli::DELETE_SUBCOMMAND => {
            cli::client::delete(uri, string(m, "token"), string(m, "filename")).await
        }
        cli::LIST_SUBCOMMAND => {
            let limit = m.get_one::<i64>("limit").copied().unwrap_or(LIST_LIMIT);
            cli::client::list(uri, string(m, "token"), limit).await
        }
        _ => Ok(()),
    }
}

const LIST_LIMIT: i64 = 100;

fn report(result: Result<(), ClientError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    }
}

fn string<'a>(m: &'a ArgMatches, id: &str) -> &'a str {
    m.get_one::<String>(id).map(String::as_str).unwrap_or_default()
}

fn credentials(m: &ArgMatches) -> Credentials {
    Credentials {
        login: string(m, "login").to_owned(),
        password: string(m, "password").to_owned(),
    }
}

fn uri_arg() -> Arg {
    arg!(-u --uri <URI>)
        .env(cli::URI_ENV)
        .default_value(cli::DEFAULT_URI)
        .help("Server URI")
}

fn token_arg() -> Arg {
    arg!(-t --token <TOKEN>)
        .required(true)
        .env(cli::TOKEN_ENV)
        .help("Access token returned by login")
}

fn filename_arg() -> Arg {
    arg!(-f --filename <FILENAME>)
        .required(true)
        .help("Name of the stored file")
}

fn credentials_command(name: &'static str, about: &'static str) -> Command {
    Command::new(name)
        .about(about)
        .arg(uri_arg())
        .arg(arg!(-l --login <LOGIN>).required(true).help("User login"))
        .arg(
            arg!(-p --password <PASSWORD>)
                .required(true)
                .help("User password"),
        )
}

fn build_cli() -> Command {
    command!(crate_name!())
        .version(clap::crate_version!())
        .about(clap::crate_description!())
        .subcommand(
            Command::new(cli::VERSION_SUBCOMMAND)
                .about(cli::VERSION_DESCRIPTION)
                .arg(arg!(--json "Print as JSON")),
        )
        .subcommand(Command::new(cli::BUGREPORT_SUBCOMMAND).about(cli::BUGREPORT_DESCRIPTION))
        .subcommand(Command::new(cli::SERVER_SUBCOMMAND).about(cli::SERVER_DESCRIPTION))
        .subcommand(credentials_command(
            cli::REGISTER_SUBCOMMAND,
            cli::REGISTER_DESCRIPTION,
        ))
        .subcommand(credentials_command(
            cli::LOGIN_SUBCOMMAND,
            cli::LOGIN_DESCRIPTION,
        ))
        .subcommand(
            Command::new(cli::LOGOUT_SUBCOMMAND)
                .about(cli::LOGOUT_DESCRIPTION)
                .arg(uri_arg())
                .arg(token_arg()),
        )
        .subcommand(
            Command::new(cli::UPLOAD_SUBCOMMAND)
                .about(cli::UPLOAD_DESCRIPTION)
                .arg(uri_arg())
                .arg(token_arg())
                .arg(
                    arg!(-f --file <FILE>)
                        .required(true)
                        .help("Path to file to upload"),
                ),
        )
        .subcommand(
            Command::new(cli::DOWNLOAD_SUBCOMMAND)
                .about(cli::DOWNLOAD_DESCRIPTION)
                .arg(uri_arg())
                .arg(token_arg())
                .arg(filename_arg())
                .arg(
                    arg!(-o --output <DIR>)
                        .default_value(".")
                        .help("Directory to save the file into"),
                ),
        )
        .subcommand(
            Command::new(cli::RENAME_SUBCOMMAND)
                .about(cli::RENAME_DESCRIPTION)
                .arg(uri_arg())
                .arg(token_arg())
                .arg(filename_arg())
                .arg(arg!(-n --new <NEW>).required(true).help("New file name")),
        )
        .subcommand(
            Command::new(cli::DELETE_SUBCOMMAND)
                .about(cli::DELETE_DESCRIPTION)
                .arg(uri_arg())
                .arg(token_arg())
                .arg(filename_arg()),
        )
        .subcommand(
            Command::new(cli::LIST_SUBCOMMAND)
                .about(cli::LIST_DESCRIPTION)
                .arg(uri_arg())
                .arg(token_arg())
                .arg(
                    Arg::new("limit")
                        .short('l')
                        .long("limit")
                        .value_parser(value_parser!(i64))
                        .default_value("100")
                        .allow_negative_numbers(true)
                        .help("Maximum number of files to show"),
                ),
        )
        .arg_required_else_help(true)
        .disable_version_flag(true)
}
