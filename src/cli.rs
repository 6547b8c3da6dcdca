//! Command-line surface of the `tradex` binary.
//!
//! Each protected subcommand mounts a [`RouteGuard`] with the capability of
//! the area it belongs to before touching any data, the same way a view
//! would.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Arg, ArgAction, ArgMatches, ColorChoice, Command};
use serde::Serialize;

use tradex::credentials::SessionContext;
use tradex::gateway::{Gateway, GatewayClient};
use tradex::guard::{Capability, ENTRY_ROUTE, RouteGuard, View, authorize};
use tradex::models::user::UserId;
use tradex::refresh::{
    DEFAULT_INTERVAL, DEFAULT_PERIOD, DEFAULT_SYMBOL, Freshness, HistoryRefresher,
    PendingUserRefresher, PredictionRequest, PredictionRunner, RunOutcome,
};
use tradex::workflow::{AuthForm, AuthMode, SubmitOutcome};
use tradex::{Result, TradexError};

/// What the user asked for.
#[derive(Debug)]
pub enum Action {
    Login { email: String, password: String },
    Register { email: String, password: String },
    Logout,
    WhoAmI { admin: bool },
    Predict(PredictionRequest),
    History,
    Pending,
    Approve(UserId),
}

fn credential_args(command: Command) -> Command {
    command
        .arg(Arg::new("email").help("Account email").required(true))
        .arg(
            Arg::new("password")
                .short('p')
                .long("password")
                .help("Account password")
                .env("TRADEX_PASSWORD")
                .hide_env_values(true)
                .required(true),
        )
}

pub fn new() -> Command {
    Command::new("tradex")
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(credential_args(
            Command::new("login").about("Log in and store the access token"),
        ))
        .subcommand(credential_args(
            Command::new("register").about("Request an account; an admin must approve it"),
        ))
        .subcommand(Command::new("logout").about("Forget the stored access token"))
        .subcommand(
            Command::new("whoami")
                .about("Check access to the dashboard, or the admin area with --admin")
                .arg(
                    Arg::new("admin")
                        .long("admin")
                        .help("Require admin capability")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("predict")
                .about("Run a prediction and show the refreshed history")
                .arg(Arg::new("symbol").help("Instrument symbol").default_value(DEFAULT_SYMBOL))
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .help("Candle interval")
                        .default_value(DEFAULT_INTERVAL),
                )
                .arg(
                    Arg::new("period")
                        .long("period")
                        .help("Lookback period")
                        .default_value(DEFAULT_PERIOD),
                ),
        )
        .subcommand(Command::new("history").about("List your past predictions"))
        .subcommand(Command::new("pending").about("List accounts awaiting approval (admin)"))
        .subcommand(
            Command::new("approve")
                .about("Approve a pending account (admin)")
                .arg(
                    Arg::new("id")
                        .help("Pending user id")
                        .required(true)
                        .value_parser(clap::value_parser!(UserId)),
                ),
        )
}

/// Turns parsed arguments into an [`Action`].
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let string = |m: &ArgMatches, name: &str| -> Result<String> {
        m.get_one::<String>(name)
            .cloned()
            .ok_or_else(|| TradexError::Config(format!("missing required argument: {name}")))
    };

    match matches.subcommand() {
        Some(("login", m)) => Ok(Action::Login {
            email: string(m, "email")?,
            password: string(m, "password")?,
        }),
        Some(("register", m)) => Ok(Action::Register {
            email: string(m, "email")?,
            password: string(m, "password")?,
        }),
        Some(("logout", _)) => Ok(Action::Logout),
        Some(("whoami", m)) => Ok(Action::WhoAmI {
            admin: m.get_flag("admin"),
        }),
        Some(("predict", m)) => Ok(Action::Predict(PredictionRequest::new(
            string(m, "symbol")?,
            string(m, "interval")?,
            string(m, "period")?,
        ))),
        Some(("history", _)) => Ok(Action::History),
        Some(("pending", _)) => Ok(Action::Pending),
        Some(("approve", m)) => m
            .get_one::<UserId>("id")
            .copied()
            .map(Action::Approve)
            .ok_or_else(|| TradexError::Config("missing required argument: id".into())),
        _ => Err(TradexError::Config("unknown command".into())),
    }
}

/// Runs `action` against the service.
pub async fn execute(action: Action, gateway: GatewayClient, session: SessionContext) -> Result<ExitCode> {
    let gateway = Arc::new(gateway);

    match action {
        Action::Login { email, password } => submit(&gateway, AuthMode::Login, &email, &password).await,
        Action::Register { email, password } => {
            submit(&gateway, AuthMode::Register, &email, &password).await
        }
        Action::Logout => {
            gateway.logout()?;
            println!("Logged out.");
            Ok(ExitCode::SUCCESS)
        }
        Action::WhoAmI { admin } => {
            let capability = if admin {
                Capability::Admin
            } else {
                Capability::Authenticated
            };
            match authorize(capability, gateway.as_ref(), &session).await {
                Some(user) => {
                    print_json(&user)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    not_authorized(ENTRY_ROUTE);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Action::Predict(request) => {
            if !mount(Capability::Authenticated, gateway.as_ref(), &session).await {
                return Ok(ExitCode::FAILURE);
            }
            let history = Arc::new(HistoryRefresher::new(gateway.clone(), session.clone()));
            let runner = PredictionRunner::new(gateway, session, history);

            let outcome = runner.run(&request).await;
            if outcome == RunOutcome::SessionExpired {
                return Ok(session_expired());
            }
            let snapshot = runner.snapshot();
            if let Some(error) = &snapshot.last_error {
                eprintln!("Prediction failed: {error}");
            }
            match &snapshot.data {
                Freshness::Fresh(result) | Freshness::Stale(result) => print_json(result)?,
                Freshness::Absent => println!("No prediction available."),
            }
            print_history(runner.history())?;
            Ok(exit_code(&outcome))
        }
        Action::History => {
            if !mount(Capability::Authenticated, gateway.as_ref(), &session).await {
                return Ok(ExitCode::FAILURE);
            }
            let history = HistoryRefresher::new(gateway, session);
            if history.run().await == RunOutcome::SessionExpired {
                return Ok(session_expired());
            }
            print_history(&history)?;
            Ok(ExitCode::SUCCESS)
        }
        Action::Pending => {
            if !mount(Capability::Admin, gateway.as_ref(), &session).await {
                return Ok(ExitCode::FAILURE);
            }
            let pending = PendingUserRefresher::new(gateway, session);
            let outcome = pending.run().await;
            finish_pending(&pending, &outcome)
        }
        Action::Approve(id) => {
            if !mount(Capability::Admin, gateway.as_ref(), &session).await {
                return Ok(ExitCode::FAILURE);
            }
            let pending = PendingUserRefresher::new(gateway, session);
            let outcome = pending.approve(id).await;
            finish_pending(&pending, &outcome)
        }
    }
}

async fn submit(gateway: &GatewayClient, mode: AuthMode, email: &str, password: &str) -> Result<ExitCode> {
    let form = AuthForm::new();
    if form.mode() != mode {
        form.toggle_mode();
    }

    match form.submit(gateway, email, password).await {
        SubmitOutcome::LoggedIn { redirect } => {
            println!("Logged in. Continue at {redirect}.");
            Ok(ExitCode::SUCCESS)
        }
        SubmitOutcome::Registered => {
            println!("{}", form.notice().unwrap_or_default());
            Ok(ExitCode::SUCCESS)
        }
        SubmitOutcome::Failed(message) => {
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
        SubmitOutcome::Ignored => Ok(ExitCode::FAILURE),
    }
}

/// Mounts a guarded area. Returns `true` when protected content may render.
async fn mount<G: Gateway>(capability: Capability, gateway: &G, session: &SessionContext) -> bool {
    let mut guard = RouteGuard::new();
    match guard.guard(capability, gateway, session).await {
        View::Protected => true,
        View::Redirect(route) => {
            not_authorized(route);
            false
        }
        View::Loading => false,
    }
}

fn not_authorized(route: &str) {
    eprintln!("Not authorized. Log in again (redirect to {route}).");
}

fn print_history<G: Gateway>(history: &HistoryRefresher<G>) -> Result<()> {
    if history.is_empty() {
        println!("No recent signals found.");
        return Ok(());
    }
    print_json(&history.entries())
}

fn finish_pending<G: Gateway>(pending: &PendingUserRefresher<G>, outcome: &RunOutcome) -> Result<ExitCode> {
    if *outcome == RunOutcome::SessionExpired {
        return Ok(session_expired());
    }
    if let RunOutcome::Failed(error) = outcome {
        eprintln!("Request failed: {error}");
    }
    let users = pending.users();
    if users.is_empty() {
        println!("No pending requests.");
    } else {
        print_json(&users)?;
    }
    Ok(exit_code(outcome))
}

fn session_expired() -> ExitCode {
    eprintln!("Session expired. Log in again.");
    ExitCode::FAILURE
}

fn exit_code(outcome: &RunOutcome) -> ExitCode {
    match outcome {
        RunOutcome::Applied | RunOutcome::Superseded => ExitCode::SUCCESS,
        RunOutcome::Failed(_) | RunOutcome::SessionExpired => ExitCode::FAILURE,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
