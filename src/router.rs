use crate::cli::{Command, ServiceCli, ServiceCommand};
use crate::error::{CliError, CliResult};
use crate::store::Credentials;
use clap::CommandFactory;

/// Raw `service` arguments split into the optional leading service name and
/// the remainder handed to the `service` subcommand parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInvocation {
    pub service_name: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceTarget {
    pub service_name: Option<String>,
    pub command: ServiceCommand,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Signup { replaces_account: bool },
    DeleteAccount,
    Service(Vec<String>),
}

pub fn service_subcommand_names() -> Vec<String> {
    ServiceCli::command()
        .get_subcommands()
        .map(|command| command.get_name().to_string())
        .collect()
}

/// A leading token is a subcommand when it names one and is not itself
/// followed by a subcommand name; any other leading token is the service
/// name. `mysvc status` names `mysvc`, `status` alone names nothing, and
/// `status status` targets a service called `status`.
pub fn classify_service_args(args: &[String]) -> ServiceInvocation {
    let subcommands = service_subcommand_names();
    let is_subcommand = |token: &String| subcommands.iter().any(|name| name == token);

    let Some(first) = args.first() else {
        return ServiceInvocation {
            service_name: None,
            args: Vec::new(),
        };
    };

    let first_is_selector = first.starts_with('-')
        || (is_subcommand(first) && !args.get(1).map(is_subcommand).unwrap_or(false));
    if first_is_selector {
        return ServiceInvocation {
            service_name: None,
            args: args.to_vec(),
        };
    }

    ServiceInvocation {
        service_name: Some(first.clone()).filter(|name| !name.is_empty()),
        args: args[1..].to_vec(),
    }
}

/// Applies the defaulting and existence rules of the `service` group.
pub fn resolve_service_target(
    credentials: &Credentials,
    service_name: Option<String>,
    command: Option<ServiceCommand>,
) -> CliResult<ServiceTarget> {
    let needs_existing = !matches!(
        command,
        Some(ServiceCommand::Add) | Some(ServiceCommand::ListAll)
    );

    match service_name {
        Some(name) => {
            if needs_existing && !credentials.services.contains_key(&name) {
                return Err(CliError::validation(format!(
                    "You don't have a service with the name \"{}\"",
                    name
                )));
            }
            Ok(ServiceTarget {
                service_name: Some(name),
                command: command.unwrap_or(ServiceCommand::Status),
            })
        }
        None => match command {
            None => Ok(ServiceTarget {
                service_name: None,
                command: ServiceCommand::ListAll,
            }),
            Some(command @ (ServiceCommand::Add | ServiceCommand::ListAll)) => Ok(ServiceTarget {
                service_name: None,
                command,
            }),
            Some(_) => Err(CliError::validation("You must specify a service")),
        },
    }
}

/// Top-level dispatch: bare invocation goes to `service` when signed up and
/// to `signup` otherwise; everything except `signup` needs an account.
pub fn resolve_route(command: Option<Command>, signed_up: bool) -> CliResult<Route> {
    match command {
        None if signed_up => Ok(Route::Service(Vec::new())),
        None | Some(Command::Signup) => Ok(Route::Signup {
            replaces_account: signed_up,
        }),
        Some(_) if !signed_up => Err(CliError::validation("You have to sign up first")),
        Some(Command::DeleteAccount) => Ok(Route::DeleteAccount),
        Some(Command::Service { args }) => Ok(Route::Service(args)),
    }
}
