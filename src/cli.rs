use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ltt")]
#[command(author, version, about = "A FOSS CLI alternative to the official MyLTT app", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Create a MyLTT account with a mobile number
    Signup,

    /// Terminate the account that you're logged into
    DeleteAccount,

    /// Add, remove, modify, view, and control your services
    #[command(disable_help_flag = true)]
    Service {
        /// [SERVICE-NAME] [COMMAND] [ARGS]
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, num_args = 0..)]
        args: Vec<String>,
    },
}

/// Parsed after the service name has been split off by the router.
#[derive(Parser, Debug)]
#[command(name = "ltt service")]
#[command(
    about = "Add, remove, modify, view, and control your services",
    override_usage = "ltt service [SERVICE-NAME] [COMMAND]",
    disable_help_subcommand = true
)]
pub struct ServiceCli {
    #[command(subcommand)]
    pub command: Option<ServiceCommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ServiceCommand {
    /// Get a list of your services
    ListAll,

    /// Get information about a service
    Status,

    /// Add a service account
    Add,

    /// Remove a service account from your services
    Remove,

    /// Rename a service
    Rename {
        /// New name for the service
        new_name: Option<String>,
    },

    /// Recharge your balance with a voucher card number
    TopUp {
        /// Voucher card number
        voucher: Option<String>,
    },

    /// Auto package re-subscription
    AutoRecharge,

    /// Subscribe to a package
    Subscribe,
}
