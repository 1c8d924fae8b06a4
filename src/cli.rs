use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

use crate::{
    commands::{
        AssumeRoleCommand, CleanCommand, CompletionsCommand, Context, ListCommand,
        SessionTokenCommand,
    },
    constants::DEFAULT_PROFILE,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "mfaws", version, about = "Manage short-term AWS credentials obtained with MFA", long_about = None, arg_required_else_help = true)]
pub struct Cli {
    #[arg(
        short = 'p',
        long,
        global = true,
        env = "AWS_PROFILE",
        default_value = DEFAULT_PROFILE,
        help = "Long-term AWS profile name"
    )]
    pub profile: String,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Path to the AWS shared credentials file [default: ~/.aws/credentials]"
    )]
    pub credentials_path: Option<PathBuf>,

    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Increase verbosity (-v info, -vv debug, -vvv trace)")]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Store a session token obtained with MFA as <profile>-short-term")]
    SessionToken(SessionTokenCommand),
    #[command(about = "Assume a role with MFA and store it as <profile>-short-term")]
    AssumeRole(AssumeRoleCommand),
    #[command(about = "List profiles in the credentials file")]
    List(ListCommand),
    #[command(about = "Delete all short-term profiles")]
    Clean(CleanCommand),
    #[command(about = "Generate shell completion scripts for mfaws")]
    Completions(CompletionsCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let Cli {
            profile,
            credentials_path,
            command,
            ..
        } = self;
        let context = move || Context::resolve(profile, credentials_path);

        match command {
            Commands::SessionToken(cmd) => cmd.execute(&context()?).await,
            Commands::AssumeRole(cmd) => cmd.execute(&context()?).await,
            Commands::List(cmd) => cmd.execute(&context()?).await,
            Commands::Clean(cmd) => cmd.execute(&context()?).await,
            Commands::Completions(cmd) => {
                cmd.execute();
                Ok(())
            }
        }
    }
}
