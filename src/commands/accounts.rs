use std::io::Write;

use clap::Subcommand;

use super::{Context, Run};
use crate::errors::CliError;

#[derive(Subcommand)]
pub enum AccountsCommand {
    #[command(about = "List connected messaging accounts")]
    List,
}

impl Run for AccountsCommand {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        match self {
            AccountsCommand::List => {
                let client = ctx.client()?;
                let accounts = client.list_accounts().await?;
                ctx.emit(out, &accounts)
            }
        }
    }
}
