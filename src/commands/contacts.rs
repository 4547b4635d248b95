use std::io::Write;

use clap::{Args, Subcommand};

use super::{Context, Run, require};
use crate::errors::CliError;

#[derive(Subcommand)]
pub enum ContactsCommand {
    #[command(about = "Search contacts on an account")]
    Search(ContactsSearchArgs),
}

impl Run for ContactsCommand {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        match self {
            ContactsCommand::Search(args) => args.run(ctx, out).await,
        }
    }
}

#[derive(Args)]
pub struct ContactsSearchArgs {
    #[arg(value_name = "ACCOUNT_ID", help = "Account ID to search")]
    pub account_id: String,

    #[arg(help = "Search query")]
    pub query: String,
}

impl Run for ContactsSearchArgs {
    async fn run(self, ctx: &Context, out: &mut dyn Write) -> Result<(), CliError> {
        let account_id = require(&self.account_id, "account ID and query are required")?;
        let query = require(&self.query, "account ID and query are required")?;

        let client = ctx.client()?;
        let contacts = client.search_contacts(&account_id, &query).await?;
        ctx.emit(out, &contacts)
    }
}
