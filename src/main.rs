use clap::{Parser, Subcommand, ValueEnum};
use collabmatch::{db::Decision, Config, Engine};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// Maintenance commands for collaboration postings and their requests.
#[derive(Parser)]
#[command(name = "collabmatch", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Accept or reject a pending request on behalf of its counterparty.
    Respond {
        request: Uuid,
        #[arg(long)]
        actor: Uuid,
        #[arg(value_enum)]
        decision: DecisionArg,
    },
    /// Close a posting to new requests.
    Close {
        posting: Uuid,
        #[arg(long)]
        owner: Uuid,
    },
    /// Explain whether a user may apply to a posting.
    CanApply {
        posting: Uuid,
        #[arg(long)]
        viewer: Uuid,
    },
    /// Suggest people to invite.
    Recommend {
        posting: Uuid,
        #[arg(long)]
        owner: Uuid,
    },
    /// Pending requests with their match badges.
    Applicants {
        posting: Uuid,
        #[arg(long)]
        owner: Uuid,
    },
    /// An owner's open and closed postings plus incoming requests.
    Dashboard {
        #[arg(long)]
        owner: Uuid,
    },
    /// A user's own requests and invitations.
    MyRequests {
        #[arg(long)]
        user: Uuid,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DecisionArg {
    Accept,
    Reject,
}

impl From<DecisionArg> for Decision {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::Accept => Decision::Accepted,
            DecisionArg::Reject => Decision::Rejected,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config = Config::load()?;
    let engine = Engine::from_config(&config).await?;

    match cli.command {
        Command::Respond { request, actor, decision } => {
            print_json(&engine.respond(request, actor, decision.into()).await?)
        }
        Command::Close { posting, owner } => {
            engine.close_posting(posting, owner).await?;
            println!("closed {posting}");
            Ok(())
        }
        Command::CanApply { posting, viewer } => {
            let eligibility = engine.can_apply(posting, viewer).await?;
            match eligibility.reason() {
                None => println!("eligible"),
                Some(reason) => println!("not eligible: {reason}"),
            }
            Ok(())
        }
        Command::Recommend { posting, owner } => {
            print_json(&engine.recommend_candidates(posting, owner).await?)
        }
        Command::Applicants { posting, owner } => {
            print_json(&engine.pending_applicants(posting, owner).await?)
        }
        Command::Dashboard { owner } => print_json(&engine.dashboard(owner).await?),
        Command::MyRequests { user } => print_json(&engine.my_requests(user).await?),
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
