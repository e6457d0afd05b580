use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use userpool_tools::commands::{self, apply_users::ApplyUsersOptions, login_as::LoginAsOptions};

#[derive(Parser)]
#[command(name = "userpool")]
#[command(about = "Cognito user pool management tools", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct ConnectionArgs {
    /// Cognito endpoint URL (default: $AWS_ENDPOINT_URL_COGNITO_IDENTITY_PROVIDER,
    /// $AWS_ENDPOINT_URL, or the regional endpoint)
    #[arg(long)]
    endpoint: Option<String>,

    /// AWS region (default: $AWS_REGION, $AWS_DEFAULT_REGION, or the active profile)
    #[arg(long)]
    region: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,
}

impl From<ConnectionArgs> for commands::ConnectionOptions {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            endpoint: args.endpoint,
            region: args.region,
            timeout_secs: Some(args.timeout),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update users from a JSON-lines or CSV file
    ApplyUsers {
        /// User pool id or name
        pool: String,

        /// Input file (.gz and .zst are decompressed)
        file: String,

        /// Set this password for every user
        #[arg(short, long)]
        password: Option<String>,

        /// Generate a password that satisfies the pool's password policy
        #[arg(short, long)]
        random_password: bool,

        /// Make the password permanent instead of temporary
        #[arg(short = 'P', long)]
        permanent_password: bool,

        /// Send a password reset code to each user
        #[arg(short, long)]
        send_password_reset_code: bool,

        /// Only apply users whose username matches this regular expression
        #[arg(short, long)]
        filter: Option<String>,

        /// Treat input as headerless CSV with these comma-separated columns
        /// (username, password, or an attribute name; empty drops the field)
        #[arg(short, long)]
        columns: Option<String>,

        /// Decode, filter and count without changing the pool
        #[arg(long)]
        dry_run: bool,

        /// Log every record instead of showing a spinner
        #[arg(short, long)]
        verbose: bool,

        /// Keep dispatching after a user fails
        #[arg(long)]
        fail_soft: bool,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Authenticate as a user and print the tokens
    LoginAs {
        /// User pool id or name
        pool: String,

        /// Username to log in as
        username: String,

        /// Password (default: $USERPOOL_PASSWORD)
        #[arg(short, long)]
        password: Option<String>,

        /// App client id or name (required when the pool has several)
        #[arg(short, long)]
        client: Option<String>,

        /// Client metadata as KEY=VALUE pairs
        #[arg(short = 'm', long, value_delimiter = ',')]
        client_metadata: Vec<String>,

        /// Reuse cached tokens until shortly before they expire
        #[arg(long)]
        use_cache: bool,

        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Generate shell completion scripts
    GenerateCompletion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "userpool_tools=debug"
    } else {
        "userpool_tools=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::ApplyUsers {
            pool,
            file,
            password,
            random_password,
            permanent_password,
            send_password_reset_code,
            filter,
            columns,
            dry_run,
            verbose,
            fail_soft,
            connection,
        } => {
            init_tracing(verbose);
            let options = ApplyUsersOptions {
                password,
                random_password,
                permanent_password,
                send_password_reset_code,
                filter,
                columns,
                dry_run,
                verbose,
                fail_soft,
            };
            commands::apply_users::run(&connection.into(), &pool, &file, &options).await
        }
        Commands::LoginAs {
            pool,
            username,
            password,
            client,
            client_metadata,
            use_cache,
            connection,
        } => {
            init_tracing(false);
            let options = LoginAsOptions {
                password,
                client,
                client_metadata,
                use_cache,
            };
            commands::login_as::run(&connection.into(), &pool, &username, &options).await
        }
        Commands::GenerateCompletion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "userpool", &mut std::io::stdout());
            Ok(())
        }
    }
}
