use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "gridgate",
    about = "gridgate — LLM gateway deployment-topology compiler",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a descriptor and its external references without writing anything
    Validate {
        /// Path to the descriptor
        #[arg(default_value = "gridgate.toml")]
        descriptor: String,
        /// Backend directory; references are resolved against its inventory.
        /// Without it, every referenced resource is assumed to exist.
        #[arg(short, long)]
        data_dir: Option<String>,
    },
    /// Compile a descriptor and print the plan
    Plan {
        #[arg(default_value = "gridgate.toml")]
        descriptor: String,
        #[arg(short, long)]
        data_dir: Option<String>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Compile, then apply the plan to the backend
    Apply {
        #[arg(default_value = "gridgate.toml")]
        descriptor: String,
        #[arg(short, long)]
        data_dir: String,
    },
    /// Print the plan outputs
    Outputs {
        #[arg(default_value = "gridgate.toml")]
        descriptor: String,
        #[arg(short, long)]
        data_dir: Option<String>,
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Register externally-owned resources in the backend inventory.
    ///
    /// Either one resource (`import security_group sg-123`) or every
    /// resource a descriptor references (`import --from gridgate.toml`).
    Import {
        /// Resource kind: vpc, security_group, certificate, repository,
        /// secret, hosted_zone
        kind: Option<String>,
        /// Resource identifier
        id: Option<String>,
        /// Register every reference of this descriptor
        #[arg(long, conflicts_with_all = ["kind", "id"])]
        from: Option<String>,
        #[arg(short, long)]
        data_dir: String,
    },
    /// Write a scaffold descriptor
    Init {
        /// Stack name
        name: String,
        /// Platform: ecs or eks
        #[arg(short, long, default_value = "ecs")]
        platform: String,
        /// Output path
        #[arg(short, long, default_value = "gridgate.toml")]
        output: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive("gridgate=info".parse()?);
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Validate {
            descriptor,
            data_dir,
        } => commands::plan::validate(&descriptor, data_dir.as_deref()),
        Commands::Plan {
            descriptor,
            data_dir,
            format,
        } => commands::plan::plan(&descriptor, data_dir.as_deref(), &format),
        Commands::Apply {
            descriptor,
            data_dir,
        } => commands::apply::apply(&descriptor, &data_dir),
        Commands::Outputs {
            descriptor,
            data_dir,
            format,
        } => commands::plan::outputs(&descriptor, data_dir.as_deref(), &format),
        Commands::Import {
            kind,
            id,
            from,
            data_dir,
        } => match (from, kind, id) {
            (Some(from), _, _) => commands::apply::import_descriptor(&from, &data_dir),
            (None, Some(kind), Some(id)) => commands::apply::import(&kind, &id, &data_dir),
            _ => anyhow::bail!("import needs either <KIND> <ID> or --from <DESCRIPTOR>"),
        },
        Commands::Init {
            name,
            platform,
            output,
        } => commands::init::init(&name, &platform, &output),
    }
}
