use clap::Parser;
use realgain::config::{Config, OutputFormat};
use realgain::{orchestration, report, AppError, Cli};

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries only the report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match execute(&cli).await {
        Ok(0) => {}
        Ok(_) => std::process::exit(2),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}

/// Run and print the report, returning the number of files that failed.
async fn execute(cli: &Cli) -> Result<usize, AppError> {
    let config = Config::resolve(cli, std::env::vars().collect())?;
    let summary = orchestration::run(&config).await?;

    let rendered = match config.format {
        OutputFormat::Table => report::render_table(&summary, config.decimals, config.details),
        OutputFormat::Json => report::render_json(&summary)?,
    };
    println!("{}", rendered);

    Ok(summary.failed_files())
}
