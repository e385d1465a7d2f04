use clap::Parser;
use corpno_dl::cli::Args;
use corpno_dl::logging::init_logging;
use corpno_dl::writer::OutputWriter;
use corpno_dl::{Config, CorpNoDownloader, DownloadSummary, Result};
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging(args.log_filter().as_deref());

    match run(&args).await {
        Ok(summary) => {
            for file in &summary.files {
                println!("{}", file.path.display());
            }
        }
        Err(e) => {
            error!(error = %e, "corpno-dl failed");
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(args: &Args) -> Result<DownloadSummary> {
    let query = args.to_query()?;

    let mut config = if args.config.exists() {
        Config::from_yaml_file(&args.config, &args.profile)?
    } else {
        debug!(path = %args.config.display(), "no configuration file, using defaults");
        Config::default()
    };
    config.apply_env_overrides();
    args.apply_to_config(&mut config);
    config.validate()?;

    info!(
        mode = ?query.mode,
        format = %query.format,
        output_dir = %config.output.output_dir.display(),
        "starting download"
    );

    let mut downloader = CorpNoDownloader::new(&config)?;
    downloader.set_writer(
        OutputWriter::new(&config.output.output_dir).with_xml_to_csv(args.xml_to_csv),
    );
    downloader.download(&query).await
}
