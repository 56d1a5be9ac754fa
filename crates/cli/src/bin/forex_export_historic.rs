use clap::Parser;
use forex_cli::{init_tracing, run_export, ExportArgs, SerdeJsonEncode};
use forex_engine::feed::FeedKind;

#[tokio::main]
async fn main() {
    init_tracing();
    let args = ExportArgs::parse();

    match run_export(FeedKind::Historic, "historic_rates", &args, &SerdeJsonEncode).await {
        Ok(path) => {
            tracing::info!("wrote {}", path.display());
            std::process::exit(0);
        }
        Err(e) => {
            tracing::error!("export failed: {e}");
            std::process::exit(1);
        }
    }
}
