use passive_dns_etl::app::datasets::UniqueResolutions;
use passive_dns_etl::app::runner;

#[tokio::main]
async fn main() {
    let exit_code = runner::run(UniqueResolutions).await;
    std::process::exit(exit_code);
}
