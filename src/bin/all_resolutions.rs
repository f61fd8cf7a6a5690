use passive_dns_etl::app::datasets::AllResolutions;
use passive_dns_etl::app::runner;

#[tokio::main]
async fn main() {
    let exit_code = runner::run(AllResolutions).await;
    std::process::exit(exit_code);
}
