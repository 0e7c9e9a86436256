mod cli;

fn main() {
    if let Err(err) = cli::start() {
        tracing::error!("{err:?}");
        std::process::exit(1);
    }
}
