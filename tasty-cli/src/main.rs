//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    if let Err(err) = tasty_cli::run() {
        eprintln!("tasty: {err}");
        std::process::exit(1);
    }
}
