use log::LevelFilter;

fn main() {
    stderrlog::new()
        .module(module_path!())
        .verbosity(LevelFilter::Info)
        .init()
        .expect("Failed to initialize logger");

    ctrlc::set_handler(cjdk::set_cancelled).expect("Error setting Ctrl-C handler");

    let matches = cjdk::cli::command().get_matches();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");

    let outcome = runtime.block_on(cjdk::CancellableFuture::new(cjdk::cli::run(&matches)));

    let code = match outcome {
        None => 130,
        Some(Ok(code)) => code,
        Some(Err(e)) => {
            log::error!("{e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}
