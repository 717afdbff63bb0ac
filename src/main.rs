//! Engine entry point: read the configuration, warm the tables, run the
//! command loop, and flush the book on the way out.

use log::error;

use riposte::board::{self, Color, START_FEN};
use riposte::config::Settings;
use riposte::engine::{gamelog, Engine, APP_NAME, APP_VERSION};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut settings = Settings::default();
    settings.load_from(&Settings::config_path());
    settings.book_file = Settings::default_book_path();

    println!("{APP_NAME} {APP_VERSION}");
    println!("Initializing...");

    // Build the magic attack tables now rather than inside the first
    // search.
    board::magics::init();

    let use_log = settings.use_log;
    let nthreads = settings.thread_count();
    let mut engine = match Engine::new(settings) {
        Ok(engine) => engine,
        Err(err) => {
            error!("{err}");
            gamelog::log_error_line(use_log, "aborted");
            eprintln!("Aborted.");
            std::process::exit(1);
        }
    };

    println!("Using {nthreads} threads (for perft)");
    println!("...Done\n");
    println!("Type \"help\" to display a list of commands");

    engine.new_game(START_FEN, Some(Color::Black));
    engine.main_loop();
    engine.shutdown();
}
