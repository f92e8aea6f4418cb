//! topbase binary entry point.

fn main() {
    if let Err(err) = topbase::cli::run() {
        topbase::ui::output::error(format!("{err:#}"));
        std::process::exit(1);
    }
}
