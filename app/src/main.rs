//! FILENAME: app/src/main.rs
// PURPOSE: Batch entry point. Usage: app [CONFIG.json]
// FORMAT: seq|level|category|message

fn main() {
    std::process::exit(app_lib::run());
}
