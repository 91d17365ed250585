//! # Voxel Streaming Demo Entry Point
//!
//! Runs the headless streaming demo from the library's `run()` function.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- [config.json]
//! ```

use std::{env, path::PathBuf, process::ExitCode};

fn main() -> ExitCode {
    voxel_streaming::init_logger();

    let config_path = env::args_os().nth(1).map(PathBuf::from);
    match voxel_streaming::run(config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            log::error!("{}", error);
            ExitCode::FAILURE
        }
    }
}
