use std::process;

use litterprep::LitterprepError;

fn main() {
    if let Err(err) = litterprep::run() {
        eprintln!("error: {err}");

        // The missing-files abort lists a sample so the operator can
        // see which batch folder went astray.
        if let LitterprepError::MissingImages { sample, .. } = &err {
            for path in sample {
                eprintln!("  missing: {path}");
            }
        }

        process::exit(err.exit_code());
    }
}
