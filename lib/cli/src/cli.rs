//! The logic for the `biopattern` binary.

use crate::commands::BiopatternCmd;

/// The main function for the `biopattern` binary.
pub fn biopattern_main() {
    if let Err(e) = BiopatternCmd::run() {
        eprintln!("error: {e:?}");
        std::process::exit(1);
    }
}
