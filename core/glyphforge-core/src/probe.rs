//! Availability check for the external rasterizer

use std::time::Duration;

use log::debug;

use crate::process::{ToolCommand, ToolRun, ToolRunner};

/// Printed when the probe fails.
pub const INSTALL_HINT: &str = "install it with: npm install -g lv_font_conv";

/// Run `prefix + probe_args` and report whether it exited 0 in time.
///
/// Any other result (empty prefix, spawn failure, nonzero exit, timeout) is `false`.
pub fn probe(
    runner: &impl ToolRunner,
    prefix: &[String],
    probe_args: &[String],
    timeout: Duration,
) -> bool {
    let Some(command) = ToolCommand::from_prefix(prefix, probe_args.iter().cloned()) else {
        debug!("probe skipped: empty tool command");
        return false;
    };

    match runner.run(&command, timeout) {
        ToolRun::Completed { success, code, .. } => {
            debug!("probe `{}` exited with {code:?}", command.display_line());
            success
        }
        ToolRun::TimedOut => {
            debug!("probe `{}` timed out", command.display_line());
            false
        }
        ToolRun::SpawnFailed(cause) => {
            debug!("probe `{}` failed to start: {cause}", command.display_line());
            false
        }
    }
}
