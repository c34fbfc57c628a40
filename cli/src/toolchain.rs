use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::CliError;

/// Compile `c_file` into `output` with `cc`.
pub fn compile(cc: &str, args: &[String], c_file: &Path, output: &Path) -> Result<(), CliError> {
    let mut command = Command::new(cc);
    command.args(args).arg(c_file).arg("-o").arg(output);
    debug!("running {:?}", command);

    let status = command.status().map_err(|source| CliError::CompilerSpawn {
        cc: cc.to_string(),
        source,
    })?;
    if status.success() {
        Ok(())
    } else {
        Err(CliError::Compiler {
            cc: cc.to_string(),
            code: status.code(),
        })
    }
}
