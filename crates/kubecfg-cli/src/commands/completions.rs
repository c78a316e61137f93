use super::{Failure, EXIT_SUCCESS};
use clap::CommandFactory;
use clap_complete::Shell;
use std::io::Write;

const BIN_NAME: &str = "kubecfg";

#[allow(clippy::unnecessary_wraps)]
pub fn run<C: CommandFactory>(shell: Shell) -> Result<u8, Failure> {
    write_script::<C>(shell, &mut std::io::stdout());
    Ok(EXIT_SUCCESS)
}

fn write_script<C: CommandFactory>(shell: Shell, out: &mut dyn Write) {
    clap_complete::generate(shell, &mut C::command(), BIN_NAME, out);
}
