use super::{exit_code, json_pretty, Failure, EXIT_SUCCESS};
use kubecfg_core::{rename_context, ErrorKind, RenameError};
use kubecfg_store::ConfigAccess;

impl From<RenameError> for Failure {
    fn from(err: RenameError) -> Self {
        let kind = err.kind();
        let message = if kind == ErrorKind::Usage {
            format!("{err}\nSee 'kubecfg config rename-context -h' for help and examples")
        } else {
            err.to_string()
        };
        Self {
            code: exit_code(kind),
            message,
        }
    }
}

pub fn run(access: &dyn ConfigAccess, args: &[String], json: bool) -> Result<u8, Failure> {
    let outcome = rename_context(access, args)?;
    if json {
        println!("{}", json_pretty(&outcome)?);
    } else {
        println!(
            "Context {:?} renamed to {:?}.",
            outcome.context_name, outcome.new_name
        );
    }
    Ok(EXIT_SUCCESS)
}
