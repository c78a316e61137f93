use super::{Failure, EXIT_SUCCESS};
use clap::CommandFactory;
use std::path::Path;

fn render(cmd: clap::Command, dir: &Path, file_stem: &str) -> Result<(), String> {
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)
        .map_err(|e| format!("man page render failed: {e}"))?;
    let path = dir.join(format!("{file_stem}.1"));
    std::fs::write(&path, &buf).map_err(|e| format!("failed to write {}: {e}", path.display()))
}

/// Write `kubecfg.1` plus one page per subcommand, nested ones included
/// (`kubecfg-config-rename-context.1`).
pub fn run<C: CommandFactory>(dir: &Path) -> Result<u8, Failure> {
    std::fs::create_dir_all(dir).map_err(|e| format!("failed to create dir: {e}"))?;
    let cmd = C::command();
    render(cmd.clone(), dir, "kubecfg")?;

    let mut pending: Vec<(String, clap::Command)> = cmd
        .get_subcommands()
        .map(|sub| (format!("kubecfg-{}", sub.get_name()), sub.clone()))
        .collect();
    while let Some((stem, sub)) = pending.pop() {
        for nested in sub.get_subcommands() {
            pending.push((format!("{stem}-{}", nested.get_name()), nested.clone()));
        }
        render(sub, dir, &stem)?;
    }

    println!("man pages written to {}", dir.display());
    Ok(EXIT_SUCCESS)
}
