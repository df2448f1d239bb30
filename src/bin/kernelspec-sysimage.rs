use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use kernelspec_sysimage::{
    inspect_kernel, locate_descriptor, logging, patch_kernel, sysimage_argument,
    KernelDescriptor, PatchOutcome, PatchSettings,
};

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Patch(Option<PathBuf>),
    Locate(Option<PathBuf>),
    Status(Option<PathBuf>),
}

fn usage() -> &'static str {
    "Usage:\n  kernelspec-sysimage [patch [<config.toml>]]\n  kernelspec-sysimage locate [<config.toml>]\n  kernelspec-sysimage status [<config.toml>]"
}

fn main() -> Result<()> {
    logging::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cwd = std::env::current_dir().context("resolving current directory")?;
    run(parse_command(&args)?, &cwd)
}

fn parse_command(args: &[String]) -> Result<Command> {
    let config = |path: &String| Some(PathBuf::from(path));

    match args {
        [] => Ok(Command::Patch(None)),
        [cmd] if cmd == "patch" => Ok(Command::Patch(None)),
        [cmd, path] if cmd == "patch" => Ok(Command::Patch(config(path))),
        [cmd] if cmd == "locate" => Ok(Command::Locate(None)),
        [cmd, path] if cmd == "locate" => Ok(Command::Locate(config(path))),
        [cmd] if cmd == "status" => Ok(Command::Status(None)),
        [cmd, path] if cmd == "status" => Ok(Command::Status(config(path))),
        _ => bail!(usage()),
    }
}

fn run(command: Command, cwd: &Path) -> Result<()> {
    match command {
        Command::Patch(config) => patch(config.as_deref(), cwd),
        Command::Locate(config) => locate(config.as_deref()),
        Command::Status(config) => status(config.as_deref(), cwd),
    }
}

fn load_settings(config: Option<&Path>) -> Result<PatchSettings> {
    match config {
        Some(path) => PatchSettings::load(path)
            .with_context(|| format!("loading patch settings '{}'", path.display())),
        None => Ok(PatchSettings::default()),
    }
}

fn patch(config: Option<&Path>, cwd: &Path) -> Result<()> {
    let settings = load_settings(config)?;

    match patch_kernel(&settings, cwd).with_context(|| {
        format!(
            "patching kernel descriptor matching '{}'",
            settings.layout.pattern()
        )
    })? {
        PatchOutcome::Patched {
            descriptor,
            argument,
        } => println!("[kernel] {} <- {}", descriptor.display(), argument),
        PatchOutcome::AlreadyPatched { descriptor } => {
            println!("[kernel] {} already patched", descriptor.display())
        }
    }
    Ok(())
}

fn locate(config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config)?;
    let descriptor = locate_descriptor(&settings.layout).context("locating kernel descriptor")?;
    println!("{}", descriptor.display());
    Ok(())
}

fn status(config: Option<&Path>, cwd: &Path) -> Result<()> {
    let settings = load_settings(config)?;
    let expected = sysimage_argument(cwd, &settings)?;
    let descriptor = inspect_kernel(&settings).context("inspecting kernel descriptor")?;
    print!("{}", status_report(&descriptor, &expected, &settings.flag_marker)?);
    Ok(())
}

fn status_report(descriptor: &KernelDescriptor, expected: &str, marker: &str) -> Result<String> {
    let argv = descriptor.argv()?;
    let state = if argv.iter().skip(1).any(|arg| *arg == expected) {
        "present"
    } else if descriptor.contains_flag(marker)? {
        "present (different sysimage path)"
    } else {
        "absent"
    };
    Ok(format!(
        "descriptor: {}\nargv: {}\nsysimage flag: {state}\n",
        descriptor.path().display(),
        argv.join(" ")
    ))
}
