use anyhow::{anyhow, bail, Context, Result};
use duckling::compiler::debug::format_program;
use duckling::{CompileOptions, Compiler, ObjectFile, RunOptions, VirtualMachine};
use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run(env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: Vec<String>) -> Result<()> {
    let Some(command) = args.first() else {
        bail!(usage());
    };
    match command.as_str() {
        "compile" => cmd_compile(&args[1..]),
        "run" => cmd_run(&args[1..]),
        "exec" => cmd_exec(&args[1..]),
        "disasm" => cmd_disasm(&args[1..]),
        "help" | "--help" | "-h" => {
            println!("{}", usage());
            Ok(())
        }
        "--version" | "-V" => {
            println!("duckc {}", duckling::VERSION);
            Ok(())
        }
        other => bail!("unknown command '{}'\n\n{}", other, usage()),
    }
}

/// Positional input plus the flags a subcommand accepts
struct Invocation {
    input: PathBuf,
    output: Option<PathBuf>,
    strict: bool,
    json: bool,
    step_limit: Option<usize>,
}

fn parse_args(args: &[String], allowed: &[&str], usage_line: &str) -> Result<Invocation> {
    let mut input = None;
    let mut inv = Invocation {
        input: PathBuf::new(),
        output: None,
        strict: false,
        json: false,
        step_limit: None,
    };

    let mut i = 0usize;
    while i < args.len() {
        let arg = args[i].as_str();
        if arg.starts_with('-') && !allowed.contains(&arg) {
            bail!("unknown flag '{}'\nusage: {}", arg, usage_line);
        }
        match arg {
            "-o" | "--out" => {
                i += 1;
                let path = args.get(i).ok_or_else(|| anyhow!("missing path after {}", arg))?;
                inv.output = Some(PathBuf::from(path));
            }
            "--step-limit" => {
                i += 1;
                let limit = args
                    .get(i)
                    .ok_or_else(|| anyhow!("missing count after --step-limit"))?;
                inv.step_limit = Some(
                    limit
                        .parse::<usize>()
                        .with_context(|| format!("invalid step limit '{}'", limit))?,
                );
            }
            "--strict" => inv.strict = true,
            "--json" => inv.json = true,
            path if input.is_none() => input = Some(PathBuf::from(path)),
            extra => bail!("unexpected argument '{}'\nusage: {}", extra, usage_line),
        }
        i += 1;
    }

    inv.input = input.ok_or_else(|| anyhow!("usage: {}", usage_line))?;
    Ok(inv)
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path.display()))
}

fn compile_file(path: &Path, strict: bool) -> Result<ObjectFile> {
    let source = read(path)?;
    let compiler = Compiler::new(CompileOptions {
        strict_lexing: strict,
    });
    let result = compiler
        .compile(&source)
        .with_context(|| format!("failed to compile '{}'", path.display()))?;
    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(result.object)
}

fn load_object(path: &Path) -> Result<ObjectFile> {
    read(path)?
        .parse::<ObjectFile>()
        .with_context(|| format!("failed to load '{}'", path.display()))
}

fn execute(object: &ObjectFile, step_limit: Option<usize>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut vm = VirtualMachine::with_options(object, RunOptions { step_limit })?;
    vm.run(&mut out)?;
    out.flush()?;
    Ok(())
}

fn cmd_compile(args: &[String]) -> Result<()> {
    let usage_line = "duckc compile <input.duck> [-o <out.dk>] [--strict]";
    let inv = parse_args(args, &["-o", "--out", "--strict"], usage_line)?;
    let object = compile_file(&inv.input, inv.strict)?;
    let out = inv
        .output
        .unwrap_or_else(|| inv.input.with_extension("dk"));
    std::fs::write(&out, object.to_text())
        .with_context(|| format!("failed to write '{}'", out.display()))?;
    println!(
        "compiled '{}' -> '{}' ({} quadruples)",
        inv.input.display(),
        out.display(),
        object.quadruples.len()
    );
    Ok(())
}

fn cmd_run(args: &[String]) -> Result<()> {
    let inv = parse_args(
        args,
        &["--step-limit"],
        "duckc run <program.dk> [--step-limit N]",
    )?;
    let object = load_object(&inv.input)?;
    execute(&object, inv.step_limit)
}

fn cmd_exec(args: &[String]) -> Result<()> {
    let inv = parse_args(
        args,
        &["--step-limit", "--strict"],
        "duckc exec <input.duck> [--step-limit N] [--strict]",
    )?;
    let object = compile_file(&inv.input, inv.strict)?;
    execute(&object, inv.step_limit)
}

fn cmd_disasm(args: &[String]) -> Result<()> {
    let inv = parse_args(args, &["--json"], "duckc disasm <program.dk> [--json]")?;
    let object = load_object(&inv.input)?;
    if inv.json {
        println!("{}", object.to_json()?);
    } else {
        println!("{}", format_program(&object));
    }
    Ok(())
}

fn usage() -> String {
    [
        "Duckling toolchain",
        "  duckc compile <input.duck> [-o <out.dk>] [--strict]",
        "  duckc run <program.dk> [--step-limit N]",
        "  duckc exec <input.duck> [--step-limit N] [--strict]",
        "  duckc disasm <program.dk> [--json]",
    ]
    .join("\n")
}
