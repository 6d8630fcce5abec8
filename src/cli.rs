use std::io;

use crate::config::AppConfig;
use crate::data::validate::{validate_operator_dataset, ValidationSeverity};
use crate::data::{DataStore, Operator, SpecsTable};
use crate::dps::{
    curve_labels, project_curve, write_curve_csv, AxisConfig, AxisKind, CurvePoint, CurveSubject,
};
use crate::server::{self, AppState};
use crate::stats::{compute_attributes, AttributeReport, OperatorConfig};
use crate::unpacker::{TokioProcessRunner, UnpackOptions, Unpacker};

const USAGE: &str = "usage: myrtle <serve|attributes|curve|validate|unpack>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Attributes,
    Curve,
    Validate,
    Unpack,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("attributes") => Some(Command::Attributes),
        Some("curve") => Some(Command::Curve),
        Some("validate") => Some(Command::Validate),
        Some("unpack") => Some(Command::Unpack),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let config = AppConfig::from_env();
    match parse_command(args) {
        Some(Command::Serve) => handle_serve(&config),
        Some(Command::Attributes) => handle_attributes(&config, args),
        Some(Command::Curve) => handle_curve(&config, args),
        Some(Command::Validate) => handle_validate(&config, args),
        Some(Command::Unpack) => handle_unpack(&config, args),
        None => {
            eprintln!("{USAGE}");
            2
        }
    }
}

/// Value following `flag`, e.g. `--favor 100`.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

/// Positional arguments after the subcommand, skipping flags and their values.
fn positionals<'a>(args: &'a [String], value_flags: &[&str]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args.iter().skip(2) {
        if skip_next {
            skip_next = false;
        } else if value_flags.contains(&arg.as_str()) {
            skip_next = true;
        } else if !arg.starts_with("--") {
            out.push(arg.as_str());
        }
    }
    out
}

fn load_state(config: &AppConfig) -> Option<AppState> {
    match AppState::load(config) {
        Ok(state) => Some(state),
        Err(err) => {
            eprintln!("failed to load data: {err}");
            None
        }
    }
}

fn handle_serve(config: &AppConfig) -> i32 {
    let Some(state) = load_state(config) else {
        return 1;
    };
    match server::run_server(&config.bind, &state) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

const ATTRIBUTE_FLAGS: [&str; 4] = ["--favor", "--potential", "--equip", "--equip-level"];

fn operator_config(args: &[String], level: u32) -> OperatorConfig {
    OperatorConfig {
        level,
        favor: parse_u32_arg(flag_value(args, "--favor"), "favor", 0),
        potential_rank: parse_u32_arg(flag_value(args, "--potential"), "potential", 0),
        equip_id: flag_value(args, "--equip").cloned(),
        equip_level: parse_u32_arg(flag_value(args, "--equip-level"), "equip-level", 1),
        skill_id: None,
    }
}

/// Highest phase and its max level when not given.
fn default_build(operator: &Operator) -> (usize, u32) {
    let phase_index = operator.phases.len().saturating_sub(1);
    let level = operator
        .phase(phase_index)
        .map_or(1, |phase| phase.max_level);
    (phase_index, level)
}

fn print_report_table(operator: &Operator, report: &AttributeReport) {
    println!("{} ({})", operator.name, operator.id());
    println!("attribute\tvalue");
    for (key, value) in report.attributes.iter() {
        println!("{key}\t{value}");
    }
    if !report.trace.is_empty() {
        println!();
        for change in &report.trace {
            println!("{change}");
        }
    }
    if !report.buff_list.is_empty() {
        println!();
        let keys: Vec<&str> = report.buff_list.keys().collect();
        println!("buffs: {}", keys.join(", "));
    }
}

fn handle_attributes(config: &AppConfig, args: &[String]) -> i32 {
    let positional = positionals(args, &ATTRIBUTE_FLAGS);
    let Some(name) = positional.first() else {
        eprintln!("usage: myrtle attributes <operator> [phase] [level] [--favor N] [--potential N] [--equip ID] [--equip-level N] [--table]");
        return 2;
    };
    let Some(state) = load_state(config) else {
        return 1;
    };
    let Some(operator) = state.store.resolve(name) else {
        eprintln!("operator '{name}' not found");
        return 1;
    };

    let (default_phase, default_level) = default_build(operator);
    let phase_index =
        parse_u32_arg(positional.get(1).copied(), "phase", default_phase as u32) as usize;
    let level = parse_u32_arg(positional.get(2).copied(), "level", default_level);
    let operator_config = operator_config(args, level);

    let report = match compute_attributes(operator, &operator_config, phase_index, &state.specs) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("attribute computation failed: {err}");
            return 1;
        }
    };

    if has_flag(args, "--table") {
        print_report_table(operator, &report);
        return 0;
    }
    match serde_json::to_string_pretty(&report) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize attribute report: {err}");
            1
        }
    }
}

const CURVE_FLAGS: [&str; 4] = ["--axis", "--max", "--step", "--targets"];

fn curve_axis(args: &[String]) -> Option<AxisConfig> {
    let kind = match flag_value(args, "--axis") {
        Some(raw) => AxisKind::parse(raw)?,
        None => AxisKind::Defense,
    };
    let defaults = AxisConfig::for_kind(kind);
    Some(AxisConfig {
        kind,
        max_value: parse_f64_arg(flag_value(args, "--max"), "max", defaults.max_value),
        step_size: parse_f64_arg(flag_value(args, "--step"), "step", defaults.step_size),
        targets: parse_u32_arg(flag_value(args, "--targets"), "targets", defaults.targets),
    })
}

/// Operators at their highest phase and level, labelled by name.
fn curve_subjects(
    store: &DataStore,
    specs: &SpecsTable,
    names: &[&str],
) -> Result<Vec<CurveSubject>, String> {
    names
        .iter()
        .map(|name| {
            let operator = store
                .resolve(name)
                .ok_or_else(|| format!("operator '{name}' not found"))?;
            let (phase_index, level) = default_build(operator);
            let config = OperatorConfig {
                level,
                favor: 100,
                ..OperatorConfig::default()
            };
            let report = compute_attributes(operator, &config, phase_index, specs)
                .map_err(|err| format!("{}: {err}", operator.id()))?;
            Ok(CurveSubject::from_report(operator.name.clone(), operator, &report))
        })
        .collect()
}

fn print_curve(points: &[CurvePoint], as_csv: bool) -> i32 {
    if as_csv {
        let labels = curve_labels(points);
        return match write_curve_csv(points, &labels, io::stdout().lock()) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("failed to write csv: {err}");
                1
            }
        };
    }
    match serde_json::to_string_pretty(points) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize curve: {err}");
            1
        }
    }
}

fn handle_curve(config: &AppConfig, args: &[String]) -> i32 {
    let names = positionals(args, &CURVE_FLAGS);
    if names.is_empty() {
        eprintln!("usage: myrtle curve <operator>... [--axis defense|resistance] [--max N] [--step N] [--targets N] [--csv]");
        return 2;
    }
    let Some(axis) = curve_axis(args) else {
        eprintln!("unknown axis; expected defense or resistance");
        return 2;
    };
    let Some(state) = load_state(config) else {
        return 1;
    };

    let subjects = match curve_subjects(&state.store, &state.specs, &names) {
        Ok(subjects) => subjects,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    match project_curve(&subjects, &axis) {
        Ok(points) => print_curve(&points, has_flag(args, "--csv")),
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

fn handle_validate(config: &AppConfig, args: &[String]) -> i32 {
    let path = args
        .get(2)
        .map(Into::into)
        .unwrap_or_else(|| config.operators_path());

    match validate_operator_dataset(&path) {
        Ok(report) => {
            for diag in &report.diagnostics {
                eprintln!("[{}] {}: {}", diag.severity, diag.context, diag.message);
            }
            let errors = report.count(ValidationSeverity::Error);
            if errors > 0 {
                eprintln!("validation failed: {errors} error(s) in {}", path.display());
                1
            } else {
                println!(
                    "validation passed: {} ({} warning(s))",
                    path.display(),
                    report.count(ValidationSeverity::Warning)
                );
                0
            }
        }
        Err(err) => {
            eprintln!("validation failed: {err}");
            1
        }
    }
}

fn unpack_options(args: &[String]) -> Option<UnpackOptions> {
    let mut options = UnpackOptions::default();
    let mut input = None;
    let mut rest = args.iter().skip(2);
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "-i" | "--input" => input = rest.next().cloned(),
            "-o" | "--output" => options.output_dir = rest.next().map(Into::into),
            "-d" | "--dirs" => {
                options.directories = rest
                    .clone()
                    .take_while(|value| !value.starts_with('-'))
                    .cloned()
                    .collect();
                for _ in 0..options.directories.len() {
                    rest.next();
                }
            }
            "--all" => options.all = true,
            "-f" | "--force" => options.force = true,
            "--debug" => options.debug = true,
            "--list-dirs" => options.list_dirs = true,
            positional if !positional.starts_with('-') && input.is_none() => {
                input = Some(positional.to_string());
            }
            other => {
                eprintln!("unknown unpack flag '{other}'");
                return None;
            }
        }
    }
    options.input_dir = input?.into();
    Some(options.with_default_directories())
}

fn handle_unpack(config: &AppConfig, args: &[String]) -> i32 {
    let Some(options) = unpack_options(args) else {
        eprintln!("usage: myrtle unpack <input-dir> [-o out] [-d dir...|--all] [-f] [--debug] [--list-dirs]");
        return 2;
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return 1;
        }
    };
    let unpacker = Unpacker::new(
        TokioProcessRunner,
        config.unpacker_python.clone(),
        config.unpacker_script.clone(),
    );
    let report = runtime.block_on(unpacker.run(&options));

    match serde_json::to_string_pretty(&report) {
        Ok(payload) => println!("{payload}"),
        Err(err) => eprintln!("failed to serialize unpack report: {err}"),
    }
    if report.success {
        0
    } else {
        1
    }
}

fn parse_u32_arg<S: AsRef<str>>(raw: Option<S>, name: &str, default: u32) -> u32 {
    let Some(raw) = raw else {
        return default;
    };
    raw.as_ref().parse::<u32>().unwrap_or_else(|_| {
        tracing::warn!("invalid {name} '{}', defaulting to {default}", raw.as_ref());
        default
    })
}

fn parse_f64_arg<S: AsRef<str>>(raw: Option<S>, name: &str, default: f64) -> f64 {
    let Some(raw) = raw else {
        return default;
    };
    raw.as_ref().parse::<f64>().unwrap_or_else(|_| {
        tracing::warn!("invalid {name} '{}', defaulting to {default}", raw.as_ref());
        default
    })
}
