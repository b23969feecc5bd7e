use hydrate_fixtures::format_patch;
use hydrate_fixtures::scenario::{check_outcome, load_scenario, run_scenario};
use mimalloc::MiMalloc;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const USAGE: &str = "usage: rehydrate [--patches] <scenario.toml|scenario.json>...";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut show_patches = false;
    let mut paths = Vec::new();
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--patches" => show_patches = true,
            "-h" | "--help" => {
                println!("{USAGE}");
                return ExitCode::SUCCESS;
            }
            _ => paths.push(PathBuf::from(arg)),
        }
    }
    if paths.is_empty() {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    }

    let mut failed = 0usize;
    for path in &paths {
        let scenario = match load_scenario(path) {
            Ok(scenario) => scenario,
            Err(err) => {
                log::error!("{err}");
                failed += 1;
                continue;
            }
        };
        let outcome = match run_scenario(&scenario) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::error!("{}: {err}", scenario.name);
                failed += 1;
                continue;
            }
        };

        println!("== {} ({})", scenario.name, path.display());
        for line in &outcome.outline {
            println!("  {line}");
        }
        println!(
            "  moved={} kept={} detached={}",
            outcome.stats.moved, outcome.stats.kept, outcome.detached
        );
        if show_patches {
            for patch in &outcome.patches {
                println!("  | {}", format_patch(patch));
            }
        }
        if let Err(report) = check_outcome(&scenario, &outcome) {
            eprintln!("{report}");
            failed += 1;
        }
    }

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        log::warn!("{failed} of {} scenarios failed", paths.len());
        ExitCode::FAILURE
    }
}
