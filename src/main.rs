//! Headless stack scene demo
//!
//! Builds the three grade stacks from a mastery dataset, walks through a
//! selection, then tests the stacks and reports what fell and what was pulled.
//!
//! Usage:
//!     stack_demo [OPTIONS] <DATA_JSON>
//!
//! Options:
//!     -c, --config <CONFIG_JSON>  Scene configuration (default: built-in)
//!     -s, --select <INDEX>        Stack to select before testing (default: 0)
//!     -v, --verbose               Log every block assignment
//!     -h, --help                  Show this help message

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use stackedu::core::logging;
use stackedu::scene::{JsonFile, SceneConfig, StackEvent, StackSceneManager};
use stackedu::stack::Grade;

const TICK: Duration = Duration::from_millis(100);

fn print_help() {
    eprintln!("stack_demo - Headless mastery stack scene");
    eprintln!();
    eprintln!("Usage: stack_demo [OPTIONS] <DATA_JSON>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    -c, --config <CONFIG_JSON>  Scene configuration (default: built-in)");
    eprintln!("    -s, --select <INDEX>        Stack to select before testing (default: 0)");
    eprintln!("    -v, --verbose               Log every block assignment");
    eprintln!("    -h, --help                  Show this help message");
}

#[derive(Debug)]
struct Args {
    data: PathBuf,
    config: Option<PathBuf>,
    select: usize,
    verbose: bool,
}

fn parse_args() -> Result<Option<Args>, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut data = None;
    let mut config = None;
    let mut select = 0;
    let mut verbose = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => return Ok(None),
            "-v" | "--verbose" => verbose = true,
            "-c" | "--config" => {
                i += 1;
                let path = args.get(i).ok_or("Missing value for --config")?;
                config = Some(PathBuf::from(path));
            }
            "-s" | "--select" => {
                i += 1;
                let value = args.get(i).ok_or("Missing value for --select")?;
                select = value
                    .parse()
                    .map_err(|_| format!("Invalid stack index: {}", value))?;
            }
            other if other.starts_with('-') => {
                return Err(format!("Unknown option: {}", other));
            }
            other => data = Some(PathBuf::from(other)),
        }
        i += 1;
    }

    let data = data.ok_or("Missing data file")?;
    Ok(Some(Args { data, config, select, verbose }))
}

/// Tick until the debounce window has passed
fn settle(manager: &mut StackSceneManager) {
    while manager.debounce_pending() {
        manager.update(TICK);
    }
}

fn run(args: Args) -> stackedu::core::Result<()> {
    let config = match &args.config {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };

    let mut manager = StackSceneManager::new(config);
    manager.subscribe(|event| match event {
        StackEvent::StackSelected(target) => {
            log::info!("[camera] looking at {} stack at {}", target.grade, target.position);
        }
        StackEvent::StackDeselected | StackEvent::TestCompleted(_) => {
            log::info!("[camera] back to overview");
        }
        StackEvent::PickingChanged { enabled } => {
            log::info!("[input] stack picking {}", if *enabled { "on" } else { "off" });
        }
        _ => {}
    });

    let report = manager.initialize(&JsonFile(args.data))?;
    for grade in Grade::ALL {
        let blocks = manager.active_blocks(grade);
        let learned = blocks.iter().filter(|b| b.label_visible).count();
        println!(
            "{}: {} blocks, {} rows, {} learned or mastered",
            grade,
            blocks.len(),
            manager.config().layout.row_count(blocks.len()),
            learned
        );
        if let Some(top) = blocks.last() {
            let world = manager.config().parent(grade).world_transform(&top.transform);
            log::debug!("{} stack top block {} at {}", grade, top.standard_id, world.w_axis.truncate());
        }
    }
    if report.dropped > 0 {
        println!("{} records dropped for an unknown grade", report.dropped);
    }

    settle(&mut manager);
    if manager.pick_stack(args.select)? {
        settle(&mut manager);
        manager.deselect()?;
    }

    let test = manager.test_my_stack()?;
    println!(
        "Test: {} blocks falling, {} not-started blocks pulled",
        test.dynamic, test.released
    );
    Ok(())
}

fn main() {
    let args = match parse_args() {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_help();
            return;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    if args.verbose {
        logging::init_with_default("debug");
    } else {
        logging::init();
    }

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
