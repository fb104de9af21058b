use anyhow::{Result, anyhow};
use pico_args::Arguments;
use std::{env, path::PathBuf};

use dragbutton::animation::{Easing, ReturnAnimator};
use dragbutton::config::{GestureConfig, Profile, ProfileStore};
use dragbutton::replay::{self, Trace};
use dragbutton::tracker::{Vec2, resisted_offset};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    let subcmd: Option<String> = pargs.subcommand().ok().flatten();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            match topic {
                Some(t) => print_subcmd_help(&t),
                None => print_help(),
            }
            Ok(())
        }

        Some("list") => {
            let store = ProfileStore::user()?;
            let active = store.active_name().unwrap_or_default();
            for name in store.list_profiles() {
                let mark = if name == active { "*" } else { " " };
                println!("{mark} {name}");
            }
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: dragbutton use <profile_name>"))?;
            let store = ProfileStore::user()?;
            store.set_active(&name)?;
            println!("active profile: {name}");
            Ok(())
        }

        Some("check") => {
            let profile = select_profile(&mut pargs)?;
            let cfg = GestureConfig::from(profile);
            println!("{}", serde_json::to_string_pretty(&cfg)?);
            Ok(())
        }

        Some("replay") => {
            let profile = select_profile(&mut pargs)?;
            let path: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: dragbutton replay <trace.toml>"))?;
            let trace = Trace::load_path(&path)?;
            for record in replay::run(&trace, GestureConfig::from(profile)) {
                println!("{}", serde_json::to_string(&record)?);
            }
            Ok(())
        }

        Some("curve") => {
            let profile = select_profile(&mut pargs)?;
            let steps = pargs
                .opt_value_from_str::<_, u32>("--steps")?
                .unwrap_or(20)
                .max(1);
            print_curve(&GestureConfig::from(profile), steps)
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn select_profile(pargs: &mut Arguments) -> Result<Profile> {
    let path: Option<PathBuf> = pargs.opt_value_from_str("--config")?;
    let name: Option<String> = pargs.opt_value_from_str("--profile")?;
    match (path, name) {
        (Some(_), Some(_)) => Err(anyhow!("--config and --profile are mutually exclusive")),
        (Some(p), None) => Profile::load_path(&p),
        (None, Some(n)) => ProfileStore::user()?.load(&n),
        (None, None) => ProfileStore::user()?.load_active(),
    }
}

fn print_curve(cfg: &GestureConfig, steps: u32) -> Result<()> {
    let th = &cfg.thresholds;
    let reach = th.max_drag * 4.0;
    for i in 0..=steps {
        let d = reach * f64::from(i) / f64::from(steps);
        let off = resisted_offset(Vec2::new(d, 0.0), th.max_drag, th.stop_speed_factor);
        println!("{}", serde_json::json!({"curve": "resistance", "distance": d, "offset": off.x}));
    }

    let mut animator = ReturnAnimator::new(th.return_ms, Easing::from_damping(th.spring_damping));
    let start = Vec2::new(th.max_drag * 2.0, 0.0);
    animator.start(start, 0);
    let dt = (th.return_ms / u64::from(steps)).max(1);
    let mut t = 0;
    while let Some(frame) = animator.sample(t) {
        let off = resisted_offset(frame.displacement, th.max_drag, th.stop_speed_factor);
        println!("{}", serde_json::json!({"curve": "return", "t": t, "offset": off.x}));
        if frame.done {
            break;
        }
        t += dt;
    }
    Ok(())
}

fn print_help() {
    println!(
        r#"dragbutton — gesture engine harness for a draggable multi-gesture button

USAGE:
  dragbutton help [command]            Show general or command-specific help
  dragbutton list                      List profiles (active marked with '*')
  dragbutton use <name>                Switch active profile
  dragbutton check   [PROFILE]         Validate and print the resolved configuration
  dragbutton replay  [PROFILE] <trace> Replay a pointer trace, print events as JSON lines
  dragbutton curve   [PROFILE] [--steps N]
                                       Print the resistance curve and return path

PROFILE:
  --profile <name>                     Use a named profile from the profile dir
  --config <path>                      Use a profile file directly
                                       (default: the active profile)

TIPS:
  - Profiles: ~/.config/dragbutton/profiles
  - Active profile pointer: ~/.config/dragbutton/active
  - RUST_LOG=debug shows engine transitions
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "list" => {
            println!("usage: dragbutton list\nLists available profiles; marks active with '*'.")
        }
        "use" => println!(
            "usage: dragbutton use <name>\nSwitches the active profile after checking it loads."
        ),
        "check" => println!(
            "usage: dragbutton check [--profile <name> | --config <path>]\nPrints thresholds, bindings and the derived click maximum."
        ),
        "replay" => println!(
            "usage: dragbutton replay [--profile <name> | --config <path>] <trace.toml>\nRuns the trace under a virtual clock; one JSON record per line."
        ),
        "curve" => println!(
            "usage: dragbutton curve [--profile <name> | --config <path>] [--steps N]\nSamples the drag resistance and the return animation."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}
