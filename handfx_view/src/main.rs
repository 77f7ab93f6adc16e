//! handfx_view — interactive entry point.

use std::io::{self, Write};

use handfx::{EffectConfig, Mode};
use handfx_view::app::{run, AppConfig};
use handfx_view::error::ViewError;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        handfx — Fire, Ice, Lightning & the Fusion Orb        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Input: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Input: Mouse + keyboard simulation  (use --features leap for hardware)");
    println!();

    let cfg = match configure() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!();
    println!("  Opening window…");
    println!();

    if let Err(e) = run(cfg) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn configure() -> Result<AppConfig, ViewError> {
    let args: Vec<String> = std::env::args().collect();

    if let Some(path) = args.iter().position(|a| a == "--config").and_then(|i| args.get(i + 1)) {
        println!("  Config: {}\n", path);
        let effect = EffectConfig::load(path)?;
        return Ok(AppConfig { effect, seed: None });
    }

    if args.iter().any(|a| a == "--quick") {
        println!("  Quick-start: fire & ice, default tuning\n");
        return Ok(AppConfig::default());
    }

    configure_interactively()
}

fn configure_interactively() -> Result<AppConfig, ViewError> {
    let mut effect = EffectConfig::default();

    println!("  Starting mode: 1.Fire & Ice  2.Lightning  3.Red & Blue");
    effect.mode = match read_line("  Choice (1–3, default 1): ").trim() {
        "2" => Mode::Lightning,
        "3" => Mode::RedBlue,
        _   => Mode::FireIce,
    };

    effect.mirror_x = matches!(
        read_line("  Mirror horizontally (selfie view)? [y/N]: ").trim(),
        "y" | "Y"
    );

    effect.tracker.hand_grace_frames = read_line("  Frames to keep a lost hand (default 3): ")
        .trim().parse().unwrap_or(3).min(60);

    effect.particles.max_live = read_line("  Max live particles (default 3000): ")
        .trim().parse().unwrap_or(3000).clamp(100, 20_000);

    let seed = read_line("  RNG seed (blank = random): ").trim().parse::<u64>().ok();

    effect.validate()?;
    Ok(AppConfig { effect, seed })
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
