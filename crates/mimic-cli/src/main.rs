//! mimic CLI - record mouse & keyboard input and play it back.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimic::prelude::*;
use mimic::{storage, PlaybackError, SessionError};
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mimic")]
#[command(about = "Record and replay mouse & keyboard input")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record input until Ctrl+C, then save
    Record {
        /// Output file (default: recording_<timestamp>.json)
        #[arg(short, long)]
        output: Option<String>,

        /// Ignore mouse input, record keyboard only
        #[arg(long)]
        no_mouse: bool,
    },

    /// Play a recording. While playing, type `pause`, `resume`, or `stop`
    /// on stdin; Ctrl+C also stops.
    Play {
        /// Recording file
        file: String,

        /// Playback speed (1.0 = realtime, 2.0 = 2x)
        #[arg(short, long, default_value = "1.0")]
        speed: f64,

        /// Repeat from the start until stopped
        #[arg(long = "loop")]
        loop_forever: bool,

        /// Skip mouse events during playback
        #[arg(long)]
        no_mouse: bool,
    },

    /// Show recording info
    Show {
        /// Recording file
        file: String,

        /// Print every event
        #[arg(long)]
        all: bool,
    },

    /// Check or request input permissions (macOS)
    Permissions {
        #[arg(long)]
        request: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Record { output, no_mouse } => record(output, no_mouse),
        Commands::Play {
            file,
            speed,
            loop_forever,
            no_mouse,
        } => play(&file, speed, loop_forever, no_mouse),
        Commands::Show { file, all } => show(&file, all),
        Commands::Permissions { request } => permissions(request),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn record(output: Option<String>, no_mouse: bool) -> Result<()> {
    let path = output.unwrap_or_else(|| {
        format!(
            "recording_{}.json",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        )
    });

    let session = Session::new();
    session.set_capture_mouse(!no_mouse);

    let hook = mimic::platform::default_hook()?;
    session.start_capture(hook.as_ref())?;
    println!("Recording... (Ctrl+C to stop)");

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let mut last = 0;
    while running.load(Ordering::SeqCst) {
        let count = session.event_count();
        if count != last {
            last = count;
            print!("\r{count} events");
            io::stdout().flush()?;
        }
        thread::sleep(Duration::from_millis(50));
    }

    let count = session.stop_capture()?;
    println!("\n{count} events recorded");
    session.save(&path).context("saving recording")?;
    println!("Saved: {path}");
    Ok(())
}

fn play(file: &str, speed: f64, loop_forever: bool, no_mouse: bool) -> Result<()> {
    let session = Arc::new(Session::new());
    session.set_capture_mouse(!no_mouse);

    let count = session.load(file).with_context(|| format!("loading {file}"))?;
    println!(
        "Playing {file} ({count} events) at {speed}x{}...",
        if loop_forever { ", looping" } else { "" }
    );

    let sink = mimic::platform::default_sink()?;
    match session.play(sink, loop_forever, speed) {
        Ok(()) => {}
        Err(SessionError::Playback(PlaybackError::Empty)) => {
            println!("No events to play.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let s = Arc::clone(&session);
    ctrlc::set_handler(move || {
        s.stop_playback();
    })?;

    // Command loop on stdin for the duration of the run.
    let s = Arc::clone(&session);
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match line.trim() {
                "pause" | "p" => {
                    s.pause();
                    println!("Paused (resume to continue)");
                }
                "resume" | "r" => {
                    s.resume();
                    println!("Resumed");
                }
                "stop" | "q" => {
                    s.stop_playback();
                    break;
                }
                "" => {}
                other => println!("Unknown command: {other} (pause/resume/stop)"),
            }
        }
    });

    let stats = session.wait_playback().unwrap_or_default();
    println!(
        "Done: {} moves, {} clicks, {} scrolls, {} keys, {} errors",
        stats.moves, stats.clicks, stats.scrolls, stats.keys, stats.errors
    );
    Ok(())
}

fn show(file: &str, all: bool) -> Result<()> {
    let events = storage::load(file).with_context(|| format!("loading {file}"))?;
    println!("Events: {}", events.len());
    if let Some(last) = events.last() {
        println!("Duration: {:.2}s", last.time);
    }

    let (mut moves, mut clicks, mut scrolls, mut keys) = (0, 0, 0, 0);
    for e in &events {
        match &e.kind {
            EventKind::Mouse(MouseAction::Move { .. }) => moves += 1,
            EventKind::Mouse(MouseAction::Click { .. }) => clicks += 1,
            EventKind::Mouse(MouseAction::Scroll { .. }) => scrolls += 1,
            EventKind::Key(_) => keys += 1,
        }
    }
    println!("Summary: {moves} moves, {clicks} clicks, {scrolls} scrolls, {keys} keys");

    if all {
        for (i, e) in events.iter().enumerate() {
            println!("{i}: {e:?}");
        }
    }
    Ok(())
}

#[cfg(target_os = "macos")]
fn permissions(request: bool) -> Result<()> {
    use mimic::platform::macos;

    let perms = if request {
        macos::request_permissions()
    } else {
        macos::check_permissions()
    };
    println!(
        "Accessibility: {}",
        if perms.accessibility { "OK" } else { "DENIED" }
    );
    println!(
        "Input Monitoring: {}",
        if perms.input_monitoring { "OK" } else { "DENIED" }
    );
    if !perms.all_granted() && !request {
        println!("\nRun with --request to request permissions");
    }
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn permissions(_request: bool) -> Result<()> {
    println!("Permission management is only needed on macOS.");
    Ok(())
}
