//! Interactive menu for exploring the gesture rules and the hold/debounce
//! dispatcher without a camera.

use gesture_core::{
    pose, ActionOutcome, Classifier, Dispatcher, Gesture, HandSnapshot, Landmark,
    LoggingPlayback, NoVolume, Point, HOLD_DURATION,
};
use std::io::{self, Write};
use std::time::{Duration, Instant};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║            Hand Gesture Rule Explorer                ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let classifier = Classifier::default();

    loop {
        print_menu();
        let choice = read_line("Select (1–3, or q to quit): ");

        match choice.trim() {
            "q" | "Q" => {
                println!("\nGoodbye!\n");
                break;
            }
            "1" => {
                let g = pick_gesture();
                report(&classifier, &pose(g));
            }
            "2" => match read_snapshot() {
                Some(hand) => report(&classifier, &hand),
                None       => println!("  ⚠  Could not parse coordinates.\n"),
            },
            "3" => simulate(&classifier),
            _   => println!("  ⚠  Please enter 1–3 or q.\n"),
        }
    }
}

fn print_menu() {
    println!("  1. Classify a canned pose");
    println!("  2. Classify hand-entered landmarks");
    println!("  3. Simulate a gesture sequence through the dispatcher");
    println!();
}

fn pick_gesture() -> Gesture {
    for (i, g) in Gesture::PRIORITY.iter().enumerate() {
        println!("    {}. {}", i + 1, g);
    }
    let n: usize = read_line("    Choice (1–7, default 1): ").trim().parse().unwrap_or(1);
    Gesture::PRIORITY[n.clamp(1, 7) - 1]
}

/// Prompts for the six landmarks the rules look at; every other joint is
/// parked on the wrist.
fn read_snapshot() -> Option<HandSnapshot> {
    let wrist = read_point("  Wrist       x,y: ")?;
    let mut hand = HandSnapshot::uniform(wrist);
    for (lm, label) in [
        (Landmark::ThumbTip,  "  Thumb tip   x,y: "),
        (Landmark::ThumbIp,   "  Thumb IP    x,y: "),
        (Landmark::IndexTip,  "  Index tip   x,y: "),
        (Landmark::MiddleTip, "  Middle tip  x,y: "),
        (Landmark::RingTip,   "  Ring tip    x,y: "),
    ] {
        hand = hand.with(lm, read_point(label)?);
    }
    Some(hand)
}

fn read_point(prompt: &str) -> Option<Point> {
    let line = read_line(prompt);
    let mut parts = line.trim().split(',').map(|s| s.trim().parse::<f32>());
    match (parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y))) => Some(Point::new(x, y)),
        _ => None,
    }
}

fn report(classifier: &Classifier, hand: &HandSnapshot) {
    println!();
    println!("  ┌─ rule evaluation (priority order)");
    for g in Gesture::PRIORITY {
        let mark = if classifier.holds(g, hand) { "✓" } else { "·" };
        println!("  │  {}  {}", mark, g);
    }
    match classifier.classify(hand) {
        Some(g) => println!("  └─ result: {}\n", g),
        None    => println!("  └─ result: no gesture\n"),
    }
}

/// Feed a space-separated list of gestures (`-` for no hand) through the
/// dispatcher on a virtual clock and print what fires.
fn simulate(classifier: &Classifier) {
    println!("  Gestures: fist open thumb up down right left, '-' = no hand");
    let line = read_line("  Sequence: ");
    let step_ms: u64 = read_line("  Frame interval ms (default 500): ")
        .trim().parse().unwrap_or(500).clamp(1, 10_000);

    let mut dispatcher = Dispatcher::new(LoggingPlayback::default(), NoVolume::default());
    let t0 = Instant::now();

    println!();
    println!("  hold = {}s", HOLD_DURATION.as_secs());
    for (i, word) in line.split_whitespace().enumerate() {
        let seen = parse_gesture(word).and_then(|g| classifier.classify(&pose(g)));
        let now = t0 + Duration::from_millis(step_ms * i as u64);
        let r = dispatcher.process(seen, now);
        let fired = match r.fired {
            Some((_, ActionOutcome::Performed(msg))) => format!("fired: {}", msg),
            Some((_, ActionOutcome::Skipped(msg)))   => format!("no-op: {}", msg),
            Some((_, ActionOutcome::Failed(err)))    => format!("failed: {}", err),
            None if r.expired                        => "hold expired".to_string(),
            None                                     => String::new(),
        };
        println!("  t={:>6}ms  {:<16} {}", step_ms * i as u64, r.overlay, fired);
    }
    println!();
}

fn parse_gesture(word: &str) -> Option<Gesture> {
    match word.to_ascii_lowercase().as_str() {
        "fist"  => Some(Gesture::ClosedFist),
        "open"  => Some(Gesture::OpenFist),
        "thumb" => Some(Gesture::ThumbsUp),
        "up"    => Some(Gesture::PointingUp),
        "down"  => Some(Gesture::PointingDown),
        "right" => Some(Gesture::PointingRight),
        "left"  => Some(Gesture::PointingLeft),
        _       => None,
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
