use std::error::Error;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use tracing::info;
use coup_rules::{Outcome, Role, Rules, Session};

const NAMES: [&str; 6] = ["Ada", "Bo", "Cy", "Di", "Ed", "Flo"];
const MAX_STEPS: usize = 1000;

fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout carries the final snapshot
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Usage: coup-rules [seed] [rules.json]
fn main() -> Result<(), Box<dyn Error>> {
    init_tracing("info");

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(seed) => seed.parse::<u64>()?,
        None => 42,
    };
    let rules = match args.next() {
        Some(path) => Rules::from_json(&std::fs::read_to_string(path)?)?,
        None => Rules::default(),
    };

    let mut rng = Pcg64::seed_from_u64(seed);
    let mut session = Session::with_rules(rules);
    let num_players = rng.gen_range(3..=NAMES.len());
    for name in &NAMES[..num_players] {
        session.add_player(*name, Role::random(&mut rng))?;
    }

    for step in 0..MAX_STEPS {
        let actions = session.actions();
        if actions.is_empty() {
            break;
        }

        let action = actions[rng.gen_range(0..actions.len())];
        if let Outcome::Revealed { target, coins } = session.apply(&action)? {
            info!(step, %target, coins, "spy report");
        }

        if let Ok(winner) = session.winner() {
            info!(step, winner, "game over");
            break;
        }
    }

    println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
    Ok(())
}
