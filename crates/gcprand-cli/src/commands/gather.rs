use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use gcprand_core::DotSampler;

pub fn run(mut sampler: DotSampler, limit: usize, interval_secs: u64, json: bool) {
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        if let Err(err) = ctrlc::set_handler(move || stop.store(true, Ordering::Relaxed)) {
            eprintln!("could not install Ctrl-C handler: {err}");
        }
    }

    println!("Gathering {limit} sample(s), {interval_secs}s apart (Ctrl-C to stop early)...");
    let result = sampler.gather(
        limit,
        Duration::from_secs(interval_secs),
        &stop,
        |i, obs| {
            print!("[{i}/{limit}]");
            super::print_observation(obs);
        },
    );

    match result {
        Ok(collected) => {
            let store = sampler.store();
            println!();
            println!(
                "Collected {collected} observation(s), {} total in history",
                store.len()
            );

            let mut counts: Vec<_> = store.color_counts().into_iter().collect();
            counts.sort_by(|a, b| b.1.cmp(&a.1));
            for (label, count) in counts {
                println!("  {label:<8} {count}");
            }
            println!("Color entropy: {:.3} bits", store.color_entropy());

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(store.observations()).unwrap_or_default()
                );
            }
        }
        Err(err) => {
            eprintln!("gather aborted: {err}");
            std::process::exit(1);
        }
    }
}
