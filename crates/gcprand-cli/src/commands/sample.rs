use gcprand_core::DotSampler;

pub fn run(mut sampler: DotSampler, json: bool) {
    match sampler.sample() {
        Ok(obs) => {
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&obs).unwrap_or_default()
                );
            } else {
                println!("\u{1F534} GCP Dot reading");
                super::print_observation(&obs);
            }
        }
        Err(err) => {
            eprintln!("measurement failed: {err}");
            std::process::exit(1);
        }
    }
}
