use log::debug;

use gcprand_core::DotSampler;

pub fn run(mut sampler: DotSampler, length: usize, fresh: bool) {
    let seed = match sampler.seed(fresh) {
        Ok(seed) => seed,
        Err(err) => {
            eprintln!("measurement failed: {err}");
            std::process::exit(1);
        }
    };
    debug!("seed: {seed}");

    match gcprand_core::generate(seed, length) {
        Ok(s) => println!("{s}"),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
