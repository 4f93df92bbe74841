use gcprand_core::DotSampler;

pub fn run(sampler: DotSampler, host: &str, port: u16) {
    let base = format!("http://{host}:{port}");

    println!("\u{1F3B2} gcprand server v{}", gcprand_core::VERSION);
    println!("   {base}");
    println!("   chart: {}", sampler.config().chart_url);
    println!();
    println!("   Endpoints:");
    println!("     GET  /          HTML page with a dot-seeded random string");
    println!("     POST /          Form field: length (1-1000, default: 128)");
    println!("     GET  /health    Store size, last observation, color entropy");
    println!("     GET  /history   Full observation history as JSON");
    println!();
    println!("   Examples:");
    println!("     curl {base}/health");
    println!("     curl -d 'length=64' {base}/");
    println!();

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(gcprand_server::run_server(sampler, host, port));
}
