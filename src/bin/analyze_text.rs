use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use veritext::{analyze, AggregationPolicy, AnalysisConfig};

fn parse_arg_value(args: &[String], key: &str) -> Option<String> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn has_flag(args: &[String], key: &str) -> bool {
    args.iter().any(|a| a == key)
}

/// Positional arguments: everything that is neither a flag nor a flag value.
fn positional_args(args: &[String]) -> Vec<String> {
    let value_flags = ["--config", "--policy", "--out"];
    let mut out = Vec::new();
    let mut i = 1;
    while i < args.len() {
        let arg = &args[i];
        if value_flags.contains(&arg.as_str()) {
            i += 2;
            continue;
        }
        if arg.starts_with("--") {
            i += 1;
            continue;
        }
        out.push(arg.clone());
        i += 1;
    }
    out
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // report JSON goes to stdout, logs stay on stderr
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .init();
}

fn main() -> Result<(), String> {
    init_logging();

    let args: Vec<String> = std::env::args().collect();
    let paths = positional_args(&args);
    if paths.is_empty() {
        eprintln!(
            "Usage:\n  analyze_text <candidate.txt> [reference.txt ...] [--config <config.json>] [--policy <max|mean|weighted>] [--out <json_path>] [--save]\n\nNotes:\n  - `--config` takes a JSON AnalysisConfig; omitted fields use defaults.\n  - `--save` writes plagiarism_report_<timestamp>.json next to the working directory."
        );
        return Ok(());
    }

    let mut config = match parse_arg_value(&args, "--config") {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .map_err(|e| format!("read config failed: {}", e))?;
            serde_json::from_str::<AnalysisConfig>(&raw)
                .map_err(|e| format!("parse config failed: {}", e))?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(policy) = parse_arg_value(&args, "--policy") {
        config.aggregation.policy = match policy.as_str() {
            "max" => AggregationPolicy::Max,
            "mean" => AggregationPolicy::Mean,
            "weighted" => AggregationPolicy::Weighted,
            other => return Err(format!("unknown policy: {}", other)),
        };
    }

    let candidate = std::fs::read_to_string(&paths[0])
        .map_err(|e| format!("read candidate failed: {}", e))?;
    let mut references = Vec::new();
    for path in &paths[1..] {
        references.push(
            std::fs::read_to_string(path)
                .map_err(|e| format!("read reference {} failed: {}", path, e))?,
        );
    }
    let reference_slices: Vec<&str> = references.iter().map(|s| s.as_str()).collect();

    let report = analyze(&candidate, &reference_slices, &config).map_err(|e| e.to_string())?;

    let json = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
    println!("{}", json);

    if let Some(out_path) = parse_arg_value(&args, "--out") {
        std::fs::write(&out_path, &json).map_err(|e| format!("write out failed: {}", e))?;
        eprintln!("Wrote report: {}", out_path);
    }
    if has_flag(&args, "--save") {
        let file_name = format!(
            "plagiarism_report_{}.json",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );
        std::fs::write(&file_name, &json).map_err(|e| format!("write report failed: {}", e))?;
        eprintln!("Wrote report: {}", file_name);
    }

    Ok(())
}
