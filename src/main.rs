//! Blend Search CLI - Recommend coffee blends from a JSON request.

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

use std::path::PathBuf;
use std::time::Instant;

use blend_search::{
    compute::{WeightedMeanPredictor, recommend},
    schema::{BlendRequest, Component, Pool, PoolFilter, SearchConfig, Strategy, TargetProfile},
};

fn main() {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <request.json>", args[0]);
        eprintln!();
        eprintln!("Recommend blends for a target flavor profile from a JSON request.");
        eprintln!("The JSON report is written to stdout.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  request.json  Path to blend request file");
        eprintln!();
        eprintln!("Example request is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_request();
        return;
    }

    let request_path = PathBuf::from(&args[1]);
    let request = BlendRequest::from_json_file(&request_path).unwrap_or_else(|e| {
        eprintln!("Error reading request {}: {}", request_path.display(), e);
        std::process::exit(1);
    });

    eprintln!("Blend Search");
    eprintln!("============");
    eprintln!(
        "Pool: {} components ({} flavor dimensions)",
        request.pool.len(),
        request.pool.dimensions()
    );
    eprintln!("Target: {:?} (color {})", request.target.flavor, request.target.color);
    eprintln!("Strategy: {:?}", request.strategy);
    eprintln!();

    let predictor = WeightedMeanPredictor::new(request.pool.dimensions());

    let start = Instant::now();
    let report = recommend(&request, &predictor).unwrap_or_else(|e| {
        eprintln!("Search failed: {}", e);
        std::process::exit(1);
    });
    let elapsed = start.elapsed();

    eprintln!(
        "{} recommendations from {} components in {:.2}s ({} evaluations, stopped: {:?})",
        report.recommendations.len(),
        report.pool_size,
        elapsed.as_secs_f64(),
        report.stats.total_evaluations,
        report.stats.stop_reason
    );

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing report: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_example_request() {
    let lots = [
        ("K-1041", [6.0, 5.5, 6.5, 6.0], 2.35, "WAREHOUSE"),
        ("K-1187", [7.5, 7.0, 6.0, 6.5], 3.10, "WAREHOUSE"),
        ("K-1203", [5.0, 6.5, 5.5, 5.0], 1.85, "SPOT"),
        ("K-1310", [6.5, 6.0, 7.0, 7.0], 2.90, "WAREHOUSE"),
        ("K-1422", [4.5, 5.0, 5.0, 4.5], 1.60, "SPOT"),
    ];
    let components: Vec<Component> = lots
        .iter()
        .map(|(id, flavor, price, location)| Component {
            id: id.to_string(),
            flavor: flavor.to_vec(),
            price: *price,
            quantity: 5000.0,
            location: Some(location.to_string()),
            certifications: Vec::new(),
        })
        .collect();

    let pool = match Pool::new(components) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Error building example pool: {}", e);
            std::process::exit(1);
        }
    };

    let request = BlendRequest {
        pool,
        filter: PoolFilter {
            min_quantity: 1000.0,
            ..Default::default()
        },
        target: TargetProfile {
            flavor: vec![6.0, 6.0, 6.0, 6.0],
            color: 110.0,
        },
        strategy: Strategy::Exhaustive {
            anchor: "K-1041".to_string(),
            min_proportion: 30,
        },
        config: SearchConfig {
            random_seed: Some(42),
            ..Default::default()
        },
    };

    match serde_json::to_string_pretty(&request) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing example: {}", e);
            std::process::exit(1);
        }
    }
}
