use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use serde::Serialize;

use export_map::data::loader::load_all_datasets;
use export_map::{
    ClassificationResult, GdpPredictor, MarketAnalyzer, MarketClassifier, RecommendationRecord,
    RegressionResult,
};

#[derive(Parser)]
#[command(name = "export-map")]
#[command(about = "Rank export markets and evaluate the GDP and market-potential models")]
struct Cli {
    /// Directory holding the country datasets
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Number of markets to recommend
    #[arg(short = 'n', long, default_value_t = 15)]
    top_n: usize,

    /// Print one JSON document instead of text tables
    #[arg(long)]
    json: bool,
}

/// Everything one run produces.
#[derive(Serialize)]
struct Report {
    merged_rows: usize,
    recommendations: Vec<RecommendationRecord>,
    gdp_model: Option<RegressionResult>,
    market_model: Option<ClassificationResult>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let datasets = load_all_datasets(&cli.data_dir);
    if datasets.is_empty() {
        bail!("no datasets found in {}", cli.data_dir.display());
    }

    let mut analyzer = MarketAnalyzer::new(&datasets);
    let recommendations = analyzer.market_recommendations(cli.top_n);

    let (merged_rows, gdp_model, market_model) = match analyzer.merged_data() {
        Some(table) => (
            table.len(),
            GdpPredictor::default().train(table),
            MarketClassifier::default().train(table),
        ),
        None => (0, None, None),
    };
    info!("Report over {merged_rows} merged markets");

    let report = Report {
        merged_rows,
        recommendations,
        gdp_model,
        market_model,
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("serializing report")?;
        println!("{json}");
    } else {
        print_report(&report, analyzer.status_message());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

fn print_report(report: &Report, status: Option<&str>) {
    if let Some(status) = status {
        println!("Note: {status}\n");
    }

    println!("Top {} export markets", report.recommendations.len());
    println!(
        "{:>4}  {:<28} {:>6} {:>14} {:>10} {:>8}  {}",
        "Rank", "Country", "MOS", "Population", "GDP/cap", "Lit. %", "Region"
    );
    for (rank, r) in report.recommendations.iter().enumerate() {
        println!(
            "{:>4}  {:<28} {:>6.3} {:>14} {:>10.0} {:>8.1}  {}",
            rank + 1,
            r.country,
            r.mos_score,
            r.population,
            r.gdp_per_capita,
            r.literacy,
            r.region
        );
    }
    println!();

    match &report.gdp_model {
        Some(gdp) => {
            println!("GDP per capita regression ({} training rows)", gdp.n_train);
            println!("  R² on held-out rows: {:.4}", gdp.r2_score);
            print_coefficients(&gdp.coefficients, gdp.intercept);
        }
        None => println!("GDP per capita regression: not trained"),
    }
    println!();

    match &report.market_model {
        Some(m) => {
            println!("High-potential market classifier (median MOS {:.4})", m.median_mos);
            println!("  accuracy: {:.4}", m.accuracy);
            println!("  ROC AUC:  {:.4}", m.roc_auc);
            let cm = m.confusion_matrix;
            println!("  confusion matrix [actual x predicted]:");
            println!("    {:>5} {:>5}", cm[0][0], cm[0][1]);
            println!("    {:>5} {:>5}", cm[1][0], cm[1][1]);
            print_coefficients(&m.coefficients, m.intercept);
            println!();
            print!("{}", m.classification_report);
        }
        None => println!("High-potential market classifier: not trained"),
    }
}

fn print_coefficients(coefficients: &[(String, f64)], intercept: f64) {
    for (feature, value) in coefficients {
        println!("  {feature:<36} {value:>12.4}");
    }
    println!("  {:<36} {intercept:>12.4}", "(intercept)");
}
