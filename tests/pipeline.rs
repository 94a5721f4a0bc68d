use std::fs;
use std::path::Path;

use export_map::columns;
use export_map::data::loader::{load_all_datasets, COUNTRIES_FILE, POPULATION_FILE};
use export_map::models::FeatureRow;
use export_map::{AnalysisError, Datasets, GdpPredictor, MarketAnalyzer, MarketClassifier};

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

fn germany_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        POPULATION_FILE,
        "Country/Territory,2022 Population\nGermany,83000000\n",
    );
    write(
        dir.path(),
        COUNTRIES_FILE,
        "Country,GDP ($ per capita),Literacy (%),Phones (per 1000),Birthrate\n\
         Germany ,48000,99,600,9\n",
    );
    dir
}

/// Thirty markets with a spelling variant on every fifth name.
fn market_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let mut population = String::from("Country/Territory,Continent,2022 Population\n");
    let mut countries = String::from(
        "Country,Region,GDP ($ per capita),Literacy (%),Phones (per 1000),Birthrate,\
         Infant mortality (per 1000 births)\n",
    );
    for i in 0..30 {
        let name = format!("Republic of Market{i:02}");
        let spelling = if i % 5 == 0 {
            format!("Market{i:02}, Republic of ")
        } else {
            format!("{name} ")
        };
        let literacy = 40.0 + (i * 17 % 60) as f64 + 0.5;
        let phones = 10.0 + (i * 31 % 90) as f64 * 9.0;
        let birth = 9.0 + (i * 11 % 35) as f64;
        let infant = 4.0 + (i * 23 % 70) as f64;
        let gdp = 800.0 + 25.0 * literacy + 12.0 * phones - 40.0 * birth - 9.0 * infant
            + (i % 3) as f64 * 100.0;
        population.push_str(&format!("{name},Somewhere,{}\n", 1_000_000 + i * 250_000));
        // the statistics table writes decimals with a comma
        countries.push_str(&format!(
            "\"{spelling}\",REGION {},{gdp:.0},\"{}\",\"{}\",\"{}\",\"{}\"\n",
            i % 4,
            format!("{literacy:.1}").replace('.', ","),
            format!("{phones:.1}").replace('.', ","),
            format!("{birth:.2}").replace('.', ","),
            format!("{infant:.2}").replace('.', ","),
        ));
    }
    write(dir.path(), POPULATION_FILE, &population);
    write(dir.path(), COUNTRIES_FILE, &countries);
    dir
}

fn sample_features() -> FeatureRow {
    columns::MODEL_FEATURES
        .iter()
        .zip([90.0, 400.0, 12.0, 8.0])
        .map(|(f, v)| (f.to_string(), v))
        .collect()
}

#[test]
fn single_country_scores_one() {
    let dir = germany_dir();
    let data = load_all_datasets(dir.path());
    let mut analyzer = MarketAnalyzer::new(&data);

    let summary = analyzer.calculate_mos().unwrap();
    assert_eq!(summary.scored, 1);
    let merged = analyzer.merged_data().unwrap();
    assert_eq!(merged.len(), 1);
    assert_eq!(merged.text(0, columns::COUNTRY), Some("Germany"));
    assert!((merged.numeric(0, columns::MOS).unwrap() - 1.0).abs() < 1e-12);

    let recs = analyzer.market_recommendations(1);
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].country, "Germany");
    assert_eq!(recs[0].population, 83_000_000);
    assert!((recs[0].mos_score - 1.0).abs() < 1e-12);
}

#[test]
fn models_refuse_tiny_tables_and_untrained_prediction() {
    let dir = germany_dir();
    let mut analyzer = MarketAnalyzer::new(&load_all_datasets(dir.path()));
    analyzer.calculate_mos();
    let table = analyzer.merged_data().unwrap();

    let mut gdp = GdpPredictor::default();
    let mut classifier = MarketClassifier::default();
    assert!(gdp.train(table).is_none());
    assert!(classifier.train(table).is_none());

    assert_eq!(gdp.predict(&sample_features()), Err(AnalysisError::ModelNotTrained));
    assert_eq!(
        classifier.predict_probability(&sample_features()),
        Err(AnalysisError::ModelNotTrained)
    );
}

#[test]
fn full_pipeline_over_loaded_files() {
    let dir = market_dir();
    let data = load_all_datasets(dir.path());
    assert_eq!(data.len(), 2);

    let mut analyzer = MarketAnalyzer::new(&data);
    let recs = analyzer.market_recommendations(10);
    assert_eq!(recs.len(), 10);
    assert!(recs.windows(2).all(|w| w[0].mos_score >= w[1].mos_score));
    assert!(recs.iter().all(|r| r.country.starts_with("Republic of Market")));
    assert!(recs.iter().all(|r| r.continent == "Somewhere"));

    let table = analyzer.merged_data().unwrap();
    assert_eq!(table.len(), 30);
    // every cleaned indicator is numeric after loading
    assert!((0..table.len()).all(|i| table.numeric(i, columns::LITERACY).is_some()));

    let mut gdp = GdpPredictor::default();
    let regression = gdp.train(table).unwrap();
    assert_eq!(regression.y_test.len(), 6);
    assert!(regression.r2_score > 0.9);
    assert!(gdp.predict(&sample_features()).unwrap().is_finite());

    let mut classifier = MarketClassifier::default();
    let classification = classifier.train(table).unwrap();
    assert_eq!(classification.y_test.len(), 6);
    assert!(classification.y_test.contains(&0) && classification.y_test.contains(&1));
    let p = classifier.predict_probability(&sample_features()).unwrap();
    assert!((0.0..=1.0).contains(&p));
}

#[test]
fn scoring_twice_is_stable() {
    let dir = market_dir();
    let data = load_all_datasets(dir.path());
    let mut analyzer = MarketAnalyzer::new(&data);
    analyzer.calculate_mos();
    let first = analyzer.merged_data().cloned();
    analyzer.calculate_mos();
    assert_eq!(analyzer.merged_data().cloned(), first);
}

#[test]
fn empty_directory_gives_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let data: Datasets = load_all_datasets(dir.path());
    assert!(data.is_empty());
    let mut analyzer = MarketAnalyzer::new(&data);
    assert!(analyzer.market_recommendations(5).is_empty());
}
