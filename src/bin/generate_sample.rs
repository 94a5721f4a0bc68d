use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use export_map::columns;
use export_map::data::loader::{COUNTRIES_FILE, POPULATION_FILE};

#[derive(Parser)]
#[command(name = "generate_sample")]
#[command(about = "Write synthetic population and country statistics tables")]
struct Cli {
    /// Output directory
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Seed of the generator
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// (population-table name, country-table spelling, continent, region)
const COUNTRIES: &[(&str, &str, &str, &str)] = &[
    ("Germany", "Germany", "Europe", "WESTERN EUROPE"),
    ("France", "France", "Europe", "WESTERN EUROPE"),
    ("Italy", "Italy", "Europe", "WESTERN EUROPE"),
    ("Spain", "Spain", "Europe", "WESTERN EUROPE"),
    ("Poland", "Poland", "Europe", "EASTERN EUROPE"),
    ("Romania", "Romania", "Europe", "EASTERN EUROPE"),
    ("Norway", "Norway", "Europe", "WESTERN EUROPE"),
    ("Czech Republic", "Czech Republic", "Europe", "EASTERN EUROPE"),
    ("United Kingdom", "United Kingdom", "Europe", "WESTERN EUROPE"),
    ("Japan", "Japan", "Asia", "ASIA (EX. NEAR EAST)"),
    ("South Korea", "Korea, South", "Asia", "ASIA (EX. NEAR EAST)"),
    ("North Korea", "Korea, North", "Asia", "ASIA (EX. NEAR EAST)"),
    ("India", "India", "Asia", "ASIA (EX. NEAR EAST)"),
    ("Indonesia", "Indonesia", "Asia", "ASIA (EX. NEAR EAST)"),
    ("Vietnam", "Vietnam", "Asia", "ASIA (EX. NEAR EAST)"),
    ("Thailand", "Thailand", "Asia", "ASIA (EX. NEAR EAST)"),
    ("Philippines", "Philippines", "Asia", "ASIA (EX. NEAR EAST)"),
    ("Saudi Arabia", "Saudi Arabia", "Asia", "NEAR EAST"),
    ("Turkey", "Turkey", "Asia", "NEAR EAST"),
    ("Nigeria", "Nigeria", "Africa", "SUB-SAHARAN AFRICA"),
    ("Niger", "Niger", "Africa", "SUB-SAHARAN AFRICA"),
    ("Kenya", "Kenya", "Africa", "SUB-SAHARAN AFRICA"),
    ("Ghana", "Ghana", "Africa", "SUB-SAHARAN AFRICA"),
    ("Chad", "Chad", "Africa", "SUB-SAHARAN AFRICA"),
    ("DR Congo", "Congo, Dem. Rep.", "Africa", "SUB-SAHARAN AFRICA"),
    ("Egypt", "Egypt", "Africa", "NORTHERN AFRICA"),
    ("Morocco", "Morocco", "Africa", "NORTHERN AFRICA"),
    ("South Africa", "South Africa", "Africa", "SUB-SAHARAN AFRICA"),
    ("Brazil", "Brazil", "South America", "LATIN AMER. & CARIB"),
    ("Argentina", "Argentina", "South America", "LATIN AMER. & CARIB"),
    ("Peru", "Peru", "South America", "LATIN AMER. & CARIB"),
    ("Chile", "Chile", "South America", "LATIN AMER. & CARIB"),
    ("Colombia", "Colombia", "South America", "LATIN AMER. & CARIB"),
    ("Mexico", "Mexico", "North America", "LATIN AMER. & CARIB"),
    ("United States", "United States", "North America", "NORTHERN AMERICA"),
    ("Canada", "Canada", "North America", "NORTHERN AMERICA"),
    ("Australia", "Australia", "Oceania", "OCEANIA"),
    ("New Zealand", "New Zealand", "Oceania", "OCEANIA"),
    ("Bahamas", "Bahamas, The", "North America", "LATIN AMER. & CARIB"),
    ("Gambia", "Gambia, The", "Africa", "SUB-SAHARAN AFRICA"),
];

/// Synthetic indicators of one country, loosely tied to a development level.
struct Indicators {
    population: u64,
    gdp: f64,
    literacy: f64,
    phones: f64,
    birthrate: f64,
    infant_mortality: f64,
}

impl Indicators {
    fn sample(rng: &mut StdRng) -> Self {
        let development: f64 = rng.gen_range(0.0..1.0);
        let noise = |rng: &mut StdRng, scale: f64| rng.gen_range(-scale..scale);

        let literacy = (35.0 + 64.0 * development + noise(rng, 6.0)).clamp(15.0, 100.0);
        let phones = (900.0 * development.powi(2) + noise(rng, 40.0)).max(1.0);
        let birthrate = (48.0 - 38.0 * development + noise(rng, 4.0)).max(7.0);
        let infant_mortality = (120.0 * (1.0 - development).powi(2) + noise(rng, 5.0)).max(2.0);
        let gdp = (500.0
            + 30.0 * literacy
            + 35.0 * phones
            - 60.0 * birthrate
            - 15.0 * infant_mortality
            + noise(rng, 1500.0))
        .max(300.0);

        Self {
            population: rng.gen_range(300_000..300_000_000),
            gdp: gdp.round(),
            literacy,
            phones,
            birthrate,
            infant_mortality,
        }
    }
}

/// Format with one decimal and a comma separator.
fn comma_decimal(value: f64) -> String {
    format!("{value:.1}").replace('.', ",")
}

fn write_population(path: &Path, rows: &[(&str, &str, u64)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(["Rank", columns::COUNTRY_TERRITORY, columns::CONTINENT, columns::POPULATION_2022])?;
    let mut ranked: Vec<&(&str, &str, u64)> = rows.iter().collect();
    ranked.sort_by(|a, b| b.2.cmp(&a.2));
    for (rank, (name, continent, population)) in ranked.into_iter().enumerate() {
        writer.write_record([
            (rank + 1).to_string(),
            name.to_string(),
            continent.to_string(),
            population.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating {}", cli.out_dir.display()))?;

    let mut rng = StdRng::seed_from_u64(cli.seed);
    let samples: Vec<Indicators> = COUNTRIES.iter().map(|_| Indicators::sample(&mut rng)).collect();

    let population_rows: Vec<(&str, &str, u64)> = COUNTRIES
        .iter()
        .zip(&samples)
        .map(|(&(name, _, continent, _), s)| (name, continent, s.population))
        .collect();
    let population_path = cli.out_dir.join(POPULATION_FILE);
    write_population(&population_path, &population_rows)?;

    let countries_path = cli.out_dir.join(COUNTRIES_FILE);
    let mut writer = csv::Writer::from_path(&countries_path)
        .with_context(|| format!("creating {}", countries_path.display()))?;
    writer.write_record([
        columns::COUNTRY,
        columns::REGION,
        "Population",
        columns::GDP_PER_CAPITA,
        columns::LITERACY,
        columns::PHONES,
        columns::BIRTHRATE,
        columns::INFANT_MORTALITY,
    ])?;
    for (&(_, spelling, _, region), s) in COUNTRIES.iter().zip(&samples) {
        // the source table pads names and regions and occasionally lacks literacy
        let literacy = if rng.gen_bool(0.05) {
            String::new()
        } else {
            comma_decimal(s.literacy)
        };
        writer.write_record([
            format!("{spelling} "),
            format!("{region:<35}"),
            s.population.to_string(),
            s.gdp.to_string(),
            literacy,
            comma_decimal(s.phones),
            format!("{:.2}", s.birthrate).replace('.', ","),
            format!("{:.2}", s.infant_mortality).replace('.', ","),
        ])?;
    }
    writer.flush()?;

    println!(
        "Wrote {} countries to {} and {}",
        COUNTRIES.len(),
        population_path.display(),
        countries_path.display()
    );
    Ok(())
}
