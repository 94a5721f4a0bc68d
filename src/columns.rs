//! Column and dataset names expected verbatim from the source files.

/// Dataset name of the world population table.
pub const POPULATION: &str = "population";
/// Dataset name of the "countries of the world" statistics table.
pub const COUNTRIES: &str = "countries";
/// Dataset name of the combined export-map table.
pub const EXPORTS: &str = "exports";

pub const COUNTRY_TERRITORY: &str = "Country/Territory";
pub const COUNTRY: &str = "Country";
pub const GDP_PER_CAPITA: &str = "GDP ($ per capita)";
pub const LITERACY: &str = "Literacy (%)";
pub const PHONES: &str = "Phones (per 1000)";
pub const BIRTHRATE: &str = "Birthrate";
pub const INFANT_MORTALITY: &str = "Infant mortality (per 1000 births)";
pub const REGION: &str = "Region";
pub const CONTINENT: &str = "Continent";
pub const POPULATION_2022: &str = "2022 Population";

/// Derived composite score column.
pub const MOS: &str = "MOS";
/// Suffix appended to a feature name for its min-max scaled column.
pub const SCALED_SUFFIX: &str = "_scaled";

/// Statistic columns of the countries table that may use a decimal comma.
pub const COUNTRY_NUMERIC_COLUMNS: [&str; 11] = [
    GDP_PER_CAPITA,
    LITERACY,
    PHONES,
    BIRTHRATE,
    "Deathrate",
    INFANT_MORTALITY,
    "Pop. Density (per sq. mi.)",
    "Net migration",
    "Arable (%)",
    "Crops (%)",
    "Other (%)",
];

/// Features shared by both predictive models.
pub const MODEL_FEATURES: [&str; 4] = [LITERACY, PHONES, BIRTHRATE, INFANT_MORTALITY];
