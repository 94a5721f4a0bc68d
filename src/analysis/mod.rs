/// Market analysis: entity resolution, opportunity scoring and ranking.
///
/// Architecture:
/// ```text
///   population      countries
///        │              │
///        ▼              ▼
///   ┌──────────────────────┐
///   │ resolver (+ fuzzy)    │  WRatio > 80 → inner join on country name
///   └──────────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  scorer   │  min-max scale → weighted MOS → stable sort
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ recommend │  top-N rows → RecommendationRecord
///   └──────────┘
/// ```

pub mod fuzzy;
pub mod recommend;
pub mod resolver;
pub mod scorer;
