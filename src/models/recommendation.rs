use serde::Deserialize;

/// One recommendation record as returned by the training service
///
/// Wire shape: `{"Id": ..., "Title": ..., "RecommendationType": 0|1}`. The
/// raw classification integer is persisted as-is; unknown codes are kept so
/// a newer service does not break older clients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Recommendation {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "RecommendationType")]
    pub recommendation_type: i64,
}

/// Known recommendation classifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecommendationKind {
    NotRecommended,
    Recommended,
}

impl RecommendationKind {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(RecommendationKind::NotRecommended),
            1 => Some(RecommendationKind::Recommended),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            RecommendationKind::NotRecommended => 0,
            RecommendationKind::Recommended => 1,
        }
    }
}
