use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Physical layout of a site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteType {
    BackIn,
    PullThru,
    Tent,
}

impl SiteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SiteType::BackIn => "BACK_IN",
            SiteType::PullThru => "PULL_THRU",
            SiteType::Tent => "TENT",
        }
    }
}

impl std::str::FromStr for SiteType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "BACK_IN" => Ok(SiteType::BackIn),
            "PULL_THRU" => Ok(SiteType::PullThru),
            "TENT" => Ok(SiteType::Tent),
            _ => Err(format!("Invalid site type: {}", s)),
        }
    }
}

impl std::fmt::Display for SiteType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bookable RV or tent slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Site {
    #[schema(example = 5)]
    pub id: i32,
    /// Display label, unique among active sites
    #[schema(example = 12)]
    pub number: i32,
    pub site_type: SiteType,
    #[schema(example = 42)]
    pub max_length_ft: i32,
    /// False once the site has been retired
    pub active: bool,
    pub description: Option<String>,
}

impl Site {
    pub fn fits(&self, rig_length_ft: i32) -> bool {
        rig_length_ft <= self.max_length_ft
    }
}

/// Values for a site about to be inserted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSite {
    pub number: i32,
    pub site_type: SiteType,
    pub max_length_ft: i32,
    pub description: Option<String>,
}

/// Request DTO for POST /api/admin/sites
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSiteRequest {
    #[validate(range(min = 1, message = "Site number must be positive"))]
    #[schema(example = 12)]
    pub number: i32,
    pub site_type: SiteType,
    #[validate(range(min = 1, max = 100, message = "Max length must be between 1 and 100 feet"))]
    #[schema(example = 40)]
    pub max_length_ft: i32,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
}

impl From<CreateSiteRequest> for NewSite {
    fn from(request: CreateSiteRequest) -> Self {
        Self {
            number: request.number,
            site_type: request.site_type,
            max_length_ft: request.max_length_ft,
            description: request.description,
        }
    }
}

/// Request DTO for PUT /api/admin/sites/:id; omitted fields keep their value
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSiteRequest {
    #[validate(range(min = 1, message = "Site number must be positive"))]
    pub number: Option<i32>,
    pub site_type: Option<SiteType>,
    #[validate(range(min = 1, max = 100, message = "Max length must be between 1 and 100 feet"))]
    pub max_length_ft: Option<i32>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    pub active: Option<bool>,
}

impl UpdateSiteRequest {
    /// Merge the requested changes over an existing site
    pub fn apply_to(self, existing: &Site) -> Site {
        Site {
            id: existing.id,
            number: self.number.unwrap_or(existing.number),
            site_type: self.site_type.unwrap_or(existing.site_type),
            max_length_ft: self.max_length_ft.unwrap_or(existing.max_length_ft),
            active: self.active.unwrap_or(existing.active),
            description: self.description.or_else(|| existing.description.clone()),
        }
    }
}
