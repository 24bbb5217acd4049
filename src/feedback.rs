//! Alfred Script Filter output
//!
//! Turns search results and their artwork slots into the JSON document Alfred reads
//! from a script filter's stdout.

use serde::Serialize;

use crate::engine::Slot;
use crate::search::AppResult;

/// Star glyph used for ratings
const STAR: char = '⭑';

/// Alfred's built-in "stop" icon, shown when artwork is unavailable
pub const ERROR_ICON: &str =
    "/System/Library/CoreServices/CoreTypes.bundle/Contents/Resources/AlertStopIcon.icns";

/// Root document of a script filter response
#[derive(Debug, Clone, Default, Serialize)]
pub struct Feedback {
    pub items: Vec<Item>,
}

/// One row in Alfred's result list
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub title: String,
    pub subtitle: String,
    pub arg: String,
    pub valid: bool,
    pub icon: Icon,
    pub mods: Mods,
}

/// Item icon; a bare `path` means "use this image file"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icon {
    pub path: String,
}

/// Modifier-key overrides
#[derive(Debug, Clone, Serialize)]
pub struct Mods {
    pub alt: Modifier,
}

/// Alternate action shown while a modifier key is held
#[derive(Debug, Clone, Serialize)]
pub struct Modifier {
    pub arg: String,
    pub valid: bool,
    pub subtitle: String,
}

impl Icon {
    /// Icon for an artwork slot; unavailable artwork gets the error icon
    pub fn from_slot(slot: &Slot) -> Self {
        let path = match slot.path() {
            Some(path) => path.to_string_lossy().into_owned(),
            None => ERROR_ICON.to_string(),
        };
        Self { path }
    }
}

/// Formats `"{price} | {stars }({count} ratings)"`; unrated apps get no stars
pub fn subtitle(price: &str, rating: f64, count: u64) -> String {
    let stars = if rating == 0.0 {
        String::new()
    } else {
        let mut stars: String = std::iter::repeat(STAR).take(rating as usize).collect();
        stars.push(' ');
        stars
    };
    format!("{} | {}({} ratings)", price, stars, count)
}

/// `macappstores://` link that opens the app in the App Store
pub fn store_link(track_id: i64) -> String {
    format!("macappstores://itunes.apple.com/app/id{}", track_id)
}

impl Item {
    /// Builds the row for one search result
    pub fn from_result(result: &AppResult, slot: &Slot) -> Self {
        Self {
            title: result.track_name.clone(),
            subtitle: subtitle(
                &result.formatted_price,
                result.average_user_rating,
                result.user_rating_count,
            ),
            arg: store_link(result.track_id),
            valid: true,
            icon: Icon::from_slot(slot),
            mods: Mods {
                alt: Modifier {
                    arg: result.track_view_url.clone(),
                    valid: true,
                    subtitle: "Open in browser".to_string(),
                },
            },
        }
    }
}

impl Feedback {
    /// Pairs each result with the slot at the same index
    pub fn from_results(results: &[AppResult], slots: &[Slot]) -> Self {
        let items = results
            .iter()
            .zip(slots)
            .map(|(result, slot)| Item::from_result(result, slot))
            .collect();
        Self { items }
    }

    /// Serializes the document for stdout
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
