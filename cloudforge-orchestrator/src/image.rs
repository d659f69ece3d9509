use chrono::{DateTime, FixedOffset};
use cloudforge_common::{ProviderError, WindowsVersion};
use cloudforge_providers::types::ImageQuery;
use cloudforge_providers::Ec2Api;
use tracing::debug;

/// Amazon's own image catalog.
const AMAZON_OWNER_ID: &str = "801119661308";

/// Catalog filter for one Windows release.
pub fn image_query(version: WindowsVersion) -> ImageQuery {
    let name_pattern = match version {
        WindowsVersion::Server2012R2 => "Windows_Server-2012-R2_RTM-English-64Bit-Base*",
        WindowsVersion::Server2016 => "Windows_Server-2016-English-Full-Base*",
    };
    ImageQuery {
        owner_id: AMAZON_OWNER_ID,
        platform: "windows",
        name_pattern,
    }
}

/// Newest matching image by creation timestamp, `None` when the filtered
/// catalog is empty.
pub async fn resolve_latest_image(
    api: &dyn Ec2Api,
    version: WindowsVersion,
) -> Result<Option<String>, ProviderError> {
    let query = image_query(version);
    let images = api.describe_images(&query).await?;
    debug!(pattern = query.name_pattern, candidates = images.len(), "image lookup");
    Ok(images
        .into_iter()
        .max_by_key(|image| creation_timestamp(&image.creation_date))
        .map(|image| image.image_id))
}

// Unparsable dates sort below every real one.
fn creation_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_release_maps_to_its_catalog_pattern() {
        assert_eq!(
            image_query(WindowsVersion::Server2012R2).name_pattern,
            "Windows_Server-2012-R2_RTM-English-64Bit-Base*"
        );
        assert_eq!(
            image_query(WindowsVersion::Server2016).name_pattern,
            "Windows_Server-2016-English-Full-Base*"
        );
    }

    #[test]
    fn queries_pin_owner_and_platform() {
        let query = image_query(WindowsVersion::Server2016);
        assert_eq!(query.owner_id, "801119661308");
        assert_eq!(query.platform, "windows");
    }

    #[test]
    fn timestamps_order_rfc3339_dates() {
        let older = creation_timestamp("2016-09-21T09:55:00.000Z");
        let newer = creation_timestamp("2017-01-04T12:00:00.000Z");
        assert!(older.unwrap() < newer.unwrap());
        assert!(creation_timestamp("not a date").is_none());
    }
}
