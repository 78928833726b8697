use crate::{core::geo::TileCoord, MapError, Result};

/// Anything that can produce tile URLs for a given coordinate.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `coord`.
    fn url(&self, coord: TileCoord) -> String;

    /// Highest zoom the service has tiles for
    fn max_zoom(&self) -> u8 {
        22
    }

    fn attribution(&self) -> &str {
        ""
    }
}

/// Raster tiles rendered server-side from a `mapbox://styles/{owner}/{style}` URL
#[derive(Debug, Clone, PartialEq)]
pub struct MapboxStyleSource {
    owner: String,
    style: String,
    access_token: String,
}

impl MapboxStyleSource {
    const STYLE_PREFIX: &'static str = "mapbox://styles/";

    pub fn from_style_url(style_url: &str, access_token: &str) -> Result<Self> {
        let path = style_url.strip_prefix(Self::STYLE_PREFIX).ok_or_else(|| {
            MapError::Config(format!("not a mapbox style URL: {}", style_url))
        })?;

        let mut parts = path.split('/').filter(|p| !p.is_empty());
        let (Some(owner), Some(style), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(MapError::Config(format!(
                "expected mapbox://styles/{{owner}}/{{style}}, got {}",
                style_url
            )));
        };

        if access_token.trim().is_empty() {
            return Err(MapError::Config("a Mapbox access token is required".to_string()));
        }

        Ok(Self {
            owner: owner.to_string(),
            style: style.to_string(),
            access_token: access_token.trim().to_string(),
        })
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn style(&self) -> &str {
        &self.style
    }
}

impl TileSource for MapboxStyleSource {
    fn url(&self, coord: TileCoord) -> String {
        format!(
            "https://api.mapbox.com/styles/v1/{}/{}/tiles/256/{}/{}/{}?access_token={}",
            self.owner, self.style, coord.z, coord.x, coord.y, self.access_token
        )
    }

    fn attribution(&self) -> &str {
        "© Mapbox © OpenStreetMap"
    }
}

/// XYZ template such as `https://tile.openstreetmap.org/{z}/{x}/{y}.png`
#[derive(Debug, Clone, PartialEq)]
pub struct UrlTemplateSource {
    template: String,
}

impl UrlTemplateSource {
    pub fn new(template: &str) -> Result<Self> {
        let is_http = template.starts_with("http://") || template.starts_with("https://");
        let has_placeholders = ["{z}", "{x}", "{y}"].iter().all(|p| template.contains(p));
        if !is_http || !has_placeholders {
            return Err(MapError::Config(format!(
                "tile URL template needs http(s) and {{z}}/{{x}}/{{y}}: {}",
                template
            )));
        }
        Ok(Self {
            template: template.to_string(),
        })
    }
}

impl TileSource for UrlTemplateSource {
    fn url(&self, coord: TileCoord) -> String {
        self.template
            .replace("{z}", &coord.z.to_string())
            .replace("{x}", &coord.x.to_string())
            .replace("{y}", &coord.y.to_string())
    }
}

/// Picks the tile source that serves `style_url`
pub fn source_for_style(style_url: &str, access_token: &str) -> Result<Box<dyn TileSource>> {
    if style_url.starts_with("mapbox://") {
        Ok(Box::new(MapboxStyleSource::from_style_url(style_url, access_token)?))
    } else {
        Ok(Box::new(UrlTemplateSource::new(style_url)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapbox_style_url() {
        let source =
            MapboxStyleSource::from_style_url("mapbox://styles/mapbox/streets-v9", "pk.test").unwrap();
        assert_eq!(source.owner(), "mapbox");
        assert_eq!(source.style(), "streets-v9");
        assert_eq!(
            source.url(TileCoord::new(290, 387, 10)),
            "https://api.mapbox.com/styles/v1/mapbox/streets-v9/tiles/256/10/290/387?access_token=pk.test"
        );
    }

    #[test]
    fn test_bad_style_urls() {
        assert!(MapboxStyleSource::from_style_url("mapbox://styles/mapbox", "pk.test").is_err());
        assert!(MapboxStyleSource::from_style_url("mapbox://styles/a/b/c", "pk.test").is_err());
        assert!(MapboxStyleSource::from_style_url("https://example.com", "pk.test").is_err());
        assert!(matches!(
            MapboxStyleSource::from_style_url("mapbox://styles/mapbox/streets-v9", " "),
            Err(MapError::Config(_))
        ));
    }

    #[test]
    fn test_url_template() {
        let source = source_for_style("https://tile.openstreetmap.org/{z}/{x}/{y}.png", "").unwrap();
        assert_eq!(
            source.url(TileCoord::new(1, 2, 3)),
            "https://tile.openstreetmap.org/3/1/2.png"
        );
        assert!(UrlTemplateSource::new("https://tile.openstreetmap.org/{z}.png").is_err());
    }
}
