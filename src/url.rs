use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use crate::tile::Tile;

const OSM_SERVERS: &[&str] = &["a", "b", "c"];

/// How a tile URL has to be requested, decided by its scheme.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Transport {
    Plain,
    Secure,
}

impl Transport {
    /// Case-insensitive check for an `https` prefix; anything else is plain.
    pub fn of(url: &str) -> Self {
        let is_https = url
            .get(..5)
            .map_or(false, |scheme| scheme.eq_ignore_ascii_case("https"));

        if is_https {
            Transport::Secure
        } else {
            Transport::Plain
        }
    }
}

/// A tile URL template with the placeholders `{x}`, `{y}` and `{z}`.
///
/// `{s}` is also understood and cycles through the subdomains `a`, `b` and `c`.
pub struct UrlFormat {
    inc: AtomicUsize,
    format_str: String,
}

impl UrlFormat {
    pub fn from_string(format_str: String) -> Self {
        Self {
            inc: AtomicUsize::new(0),
            format_str,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.format_str
    }

    pub fn transport(&self) -> Transport {
        Transport::of(&self.format_str)
    }

    /// Builds the URL for `tile`, replacing every occurrence of each placeholder.
    ///
    /// # Example
    /// ```rust
    /// # use tms_tile_downloader::{Tile, UrlFormat};
    /// let url = UrlFormat::from_string("https://tiles.example/{z}/{x}/{y}.png".into());
    /// assert_eq!(url.tile_url(&Tile::new(3, 2, 4)), "https://tiles.example/4/3/2.png");
    /// ```
    pub fn tile_url(&self, tile: &Tile) -> String {
        let mut url = self
            .format_str
            .replace("{x}", &tile.x.to_string())
            .replace("{y}", &tile.y.to_string())
            .replace("{z}", &tile.z.to_string());

        if url.contains("{s}") {
            let inc = self.inc.fetch_add(1, Ordering::Relaxed);
            url = url.replace("{s}", OSM_SERVERS[inc % OSM_SERVERS.len()]);
        }

        url
    }
}

impl PartialEq for UrlFormat {
    fn eq(&self, other: &Self) -> bool {
        self.format_str == other.format_str
    }
}

impl fmt::Debug for UrlFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlFormat")
            .field("format_str", &self.format_str)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_coordinates() {
        let url = UrlFormat::from_string("https://tiles.example/{z}/{x}/{y}.png".into());
        let formatted = url.tile_url(&Tile::new(3, 2, 4));

        assert_eq!(formatted, "https://tiles.example/4/3/2.png");
        assert!(!formatted.contains('{'));
    }

    #[test]
    fn substitutes_every_occurrence() {
        let url = UrlFormat::from_string("http://t/{z}/{x}/{y}?z={z}&x={x}".into());
        assert_eq!(url.tile_url(&Tile::new(5, 6, 7)), "http://t/7/5/6?z=7&x=5");
    }

    #[test]
    fn leaves_unknown_placeholders_alone() {
        let url = UrlFormat::from_string("http://t/{z}/{x}/{y}{r}.png".into());
        assert_eq!(url.tile_url(&Tile::new(0, 0, 0)), "http://t/0/0/0{r}.png");
    }

    #[test]
    fn rotates_subdomains() {
        let url = UrlFormat::from_string("https://{s}.tile.example/{z}/{x}/{y}.png".into());
        let tile = Tile::new(0, 0, 0);

        let hosts: Vec<_> = (0..4).map(|_| url.tile_url(&tile)).collect();
        assert_eq!(
            hosts,
            [
                "https://a.tile.example/0/0/0.png",
                "https://b.tile.example/0/0/0.png",
                "https://c.tile.example/0/0/0.png",
                "https://a.tile.example/0/0/0.png",
            ]
        );
    }

    #[test]
    fn transport_by_scheme() {
        assert_eq!(Transport::of("https://a/{z}"), Transport::Secure);
        assert_eq!(Transport::of("HTTPS://a/{z}"), Transport::Secure);
        assert_eq!(Transport::of("HtTpS://a/{z}"), Transport::Secure);
        assert_eq!(Transport::of("http://a/{z}"), Transport::Plain);
        assert_eq!(Transport::of("htt"), Transport::Plain);
    }
}
