use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    str::FromStr,
};

use ini::Ini;

use crate::error::ConfigError;
use crate::partition::DownloadRange;
use crate::tile::{tiles_per_axis, MAX_ZOOM};
use crate::url::UrlFormat;

pub const URL_KEY: &str = "download.url";
pub const PATH_KEY: &str = "download.path";
pub const ZOOM_START_KEY: &str = "download.zoomStart";
pub const ZOOM_END_KEY: &str = "download.zoomEnd";
pub const X_START_KEY: &str = "download.xStart";
pub const Y_START_KEY: &str = "download.yStart";
pub const X_END_KEY: &str = "download.xEnd";
pub const Y_END_KEY: &str = "download.yEnd";
pub const SINGLE_THREAD_KEY: &str = "download.singleThread";

/// A flat key-value configuration source, e.g. a `config.properties` file:
///
/// ```text
/// download.url=https://tile.example.org/{z}/{x}/{y}.png
/// download.path=./tiles
/// download.zoomStart=0
/// download.zoomEnd=8
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Properties {
    values: HashMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the keys of the file's general (section-less) part.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::from_ini(&ini))
    }

    pub fn from_ini(ini: &Ini) -> Self {
        let values = ini
            .general_section()
            .iter()
            .map(|(k, v)| (k.to_owned(), v.trim().to_owned()))
            .collect();

        Self { values }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get_string(&self, key: &str) -> Result<&str, ConfigError> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::Missing(key.to_owned()))
    }

    pub fn get_int(&self, key: &str) -> Result<i32, ConfigError> {
        self.parse(key)
    }

    pub fn get_long(&self, key: &str) -> Result<i64, ConfigError> {
        self.parse(key)
    }

    /// `true` or `false`, case-insensitive.
    pub fn get_bool(&self, key: &str) -> Result<bool, ConfigError> {
        let value = self.get_string(key)?;

        if value.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if value.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(ConfigError::invalid(key, value, "must be `true` or `false`"))
        }
    }

    fn parse<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.get_string(key)?;
        value
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(key, value, e.to_string()))
    }

    fn get_or<T>(
        &self,
        key: &str,
        default: T,
        get: impl Fn(&Self, &str) -> Result<T, ConfigError>,
    ) -> Result<T, ConfigError> {
        if self.contains(key) {
            get(self, key)
        } else {
            Ok(default)
        }
    }
}

/// Tile download configuration.
#[derive(Debug, PartialEq)]
pub struct Config {
    /// The URL to download individual tiles from including the replacement
    /// specifiers `{x}`, `{y}` and `{z}`.
    pub url: UrlFormat,

    /// The folder to output the tiles to.
    pub output_folder: PathBuf,

    /// Zoom levels and tile bounds to download.
    pub range: DownloadRange,

    /// Use a single worker per zoom level.
    pub sequential: bool,

    /// Show a progress bar per zoom level.
    pub progress: bool,
}

impl Config {
    /// Reads and validates a configuration from `props`.
    ///
    /// Fails on the first missing required key or invalid value.
    pub fn from_properties(props: &Properties) -> Result<Self, ConfigError> {
        let url = props.get_string(URL_KEY)?.to_owned();
        let output_folder = PathBuf::from(props.get_string(PATH_KEY)?);
        let zoom_start = zoom(props, ZOOM_START_KEY)?;
        let zoom_end = zoom(props, ZOOM_END_KEY)?;

        if !url.get(..7).map_or(false, |s| s.eq_ignore_ascii_case("http://"))
            && !url.get(..8).map_or(false, |s| s.eq_ignore_ascii_case("https://"))
        {
            return Err(ConfigError::invalid(URL_KEY, &url, "must be an http(s) URL"));
        }
        if output_folder.as_os_str().is_empty() {
            return Err(ConfigError::invalid(PATH_KEY, "", "must not be empty"));
        }
        if zoom_start > zoom_end {
            return Err(ConfigError::invalid(
                ZOOM_START_KEY,
                zoom_start,
                format!("must not exceed {} ({})", ZOOM_END_KEY, zoom_end),
            ));
        }

        let range = DownloadRange {
            zoom_start,
            zoom_end,
            x_start: bound(props, X_START_KEY, zoom_start)?,
            y_start: bound(props, Y_START_KEY, zoom_start)?,
            x_end: bound(props, X_END_KEY, zoom_end)?,
            y_end: bound(props, Y_END_KEY, zoom_end)?,
        };

        if zoom_start == zoom_end && range.x_end != 0 && range.x_start > range.x_end {
            return Err(ConfigError::invalid(
                X_START_KEY,
                range.x_start,
                format!("must not exceed {} ({})", X_END_KEY, range.x_end),
            ));
        }

        Ok(Self {
            url: UrlFormat::from_string(url),
            output_folder,
            range,
            sequential: props.get_or(SINGLE_THREAD_KEY, false, Properties::get_bool)?,
            progress: true,
        })
    }
}

fn zoom(props: &Properties, key: &str) -> Result<u8, ConfigError> {
    let value = props.get_int(key)?;

    u8::try_from(value)
        .ok()
        .filter(|z| *z <= MAX_ZOOM)
        .ok_or_else(|| {
            ConfigError::invalid(key, value, format!("must be between 0 and {}", MAX_ZOOM))
        })
}

/// An optional tile index bound that has to lie on the grid of `zoom`.
fn bound(props: &Properties, key: &str, zoom: u8) -> Result<u32, ConfigError> {
    let value = props.get_or(key, 0, Properties::get_long)?;
    let limit = tiles_per_axis(zoom);

    u32::try_from(value)
        .ok()
        .filter(|v| *v < limit)
        .ok_or_else(|| {
            ConfigError::invalid(
                key,
                value,
                format!("must be between 0 and {} at zoom {}", limit - 1, zoom),
            )
        })
}
