use clap::{command, parser::ValueSource, value_parser, Arg, ArgAction, ArgMatches};
use std::path::PathBuf;

use crate::validators::*;
use tms_tile_downloader::{
    Config, ConfigError, Properties, PATH_KEY, SINGLE_THREAD_KEY, URL_KEY, X_END_KEY,
    X_START_KEY, Y_END_KEY, Y_START_KEY, ZOOM_END_KEY, ZOOM_START_KEY,
};

const CONFIG_ARG: &str = "config";
const URL_ARG: &str = "url";
const ZOOM_ARG: &str = "zoom";
const OUTPUT_DIR_ARG: &str = "output_dir";
const MIN_ZOOM_ARG: &str = "min_zoom";
const MAX_ZOOM_ARG: &str = "max_zoom";
const X_START_ARG: &str = "x_start";
const Y_START_ARG: &str = "y_start";
const X_END_ARG: &str = "x_end";
const Y_END_ARG: &str = "y_end";
const SINGLE_THREAD_ARG: &str = "single_thread";
const NO_PROGRESS_ARG: &str = "no_progress";
const DRY_RUN_ARG: &str = "dry_run";

pub struct Args {
    pub config: PathBuf,
    pub config_is_default: bool,
    pub url: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub min_zoom: Option<u8>,
    pub max_zoom: Option<u8>,
    pub x_start: Option<u32>,
    pub y_start: Option<u32>,
    pub x_end: Option<u32>,
    pub y_end: Option<u32>,
    pub single_thread: bool,
    pub progress: bool,
    pub dry_run: bool,
}

impl std::convert::TryFrom<Args> for Config {
    type Error = ConfigError;

    fn try_from(args: Args) -> Result<Self, Self::Error> {
        let mut config = Config::from_properties(&args.properties()?)?;
        config.progress = args.progress;

        Ok(config)
    }
}

impl Args {
    pub fn parse() -> Self {
        let matches = get_matches();

        let (min_zoom, max_zoom) = match matches.get_one::<u8>(ZOOM_ARG) {
            // if `zoom` is set, use it for both min/max
            Some(&zoom) => (Some(zoom), Some(zoom)),
            None => (
                matches.get_one::<u8>(MIN_ZOOM_ARG).copied(),
                matches.get_one::<u8>(MAX_ZOOM_ARG).copied(),
            ),
        };

        Self {
            config: matches
                .get_one::<PathBuf>(CONFIG_ARG)
                .cloned()
                .unwrap_or_default(),
            config_is_default: matches.value_source(CONFIG_ARG)
                == Some(ValueSource::DefaultValue),
            url: matches.get_one::<String>(URL_ARG).cloned(),
            output_dir: matches.get_one::<PathBuf>(OUTPUT_DIR_ARG).cloned(),
            min_zoom,
            max_zoom,
            x_start: matches.get_one::<u32>(X_START_ARG).copied(),
            y_start: matches.get_one::<u32>(Y_START_ARG).copied(),
            x_end: matches.get_one::<u32>(X_END_ARG).copied(),
            y_end: matches.get_one::<u32>(Y_END_ARG).copied(),
            single_thread: matches.get_flag(SINGLE_THREAD_ARG),
            progress: !matches.get_flag(NO_PROGRESS_ARG),
            dry_run: matches.get_flag(DRY_RUN_ARG),
        }
    }

    /// The configuration file's keys with the command line applied on top.
    ///
    /// A missing configuration file is fine as long as it is the default one.
    pub fn properties(&self) -> Result<Properties, ConfigError> {
        let mut props = if self.config_is_default && !self.config.exists() {
            Properties::new()
        } else {
            Properties::load(&self.config)?
        };

        if let Some(url) = &self.url {
            props.set(URL_KEY, url);
        }
        if let Some(dir) = &self.output_dir {
            props.set(PATH_KEY, dir.display());
        }

        let overrides = [
            (ZOOM_START_KEY, self.min_zoom.map(u32::from)),
            (ZOOM_END_KEY, self.max_zoom.map(u32::from)),
            (X_START_KEY, self.x_start),
            (Y_START_KEY, self.y_start),
            (X_END_KEY, self.x_end),
            (Y_END_KEY, self.y_end),
        ];
        for (key, value) in overrides {
            if let Some(value) = value {
                props.set(key, value);
            }
        }

        if self.single_thread {
            props.set(SINGLE_THREAD_KEY, true);
        }

        Ok(props)
    }
}

fn get_matches() -> ArgMatches {
    command!()
        .arg(
            Arg::new(CONFIG_ARG)
                .help("Properties file with the `download.*` keys. Command line options take precedence.")
                .value_parser(value_parser!(PathBuf))
                .default_value("config.properties")
                .short('c')
                .long("config"),
        )
        .arg(
            Arg::new(URL_ARG)
                .help("The URL with format specifiers `{x}`, `{y}`, `{z}` to fetch the tiles from. Also supports the format specifier `{s}` which is replaced with `a`, `b` or `c` in turn to spread the load between different servers.")
                .value_parser(tile_url)
                .short('u')
                .long("url"),
        )
        .arg(
            Arg::new(OUTPUT_DIR_ARG)
                .help("The folder to output the tiles to.")
                .value_parser(value_parser!(PathBuf))
                .short('o')
                .long("output"),
        )
        .arg(
            Arg::new(MIN_ZOOM_ARG)
                .help("The minimum zoom level to fetch")
                .value_parser(zoom_level)
                .long("min-zoom"),
        )
        .arg(
            Arg::new(MAX_ZOOM_ARG)
                .help("The maximum zoom level to fetch")
                .value_parser(zoom_level)
                .long("max-zoom"),
        )
        .arg(
            Arg::new(ZOOM_ARG)
                .help("Only fetch a single zoom level (implies min=x/max=x)")
                .value_parser(zoom_level)
                .conflicts_with_all([MIN_ZOOM_ARG, MAX_ZOOM_ARG])
                .short('z')
                .long("zoom"),
        )
        .arg(
            Arg::new(X_START_ARG)
                .help("First tile column, applied at the minimum zoom level only (0 = unbounded)")
                .value_parser(tile_index)
                .long("x-start"),
        )
        .arg(
            Arg::new(Y_START_ARG)
                .help("First tile row of the first column, applied at the minimum zoom level only (0 = unbounded)")
                .value_parser(tile_index)
                .long("y-start"),
        )
        .arg(
            Arg::new(X_END_ARG)
                .help("Last tile column, applied at the maximum zoom level only (0 = unbounded)")
                .value_parser(tile_index)
                .long("x-end"),
        )
        .arg(
            Arg::new(Y_END_ARG)
                .help("Last tile row of the last column, applied at the maximum zoom level only (0 = unbounded)")
                .value_parser(tile_index)
                .long("y-end"),
        )
        .arg(
            Arg::new(SINGLE_THREAD_ARG)
                .help("Download each zoom level with a single worker")
                .action(ArgAction::SetTrue)
                .long("single-thread"),
        )
        .arg(
            Arg::new(NO_PROGRESS_ARG)
                .help("Don't draw progress bars")
                .action(ArgAction::SetTrue)
                .long("no-progress"),
        )
        .arg(
            Arg::new(DRY_RUN_ARG)
                .help("Don't actually fetch anything, just determine how many tiles would be fetched.")
                .action(ArgAction::SetTrue)
                .long("dry-run"),
        )
        .get_matches()
}
