/// Configuration module for Pomodoro settings and their on-disk form
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

/// Overrides the config file location when set to a non-empty path.
pub const CONFIG_ENV: &str = "POMODORO_CONFIG";

const APP_DIR: &str = "pomodoro";
const CONFIG_FILE: &str = "pomodoro_config.txt";

/// Why a single CLI token or config line was not applied.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("`{0}` is not an integer")]
    NotAnInteger(String),

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("{field} value {value} is too large")]
    TooLarge { field: &'static str, value: i64 },

    #[error("`{0}` is not a work-break pair, expected <work>-<break>")]
    MalformedPair(String),

    #[error("`{0}` is not a color, expected (r,g,b)")]
    MalformedColor(String),

    #[error("{field} channel {value} is outside 0-255")]
    ChannelOutOfRange { field: &'static str, value: i64 },

    #[error("`{0}` is not a key=value line")]
    MalformedLine(String),

    #[error("unrecognized argument `{0}`")]
    Unrecognized(String),
}

/// Error type for config file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.r, self.g, self.b)
    }
}

/// Interval lengths, session count and bar colors.
///
/// Every numeric field is strictly positive. Values only ever reach a
/// `Configuration` through [`Setting`], which validates them first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub work_color: Rgb,
    pub break_color: Rgb,
    pub work_minutes: u32,
    pub break_minutes: u32,
    pub sessions: u32,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            work_color: Rgb::new(208, 53, 197),
            break_color: Rgb::new(50, 192, 50),
            work_minutes: 25,
            break_minutes: 5,
            sessions: 1,
        }
    }
}

impl Configuration {
    pub fn apply(&mut self, setting: Setting) {
        match setting {
            Setting::WorkMinutes(minutes) => self.work_minutes = minutes,
            Setting::BreakMinutes(minutes) => self.break_minutes = minutes,
            Setting::Sessions(count) => self.sessions = count,
            Setting::WorkColor(color) => self.work_color = color,
            Setting::BreakColor(color) => self.break_color = color,
        }
    }

    /// Renders the file form read back by [`parse_config`].
    pub fn to_file_contents(&self) -> String {
        format!(
            "work={}\nbreak={}\nsessions={}\nworkcolor={}\nbreakcolor={}\n",
            self.work_minutes, self.break_minutes, self.sessions, self.work_color, self.break_color
        )
    }
}

/// One validated field assignment, shared by the config file and the
/// `config` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    WorkMinutes(u32),
    BreakMinutes(u32),
    Sessions(u32),
    WorkColor(Rgb),
    BreakColor(Rgb),
}

impl Setting {
    /// Parses `value` for `key`. Returns `None` when the key is unknown.
    pub fn parse(key: &str, value: &str) -> Option<Result<Self, ParseError>> {
        let setting = match key.trim() {
            "work" => parse_positive("work", value).map(Setting::WorkMinutes),
            "break" => parse_positive("break", value).map(Setting::BreakMinutes),
            "sessions" => parse_positive("sessions", value).map(Setting::Sessions),
            "workcolor" => parse_color("workcolor", value).map(Setting::WorkColor),
            "breakcolor" => parse_color("breakcolor", value).map(Setting::BreakColor),
            _ => return None,
        };
        Some(setting)
    }
}

pub(crate) fn parse_int(raw: &str) -> Result<i64, ParseError> {
    let raw = raw.trim();
    raw.parse()
        .map_err(|_| ParseError::NotAnInteger(raw.to_string()))
}

pub(crate) fn positive(field: &'static str, value: i64) -> Result<u32, ParseError> {
    if value <= 0 {
        return Err(ParseError::NotPositive { field, value });
    }
    u32::try_from(value).map_err(|_| ParseError::TooLarge { field, value })
}

pub(crate) fn parse_positive(field: &'static str, raw: &str) -> Result<u32, ParseError> {
    positive(field, parse_int(raw)?)
}

fn channel(field: &'static str, value: i64) -> Result<u8, ParseError> {
    u8::try_from(value).map_err(|_| ParseError::ChannelOutOfRange { field, value })
}

fn parse_color(field: &'static str, raw: &str) -> Result<Rgb, ParseError> {
    let raw = raw.trim();
    let malformed = || ParseError::MalformedColor(raw.to_string());

    let inner = raw
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .ok_or_else(malformed)?;
    let parts: Vec<&str> = inner.split(',').collect();
    let [r, g, b] = parts.as_slice() else {
        return Err(malformed());
    };

    let mut channels = [0u8; 3];
    for (slot, part) in channels.iter_mut().zip([r, g, b]) {
        let value: i64 = part.trim().parse().map_err(|_| malformed())?;
        *slot = channel(field, value)?;
    }
    Ok(Rgb::new(channels[0], channels[1], channels[2]))
}

/// A rejected config file line, numbered from 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub line: usize,
    pub error: ParseError,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.error)
    }
}

#[derive(Debug, Clone)]
pub struct Parsed {
    pub config: Configuration,
    pub errors: Vec<LineError>,
    /// The text was in the old nine-integer layout.
    pub legacy: bool,
}

/// Overlays the file text onto `base`, field by field.
///
/// Recognized, well-formed, in-range lines replace the matching field.
/// Anything else leaves the field alone and is returned in `errors`,
/// except unknown keys, which are skipped silently.
pub fn parse_config(text: &str, base: Configuration) -> Parsed {
    if let Some(values) = legacy_values(text) {
        return parse_legacy(values, base);
    }

    let mut config = base;
    let mut errors = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let result = match line.split_once('=') {
            Some((key, value)) => match Setting::parse(key, value) {
                Some(result) => result,
                None => continue,
            },
            None => Err(ParseError::MalformedLine(line.to_string())),
        };

        match result {
            Ok(setting) => config.apply(setting),
            Err(error) => errors.push(LineError {
                line: index + 1,
                error,
            }),
        }
    }

    Parsed {
        config,
        errors,
        legacy: false,
    }
}

// workR workG workB breakR breakG breakB work break sessions
fn legacy_values(text: &str) -> Option<[i64; 9]> {
    if text.contains('=') {
        return None;
    }
    let values: Vec<i64> = text
        .split_whitespace()
        .map(|token| token.parse().ok())
        .collect::<Option<_>>()?;
    values.try_into().ok()
}

fn parse_legacy(values: [i64; 9], base: Configuration) -> Parsed {
    let [wr, wg, wb, br, bg, bb, work, brk, sessions] = values;
    let mut config = base;
    let mut errors = Vec::new();

    let color = |field, r, g, b| -> Result<Rgb, ParseError> {
        Ok(Rgb::new(channel(field, r)?, channel(field, g)?, channel(field, b)?))
    };
    let results = [
        color("workcolor", wr, wg, wb).map(Setting::WorkColor),
        color("breakcolor", br, bg, bb).map(Setting::BreakColor),
        positive("work", work).map(Setting::WorkMinutes),
        positive("break", brk).map(Setting::BreakMinutes),
        positive("sessions", sessions).map(Setting::Sessions),
    ];
    for result in results {
        match result {
            Ok(setting) => config.apply(setting),
            Err(error) => errors.push(LineError { line: 1, error }),
        }
    }

    Parsed {
        config,
        errors,
        legacy: true,
    }
}

/// Default location of the config file.
pub fn config_path() -> PathBuf {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|path| !path.is_empty()) {
        return PathBuf::from(path);
    }

    #[cfg(target_os = "windows")]
    {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join(APP_DIR).join(CONFIG_FILE)
        } else {
            PathBuf::from(CONFIG_FILE)
        }
    }
    #[cfg(not(target_os = "windows"))]
    {
        // ~/.config/pomodoro/pomodoro_config.txt on every Unix, macOS included
        if let Some(home_dir) = dirs::home_dir() {
            home_dir.join(".config").join(APP_DIR).join(CONFIG_FILE)
        } else {
            PathBuf::from(CONFIG_FILE)
        }
    }
}

/// Reads and writes the config file at a fixed path.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn locate() -> Self {
        let path = config_path();
        debug!("config path resolved to {}", path.display());
        Self::new(path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted configuration over the defaults.
    ///
    /// Never fails: unreadable files and bad lines are reported on stderr
    /// and the affected fields keep their defaults. A missing file is seeded
    /// with the defaults, and a legacy file is rewritten in the current
    /// layout, both without announcing it.
    pub fn load(&self) -> Configuration {
        let defaults = Configuration::default();

        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(source) if source.kind() == io::ErrorKind::NotFound => {
                info!("no config at {}, writing defaults", self.path.display());
                if let Err(err) = self.save(&defaults, false) {
                    warn!("could not seed default config: {err}");
                }
                return defaults;
            }
            Err(source) => {
                let err = ConfigError::Read {
                    path: self.path.clone(),
                    source,
                };
                eprintln!("Warning: {err}, using defaults");
                warn!("{err}");
                return defaults;
            }
        };

        let parsed = parse_config(&text, defaults);
        for error in &parsed.errors {
            eprintln!("Warning: {}: {error}", self.path.display());
            warn!("rejected config {error}");
        }

        if parsed.legacy {
            info!("migrating legacy config at {}", self.path.display());
            if let Err(err) = self.save(&parsed.config, false) {
                warn!("could not rewrite legacy config: {err}");
            }
        }

        parsed.config
    }

    /// Overwrites the config file with every field of `config`.
    pub fn save(&self, config: &Configuration, announce: bool) -> Result<(), ConfigError> {
        self.ensure_dir()?;

        fs::write(&self.path, config.to_file_contents()).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        info!("saved configuration to {}", self.path.display());

        if announce {
            println!("Pomodoro configuration saved to {}", self.path.display());
        }
        Ok(())
    }

    /// Creates the directory holding the config file, private to the user.
    pub fn ensure_dir(&self) -> Result<(), ConfigError> {
        let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
            return Ok(());
        };
        if dir.is_dir() {
            return Ok(());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(dir).map_err(|source| ConfigError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })
    }
}
