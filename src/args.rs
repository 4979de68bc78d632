/// Command-line token grammar: one-run overrides or a `config` rewrite
use log::{error, warn};

use crate::config::{
    ConfigStore, Configuration, ParseError, Setting, parse_int, parse_positive, positive,
};

/// The closed set of top-level token shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    /// `<work>-<break>`
    Pair(&'a str),
    /// `n=<sessions>`
    Sessions(&'a str),
    /// `config`, which consumes every token after it
    Config,
    Unknown(&'a str),
}

fn classify(token: &str) -> Token<'_> {
    if token == "config" {
        Token::Config
    } else if let Some(count) = token.strip_prefix("n=") {
        Token::Sessions(count)
    } else if token.contains('-') && !token.contains('=') {
        Token::Pair(token)
    } else {
        Token::Unknown(token)
    }
}

// A leading sign belongs to the work half, so `-5-3` splits as (-5, 3).
fn split_pair(token: &str) -> Option<(&str, &str)> {
    let offset = usize::from(token.starts_with('-'));
    let hyphen = token[offset..].find('-')? + offset;
    Some((&token[..hyphen], &token[hyphen + 1..]))
}

/// A token, or half of one, that was not applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    pub token: String,
    pub error: ParseError,
}

#[derive(Debug, Clone)]
pub struct Invocation {
    /// The working copy after every accepted override.
    pub config: Configuration,
    /// False once `config` has been seen.
    pub run_timer: bool,
    pub rejected: Vec<Rejected>,
}

struct Interpreter {
    config: Configuration,
    rejected: Vec<Rejected>,
}

impl Interpreter {
    fn reject(&mut self, token: &str, error: ParseError) {
        eprintln!("Ignoring `{token}`: {error}");
        warn!("rejected argument `{token}`: {error}");
        self.rejected.push(Rejected {
            token: token.to_string(),
            error,
        });
    }

    fn apply(&mut self, token: &str, result: Result<Setting, ParseError>) {
        match result {
            Ok(setting) => self.config.apply(setting),
            Err(error) => self.reject(token, error),
        }
    }

    fn pair(&mut self, token: &str) {
        let halves = split_pair(token).and_then(|(work, rest)| {
            let work = parse_int(work).ok()?;
            let rest = parse_int(rest).ok()?;
            Some((work, rest))
        });
        let Some((work, rest)) = halves else {
            self.reject(token, ParseError::MalformedPair(token.to_string()));
            return;
        };

        self.apply(token, positive("work", work).map(Setting::WorkMinutes));
        self.apply(token, positive("break", rest).map(Setting::BreakMinutes));
    }

    // Unknown keys and bare words are skipped without a message here.
    fn config_setting(&mut self, token: &str) {
        let Some((key, value)) = token.split_once('=') else {
            return;
        };
        if let Some(result) = Setting::parse(key, value) {
            self.apply(token, result);
        }
    }
}

/// Applies `tokens` (program name excluded) to `working`, left to right.
///
/// A malformed token never aborts the invocation: it is reported on stderr,
/// recorded in [`Invocation::rejected`] and the fields it would have set keep
/// their prior values. Reaching `config` hands every remaining token to the
/// key=value sub-grammar, persists the result through `store` and disables
/// the timer run.
pub fn interpret<S: AsRef<str>>(
    tokens: &[S],
    working: Configuration,
    store: &ConfigStore,
) -> Invocation {
    let mut interpreter = Interpreter {
        config: working,
        rejected: Vec::new(),
    };

    let mut tokens = tokens.iter().map(AsRef::<str>::as_ref);
    while let Some(token) = tokens.next() {
        match classify(token) {
            Token::Pair(pair) => interpreter.pair(pair),
            Token::Sessions(count) => {
                let result = parse_positive("sessions", count).map(Setting::Sessions);
                interpreter.apply(token, result);
            }
            Token::Config => {
                for setting in tokens.by_ref() {
                    interpreter.config_setting(setting);
                }

                if let Err(err) = store.save(&interpreter.config, true) {
                    eprintln!("Error saving configuration: {err}");
                    error!("{err}");
                }
                return Invocation {
                    config: interpreter.config,
                    run_timer: false,
                    rejected: interpreter.rejected,
                };
            }
            Token::Unknown(other) => {
                interpreter.reject(other, ParseError::Unrecognized(other.to_string()))
            }
        }
    }

    Invocation {
        config: interpreter.config,
        run_timer: true,
        rejected: interpreter.rejected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Rgb;
    use tempfile::TempDir;

    fn run(tokens: &[&str]) -> (Invocation, ConfigStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path().join("pomodoro_config.txt"));
        let invocation = interpret(tokens, Configuration::default(), &store);
        (invocation, store, dir)
    }

    #[test]
    fn test_no_tokens_keeps_configuration() {
        let (invocation, store, _dir) = run(&[]);

        assert!(invocation.run_timer);
        assert!(invocation.rejected.is_empty());
        assert_eq!(invocation.config, Configuration::default());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_pair_sets_work_and_break() {
        let (invocation, _store, _dir) = run(&["50-10"]);

        assert!(invocation.run_timer);
        assert_eq!(invocation.config.work_minutes, 50);
        assert_eq!(invocation.config.break_minutes, 10);
    }

    #[test]
    fn test_pair_with_non_positive_half_applies_the_other() {
        let (invocation, _store, _dir) = run(&["40-0"]);

        assert_eq!(invocation.config.work_minutes, 40);
        assert_eq!(invocation.config.break_minutes, 5);
        assert_eq!(
            invocation.rejected,
            vec![Rejected {
                token: "40-0".into(),
                error: ParseError::NotPositive {
                    field: "break",
                    value: 0
                },
            }]
        );
    }

    #[test]
    fn test_leading_sign_belongs_to_work_half() {
        let (invocation, _store, _dir) = run(&["-5-3"]);

        assert_eq!(invocation.config.work_minutes, 25);
        assert_eq!(invocation.config.break_minutes, 3);
    }

    #[test]
    fn test_malformed_pair_is_skipped_whole() {
        let (invocation, _store, _dir) = run(&["ten-5", "30-"]);

        assert_eq!(invocation.config, Configuration::default());
        assert_eq!(invocation.rejected.len(), 2);
        assert_eq!(
            invocation.rejected[0].error,
            ParseError::MalformedPair("ten-5".into())
        );
    }

    #[test]
    fn test_sessions_override() {
        let (invocation, _store, _dir) = run(&["n=4"]);
        assert_eq!(invocation.config.sessions, 4);

        let (invocation, _store, _dir) = run(&["n=0", "n=x"]);
        assert_eq!(invocation.config.sessions, 1);
        assert_eq!(invocation.rejected.len(), 2);
    }

    #[test]
    fn test_overrides_apply_left_to_right() {
        let (invocation, store, _dir) = run(&["10-2", "n=3", "20-4"]);

        assert_eq!(invocation.config.work_minutes, 20);
        assert_eq!(invocation.config.break_minutes, 4);
        assert_eq!(invocation.config.sessions, 3);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_unknown_top_level_token_is_reported() {
        let (invocation, _store, _dir) = run(&["work=10"]);

        assert!(invocation.run_timer);
        assert_eq!(invocation.config, Configuration::default());
        assert_eq!(
            invocation.rejected[0].error,
            ParseError::Unrecognized("work=10".into())
        );
    }

    #[test]
    fn test_config_persists_and_skips_timer() {
        let (invocation, store, _dir) = run(&[
            "config",
            "work=45",
            "break=15",
            "sessions=2",
            "workcolor=(1,2,3)",
            "breakcolor=(4,5,6)",
        ]);

        let expected = Configuration {
            work_color: Rgb::new(1, 2, 3),
            break_color: Rgb::new(4, 5, 6),
            work_minutes: 45,
            break_minutes: 15,
            sessions: 2,
        };
        assert!(!invocation.run_timer);
        assert_eq!(invocation.config, expected);
        assert_eq!(store.load(), expected);
    }

    #[test]
    fn test_config_skips_invalid_entries_and_continues() {
        let (invocation, store, _dir) = run(&[
            "config",
            "workcolor=(256,0,0)",
            "work=0",
            "whatever",
            "theme=dark",
            "break=7",
        ]);

        assert_eq!(invocation.rejected.len(), 2);
        assert_eq!(invocation.config.work_color, Configuration::default().work_color);
        assert_eq!(invocation.config.work_minutes, 25);
        assert_eq!(invocation.config.break_minutes, 7);
        assert_eq!(store.load().break_minutes, 7);
    }

    #[test]
    fn test_config_consumes_remaining_tokens() {
        let (invocation, store, _dir) = run(&["30-5", "config", "n=9", "99-9"]);

        assert!(!invocation.run_timer);
        assert!(invocation.rejected.is_empty());
        assert_eq!(invocation.config.sessions, 1);
        assert_eq!(invocation.config.work_minutes, 30);
        assert_eq!(store.load().work_minutes, 30);
    }

    #[test]
    fn test_split_pair_shapes() {
        assert_eq!(split_pair("25-5"), Some(("25", "5")));
        assert_eq!(split_pair("-1-2"), Some(("-1", "2")));
        assert_eq!(split_pair("5--3"), Some(("5", "-3")));
        assert_eq!(split_pair("-7"), None);
    }
}
