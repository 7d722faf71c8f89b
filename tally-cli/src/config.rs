use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tally_core::{CurrencyCode, ParserConfig, SignPolicy, UnresolvedPolicy};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputSection,
    pub parser: ParserConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// Drop the account column from CSV written to stdout / --out
    pub preview: bool,
    /// Always write per-account CSVs here (overridden by --split-dir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_dir: Option<PathBuf>,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub extra_currencies: Vec<CurrencyCode>,
    pub default_currency: Option<CurrencyCode>,
    pub sign: Option<SignPolicy>,
    pub preview: bool,
}

impl Config {
    pub fn apply(mut self, o: &Overrides) -> Result<Self> {
        for code in &o.extra_currencies {
            self.parser.currencies.insert(*code);
        }
        if let Some(code) = o.default_currency {
            // a seeded currency must also be detectable later on
            self.parser.currencies.insert(code);
            self.parser.unresolved = UnresolvedPolicy::DefaultCurrency { code };
        }
        if let Some(sign) = o.sign {
            self.parser.sign = sign;
        }
        self.output.preview |= o.preview;
        self.parser.validate().context("invalid parser configuration")?;
        Ok(self)
    }
}

fn tally_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".tally"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(tally_home()?.join("config.toml"))
}

pub fn parse_config(s: &str) -> Result<Config> {
    Ok(toml::from_str(s).context("parse config.toml")?)
}

/// Load `explicit` (must exist), else `~/.tally/config.toml` if present,
/// else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let p = match explicit {
        Some(p) => {
            if !p.exists() {
                bail!("config not found: {}", p.display());
            }
            p.to_path_buf()
        }
        None => {
            let p = config_path()?;
            if !p.exists() {
                return Ok(Config::default());
            }
            p
        }
    };
    let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s).with_context(|| format!("in {}", p.display()))
}

pub fn render_config(cfg: &Config) -> Result<String> {
    toml::to_string_pretty(cfg).context("serialize config")
}

pub fn save_config(cfg: &Config, path: &Path) -> Result<()> {
    let s = render_config(cfg)?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn init_config() -> Result<PathBuf> {
    let dir = tally_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    let p = dir.join("config.toml");
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(p);
    }
    save_config(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrip() {
        let cfg = Config::default();
        let s = render_config(&cfg).unwrap();
        assert!(s.contains("[parser]"));
        assert_eq!(parse_config(&s).unwrap(), cfg);
    }

    #[test]
    fn test_partial_file() {
        let cfg = parse_config(
            r#"
[output]
preview = true

[parser]
currencies = ["AED", "USD", "EUR", "GBP", "SAR"]
"#,
        )
        .unwrap();
        assert!(cfg.output.preview);
        assert_eq!(cfg.parser.currencies.len(), 5);
        assert_eq!(cfg.parser.unresolved, UnresolvedPolicy::Sentinel);
    }

    #[test]
    fn test_bad_currency_is_rejected() {
        assert!(parse_config("[parser]\ncurrencies = [\"EURO\"]\n").is_err());
    }

    #[test]
    fn test_overrides() {
        let sar = CurrencyCode::parse("SAR").unwrap();
        let o = Overrides {
            extra_currencies: vec![CurrencyCode::parse("CHF").unwrap()],
            default_currency: Some(sar),
            sign: Some(SignPolicy::DashMarksDebit),
            preview: true,
        };
        let cfg = Config::default().apply(&o).unwrap();
        assert!(cfg.parser.currencies.contains(sar));
        assert!(cfg.parser.currencies.accept("CHF").is_some());
        assert_eq!(cfg.parser.unresolved, UnresolvedPolicy::DefaultCurrency { code: sar });
        assert_eq!(cfg.parser.sign, SignPolicy::DashMarksDebit);
        assert!(cfg.output.preview);
    }

    #[test]
    fn test_config_lives_under_tally_home() {
        let p = config_path().unwrap();
        assert!(p.ends_with(".tally/config.toml"), "{}", p.display());
    }

    #[test]
    fn test_explicit_missing_config_errors() {
        assert!(load_config(Some(Path::new("/nonexistent/tally.toml"))).is_err());
    }

    #[test]
    fn test_save_and_load_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("tally.toml");
        let mut cfg = Config::default();
        cfg.output.split_dir = Some(PathBuf::from("out"));
        save_config(&cfg, &p).unwrap();
        assert_eq!(load_config(Some(&p)).unwrap(), cfg);
    }
}
