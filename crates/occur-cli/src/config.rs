use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment, Provider,
};
use occur_core::config::Config;
use std::path::Path;

pub const CONFIG_FILE: &str = "occur.toml";
pub const ENV_PREFIX: &str = "OCCUR_";

/// Loads the configuration: built-in defaults, then the TOML file (`path` or
/// `./occur.toml`), then `OCCUR_` environment variables with `__` between
/// nested keys, e.g. `OCCUR_MATCHER__LOOKAHEAD_DAYS=365`.
pub fn load(path: Option<&Path>) -> Result<Config, figment::Error> {
    let file = Toml::file(path.unwrap_or_else(|| Path::new(CONFIG_FILE)));
    layered(file).extract()
}

fn layered(file: impl Provider) -> Figment {
    Figment::from(Serialized::defaults(Config::default()))
        .merge(file)
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}
