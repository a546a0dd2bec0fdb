use std::{env, fmt::Display, str::FromStr};

use log::*;

/// Read `name` from the environment and parse it. Missing or unparseable values fall back to `default`, with a log
/// message explaining why.
pub fn env_or_default<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            info!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
    }
}
