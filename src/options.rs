//! Flag value extraction for subcommands that take free-form options.
//!
//! Values for `--name` follow either as separate tokens up to the next
//! `--` token, or inline as `--name=v1 v2`, where the inline value is split
//! on spaces. Both forms give the same result.

use std::collections::HashMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    One,
    Many,
}

#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub arity: Arity,
}

impl OptionSpec {
    pub const fn one(name: &'static str) -> Self {
        Self {
            name,
            arity: Arity::One,
        }
    }

    pub const fn many(name: &'static str) -> Self {
        Self {
            name,
            arity: Arity::Many,
        }
    }
}

/// Returns the values of the first occurrence of `--name`, or `None` when
/// the flag is absent.
pub fn extract<S: AsRef<str>>(name: &str, args: &[S]) -> Option<Vec<String>> {
    let flag = format!("--{}", name);
    let inline = format!("{}=", flag);

    for (i, arg) in args.iter().enumerate() {
        let arg = arg.as_ref();

        if let Some(value) = arg.strip_prefix(&inline) {
            return Some(value.split(' ').map(str::to_owned).collect());
        }

        if arg == flag {
            let values = args[i + 1..]
                .iter()
                .map(AsRef::as_ref)
                .take_while(|token| !token.starts_with("--"))
                .map(str::to_owned)
                .collect();
            return Some(values);
        }
    }

    None
}

#[derive(Debug, Default)]
pub struct ParsedOptions {
    values: HashMap<&'static str, Vec<String>>,
}

impl ParsedOptions {
    pub fn single(&self, name: &str) -> Option<&str> {
        self.values
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn many(&self, name: &str) -> &[String] {
        self.values.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Validates `args` against `schema` and collects every option present.
pub fn parse<S: AsRef<str>>(schema: &[OptionSpec], args: &[S]) -> Result<ParsedOptions> {
    let mut owned = false;
    for arg in args {
        let arg = arg.as_ref();
        match arg.strip_prefix("--") {
            Some(flag) => {
                let name = flag.split_once('=').map_or(flag, |(name, _)| name);
                if !schema.iter().any(|spec| spec.name == name) {
                    return Err(Error::usage(format!("unknown option '--{}'", name)));
                }
                owned = !flag.contains('=');
            }
            None if owned => {}
            None => return Err(Error::usage(format!("unexpected argument '{}'", arg))),
        }
    }

    let mut parsed = ParsedOptions::default();
    for spec in schema {
        let Some(values) = extract(spec.name, args) else {
            continue;
        };

        if spec.arity == Arity::One && values.len() != 1 {
            return Err(Error::usage(format!(
                "option '--{}' takes exactly one value, got {}",
                spec.name,
                values.len()
            )));
        }

        if values.iter().any(String::is_empty) {
            return Err(Error::usage(format!(
                "option '--{}' has an empty value",
                spec.name
            )));
        }

        parsed.values.insert(spec.name, values);
    }

    Ok(parsed)
}
