//! Command implementations.

use std::path::Path;

use nutmeg_common::Bundle;
use nutmeg_vm::{Catalog, Engine, RuntimeError};
use nutmeg_weaver::{load_bundle, WeaveError};
use serde_json::json;
use tracing::debug;

/// Report a failure on stderr: the message, then one line per culprit.
pub fn mishap(message: &str, culprits: &[(&str, String)]) {
    eprintln!("MISHAP: {message}");
    for (key, value) in culprits {
        eprintln!(" {key}: {value}");
    }
}

fn runtime_mishap(err: &RuntimeError) -> i32 {
    mishap(&err.to_string(), &err.culprits());
    3
}

/// Read `path` and load it into a fresh engine.
pub fn load(path: &Path) -> Result<(Engine, Bundle), i32> {
    let bundle = Bundle::load(path).map_err(|e| {
        mishap(&e.to_string(), &[("Path", path.display().to_string())]);
        1
    })?;
    debug!(bindings = bundle.bindings.len(), "bundle read");

    let mut engine = Engine::new(Catalog::standard());
    load_bundle(&mut engine, &bundle).map_err(|e| match &e {
        WeaveError::Runtime(err) => runtime_mishap(err),
        _ => {
            mishap(&e.to_string(), &e.culprits());
            1
        }
    })?;
    Ok((engine, bundle))
}

/// The binding to run: the one named, else the bundle's only command.
pub fn entry_point(bundle: &Bundle, named: Option<&str>) -> Result<String, i32> {
    if let Some(name) = named {
        return Ok(name.to_string());
    }
    bundle.default_entry_point().map(str::to_string).map_err(|e| {
        mishap(&e.to_string(), &[("Hint", "use --entry-point NAME".into())]);
        1
    })
}

/// Run `entry` with string arguments.
pub fn start(engine: &mut Engine, entry: &str, args: &[String], print: bool) -> Result<(), i32> {
    match engine.start(entry, args, print) {
        Ok(_) => Ok(()),
        Err(RuntimeError::UnknownIdentifier { name }) => {
            mishap("unknown entry point", &[("Identifier", name)]);
            Err(1)
        }
        Err(err) => Err(runtime_mishap(&err)),
    }
}

/// Print the DOT rendering of `entry`.
pub fn graphviz(engine: &Engine, entry: &str) -> Result<(), i32> {
    let dot = engine.to_dot(entry).map_err(|err| {
        mishap(&err.to_string(), &err.culprits());
        1
    })?;
    print!("{dot}");
    Ok(())
}

/// Run every unit test of the bundle, resetting the stacks in between.
pub fn unittest(engine: &mut Engine, bundle: &Bundle, title: Option<&str>) -> Result<(), i32> {
    if let Some(title) = title {
        println!("{title}");
    }
    let mut failed = 0;
    for name in &bundle.unittests {
        engine.reset();
        match engine.start(name, &[], false) {
            Ok(_) => println!("PASS: {name}"),
            Err(err) => {
                failed += 1;
                println!("FAIL: {name}");
                println!(" {err}");
                for (key, value) in err.culprits() {
                    println!(" {key}: {value}");
                }
            }
        }
    }
    let total = bundle.unittests.len();
    println!("{} passed, {failed} failed, {total} total", total - failed);
    if failed > 0 {
        Err(1)
    } else {
        Ok(())
    }
}

/// List the built-in catalog as JSON.
pub fn info() -> Result<(), i32> {
    let catalog = Catalog::standard();
    let builtins: Vec<_> = catalog
        .names()
        .into_iter()
        .map(|(name, builtin)| {
            json!({
                "name": name,
                "primary": builtin.name,
                "arity": builtin.arity.to_string(),
            })
        })
        .collect();
    let text = serde_json::to_string_pretty(&json!({ "builtins": builtins })).map_err(|e| {
        mishap(&e.to_string(), &[]);
        1
    })?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_point_prefers_the_named_binding() {
        let bundle = Bundle {
            commands: vec!["main".into()],
            ..Bundle::default()
        };
        assert_eq!(entry_point(&bundle, Some("other")), Ok("other".to_string()));
        assert_eq!(entry_point(&bundle, None), Ok("main".to_string()));
    }

    #[test]
    fn entry_point_needs_a_single_command() {
        let bundle = Bundle {
            commands: vec!["a".into(), "b".into()],
            ..Bundle::default()
        };
        assert_eq!(entry_point(&bundle, None), Err(1));
        assert_eq!(entry_point(&Bundle::default(), None), Err(1));
    }
}
