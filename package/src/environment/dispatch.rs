//! Name-based calls into an environment with JSON arguments
//!
//! Used by the `call` command. Arguments arrive untyped, so arity and type
//! checks happen here before the typed [`Environment`] methods run.

use super::Environment;
use crate::types::PackageDatabaseEntry;
use crate::{Error, Result};
use serde_json::{json, Value};
use tracing::debug;

/// Invoke `method` on `env` with dynamic arguments
pub fn call(env: &dyn Environment, method: &str, args: &[Value]) -> Result<Value> {
    debug!("Dispatching {} with {} argument(s)", method, args.len());

    match method {
        "query_use" => {
            let (flag, pde) = name_and_entry(method, args)?;
            Ok(Value::Bool(env.query_use(flag, pde.as_ref())?))
        }
        "accept_keyword" => {
            let (keyword, pde) = name_and_entry(method, args)?;
            Ok(Value::Bool(env.accept_keyword(keyword, pde.as_ref())?))
        }
        "accept_license" => {
            let (license, pde) = name_and_entry(method, args)?;
            Ok(Value::Bool(env.accept_license(license, pde.as_ref())?))
        }
        "mask_reasons" => {
            arity(method, args, 1, 1, "1")?;
            let pde = entry(method, &args[0])?;
            Ok(serde_json::to_value(env.mask_reasons(&pde)?)?)
        }
        "package_set" => {
            arity(method, args, 1, 1, "1")?;
            let name = string(method, &args[0])?;
            Ok(serde_json::to_value(env.package_set(name)?)?)
        }
        "fetch_repository" => {
            arity(method, args, 1, 1, "1")?;
            let name = string(method, &args[0])?;
            let repo = env.package_database().fetch_repository(name)?;
            Ok(json!({
                "name": repo.name(),
                "location": repo.location().map(|p| p.display().to_string()),
            }))
        }
        _ => Err(Error::NoMethod(method.to_string())),
    }
}

fn arity(method: &str, args: &[Value], min: usize, max: usize, expected: &'static str) -> Result<()> {
    if args.len() < min || args.len() > max {
        return Err(Error::Argument {
            method: method.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

fn string<'a>(method: &str, value: &'a Value) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| Error::type_error(method, "string", value))
}

/// A package version given as `cat/pkg-ver::repo` or as an object
fn entry(method: &str, value: &Value) -> Result<PackageDatabaseEntry> {
    match value {
        Value::String(s) => PackageDatabaseEntry::parse(s),
        Value::Object(_) => Ok(serde_json::from_value(value.clone())?),
        other => Err(Error::type_error(method, "package database entry", other)),
    }
}

fn name_and_entry<'a>(
    method: &str,
    args: &'a [Value],
) -> Result<(&'a str, Option<PackageDatabaseEntry>)> {
    arity(method, args, 1, 2, "1..2")?;
    let name = string(method, &args[0])?;
    let pde = args.get(1).map(|v| entry(method, v)).transpose()?;
    Ok((name, pde))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accept::AcceptancePolicy;
    use crate::db::PackageDatabase;
    use crate::repository::Repository;
    use crate::use_flags::UseFlagPolicy;
    use assert_matches::assert_matches;
    use pkgenv_config::MaskConfig;

    struct TestEnv {
        db: PackageDatabase,
        use_policy: UseFlagPolicy,
        acceptance: AcceptancePolicy,
        masks: MaskConfig,
    }

    impl Environment for TestEnv {
        fn package_database(&self) -> &PackageDatabase {
            &self.db
        }
        fn use_policy(&self) -> &UseFlagPolicy {
            &self.use_policy
        }
        fn acceptance_policy(&self) -> &AcceptancePolicy {
            &self.acceptance
        }
        fn user_masks(&self) -> &MaskConfig {
            &self.masks
        }
    }

    fn env() -> TestEnv {
        let repo = Repository::builder("testrepo")
            .package("foo/bar-1.0", "test", "")
            .unwrap()
            .package("foo/bar-2.0", "~test", "")
            .unwrap()
            .build();
        TestEnv {
            db: PackageDatabase::builder().add_repository(repo).unwrap().build(),
            use_policy: UseFlagPolicy::disabled(),
            acceptance: AcceptancePolicy::for_arch("test"),
            masks: MaskConfig::new(),
        }
    }

    #[test]
    fn test_queries() {
        let env = env();
        assert_eq!(call(&env, "accept_keyword", &[json!("test")]).unwrap(), json!(true));
        assert_eq!(call(&env, "accept_keyword", &[json!("~test")]).unwrap(), json!(false));
        assert_eq!(call(&env, "accept_license", &[json!("GPL-2")]).unwrap(), json!(true));
        assert_eq!(
            call(&env, "query_use", &[json!("foo"), json!("foo/bar-1.0::testrepo")]).unwrap(),
            json!(false)
        );
        assert_eq!(
            call(
                &env,
                "query_use",
                &[
                    json!("foo"),
                    json!({"name": "foo/bar", "version": "1.0", "repository": "testrepo"})
                ]
            )
            .unwrap(),
            json!(false)
        );
    }

    #[test]
    fn test_mask_reasons_and_sets() {
        let env = env();
        assert_eq!(
            call(&env, "mask_reasons", &[json!("foo/bar-1.0::testrepo")]).unwrap(),
            json!([])
        );
        assert_eq!(
            call(&env, "mask_reasons", &[json!("foo/bar-2.0::testrepo")]).unwrap(),
            json!(["keyword"])
        );
        assert_eq!(
            call(&env, "fetch_repository", &[json!("testrepo")]).unwrap()["name"],
            json!("testrepo")
        );
        assert!(call(&env, "package_set", &[json!("everything")]).unwrap().is_object());
    }

    #[test]
    fn test_argument_errors() {
        let env = env();
        assert_matches!(call(&env, "query_use", &[]), Err(Error::Argument { got: 0, .. }));
        assert_matches!(
            call(&env, "accept_keyword", &[json!("a"), json!("b"), json!("c")]),
            Err(Error::Argument { got: 3, .. })
        );
        assert_matches!(call(&env, "mask_reasons", &[]), Err(Error::Argument { .. }));
        assert_matches!(call(&env, "package_set", &[json!(1), json!(2)]), Err(Error::Argument { .. }));
    }

    #[test]
    fn test_type_errors() {
        let env = env();
        assert_matches!(
            call(&env, "query_use", &[json!(1)]),
            Err(Error::Type { expected: "string", .. })
        );
        assert_matches!(
            call(&env, "accept_license", &[json!("GPL-2"), json!(true)]),
            Err(Error::Type { .. })
        );
        assert_matches!(call(&env, "package_set", &[json!(null)]), Err(Error::Type { .. }));
    }

    #[test]
    fn test_lookup_errors() {
        let env = env();
        assert_matches!(
            call(&env, "mask_reasons", &[json!("foo/bar-1.0::nosuchrepo")]),
            Err(Error::NoSuchRepository(_))
        );
        assert_matches!(
            call(&env, "package_set", &[json!("broken*")]),
            Err(Error::SetName(_))
        );
        assert_matches!(call(&env, "new", &[]), Err(Error::NoMethod(_)));
        assert_matches!(call(&env, "frobnicate", &[]), Err(Error::NoMethod(_)));
    }
}
